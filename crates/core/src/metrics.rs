use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Default)]
pub struct Metrics {
    commands: AtomicU64,
    llm_attempts: AtomicU64,
    llm_failures: AtomicU64,
    llm_resolutions: AtomicU64,
    fallbacks: AtomicU64,
    no_matches: AtomicU64,
    actions_dispatched: AtomicU64,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_commands(&self) {
        self.commands.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_llm_attempts(&self) {
        self.llm_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_llm_failures(&self) {
        self.llm_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_llm_resolutions(&self) {
        self.llm_resolutions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_fallbacks(&self) {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_no_matches(&self) {
        self.no_matches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_actions_dispatched(&self) {
        self.actions_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            commands: self.commands.load(Ordering::Relaxed),
            llm_attempts: self.llm_attempts.load(Ordering::Relaxed),
            llm_failures: self.llm_failures.load(Ordering::Relaxed),
            llm_resolutions: self.llm_resolutions.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
            no_matches: self.no_matches.load(Ordering::Relaxed),
            actions_dispatched: self.actions_dispatched.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub commands: u64,
    pub llm_attempts: u64,
    pub llm_failures: u64,
    pub llm_resolutions: u64,
    pub fallbacks: u64,
    pub no_matches: u64,
    pub actions_dispatched: u64,
}

impl MetricsSnapshot {
    /// Share of provider calls that completed without a transport or timeout
    /// failure. Inconclusive replies count as successful calls.
    pub fn llm_success_rate(&self) -> f64 {
        if self.llm_attempts == 0 {
            return 1.0;
        }
        1.0 - (self.llm_failures as f64 / self.llm_attempts as f64)
    }
}
