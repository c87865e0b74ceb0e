//! Two-stage intent resolution.
//!
//! Stages run strictly in order within one request: the interpreter (when
//! configured) first, the deterministic matcher second. Every outcome of
//! the first stage other than a registered target falls through.

use crate::interpreter::{Interpretation, LlmInterpreter};
use crate::matcher::{DeterministicMatcher, MatchOutcome};
use crate::metrics::Metrics;
use crate::registry::TargetRegistry;
use crate::types::{ActionDescriptor, Command, SymbolicTarget};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_millis(8000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Llm,
    Deterministic,
}

/// What happened in the interpretation stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", content = "detail", rename_all = "snake_case")]
pub enum LlmStage {
    NoProvider,
    Resolved,
    Inconclusive,
    ProviderError(String),
    TimedOut,
    UnknownTarget(SymbolicTarget),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved {
        action: ActionDescriptor,
        target: SymbolicTarget,
        strategy: Strategy,
        llm: LlmStage,
    },
    Failed {
        llm: LlmStage,
    },
}

impl Resolution {
    pub fn action(&self) -> ActionDescriptor {
        match self {
            Resolution::Resolved { action, .. } => action.clone(),
            Resolution::Failed { .. } => ActionDescriptor::None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved { .. })
    }
}

pub struct IntentResolver {
    registry: Arc<TargetRegistry>,
    matcher: DeterministicMatcher,
    interpreter: Option<LlmInterpreter>,
    provider_timeout: Duration,
    metrics: Arc<Metrics>,
}

impl IntentResolver {
    pub fn new(
        registry: Arc<TargetRegistry>,
        matcher: DeterministicMatcher,
        interpreter: Option<LlmInterpreter>,
        provider_timeout: Duration,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            registry,
            matcher,
            interpreter,
            provider_timeout,
            metrics,
        }
    }

    pub async fn resolve(&self, command: &Command) -> Resolution {
        let llm = match &self.interpreter {
            Some(interpreter) => match self.try_llm(interpreter, command).await {
                Ok(resolved) => return resolved,
                Err(stage) => {
                    self.metrics.inc_fallbacks();
                    stage
                }
            },
            None => LlmStage::NoProvider,
        };

        self.try_deterministic(command, llm)
    }

    async fn try_llm(
        &self,
        interpreter: &LlmInterpreter,
        command: &Command,
    ) -> Result<Resolution, LlmStage> {
        self.metrics.inc_llm_attempts();

        let interpretation =
            match tokio::time::timeout(self.provider_timeout, interpreter.interpret(command)).await {
                Ok(interpretation) => interpretation,
                Err(_) => {
                    self.metrics.inc_llm_failures();
                    tracing::warn!(
                        "{} did not answer within {:?}, falling back",
                        interpreter.provider_name(),
                        self.provider_timeout
                    );
                    return Err(LlmStage::TimedOut);
                }
            };

        match interpretation {
            Interpretation::Target(target) => match self.registry.resolve(&target, command) {
                Some(action) => {
                    self.metrics.inc_llm_resolutions();
                    tracing::debug!("Provider resolved {} to {:?}", target, action);
                    Ok(Resolution::Resolved {
                        action,
                        target,
                        strategy: Strategy::Llm,
                        llm: LlmStage::Resolved,
                    })
                }
                None => {
                    tracing::debug!("Provider named unknown target {}", target);
                    Err(LlmStage::UnknownTarget(target))
                }
            },
            Interpretation::Inconclusive => Err(LlmStage::Inconclusive),
            Interpretation::ProviderError(detail) => {
                self.metrics.inc_llm_failures();
                tracing::warn!("{} failed: {}", interpreter.provider_name(), detail);
                Err(LlmStage::ProviderError(detail))
            }
        }
    }

    fn try_deterministic(&self, command: &Command, llm: LlmStage) -> Resolution {
        if let MatchOutcome::Matched(target) = self.matcher.match_command(command) {
            if let Some(action) = self.registry.resolve(&target, command) {
                return Resolution::Resolved {
                    action,
                    target,
                    strategy: Strategy::Deterministic,
                    llm,
                };
            }
            tracing::debug!("Matcher named unresolvable target {}", target);
        }

        self.metrics.inc_no_matches();
        Resolution::Failed { llm }
    }

    pub fn matcher(&self) -> &DeterministicMatcher {
        &self.matcher
    }

    pub fn has_interpreter(&self) -> bool {
        self.interpreter.is_some()
    }
}
