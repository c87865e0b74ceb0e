use crate::error::EngineError;
use crate::executor::ActionExecutor;
use crate::interpreter::LlmInterpreter;
use crate::matcher::{self, DeterministicMatcher, OrdinalRule};
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::registry::TargetRegistry;
use crate::resolver::{IntentResolver, Resolution, DEFAULT_PROVIDER_TIMEOUT};
use crate::types::{ActionDescriptor, Command, ConversationRecord, ElementDescriptor};
use std::sync::Arc;
use std::time::Duration;
use voxtap_memory::store::DEFAULT_WINDOW;
use voxtap_memory::ConversationStore;
use voxtap_providers::LLMProvider;

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub ordinal: OrdinalRule,
    pub provider_timeout: Duration,
    pub history_window: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            ordinal: OrdinalRule::default(),
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
            history_window: DEFAULT_WINDOW,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Outcome {
    pub resolution: Resolution,
    pub history: Vec<ConversationRecord>,
}

impl Outcome {
    pub fn error(&self) -> Option<EngineError> {
        match &self.resolution {
            Resolution::Resolved { .. } => None,
            Resolution::Failed { llm } => Some(EngineError::NoMatch { llm: llm.clone() }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Dispatched {
    pub performed: bool,
    pub history: Vec<ConversationRecord>,
}

/// Entry point for the server: resolves commands and keeps the shared
/// conversation history.
pub struct CommandEngine {
    resolver: IntentResolver,
    store: ConversationStore<ConversationRecord>,
    executor: Arc<dyn ActionExecutor>,
    metrics: Arc<Metrics>,
}

impl CommandEngine {
    pub fn new(
        registry: TargetRegistry,
        provider: Option<Arc<dyn LLMProvider>>,
        executor: Arc<dyn ActionExecutor>,
        settings: EngineSettings,
    ) -> Self {
        let registry = Arc::new(registry);
        let metrics = Metrics::new();
        let interpreter = provider.map(|provider| {
            LlmInterpreter::new(provider, registry.clone(), settings.ordinal.clone())
        });
        let matcher = DeterministicMatcher::new(registry.clone(), settings.ordinal);
        let resolver = IntentResolver::new(
            registry,
            matcher,
            interpreter,
            settings.provider_timeout,
            metrics.clone(),
        );

        Self {
            resolver,
            store: ConversationStore::new(settings.history_window),
            executor,
            metrics,
        }
    }

    /// Resolve a command and record it. Nothing is recorded if the returned
    /// future is dropped before it completes.
    pub async fn handle(&self, command: Command) -> Outcome {
        self.metrics.inc_commands();

        let resolution = self.resolver.resolve(&command).await;
        match &resolution {
            Resolution::Resolved {
                action,
                target,
                strategy,
                ..
            } => tracing::info!(
                "Resolved '{}' to {:?} via {:?} ({})",
                command.raw_text(),
                action,
                strategy,
                target
            ),
            Resolution::Failed { llm } => tracing::info!(
                "No target for '{}' (interpretation: {:?})",
                command.raw_text(),
                llm
            ),
        }

        self.store.append(ConversationRecord::new(command, resolution.action()));

        Outcome {
            resolution,
            history: self.store.snapshot(),
        }
    }

    /// Hand an explicit action to the executor and record it under
    /// `description`.
    pub async fn dispatch(
        &self,
        description: &str,
        action: ActionDescriptor,
    ) -> Result<Dispatched, EngineError> {
        let command = Command::new(description)?;
        self.metrics.inc_actions_dispatched();

        let performed = self.executor.execute(&action).await;
        self.store.append(ConversationRecord::new(command, action));

        Ok(Dispatched {
            performed,
            history: self.store.snapshot(),
        })
    }

    /// Execute the action of a resolved outcome, if any.
    pub async fn perform(&self, outcome: &Outcome) -> bool {
        match &outcome.resolution {
            Resolution::Resolved { action, .. } => self.executor.execute(action).await,
            Resolution::Failed { .. } => false,
        }
    }

    pub fn find_element(
        &self,
        text: &str,
        elements: &[ElementDescriptor],
    ) -> Option<ElementDescriptor> {
        matcher::find_element(text, elements).map(|index| elements[index].clone())
    }

    pub fn history(&self) -> Vec<ConversationRecord> {
        self.store.snapshot()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn has_interpreter(&self) -> bool {
        self.resolver.has_interpreter()
    }
}
