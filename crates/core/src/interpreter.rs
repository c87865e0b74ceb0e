//! Delegates command interpretation to an external language model.
//!
//! The model is asked for a bare ordinal such as `2번`; its reply is run
//! through the same [`OrdinalRule`] as the deterministic matcher and is
//! never trusted verbatim.

use crate::matcher::OrdinalRule;
use crate::registry::TargetRegistry;
use crate::types::{Command, SymbolicTarget};
use std::sync::Arc;
use voxtap_providers::{LLMProvider, Message};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interpretation {
    Target(SymbolicTarget),
    /// The call succeeded but the reply named no usable ordinal.
    Inconclusive,
    ProviderError(String),
}

pub struct LlmInterpreter {
    provider: Arc<dyn LLMProvider>,
    registry: Arc<TargetRegistry>,
    ordinal: OrdinalRule,
}

impl LlmInterpreter {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        registry: Arc<TargetRegistry>,
        ordinal: OrdinalRule,
    ) -> Self {
        Self {
            provider,
            registry,
            ordinal,
        }
    }

    /// One outbound call, no retries.
    pub async fn interpret(&self, command: &Command) -> Interpretation {
        let messages = self.build_messages(command);

        match self.provider.generate(&messages).await {
            Ok(response) => self.parse_reply(response.text()),
            Err(e) => Interpretation::ProviderError(e.to_string()),
        }
    }

    pub fn parse_reply(&self, reply: &str) -> Interpretation {
        match self.ordinal.extract(reply) {
            Some(id) => Interpretation::Target(SymbolicTarget::Id(id)),
            None => {
                tracing::debug!("No ordinal in provider reply: {:?}", reply);
                Interpretation::Inconclusive
            }
        }
    }

    pub fn build_messages(&self, command: &Command) -> Vec<Message> {
        let range = self.ordinal.range();
        let system = format!(
            "You map voice commands for a smartphone to numbered on-screen targets. \
             Reply with only the target number followed by '{suffix}', for example '{example}'. \
             Valid numbers are {min} to {max}. If no target fits, reply 'none'.",
            suffix = self.ordinal.suffix(),
            example = self.ordinal.format(*range.start()),
            min = range.start(),
            max = range.end(),
        );

        let mut user = format!("Command: {}\nTargets:\n", command.raw_text());
        for entry in self.registry.entries() {
            user.push_str(&format!("{}: {}\n", self.ordinal.format(entry.id), entry.label));
        }

        let mut user = Message::user(user);
        if let Some(image) = command.screen_context() {
            user = user.with_image(image);
        }

        vec![Message::system(system), user]
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }
}
