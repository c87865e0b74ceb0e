use crate::resolver::LlmStage;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Neither strategy produced a registered target. `llm` records why the
    /// interpretation stage did not help; it is for logs, not for callers.
    #[error("No target matched the command")]
    NoMatch { llm: LlmStage },
}

impl EngineError {
    /// Stable machine-readable code used on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::InvalidInput(_) => "invalid_input",
            EngineError::NoMatch { .. } => "no_match",
        }
    }
}
