//! Command intent resolution: turns a natural-language command into a
//! validated on-screen action.

pub mod engine;
pub mod error;
pub mod executor;
pub mod interpreter;
pub mod matcher;
pub mod metrics;
pub mod registry;
pub mod resolver;
pub mod types;

pub use engine::{CommandEngine, Dispatched, EngineSettings, Outcome};
pub use error::EngineError;
pub use executor::{ActionExecutor, SimulatedExecutor};
pub use interpreter::{Interpretation, LlmInterpreter};
pub use matcher::{DeterministicMatcher, MatchOutcome, OrdinalRule};
pub use metrics::{Metrics, MetricsSnapshot};
pub use registry::{RegistryError, TargetRegistry};
pub use resolver::{IntentResolver, LlmStage, Resolution, Strategy};
pub use types::*;
