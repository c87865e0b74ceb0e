//! HTTP front end for the command resolution engine.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod server;

pub use config::Config;
pub use server::{router, run_server, AppState};
