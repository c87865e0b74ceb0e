use crate::config::Config;
use crate::server::AppState;
use anyhow::{bail, Result};
use std::sync::Arc;
use voxtap_core::{CommandEngine, SimulatedExecutor};
use voxtap_providers::{LLMProvider, OpenAICompatibleProvider};

/// Build the configured provider, if any.
pub fn build_provider(config: &Config) -> Result<Option<Arc<dyn LLMProvider>>> {
    let Some(provider) = &config.provider else {
        return Ok(None);
    };

    let api_key = provider.api_key();
    if provider.requires_api_key() && api_key.is_none() {
        bail!(
            "Provider '{}' requires an API key in VOXTAP_API_KEY or OPENAI_API_KEY",
            provider.display_name()
        );
    }

    let base_url = provider.base_url();
    let model = config.model();
    tracing::info!(
        "Using {} provider at {} (model {})",
        provider.display_name(),
        base_url,
        model
    );

    Ok(Some(Arc::new(OpenAICompatibleProvider::new(
        base_url, api_key, model,
    ))))
}

pub fn build_state(config: &Config) -> Result<AppState> {
    config.validate()?;

    let provider = build_provider(config)?;
    if provider.is_none() {
        tracing::info!("No provider configured, resolving with the deterministic matcher only");
    }

    let engine = CommandEngine::new(
        config.registry()?,
        provider.clone(),
        Arc::new(SimulatedExecutor),
        config.engine_settings()?,
    );

    Ok(AppState::new(
        Arc::new(engine),
        provider,
        config.provider_timeout(),
    ))
}
