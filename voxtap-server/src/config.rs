use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use voxtap_core::registry::default_grid_entries;
use voxtap_core::{EngineSettings, OrdinalRule, TargetEntry, TargetRegistry};

pub const ENDPOINT_ENV: &str = "VOXTAP_LLM_ENDPOINT";
pub const MODEL_ENV: &str = "VOXTAP_LLM_MODEL";
pub const API_KEY_ENVS: [&str; 2] = ["VOXTAP_API_KEY", "OPENAI_API_KEY"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    /// No provider means commands are resolved by the deterministic matcher only.
    #[serde(default)]
    pub provider: Option<LLMProvider>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    #[serde(default = "default_grid_entries")]
    pub targets: Vec<TargetEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub body_limit_kb: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub provider_timeout_ms: u64,
    pub ordinal_suffix: String,
    pub ordinal_min: u32,
    pub ordinal_max: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LLMProvider {
    #[serde(rename = "openai")]
    OpenAI,
    #[serde(rename = "local")]
    Local { base_url: String },
}

impl LLMProvider {
    pub fn default_base_url(&self) -> String {
        match self {
            LLMProvider::OpenAI => "https://api.openai.com/v1".to_string(),
            LLMProvider::Local { base_url } => base_url.clone(),
        }
    }

    pub fn base_url(&self) -> String {
        std::env::var(ENDPOINT_ENV).unwrap_or_else(|_| self.default_base_url())
    }

    pub fn requires_api_key(&self) -> bool {
        matches!(self, LLMProvider::OpenAI)
    }

    pub fn api_key(&self) -> Option<String> {
        API_KEY_ENVS
            .iter()
            .find_map(|name| std::env::var(name).ok())
            .filter(|key| !key.trim().is_empty())
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            LLMProvider::OpenAI => "OpenAI",
            LLMProvider::Local { .. } => "Local",
        }
    }
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_history_limit() -> usize {
    5
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8000".to_string(),
            body_limit_kb: 10 * 1024,
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            provider_timeout_ms: 8000,
            ordinal_suffix: "번".to_string(),
            ordinal_min: 1,
            ordinal_max: 24,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            provider: None,
            model: default_model(),
            resolver: ResolverConfig::default(),
            history_limit: default_history_limit(),
            targets: default_grid_entries(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Load `path` if it exists, otherwise fall back to the built-in defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            tracing::info!("{} not found, using default configuration", path.display());
            Ok(Self::default())
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;

        if self.history_limit == 0 {
            bail!("history_limit must be at least 1");
        }
        if self.resolver.provider_timeout_ms == 0 {
            bail!("resolver.provider_timeout_ms must be positive");
        }
        if self.resolver.ordinal_suffix.is_empty() {
            bail!("resolver.ordinal_suffix must not be empty");
        }
        if self.resolver.ordinal_min == 0 || self.resolver.ordinal_min > self.resolver.ordinal_max {
            bail!(
                "Invalid ordinal range {}..={}",
                self.resolver.ordinal_min,
                self.resolver.ordinal_max
            );
        }
        if self.model.trim().is_empty() && self.provider.is_some() {
            bail!("model must be set when a provider is configured");
        }

        self.registry()?;
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.server
            .listen_addr
            .parse()
            .with_context(|| format!("Invalid listen address: {}", self.server.listen_addr))
    }

    pub fn model(&self) -> String {
        std::env::var(MODEL_ENV).unwrap_or_else(|_| self.model.clone())
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.resolver.provider_timeout_ms)
    }

    pub fn registry(&self) -> Result<TargetRegistry> {
        TargetRegistry::new(self.targets.clone()).context("Invalid target registry")
    }

    pub fn engine_settings(&self) -> Result<EngineSettings> {
        let ordinal = OrdinalRule::new(
            &self.resolver.ordinal_suffix,
            self.resolver.ordinal_min,
            self.resolver.ordinal_max,
        )
        .context("Invalid ordinal suffix")?;

        Ok(EngineSettings {
            ordinal,
            provider_timeout: self.provider_timeout(),
            history_window: self.history_limit,
        })
    }
}
