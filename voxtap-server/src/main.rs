use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use voxtap_server::{bootstrap, router, run_server, Config};

/// Voice command resolution server
#[derive(Parser, Debug)]
#[command(name = "voxtap")]
#[command(about = "Resolve spoken commands into on-screen actions")]
struct Args {
    /// Path to the YAML configuration file
    #[arg(long, short = 'c', default_value = "voxtap.yaml")]
    config: PathBuf,

    /// Override the listen address, e.g. 0.0.0.0:8000
    #[arg(long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let mut config = Config::load_or_default(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    if let Some(listen) = args.listen {
        config.server.listen_addr = listen;
    }

    let state = bootstrap::build_state(&config).context("Invalid configuration")?;
    tracing::info!(
        "Loaded {} targets, provider {}",
        config.targets.len(),
        if state.engine.has_interpreter() { "enabled" } else { "disabled" }
    );

    let app = router(state, config.server.body_limit_kb);
    run_server(config.listen_addr()?, app).await
}
