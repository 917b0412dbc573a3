//! Tracing setup

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Install the global subscriber. `RUST_LOG` takes precedence over
/// `default_filter`. Fails if a subscriber is already installed.
pub fn init_tracing(default_filter: &str) -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(env_filter(default_filter)?)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    Ok(())
}

/// Same as [`init_tracing`], emitting JSON lines when `config.json` is set
pub fn init_from_config(config: &LoggingConfig) -> anyhow::Result<()> {
    if !config.json {
        return init_tracing(&config.filter);
    }

    tracing_subscriber::registry()
        .with(env_filter(&config.filter)?)
        .with(tracing_subscriber::fmt::layer().json())
        .try_init()?;

    Ok(())
}

fn env_filter(default_filter: &str) -> anyhow::Result<EnvFilter> {
    Ok(EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_filter))?)
}
