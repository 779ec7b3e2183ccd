// Tracing subscriber setup
use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "stagehand_core=info,stagehand_infra_system=info,stagehand_cli=info";

/// Install the global subscriber
///
/// `STAGEHAND_LOG_FORMAT` picks `json`, `pretty` or the default compact output;
/// `RUST_LOG` overrides the filter.
pub fn init() -> Result<()> {
    let log_format =
        std::env::var("STAGEHAND_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .context("Failed to create env filter")?;

    match log_format.as_str() {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json())
            .try_init(),
        "pretty" => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty())
            .try_init(),
        _ => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().compact().with_target(false))
            .try_init(),
    }
    .context("Failed to install tracing subscriber")
}
