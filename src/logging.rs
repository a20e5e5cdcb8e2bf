use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the log filter.
pub const LOG_ENV: &str = "PORTWAIT_LOG";

/// Install the stderr subscriber. `PORTWAIT_LOG` wins over the default
/// level, which is `debug` for `--debug` and `warn` otherwise.
pub fn init(debug: bool) -> Result<()> {
    let default = if debug { "portwait=debug" } else { "portwait=warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(default))
        .context("invalid log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))
}
