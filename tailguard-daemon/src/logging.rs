//! Logging initialization for tailguard-daemon.
//!
//! Builds one `fmt` layer from the `[general]` section of
//! `TailguardConfig`. `RUST_LOG` takes precedence over `log_level`.
//! Without `RUST_LOG`, the HTTP client stack is held at `warn` so a
//! `debug` daemon logs its own pipeline rather than connection chatter.

use anyhow::{Result, anyhow};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use tailguard_core::config::GeneralConfig;

/// Directives appended to the configured level.
const QUIET_DEPENDENCIES: &str = "hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize the global tracing subscriber.
///
/// Must be called exactly once, before any tracing macros are used.
///
/// * `"json"` - one JSON object per line, for log shippers
/// * `"pretty"` - multi-line human-readable output
pub fn init_tracing(config: &GeneralConfig) -> Result<()> {
    let filter = build_filter(&config.log_level)?;
    let layer = output_layer(&config.log_format, filter)?;

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| anyhow!("tailguard logging is already initialized: {}", e))
}

/// `RUST_LOG` if it parses, otherwise the configured level.
fn build_filter(log_level: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(format!("{},{}", log_level.trim(), QUIET_DEPENDENCIES))
        .map_err(|e| anyhow!("invalid log level '{}': {}", log_level, e))
}

fn output_layer(log_format: &str, filter: EnvFilter) -> Result<BoxedLayer> {
    match log_format {
        "json" => Ok(tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(false)
            .with_filter(filter)
            .boxed()),
        "pretty" => Ok(tracing_subscriber::fmt::layer()
            .pretty()
            .with_filter(filter)
            .boxed()),
        other => Err(anyhow!(
            "unsupported log format '{}' (tailguard writes 'json' or 'pretty')",
            other
        )),
    }
}
