//! Alert sink initialization.
//!
//! Sinks are returned in a fixed order (log, then webhook) so dispatch
//! reports are stable across restarts.

use std::sync::Arc;

use anyhow::Result;

use tailguard_core::config::TailguardConfig;
use tailguard_core::pipeline::DynAlertSink;
use tailguard_log_pipeline::{LogSink, WebhookFormat, WebhookSink};

/// Initialize every enabled alert sink.
///
/// Returns an empty vector when nothing is enabled; the caller decides
/// whether that is fatal.
pub fn init(config: &TailguardConfig) -> Result<Vec<Arc<dyn DynAlertSink>>> {
    let alerts = &config.alerts;
    let mut sinks: Vec<Arc<dyn DynAlertSink>> = Vec::new();

    if alerts.log_enabled {
        tracing::debug!("log sink enabled");
        sinks.push(Arc::new(LogSink::new()));
    }

    if alerts.webhook.enabled {
        let format: WebhookFormat = alerts
            .webhook
            .format
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid webhook format: {}", e))?;

        let mut sink = WebhookSink::new(&alerts.webhook.url, format)
            .map_err(|e| anyhow::anyhow!("failed to build webhook sink: {}", e))?;
        if !alerts.webhook.username.is_empty() {
            sink = sink.with_username(&alerts.webhook.username);
        }

        tracing::debug!(format = %format, "webhook sink enabled");
        sinks.push(Arc::new(sink));
    } else {
        tracing::debug!("webhook sink disabled in configuration");
    }

    Ok(sinks)
}
