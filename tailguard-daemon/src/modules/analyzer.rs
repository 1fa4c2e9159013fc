//! Analyzer initialization.
//!
//! Maps `[analyzer] kind` to a concrete implementation:
//!
//! * `"rules"` - [`SeverityAnalyzer`] with the configured `min_severity`
//! * `"http"` - [`HttpAnalyzer`] posting events to `endpoint`

use std::sync::Arc;

use anyhow::Result;

use tailguard_core::config::TailguardConfig;
use tailguard_core::pipeline::DynAnalyzer;
use tailguard_log_pipeline::{HttpAnalyzer, SeverityAnalyzer};

/// Initialize the configured analyzer.
///
/// # Errors
///
/// Returns an error for an unknown kind or when the HTTP client cannot
/// be built.
pub fn init(config: &TailguardConfig) -> Result<Arc<dyn DynAnalyzer>> {
    let section = &config.analyzer;

    match section.kind.as_str() {
        "rules" => {
            let min_severity = section.min_severity();
            tracing::info!(min_severity = %min_severity, "using rule-based analyzer");
            Ok(Arc::new(SeverityAnalyzer::new(min_severity)))
        }
        "http" => {
            let mut analyzer = HttpAnalyzer::new(&section.endpoint)
                .map_err(|e| anyhow::anyhow!("failed to build http analyzer: {}", e))?;
            if !section.api_key.is_empty() {
                analyzer = analyzer.with_api_key(&section.api_key);
            }
            tracing::info!(endpoint = %section.endpoint, "using http analyzer");
            Ok(Arc::new(analyzer))
        }
        other => Err(anyhow::anyhow!("unknown analyzer kind '{}'", other)),
    }
}
