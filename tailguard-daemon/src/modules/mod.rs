//! Capability wiring.
//!
//! The pipeline crate never reads configuration. Each submodule turns one
//! section of `TailguardConfig` into a trait object the pipeline consumes:
//!
//! ```text
//! [analyzer] --> analyzer::init --> Arc<dyn DynAnalyzer>
//! [alerts]   --> sinks::init    --> Vec<Arc<dyn DynAlertSink>>
//! ```

pub mod analyzer;
pub mod sinks;

use std::sync::Arc;

use anyhow::Result;

use tailguard_core::config::TailguardConfig;
use tailguard_core::pipeline::{DynAlertSink, DynAnalyzer};

/// The external capabilities injected into the log pipeline.
pub struct Capabilities {
    /// The single analyzer every event is handed to.
    pub analyzer: Arc<dyn DynAnalyzer>,
    /// Alert sinks in configuration order.
    pub sinks: Vec<Arc<dyn DynAlertSink>>,
}

impl Capabilities {
    /// Build every enabled capability from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any capability fails to initialize or if no
    /// alert sink ends up enabled.
    pub fn from_config(config: &TailguardConfig) -> Result<Self> {
        let analyzer = analyzer::init(config)?;
        let sinks = sinks::init(config)?;

        if sinks.is_empty() {
            return Err(anyhow::anyhow!("no alert sink is enabled"));
        }

        tracing::info!(
            analyzer = analyzer.name(),
            sinks = sinks.len(),
            "capabilities initialized"
        );

        Ok(Self { analyzer, sinks })
    }

    /// Names of the configured sinks, in dispatch order.
    pub fn sink_names(&self) -> Vec<String> {
        self.sinks.iter().map(|s| s.name().to_owned()).collect()
    }
}

impl std::fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capabilities")
            .field("analyzer", &self.analyzer.name())
            .field("sinks", &self.sink_names())
            .finish()
    }
}
