//! Daemon assembly and lifecycle management.
//!
//! The [`Orchestrator`] validates configuration, builds the capabilities
//! and the log pipeline, and runs it until a shutdown signal arrives or
//! the watched file becomes unreadable.
//!
//! # Lifecycle
//!
//! 1. Write the PID file (if configured)
//! 2. Open the tailer at the end of the watched file
//! 3. Run the pipeline; SIGTERM/SIGINT cancel the shared token
//! 4. Remove the PID file, whatever the outcome

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use tailguard_core::config::TailguardConfig;
use tailguard_log_pipeline::{
    CompositeDispatcher, LogPipeline, LogTailer, PipelineSummary, TailerConfig,
};

use crate::metrics_server;
use crate::modules::Capabilities;
use crate::pid_file::{remove_pid_file, write_pid_file};

/// The main daemon orchestrator.
pub struct Orchestrator {
    /// Validated configuration.
    config: TailguardConfig,
    /// Analyzer and sinks built from configuration.
    capabilities: Capabilities,
    /// Shared shutdown token, observed by every pipeline stage.
    cancel: CancellationToken,
    start_time: Instant,
}

impl Orchestrator {
    /// Load configuration from `config_path` and build the orchestrator.
    ///
    /// Environment overrides are applied before validation.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated,
    /// or if any capability fails to initialize.
    pub async fn build(config_path: &Path) -> Result<Self> {
        let config = TailguardConfig::load(config_path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?;
        Self::build_from_config(config)
    }

    /// Build from an already-loaded configuration.
    pub fn build_from_config(config: TailguardConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

        if config.metrics.enabled {
            metrics_server::install_metrics_recorder(&config.metrics)?;
        }

        let capabilities = Capabilities::from_config(&config)?;

        Ok(Self {
            config,
            capabilities,
            cancel: CancellationToken::new(),
            start_time: Instant::now(),
        })
    }

    /// A clone of the shutdown token. Cancelling it stops [`run`](Self::run).
    pub fn shutdown_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// The validated configuration.
    pub fn config(&self) -> &TailguardConfig {
        &self.config
    }

    /// Names of the configured alert sinks.
    pub fn sink_names(&self) -> Vec<String> {
        self.capabilities.sink_names()
    }

    /// Run until shutdown.
    ///
    /// # Shutdown triggers
    ///
    /// - `SIGTERM` or `SIGINT` (Ctrl+C on non-unix)
    /// - Cancelling [`shutdown_token`](Self::shutdown_token)
    ///
    /// # Errors
    ///
    /// Returns an error if the PID file cannot be written, the tailer
    /// cannot be opened, or the watched file is lost while running.
    pub async fn run(self) -> Result<PipelineSummary> {
        let pid_path = self.pid_path();
        if let Some(path) = &pid_path {
            write_pid_file(path)?;
        }

        let outcome = self.run_pipeline().await;

        if let Some(path) = &pid_path {
            remove_pid_file(path);
        }

        outcome
    }

    async fn run_pipeline(self) -> Result<PipelineSummary> {
        let pipeline = self.build_pipeline().await?;

        let signal_task = spawn_signal_listener(self.cancel.clone());

        tracing::info!(
            watch = %self.config.watcher.path,
            sinks = ?self.capabilities.sink_names(),
            "tailguard running"
        );
        let result = pipeline.run().await;

        // stop the signal listener if the pipeline ended on its own
        self.cancel.cancel();
        let _ = signal_task.await;

        let uptime_secs = self.start_time.elapsed().as_secs();
        match result {
            Ok(summary) => {
                tracing::info!(summary = %summary, uptime_secs, "tailguard stopped");
                Ok(summary)
            }
            Err(e) => {
                tracing::error!(error = %e, uptime_secs, "tailguard stopped on error");
                Err(anyhow::anyhow!("log pipeline failed: {}", e))
            }
        }
    }

    async fn build_pipeline(&self) -> Result<LogPipeline> {
        let tailer = LogTailer::open(
            TailerConfig::from_core(&self.config.watcher),
            self.cancel.clone(),
        )
        .await
        .map_err(|e| anyhow::anyhow!("failed to open watched file: {}", e))?;

        let dispatcher = CompositeDispatcher::new(self.capabilities.sinks.clone())
            .with_sink_timeout(self.config.alerts.sink_timeout())
            .with_cancellation(self.cancel.clone());

        LogPipeline::builder()
            .tailer(tailer)
            .analyzer(self.capabilities.analyzer.clone())
            .dispatcher(dispatcher)
            .cancellation(self.cancel.clone())
            .analyzer_timeout(self.config.analyzer.timeout())
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build log pipeline: {}", e))
    }

    fn pid_path(&self) -> Option<PathBuf> {
        let pid_file = self.config.general.pid_file.trim();
        (!pid_file.is_empty()).then(|| PathBuf::from(pid_file))
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("watch", &self.config.watcher.path)
            .field("capabilities", &self.capabilities)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

/// Cancel `cancel` when a shutdown signal arrives.
///
/// The task also exits once the token is cancelled elsewhere.
fn spawn_signal_listener(cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            () = cancel.cancelled() => {}
            signal = wait_for_shutdown_signal() => match signal {
                Ok(name) => {
                    tracing::info!(signal = name, "shutdown signal received");
                    cancel.cancel();
                }
                Err(e) => {
                    tracing::error!(error = %e, "signal handler unavailable, relying on token");
                    cancel.cancelled().await;
                }
            },
        }
    })
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
///
/// Returns the name of the signal that triggered the shutdown.
#[cfg(unix)]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("failed to install Ctrl+C handler: {}", e))?;
    Ok("CTRL_C")
}
