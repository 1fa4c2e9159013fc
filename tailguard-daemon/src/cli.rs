//! CLI argument definitions for tailguard-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.
//! Flags override the configuration file and environment variables.

use std::path::PathBuf;

use clap::Parser;

use tailguard_core::config::TailguardConfig;

/// tailguard log watching daemon.
///
/// Tails an application log file, analyzes error and fatal events,
/// and fans alerts out to the configured channels.
#[derive(Parser, Debug)]
#[command(name = "tailguard-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to tailguard.toml configuration file.
    #[arg(short, long, default_value = "tailguard.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    #[arg(long)]
    pub log_format: Option<String>,

    /// Override the watched log file path.
    #[arg(short, long)]
    pub watch: Option<String>,

    /// Validate configuration file and exit without starting the daemon.
    #[arg(long)]
    pub validate: bool,

    /// Override PID file path (takes precedence over config file).
    #[arg(long)]
    pub pid_file: Option<String>,
}

impl DaemonCli {
    /// Apply command-line overrides on top of the loaded configuration.
    ///
    /// Call before `validate()` so overridden values are checked too.
    pub fn apply_overrides(&self, config: &mut TailguardConfig) {
        if let Some(level) = &self.log_level {
            config.general.log_level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.general.log_format = format.clone();
        }
        if let Some(path) = &self.watch {
            config.watcher.path = path.clone();
        }
        if let Some(pid_file) = &self.pid_file {
            config.general.pid_file = pid_file.clone();
        }
    }
}
