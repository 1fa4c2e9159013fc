//! tailguard-daemon binary entry point.

use anyhow::Result;
use clap::Parser;

use tailguard_core::config::TailguardConfig;
use tailguard_daemon::cli::DaemonCli;
use tailguard_daemon::logging::init_tracing;
use tailguard_daemon::orchestrator::Orchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DaemonCli::parse();

    // file < env < CLI
    let mut config = TailguardConfig::from_file(&cli.config)
        .await
        .map_err(|e| anyhow::anyhow!("failed to load {}: {}", cli.config.display(), e))?;
    config.apply_env_overrides();
    cli.apply_overrides(&mut config);
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {}", e))?;

    if cli.validate {
        println!("configuration OK: {}", cli.config.display());
        return Ok(());
    }

    init_tracing(&config.general)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "tailguard-daemon starting"
    );

    let orchestrator = Orchestrator::build_from_config(config)?;
    orchestrator.run().await?;

    Ok(())
}
