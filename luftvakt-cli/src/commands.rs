use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{error, info};

use luftvakt_config::LuftvaktConfig;
use luftvakt_engine::{run_live, run_replay, RunSummary, ShutdownSignal};
use luftvakt_telemetry::{EventLogger, MetricsRecorder};

#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    /// Configuration file; defaults to config/luftvakt.yaml plus LUFTVAKT_* overrides
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Print Prometheus metrics when the run ends
    #[arg(long, global = true)]
    pub print_metrics: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Monitor a live interface (pcap) until interrupted
    Run(RunArgs),
    /// Analyse a recorded pcap file
    Replay(ReplayArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Monitor-mode interface; overrides capture.interface
    #[arg(short, long)]
    pub interface: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ReplayArgs {
    #[arg(short, long)]
    pub file: PathBuf,
}

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => LuftvaktConfig::load_from_path(path),
        None => LuftvaktConfig::load(),
    }
    .context("Failed to load configuration")?;

    EventLogger::init(&config.telemetry.log_level, config.telemetry.json)
        .context("Failed to install log subscriber")?;
    let metrics = Arc::new(MetricsRecorder::new().context("Failed to register metrics")?);

    let shutdown = ShutdownSignal::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Interrupt received, stopping");
                    shutdown.trigger();
                }
                Err(e) => error!("Unable to listen for interrupt: {e}"),
            }
        }
    });

    let summary: RunSummary = match cli.command {
        Commands::Run(args) => {
            if let Some(interface) = args.interface {
                config.capture.interface = interface;
            }
            run_live(&config, metrics.clone(), shutdown).await?
        }
        Commands::Replay(args) => run_replay(&config, &args.file, metrics.clone(), shutdown)
            .await
            .with_context(|| format!("Replay of {} failed", args.file.display()))?,
    };

    info!(
        frames = summary.capture.frames,
        dropped = summary.analysis.frames_dropped,
        alerts = summary.analysis.alerts,
        "Run finished"
    );
    if cli.print_metrics {
        print!("{}", metrics.gather_metrics()?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_replay_with_global_config() {
        let cli = Cli::try_parse_from([
            "luftvakt",
            "replay",
            "--file",
            "capture.pcap",
            "--config",
            "lab.yaml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("lab.yaml")));
        assert!(matches!(cli.command, Commands::Replay(ReplayArgs { ref file }) if file == &PathBuf::from("capture.pcap")));
    }

    #[test]
    fn interface_is_optional() {
        let cli = Cli::try_parse_from(["luftvakt", "run"]).unwrap();
        assert!(matches!(cli.command, Commands::Run(RunArgs { interface: None })));
    }
}
