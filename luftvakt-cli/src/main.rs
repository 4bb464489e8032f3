//! ## luftvakt-cli
//! **Operational interface**
//!
//! Loads the layered configuration, installs logging and runs the detection
//! core against a monitor-mode interface or a pcap file.

use clap::Parser;

mod commands;

use commands::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    commands::run_command(Cli::parse()).await
}
