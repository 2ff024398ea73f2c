//! HPT CLI - Command line tool for regional apartment price trends.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "hpt-cli",
    version,
    about = "Regional apartment price trends and forecasts"
)]
struct Cli {
    #[command(subcommand)]
    command: hpt_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    log::debug!("starting {}", env!("CARGO_PKG_NAME"));
    hpt_cmd::run(cli.command).await
}
