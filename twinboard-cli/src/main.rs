mod commands;
mod config;
mod logging;
mod paths;

use clap::Parser;

use crate::config::Cli;
use crate::config::Command;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    logging::init(cli.log_level, matches!(cli.command, Command::Serve(_)));

    if let Err(e) = commands::run(cli).await {
        log::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
