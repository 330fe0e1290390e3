mod aws;
mod bundle;
mod commands;
mod config;
mod error;
mod logger;
mod progress;
mod runner;
use crate::commands::Commands;
use crate::runner::{Runnable, Runner};
use clap::Parser;

#[derive(Parser)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Derive a runner from the command and run it
///
/// Every failure ends up here, printed in one place, with a non-zero exit
async fn run(command: impl Runnable) {
    let run = command.runner().run().await;

    if let Err(error) = run {
        eprintln!("\n{} {error}", console::style("Error").red().bold());
        std::process::exit(1);
    }
}

#[tokio::main]
async fn main() {
    color_eyre::install().ok();
    logger::init();

    // Match all commands here, in one place
    match Cli::parse().command {
        Commands::Deploy(cmd) => run(cmd).await,
        Commands::Package(cmd) => run(cmd).await,
        Commands::Invoke(cmd) => run(cmd).await,
        Commands::Status(cmd) => run(cmd).await,
    }
}
