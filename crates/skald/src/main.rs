//! Skald CLI - extension manager
//!
//! Entry point for the `skald` command-line interface.

mod cli;
mod commands;
mod context;
mod notifier;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    let global = cli.global();
    match cli.command {
        Commands::List(args) => commands::list::run(args, &global).await,
        Commands::Search(args) => commands::search::run(args, &global).await,
        Commands::Info(args) => commands::info::run(args, &global).await,
        Commands::Install(args) => commands::install::run(args, &global).await,
        Commands::Uninstall(args) => commands::uninstall::run(args, &global).await,
        Commands::Enable(args) => commands::enablement::run(args, true, &global).await,
        Commands::Disable(args) => commands::enablement::run(args, false, &global).await,
        Commands::CheckUpdates => commands::update::check(&global).await,
        Commands::Update(args) => commands::update::run(args, &global).await,
        Commands::Deps(args) => commands::deps::run(args, &global).await,
        Commands::Readme(args) => commands::docs::readme(args, &global).await,
        Commands::Changelog(args) => commands::docs::changelog(args, &global).await,
        Commands::Recommend(args) => commands::recommend::run(args, &global).await,
        Commands::Open(args) => commands::open::run(args, &global).await,
        Commands::Log(args) => commands::log::run(args, &global),
    }
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            // Background sync chatter stays out of normal output
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}
