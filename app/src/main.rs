//! Quotebox command line
//!
//! A thin presentation layer: every command goes through one `App` instance.

mod cli;
mod commands;

use clap::Parser;

use cli::Cli;
use quotebox_core::{App, Config};

#[tokio::main]
async fn main() {
    quotebox_core::init_logging();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let data_dir = cli.data_dir.clone().unwrap_or_else(Config::data_dir);
    let config = Config::load(&data_dir)?;
    let app = App::new(config)?;
    app.initialize();

    commands::dispatch(&app, cli.command).await
}
