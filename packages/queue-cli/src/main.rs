mod args;
mod runner;

use anyhow::Result;
use clap::Parser;

use args::{Cli, Commands};
use runner::DemoRunner;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.is_debug() { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command() {
        Commands::Demo(demo_args) => DemoRunner::new(demo_args.clone()).run().await,
    }
}
