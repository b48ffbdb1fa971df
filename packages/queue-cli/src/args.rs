//! CLI argument parsing, via `clap`'s derive API.

use std::time::Duration;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Spawn a pool with a fixed number of demo workers, drive a batch
    /// of synthetic calls and casts through it, and print the final
    /// counts.
    Demo(DemoArgs),
}

#[derive(Args, Clone)]
pub struct DemoArgs {
    /// Name the pool is registered under.
    #[arg(short, long, default_value = "demo")]
    pool_name: String,

    /// Number of demo workers to register before submitting traffic.
    #[arg(short, long, default_value_t = 4)]
    workers: usize,

    /// Number of synchronous calls to submit.
    #[arg(long, default_value_t = 20)]
    calls: usize,

    /// Number of fire-and-forget casts to submit.
    #[arg(long, default_value_t = 10)]
    casts: usize,

    /// Per-call timeout in milliseconds.
    #[arg(long, default_value_t = 1000)]
    timeout_ms: u64,
}

impl DemoArgs {
    pub fn pool_name(&self) -> &str {
        &self.pool_name
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn calls(&self) -> usize {
        self.calls
    }

    pub fn casts(&self) -> usize {
        self.casts
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Cli {
    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn command(&self) -> &Commands {
        &self.command
    }
}
