//! Debounce simulator - debounce-sim command

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use debounce_core::DebouncePolicy;
use std::path::PathBuf;
use std::time::Duration;

mod cmd;

/// Debounce simulator - replay call streams against a debounce policy
#[derive(Parser)]
#[command(name = "debounce-sim")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scenario file on virtual time
    Run {
        /// Scenario TOML file
        scenario: PathBuf,
        /// Print the timeline as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replay a periodic call stream on virtual time
    Periodic {
        #[command(flatten)]
        policy: PolicyArgs,
        /// Interval between calls (ms)
        #[arg(long, default_value = "40")]
        every_ms: u64,
        /// Stop calling and replaying at this time (ms)
        #[arg(long, default_value = "1000")]
        until_ms: u64,
        /// Print the timeline as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print an example scenario file
    Example,
    /// Debounce stdin lines in real time
    Live {
        #[command(flatten)]
        policy: PolicyArgs,
    },
}

#[derive(Args)]
struct PolicyArgs {
    /// Quiet period after the last call (ms)
    #[arg(long, default_value = "100")]
    wait_ms: u64,
    /// Upper bound on delay during a continuous burst (ms)
    #[arg(long)]
    max_wait_ms: Option<u64>,
    /// Deliver the first call of a burst immediately
    #[arg(long)]
    leading: bool,
    /// Deliver the last call once the burst settles
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    trailing: bool,
}

impl PolicyArgs {
    fn policy(&self) -> DebouncePolicy {
        let policy = DebouncePolicy::new(Duration::from_millis(self.wait_ms))
            .with_leading(self.leading)
            .with_trailing(self.trailing);

        match self.max_wait_ms {
            Some(max_wait_ms) => policy.with_max_wait(Duration::from_millis(max_wait_ms)),
            None => policy,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so --json output stays parseable
    let level = if cli.verbose { tracing::Level::DEBUG } else { tracing::Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run { scenario, json } => cmd::run::run(&scenario, json),
        Commands::Periodic { policy, every_ms, until_ms, json } => {
            cmd::periodic::run(policy.policy(), every_ms, until_ms, json)
        }
        Commands::Example => cmd::example::run(),
        Commands::Live { policy } => cmd::live::run(policy.policy()).await,
    }
}
