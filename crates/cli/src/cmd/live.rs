//! Debounce stdin lines in real time
//!
//! Each line is a call; deliveries are printed as they happen. At end of
//! input the pending line, if any, is delivered immediately.

use anyhow::Result;
use debounce_core::DebouncePolicy;
use debounce_runtime::Debounced;
use owo_colors::OwoColorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Instant;
use tracing::debug;

pub async fn run(policy: DebouncePolicy) -> Result<()> {
    let started = Instant::now();
    let debounced = Debounced::new(
        move |line: String| {
            println!(
                "{:>8}  {}",
                format!("{}ms", started.elapsed().as_millis()).yellow(),
                line
            );
        },
        policy,
    )?;

    eprintln!("{}", "Reading stdin (Ctrl-D to finish)".dimmed());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        debug!("Submitted line at {:?}", started.elapsed());
        debounced.call(line);
    }

    if debounced.is_pending() {
        debug!("End of input, flushing pending line");
        debounced.flush();
    }

    eprintln!();
    let stats = debounced.stats();
    eprintln!(
        "{} submitted, {} delivered, {} superseded",
        stats.submitted,
        stats.delivered(),
        stats.superseded
    );

    Ok(())
}
