//! CLI command implementations

pub mod example;
pub mod live;
pub mod periodic;
pub mod run;

use anyhow::Result;
use cli_lib::{Edge, Timeline};
use debounce_core::{DebouncePolicy, DebounceStats};
use owo_colors::OwoColorize;

/// Print a replayed timeline, as JSON or for humans
pub(crate) fn print_timeline(timeline: &Timeline, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(timeline)?);
        return Ok(());
    }

    print_policy(&timeline.policy);
    println!();

    if timeline.deliveries.is_empty() && timeline.pending.is_none() {
        println!("{}", "No deliveries".dimmed());
    } else {
        println!("{}", "Deliveries".bold());
        for delivery in &timeline.deliveries {
            let edge = match delivery.edge {
                Edge::Leading => "leading ".cyan().to_string(),
                Edge::Trailing => "trailing".green().to_string(),
            };
            println!("  {:>8}  {}  {}", format!("{}ms", delivery.at_ms).yellow(), edge, delivery.value);
        }

        // Replay stopped before the burst settled
        if let Some(pending) = &timeline.pending {
            println!(
                "  {:>8}  {}  {}",
                format!("{}ms", timeline.end_ms).yellow(),
                "pending ".magenta(),
                pending
            );
        }
    }

    println!();
    print_stats(&timeline.stats);
    println!("{}", format!("Replayed until {}ms", timeline.end_ms).dimmed());

    Ok(())
}

pub(crate) fn print_policy(policy: &DebouncePolicy) {
    println!("{}", "Policy".bold());
    println!("  {} = {}ms", "wait".cyan(), policy.wait_ms);
    match policy.max_wait_ms {
        Some(max_wait_ms) => println!("  {} = {}ms", "max_wait".cyan(), max_wait_ms),
        None => println!("  {} = {}", "max_wait".cyan(), "none".dimmed()),
    }
    println!("  {} = {}", "leading".cyan(), policy.leading);
    println!("  {} = {}", "trailing".cyan(), policy.trailing);
}

pub(crate) fn print_stats(stats: &DebounceStats) {
    println!("{}", "Stats".bold());
    println!(
        "  {} submitted, {} delivered {}",
        stats.submitted,
        stats.delivered(),
        format!("({} leading, {} trailing)", stats.leading, stats.trailing).dimmed()
    );
    println!(
        "  {} superseded, {} discarded, {} cancelled",
        stats.superseded, stats.discarded, stats.cancelled
    );
}
