//! Replay a fixed-rate call stream

use anyhow::{bail, Result};
use cli_lib::{simulate, Scenario};
use debounce_core::DebouncePolicy;

pub fn run(policy: DebouncePolicy, every_ms: u64, until_ms: u64, json: bool) -> Result<()> {
    if every_ms == 0 {
        bail!("--every-ms must be greater than zero");
    }

    let scenario = Scenario::periodic(policy, every_ms, until_ms);
    let timeline = simulate(&scenario);
    super::print_timeline(&timeline, json)
}
