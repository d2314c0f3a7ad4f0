//! Replay a scenario file

use anyhow::Result;
use cli_lib::{simulate, Scenario};
use std::path::Path;
use tracing::debug;

pub fn run(path: &Path, json: bool) -> Result<()> {
    let scenario = Scenario::load(path)?;
    debug!(
        "Loaded scenario {} ({} submissions)",
        path.display(),
        scenario.submit.len()
    );

    let timeline = simulate(&scenario);
    super::print_timeline(&timeline, json)
}
