//! Print an example scenario file

use anyhow::Result;
use cli_lib::example_scenario;

pub fn run() -> Result<()> {
    print!("{}", example_scenario());
    Ok(())
}
