//! Submission scenarios for the simulator
//!
//! A scenario is a policy plus a list of timed submissions:
//!
//! ```toml
//! until_ms = 600
//!
//! [policy]
//! wait_ms = 100
//! max_wait_ms = 250
//!
//! [[submit]]
//! at_ms = 0
//! value = "a"
//! ```

use anyhow::{Context, Result};
use debounce_core::DebouncePolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One submission in a scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    /// Virtual time of the submission
    pub at_ms: u64,
    /// Argument handed to the debounced operation
    pub value: String,
}

/// Policy and submission timeline to replay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Debounce policy (defaults apply to missing fields)
    #[serde(default)]
    pub policy: DebouncePolicy,

    /// Submissions, in any order
    #[serde(default)]
    pub submit: Vec<Submission>,

    /// Time to run until (default: last submission + wait)
    #[serde(default)]
    pub until_ms: Option<u64>,
}

impl Scenario {
    /// Parse a scenario from TOML
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let mut scenario: Scenario = toml::from_str(source).context("Failed to parse scenario")?;
        scenario.submit.sort_by_key(|s| s.at_ms);
        Ok(scenario)
    }

    /// Load a scenario file
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario: {}", path.display()))?;
        Self::from_toml_str(&source).with_context(|| format!("Invalid scenario: {}", path.display()))
    }

    /// Submissions every `every_ms`, from 0 up to (excluding) `until_ms`
    ///
    /// Values are the submission times.
    pub fn periodic(policy: DebouncePolicy, every_ms: u64, until_ms: u64) -> Self {
        let step = every_ms.max(1);
        let submit = (0..until_ms)
            .step_by(step as usize)
            .map(|at_ms| Submission {
                at_ms,
                value: at_ms.to_string(),
            })
            .collect();

        Self {
            policy,
            submit,
            until_ms: Some(until_ms),
        }
    }

    /// Time the replay runs until
    pub fn end_ms(&self) -> u64 {
        let settle = self
            .submit
            .last()
            .map_or(0, |last| last.at_ms + self.policy.wait_ms);
        self.until_ms.unwrap_or(settle)
    }
}

/// Example scenario file contents
pub fn example_scenario() -> &'static str {
    r#"# Debounce scenario
# Runs on virtual time; all values are milliseconds.

# Stop replaying here (default: last submission + wait_ms)
until_ms = 600

[policy]
wait_ms = 100        # quiet period after the last submission
max_wait_ms = 250    # deliver at least this often during a burst
leading = false      # deliver the first submission of a burst immediately
trailing = true      # deliver the last submission once the burst settles

[[submit]]
at_ms = 0
value = "a"

[[submit]]
at_ms = 40
value = "b"

[[submit]]
at_ms = 80
value = "c"
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_scenario_parses() {
        let scenario = Scenario::from_toml_str(example_scenario()).unwrap();

        assert_eq!(scenario.policy.wait_ms, 100);
        assert_eq!(scenario.policy.max_wait_ms, Some(250));
        assert_eq!(scenario.submit.len(), 3);
        assert_eq!(scenario.end_ms(), 600);
    }

    #[test]
    fn test_submissions_are_sorted() {
        let scenario = Scenario::from_toml_str(
            "[[submit]]\nat_ms = 50\nvalue = \"late\"\n\n[[submit]]\nat_ms = 10\nvalue = \"early\"\n",
        )
        .unwrap();

        let values: Vec<&str> = scenario.submit.iter().map(|s| s.value.as_str()).collect();
        assert_eq!(values, vec!["early", "late"]);
        assert_eq!(scenario.policy, DebouncePolicy::default());
        assert_eq!(scenario.end_ms(), 550);
    }

    #[test]
    fn test_periodic_generates_stream() {
        let scenario = Scenario::periodic(DebouncePolicy::default(), 40, 130);

        let times: Vec<u64> = scenario.submit.iter().map(|s| s.at_ms).collect();
        assert_eq!(times, vec![0, 40, 80, 120]);
        assert_eq!(scenario.end_ms(), 130);
    }

    #[test]
    fn test_invalid_scenario_reports_context() {
        let err = Scenario::from_toml_str("[[submit]]\nat_ms = \"soon\"\n").unwrap_err();
        assert!(err.to_string().contains("Failed to parse scenario"));
    }
}
