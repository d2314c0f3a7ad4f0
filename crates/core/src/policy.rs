//! Debounce policy configuration

use crate::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default quiet period (500ms)
pub const DEFAULT_WAIT_MS: u64 = 500;

/// Debounce policy
///
/// Controls when a burst of submissions is delivered to the target
/// operation:
/// - `wait_ms`: quiet period after the last submission (default: 500ms)
/// - `max_wait_ms`: ceiling on the delay from burst start to a delivery
/// - `leading`: deliver the first submission of a burst immediately
/// - `trailing`: deliver the last submission when the burst goes quiet
///
/// With both edges disabled nothing is ever delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebouncePolicy {
    /// Quiet period in milliseconds (default: 500)
    #[serde(default = "default_wait_ms")]
    pub wait_ms: u64,

    /// Maximum delay before a forced delivery (default: unset)
    #[serde(default)]
    pub max_wait_ms: Option<u64>,

    /// Fire on the leading edge (default: false)
    #[serde(default)]
    pub leading: bool,

    /// Fire on the trailing edge (default: true)
    #[serde(default = "default_true")]
    pub trailing: bool,
}

impl Default for DebouncePolicy {
    fn default() -> Self {
        Self {
            wait_ms: DEFAULT_WAIT_MS,
            max_wait_ms: None,
            leading: false,
            trailing: true,
        }
    }
}

impl DebouncePolicy {
    /// Trailing-edge policy with the given quiet period
    pub fn new(wait: Duration) -> Self {
        Self::default().with_wait(wait)
    }

    /// Parse a policy from TOML, filling unspecified fields with defaults
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Set the quiet period
    pub fn with_wait(mut self, wait: Duration) -> Self {
        self.wait_ms = duration_to_ms(wait);
        self
    }

    /// Set the max-wait ceiling
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait_ms = Some(duration_to_ms(max_wait));
        self
    }

    /// Enable or disable leading-edge delivery
    pub fn with_leading(mut self, leading: bool) -> Self {
        self.leading = leading;
        self
    }

    /// Enable or disable trailing-edge delivery
    pub fn with_trailing(mut self, trailing: bool) -> Self {
        self.trailing = trailing;
        self
    }

    /// Quiet period
    pub fn wait(&self) -> Duration {
        Duration::from_millis(self.wait_ms)
    }

    /// Max-wait ceiling, if configured
    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait_ms.map(Duration::from_millis)
    }

    /// Whether this policy can ever deliver a call
    pub fn fires(&self) -> bool {
        self.leading || self.trailing
    }
}

fn duration_to_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn default_wait_ms() -> u64 {
    DEFAULT_WAIT_MS
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_trailing_500ms() {
        let policy = DebouncePolicy::default();

        assert_eq!(policy.wait(), Duration::from_millis(500));
        assert_eq!(policy.max_wait(), None);
        assert!(!policy.leading);
        assert!(policy.trailing);
        assert!(policy.fires());
    }

    #[test]
    fn test_builder_sets_all_fields() {
        let policy = DebouncePolicy::new(Duration::from_millis(100))
            .with_max_wait(Duration::from_millis(250))
            .with_leading(true)
            .with_trailing(false);

        assert_eq!(policy.wait_ms, 100);
        assert_eq!(policy.max_wait(), Some(Duration::from_millis(250)));
        assert!(policy.leading);
        assert!(!policy.trailing);
    }

    #[test]
    fn test_no_edges_never_fires() {
        let policy = DebouncePolicy::default().with_trailing(false);
        assert!(!policy.fires());
    }

    #[test]
    fn test_parse_partial_toml_uses_defaults() {
        let policy = DebouncePolicy::from_toml_str("max_wait_ms = 1000\nleading = true\n").unwrap();

        assert_eq!(policy.wait_ms, DEFAULT_WAIT_MS);
        assert_eq!(policy.max_wait_ms, Some(1000));
        assert!(policy.leading);
        assert!(policy.trailing);
    }

    #[test]
    fn test_parse_empty_toml_is_default() {
        let policy = DebouncePolicy::from_toml_str("").unwrap();
        assert_eq!(policy, DebouncePolicy::default());
    }

    #[test]
    fn test_parse_rejects_negative_wait() {
        let err = DebouncePolicy::from_toml_str("wait_ms = -5\n").unwrap_err();
        assert!(err.to_string().contains("invalid debounce policy"));
    }

    #[test]
    fn test_toml_roundtrip_keeps_max_wait() {
        let policy = DebouncePolicy::new(Duration::from_millis(40))
            .with_max_wait(Duration::from_millis(90));

        let text = toml::to_string(&policy).unwrap();
        assert_eq!(DebouncePolicy::from_toml_str(&text).unwrap(), policy);
    }
}
