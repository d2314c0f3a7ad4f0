//! Error types for debounce configuration and drivers

use thiserror::Error;

/// Errors surfaced while configuring or driving a debouncer.
///
/// The scheduler itself never fails: submissions, expiries and
/// cancellation are infallible. Errors only come from parsing a
/// policy or from a driver that cannot find a runtime to host its timers.
#[derive(Debug, Error)]
pub enum DebounceError {
    /// Policy could not be parsed
    #[error("invalid debounce policy: {0}")]
    InvalidConfig(#[from] toml::de::Error),

    /// A timer driver needs an async runtime but none is running
    #[error("no async runtime available to drive debounce timers")]
    NoRuntime,
}
