//! Debounce scheduling primitives
//!
//! This crate provides:
//! - Debounce policy (wait, max wait, leading/trailing edges)
//! - The scheduler state machine (`Debouncer`)
//! - Clock and timer capabilities the scheduler is written against
//! - Virtual time for deterministic replay and tests

pub mod clock;
pub mod error;
pub mod policy;
pub mod scheduler;
pub mod timer;
pub mod virtual_time;

// Re-exports
pub use clock::{Clock, SystemClock};
pub use error::DebounceError;
pub use policy::DebouncePolicy;
pub use scheduler::{DebounceStats, Debouncer};
pub use timer::{Timer, TimerHandle, TimerSlot};
pub use virtual_time::{ManualClock, ManualTimers};

/// Result type for debounce operations
pub type Result<T> = std::result::Result<T, DebounceError>;
