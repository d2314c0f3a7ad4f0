//! Tokio driver for debounce scheduling
//!
//! This crate provides:
//! - `Debounced`: a debounced callable whose timers run on Tokio
//! - `DebouncedMutation`: debounced async operations with per-caller results
//! - Tokio-backed clock and timer capabilities

pub mod debounced;
pub mod driver;
pub mod mutation;

// Re-exports
pub use debounce_core::{DebounceError, DebouncePolicy, DebounceStats, Result};
pub use debounced::{debounce, Debounced};
pub use driver::{TokioClock, TokioTimers};
pub use mutation::{DebouncedMutation, MutateOptions, MutationError, MutationResult};
