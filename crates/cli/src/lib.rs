//! Library side of the `debounce-sim` CLI
//!
//! Scenario loading and virtual-time replay, shared by the binary and its tests.

pub mod scenario;
pub mod sim;

pub use scenario::{example_scenario, Scenario, Submission};
pub use sim::{simulate, Delivery, Edge, Timeline};
