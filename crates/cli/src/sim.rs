//! Replay a scenario on virtual time

use crate::scenario::Scenario;
use debounce_core::{DebouncePolicy, DebounceStats, Debouncer, ManualClock, ManualTimers};
use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

/// Which edge produced a delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Leading,
    Trailing,
}

/// One execution of the debounced operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delivery {
    pub at_ms: u64,
    pub edge: Edge,
    pub value: String,
}

/// Outcome of a replay
#[derive(Debug, Clone, Serialize)]
pub struct Timeline {
    pub policy: DebouncePolicy,
    pub end_ms: u64,
    pub deliveries: Vec<Delivery>,
    /// Value still waiting for delivery when the replay stopped
    pub pending: Option<String>,
    pub stats: DebounceStats,
}

/// Replay `scenario` and collect every delivery
pub fn simulate(scenario: &Scenario) -> Timeline {
    let clock = ManualClock::new();
    let deliveries = Rc::new(RefCell::new(Vec::new()));
    // Deliveries made inside `submit` are leading, all others trailing
    let edge = Rc::new(Cell::new(Edge::Trailing));

    let op = {
        let clock = clock.clone();
        let deliveries = Rc::clone(&deliveries);
        let edge = Rc::clone(&edge);
        move |value: String| {
            deliveries.borrow_mut().push(Delivery {
                at_ms: as_ms(clock.elapsed()),
                edge: edge.get(),
                value,
            });
        }
    };

    let timers = ManualTimers::new(clock.clone());
    let mut debouncer = Debouncer::new(op, scenario.policy, timers, clock);

    for submission in &scenario.submit {
        debouncer.advance_to(Duration::from_millis(submission.at_ms));
        edge.set(Edge::Leading);
        debouncer.submit(submission.value.clone());
        edge.set(Edge::Trailing);
    }

    let end_ms = scenario.end_ms();
    debouncer.advance_to(Duration::from_millis(end_ms));

    // Only the most recent submission can still be pending
    let pending = debouncer
        .is_pending()
        .then(|| scenario.submit.last().map(|s| s.value.clone()))
        .flatten();
    let stats = debouncer.stats();
    drop(debouncer);

    Timeline {
        policy: scenario.policy,
        end_ms,
        deliveries: deliveries.take(),
        pending,
        stats,
    }
}

fn as_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
