//! Violation records and the producer/consumer handoff queue

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

use crate::simulation::{Direction, VehicleClass, VehicleId};

/// A speeding excursion detected by the simulation loop
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub vehicle_id: VehicleId,
    pub class: VehicleClass,
    pub reported_speed: u32,
    pub direction: Direction,
}

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<Violation>,
    shutdown: bool,
}

/// FIFO handoff between the simulation loop and the ticket worker.
///
/// Producers push under the lock and signal the worker; they never wait.
/// The worker parks on the condition until an entry arrives or shutdown
/// is requested, and keeps draining after a shutdown request until the
/// queue is empty.
#[derive(Debug, Default)]
pub struct ViolationQueue {
    state: Mutex<QueueState>,
    available: Condvar,
}

impl ViolationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// O(1) push; wakes the worker
    pub fn push(&self, violation: Violation) {
        let mut state = self.state.lock().unwrap();
        state.pending.push_back(violation);
        self.available.notify_one();
    }

    /// Block until a violation is available.
    ///
    /// Returns `None` only once shutdown has been requested and the
    /// queue is empty, so a draining consumer never drops entries.
    pub fn recv(&self) -> Option<Violation> {
        let mut state = self.state.lock().unwrap();
        loop {
            if let Some(violation) = state.pending.pop_front() {
                return Some(violation);
            }
            if state.shutdown {
                return None;
            }
            state = self.available.wait(state).unwrap();
        }
    }

    /// Ask the worker to finish: it drains whatever is queued, then exits
    pub fn request_shutdown(&self) {
        let mut state = self.state.lock().unwrap();
        state.shutdown = true;
        self.available.notify_all();
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
