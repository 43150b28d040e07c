//! Vehicle spawning and lane admission
//!
//! Each (approach, class) pair runs an independent interval timer. Fired
//! timers enqueue a vehicle onto the approach's FIFO queue; the world
//! drains each queue into the active set only while the approach is
//! under its capacity, which gives saturated lanes natural backpressure.

use std::collections::VecDeque;

use super::config::SimConfig;
use super::types::{Direction, VehicleClass};
use super::vehicle::SimVehicle;

fn class_index(class: VehicleClass) -> usize {
    match class {
        VehicleClass::Regular => 0,
        VehicleClass::Heavy => 1,
        VehicleClass::Emergency => 2,
    }
}

/// Spawn timers and the per-approach admission queues
#[derive(Debug, Default)]
pub struct AdmissionState {
    /// Accumulated seconds per (approach, class)
    timers: [[f32; 3]; 4],
    queues: [VecDeque<SimVehicle>; 4],
}

impl AdmissionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance all spawn timers by `delta_secs` and return the
    /// (approach, class) pairs whose timer elapsed. Emergency entries
    /// still have to pass their Bernoulli gate; the caller owns the RNG.
    pub fn advance(&mut self, delta_secs: f32, config: &SimConfig) -> Vec<(Direction, VehicleClass)> {
        let mut due = Vec::new();
        for (idx, direction) in Direction::APPROACHES.iter().copied().enumerate() {
            for class in VehicleClass::ALL {
                let interval = config.spawn.interval(class);
                if interval <= 0.0 {
                    continue;
                }
                let timer = &mut self.timers[idx][class_index(class)];
                *timer += delta_secs;
                while *timer >= interval {
                    *timer -= interval;
                    due.push((direction, class));
                }
            }
        }
        due
    }

    /// Push a spawned vehicle onto the tail of its approach queue
    pub fn enqueue(&mut self, direction: Direction, vehicle: SimVehicle) {
        if let Some(idx) = direction.approach_index() {
            self.queues[idx].push_back(vehicle);
        }
    }

    /// Pop the head of an approach queue, if any
    pub fn pop(&mut self, direction: Direction) -> Option<SimVehicle> {
        let idx = direction.approach_index()?;
        self.queues[idx].pop_front()
    }

    /// Number of vehicles waiting for admission on an approach
    pub fn queued(&self, direction: Direction) -> usize {
        match direction.approach_index() {
            Some(idx) => self.queues[idx].len(),
            None => 0,
        }
    }
}
