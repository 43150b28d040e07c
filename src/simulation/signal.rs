//! Traffic-light phase scheduling
//!
//! The two lights of an axis pair are always in lockstep, so the
//! scheduler tracks one state per axis. Both states are a pure function
//! of elapsed simulation time; there are no per-light timers.

use log::debug;

use super::config::SignalConfig;
use super::types::Axis;

/// State of one axis pair of lights
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightState {
    Red,
    Yellow,
    Green,
}

/// The state of both axis pairs at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisStates {
    pub north_south: LightState,
    pub east_west: LightState,
}

impl AxisStates {
    pub fn get(&self, axis: Axis) -> LightState {
        match axis {
            Axis::NorthSouth => self.north_south,
            Axis::EastWest => self.east_west,
        }
    }
}

/// Compute both axis states for a given elapsed simulation time.
///
/// The cycle wraps modulo `cycle_secs` and splits into six consecutive
/// intervals: NS green, NS yellow, clearance, then the mirrored EW
/// sequence in the second half. The opposing axis stays red throughout
/// the other axis's half.
pub fn phase_at(config: &SignalConfig, elapsed: f32) -> AxisStates {
    let half = config.cycle_secs / 2.0;
    let green = config.green_secs();
    let t = elapsed.rem_euclid(config.cycle_secs);

    let active = |u: f32| {
        if u < green {
            LightState::Green
        } else if u < green + config.yellow_secs {
            LightState::Yellow
        } else {
            LightState::Red
        }
    };

    if t < half {
        AxisStates {
            north_south: active(t),
            east_west: LightState::Red,
        }
    } else {
        AxisStates {
            north_south: LightState::Red,
            east_west: active(t - half),
        }
    }
}

/// Owns the current light states and applies recomputed phases.
pub struct SignalController {
    config: SignalConfig,
    states: AxisStates,
}

impl SignalController {
    pub fn new(config: SignalConfig) -> Self {
        let states = phase_at(&config, 0.0);
        Self { config, states }
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    pub fn state(&self, axis: Axis) -> LightState {
        self.states.get(axis)
    }

    pub fn states(&self) -> AxisStates {
        self.states
    }

    /// Recompute both axis states for `elapsed` and apply them.
    ///
    /// Returns only the axes whose state actually changed; re-applying
    /// the same interval returns nothing, so each returned entry can be
    /// treated as an edge event by downstream consumers.
    pub fn update(&mut self, elapsed: f32) -> Vec<(Axis, LightState)> {
        let next = phase_at(&self.config, elapsed);
        let mut changed = Vec::new();

        if next.north_south != self.states.north_south {
            debug!("signal: north-south -> {:?}", next.north_south);
            changed.push((Axis::NorthSouth, next.north_south));
        }
        if next.east_west != self.states.east_west {
            debug!("signal: east-west -> {:?}", next.east_west);
            changed.push((Axis::EastWest, next.east_west));
        }

        self.states = next;
        changed
    }

    /// Seconds left until the current cycle wraps
    pub fn remaining_in_cycle(&self, elapsed: f32) -> f32 {
        self.config.cycle_secs - elapsed.rem_euclid(self.config.cycle_secs)
    }
}
