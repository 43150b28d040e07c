//! Tunable simulation parameters
//!
//! Everything direction- or class-specific that the spawners, the signal
//! scheduler and the detector consume lives here, so a scenario can be
//! described as one `SimConfig` value.

use super::types::VehicleClass;

/// Signal timing shared by both axis pairs
#[derive(Debug, Clone, Copy)]
pub struct SignalConfig {
    /// Full cycle length in seconds; the cycle wraps modulo this value
    pub cycle_secs: f32,
    /// Yellow phase length in seconds
    pub yellow_secs: f32,
}

impl SignalConfig {
    /// Green window per axis: half the cycle minus the yellow window
    pub fn green_secs(&self) -> f32 {
        self.cycle_secs / 2.0 - self.yellow_secs
    }
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            cycle_secs: 20.0,
            yellow_secs: 3.0,
        }
    }
}

/// Spawn cadence per class plus the emergency gating probabilities
#[derive(Debug, Clone)]
pub struct SpawnConfig {
    pub regular_interval_secs: f32,
    pub heavy_interval_secs: f32,
    pub emergency_interval_secs: f32,
    /// Bernoulli probability that an elapsed emergency timer actually
    /// produces a vehicle, per approach (N, S, E, W)
    pub emergency_probability: [f64; 4],
}

impl SpawnConfig {
    pub fn interval(&self, class: VehicleClass) -> f32 {
        match class {
            VehicleClass::Regular => self.regular_interval_secs,
            VehicleClass::Heavy => self.heavy_interval_secs,
            VehicleClass::Emergency => self.emergency_interval_secs,
        }
    }
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            regular_interval_secs: 3.0,
            heavy_interval_secs: 7.0,
            emergency_interval_secs: 11.0,
            emergency_probability: [0.3, 0.3, 0.2, 0.2],
        }
    }
}

/// Top-level simulation configuration
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub signal: SignalConfig,
    pub spawn: SpawnConfig,
    /// Active (un-turned) vehicle capacity per approach (N, S, E, W)
    pub capacities: [usize; 4],
    /// Seconds between reported-speed increments
    pub speed_step_interval_secs: f32,
    /// Amount each increment adds to a vehicle's reported speed
    pub speed_step: u32,
    /// Sim-time window `[start, end)` during which turning traffic is
    /// forced onto the primary outbound lane (models a lane closure)
    pub closure_window: Option<(f32, f32)>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            signal: SignalConfig::default(),
            spawn: SpawnConfig::default(),
            capacities: [6, 6, 5, 5],
            speed_step_interval_secs: 1.0,
            speed_step: 5,
            closure_window: None,
        }
    }
}
