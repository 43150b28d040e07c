//! Standalone intersection simulation
//!
//! Core tick-driven logic for a single four-approach signalized
//! intersection: signal phases, lane admission, car-following and
//! turning, and speed-violation detection. Everything here runs
//! headless; rendering and portal front-ends consume [`WorldSnapshot`]s
//! and the enforcement ledger instead of reaching into the world.

mod admission;
mod config;
mod lane;
mod signal;
mod types;
mod vehicle;
mod world;

// Re-export public types for external use
// These may not be used within this crate but are part of the public API
pub use config::{SimConfig, SignalConfig, SpawnConfig};
#[allow(unused_imports)]
pub use lane::{approach_table, ApproachLane, ExitLane, LaneIndex, TurnChoice};
pub use signal::{phase_at, AxisStates, LightState, SignalController};
pub use types::{
    Axis, Direction, Position, VehicleClass, VehicleId, ADMISSION_HEADWAY, MIN_FOLLOWING_GAP,
    PRUNE_MARGIN, SCENE_SIZE,
};
#[allow(unused_imports)]
pub use vehicle::{evaluate_move, MoveDecision, SimVehicle};
pub use world::{SimStats, SimWorld, VehicleView, WorldSnapshot};
