//! Vehicle state and per-tick movement decisions

use super::lane::{ApproachLane, LaneIndex};
use super::signal::{LightState, SignalController};
use super::types::{Direction, Position, VehicleClass, VehicleId, MIN_FOLLOWING_GAP};

/// A vehicle in the active set
#[derive(Debug, Clone, PartialEq)]
pub struct SimVehicle {
    pub id: VehicleId,
    pub class: VehicleClass,
    pub direction: Direction,
    pub position: Position,
    /// Heading in degrees, kept for the rendering collaborator
    pub heading: f32,
    /// Cruise speed in pixels per second
    pub animation_speed: f32,
    /// Sensor-reported speed checked against the legal limit
    pub reported_speed: u32,
    /// True once the vehicle has cleared the intersection
    pub turned: bool,
    /// Admission order, used to keep iteration and snapshots stable
    pub seq: u64,
}

impl SimVehicle {
    pub fn new(
        id: VehicleId,
        class: VehicleClass,
        direction: Direction,
        position: Position,
        reported_speed: u32,
        seq: u64,
    ) -> Self {
        Self {
            id,
            class,
            direction,
            position,
            heading: direction.heading_degrees(),
            animation_speed: class.animation_speed(),
            reported_speed,
            turned: false,
            seq,
        }
    }
}

/// Outcome of the pre-turn movement gates for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDecision {
    Moves,
    HeldBySignal,
    HeldByGap,
}

impl MoveDecision {
    pub fn permits_movement(self) -> bool {
        self == MoveDecision::Moves
    }
}

/// Evaluate whether a vehicle may advance this tick.
///
/// Turned vehicles are no longer gated and always move. For the rest,
/// the signal gate applies once the vehicle is inside the stop-line zone
/// (emergency vehicles are exempt), and the following gate requires a
/// clear minimum gap to the nearest comparable vehicle ahead: heavy
/// vehicles only follow other heavy vehicles, everyone else follows any
/// class. An emergency vehicle with nothing ahead of it in its approach
/// may always move.
pub fn evaluate_move(
    vehicle: &SimVehicle,
    lane: &ApproachLane,
    lanes: &LaneIndex,
    signal: &SignalController,
) -> MoveDecision {
    if vehicle.turned {
        return MoveDecision::Moves;
    }

    let progress = lane.progress_of(vehicle.position);
    let emergency = vehicle.class == VehicleClass::Emergency;

    // Lane-clearance precedence: a first-in-lane emergency vehicle is
    // not held by either gate.
    if emergency && lanes.nearest_ahead(vehicle.direction, progress).is_none() {
        return MoveDecision::Moves;
    }

    let in_gate_zone = progress >= lane.gate_zone;
    if in_gate_zone
        && !emergency
        && signal.state(vehicle.direction.axis()) != LightState::Green
    {
        return MoveDecision::HeldBySignal;
    }

    let ahead = match vehicle.class {
        VehicleClass::Heavy => lanes.nearest_heavy_ahead(vehicle.direction, progress),
        _ => lanes.nearest_ahead(vehicle.direction, progress),
    };
    if let Some((ahead_progress, _)) = ahead {
        if ahead_progress - progress < MIN_FOLLOWING_GAP {
            return MoveDecision::HeldByGap;
        }
    }

    MoveDecision::Moves
}
