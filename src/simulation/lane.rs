//! Approach geometry and per-lane vehicle ordering
//!
//! The four approaches share one parameterized descriptor each instead
//! of four copies of the same branch logic. `LaneIndex` keeps the
//! un-turned vehicles of an approach ordered by progress, so finding the
//! nearest vehicle ahead is a range query rather than a scan over the
//! active set.

use std::collections::BTreeMap;
use std::ops::Bound;

use ordered_float::OrderedFloat;

use super::types::{Direction, Position, VehicleClass, VehicleId};

/// Which way a vehicle exits the intersection relative to its approach
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnChoice {
    Left,
    Straight,
    Right,
}

impl TurnChoice {
    pub const ALL: [TurnChoice; 3] = [TurnChoice::Left, TurnChoice::Straight, TurnChoice::Right];

    fn index(self) -> usize {
        match self {
            TurnChoice::Left => 0,
            TurnChoice::Straight => 1,
            TurnChoice::Right => 2,
        }
    }
}

/// Outbound lane geometry for one (approach, choice) pair
#[derive(Debug, Clone, Copy)]
pub struct ExitLane {
    /// Travel direction after the turn
    pub direction: Direction,
    /// Entry point of the default outbound lane
    pub primary: Position,
    /// Entry point of the alternate outbound lane
    pub secondary: Position,
    /// Entry point of the wide lane reserved for heavy vehicles
    pub heavy: Position,
}

/// Static geometry of one approach
#[derive(Debug, Clone)]
pub struct ApproachLane {
    pub direction: Direction,
    /// Anchor where admitted vehicles enter the scene
    pub spawn: Position,
    /// Progress at which the signal gate starts to apply
    pub gate_zone: f32,
    /// Progress past which the vehicle commits to a turn
    pub turn_line: f32,
    exits: [ExitLane; 3],
}

impl ApproachLane {
    pub fn exit(&self, choice: TurnChoice) -> &ExitLane {
        &self.exits[choice.index()]
    }

    /// Distance travelled from the spawn anchor along the approach axis
    pub fn progress_of(&self, position: Position) -> f32 {
        let (ux, uy) = self.direction.unit_vector();
        (position.x - self.spawn.x) * ux + (position.y - self.spawn.y) * uy
    }

    /// Scene position at a given progress along the approach
    pub fn position_at(&self, progress: f32) -> Position {
        self.spawn.advanced(self.direction, progress)
    }
}

// Outbound lane bands. The primary lane of each heading lines up with the
// matching approach lane, so a straight crossing stays in its own band.
const SOUTHBOUND: (f32, f32, f32) = (425.0, 455.0, 485.0);
const NORTHBOUND: (f32, f32, f32) = (300.0, 330.0, 270.0);
const EASTBOUND: (f32, f32, f32) = (305.0, 335.0, 275.0);
const WESTBOUND: (f32, f32, f32) = (490.0, 460.0, 520.0);

/// Progress where the signal gate zone begins, identical per approach
const GATE_ZONE_PROGRESS: f32 = 250.0;
/// Progress past which a vehicle commits to its turn
const TURN_LINE_PROGRESS: f32 = 340.0;

fn southbound_exit() -> ExitLane {
    let (primary, secondary, heavy) = SOUTHBOUND;
    ExitLane {
        direction: Direction::TurnSouth,
        primary: Position::new(primary, 430.0),
        secondary: Position::new(secondary, 430.0),
        heavy: Position::new(heavy, 430.0),
    }
}

fn northbound_exit() -> ExitLane {
    let (primary, secondary, heavy) = NORTHBOUND;
    ExitLane {
        direction: Direction::TurnNorth,
        primary: Position::new(primary, 370.0),
        secondary: Position::new(secondary, 370.0),
        heavy: Position::new(heavy, 370.0),
    }
}

fn eastbound_exit() -> ExitLane {
    let (primary, secondary, heavy) = EASTBOUND;
    ExitLane {
        direction: Direction::TurnEast,
        primary: Position::new(430.0, primary),
        secondary: Position::new(430.0, secondary),
        heavy: Position::new(430.0, heavy),
    }
}

fn westbound_exit() -> ExitLane {
    let (primary, secondary, heavy) = WESTBOUND;
    ExitLane {
        direction: Direction::TurnWest,
        primary: Position::new(370.0, primary),
        secondary: Position::new(370.0, secondary),
        heavy: Position::new(370.0, heavy),
    }
}

/// Build the descriptor table for all four approaches, indexed by
/// `Direction::approach_index`. Exit entries are ordered left, straight,
/// right as seen from the approaching driver.
pub fn approach_table() -> [ApproachLane; 4] {
    [
        ApproachLane {
            direction: Direction::North,
            spawn: Position::new(425.0, 0.0),
            gate_zone: GATE_ZONE_PROGRESS,
            turn_line: TURN_LINE_PROGRESS,
            exits: [eastbound_exit(), southbound_exit(), westbound_exit()],
        },
        ApproachLane {
            direction: Direction::South,
            spawn: Position::new(300.0, 800.0),
            gate_zone: GATE_ZONE_PROGRESS,
            turn_line: TURN_LINE_PROGRESS,
            exits: [westbound_exit(), northbound_exit(), eastbound_exit()],
        },
        ApproachLane {
            direction: Direction::East,
            spawn: Position::new(800.0, 490.0),
            gate_zone: GATE_ZONE_PROGRESS,
            turn_line: TURN_LINE_PROGRESS,
            exits: [southbound_exit(), westbound_exit(), northbound_exit()],
        },
        ApproachLane {
            direction: Direction::West,
            spawn: Position::new(0.0, 305.0),
            gate_zone: GATE_ZONE_PROGRESS,
            turn_line: TURN_LINE_PROGRESS,
            exits: [northbound_exit(), eastbound_exit(), southbound_exit()],
        },
    ]
}

type LaneOrder = BTreeMap<OrderedFloat<f32>, VehicleId>;

/// Ordered index of un-turned vehicles per approach.
///
/// Heavy vehicles follow in a lane of their own, so each approach keeps
/// two orderings: the general lane shared by regular and emergency
/// traffic, and the heavy lane. Post-turn directions have no ordering;
/// calls for them are no-ops.
#[derive(Debug, Default)]
pub struct LaneIndex {
    general: [LaneOrder; 4],
    heavy: [LaneOrder; 4],
}

impl LaneIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn order(&self, direction: Direction, class: VehicleClass) -> Option<&LaneOrder> {
        let idx = direction.approach_index()?;
        Some(match class {
            VehicleClass::Heavy => &self.heavy[idx],
            _ => &self.general[idx],
        })
    }

    fn order_mut(&mut self, direction: Direction, class: VehicleClass) -> Option<&mut LaneOrder> {
        let idx = direction.approach_index()?;
        Some(match class {
            VehicleClass::Heavy => &mut self.heavy[idx],
            _ => &mut self.general[idx],
        })
    }

    /// Insert a vehicle at `progress`. Returns false if that slot in the
    /// lane is already occupied (the vehicle is not inserted).
    pub fn insert(
        &mut self,
        direction: Direction,
        class: VehicleClass,
        progress: f32,
        id: VehicleId,
    ) -> bool {
        match self.order_mut(direction, class) {
            Some(order) => {
                let key = OrderedFloat(progress);
                if order.contains_key(&key) {
                    return false;
                }
                order.insert(key, id);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, direction: Direction, class: VehicleClass, progress: f32) {
        if let Some(order) = self.order_mut(direction, class) {
            order.remove(&OrderedFloat(progress));
        }
    }

    /// Move a vehicle from `old` to `new` progress within its lane
    pub fn reposition(
        &mut self,
        direction: Direction,
        class: VehicleClass,
        old: f32,
        new: f32,
    ) {
        if let Some(order) = self.order_mut(direction, class) {
            if let Some(id) = order.remove(&OrderedFloat(old)) {
                order.insert(OrderedFloat(new), id);
            }
        }
    }

    /// Number of active (un-turned) vehicles in the approach
    pub fn active_count(&self, direction: Direction) -> usize {
        match direction.approach_index() {
            Some(idx) => self.general[idx].len() + self.heavy[idx].len(),
            None => 0,
        }
    }

    /// Rearmost progress in the approach across both lanes
    pub fn rearmost(&self, direction: Direction) -> Option<f32> {
        let idx = direction.approach_index()?;
        let general = self.general[idx].keys().next().map(|k| k.into_inner());
        let heavy = self.heavy[idx].keys().next().map(|k| k.into_inner());
        match (general, heavy) {
            (Some(g), Some(h)) => Some(g.min(h)),
            (Some(g), None) => Some(g),
            (None, Some(h)) => Some(h),
            (None, None) => None,
        }
    }

    fn ahead_in(order: &LaneOrder, progress: f32) -> Option<(f32, &VehicleId)> {
        order
            .range((Bound::Excluded(OrderedFloat(progress)), Bound::Unbounded))
            .next()
            .map(|(key, id)| (key.into_inner(), id))
    }

    /// Nearest vehicle strictly ahead in the heavy lane
    pub fn nearest_heavy_ahead(
        &self,
        direction: Direction,
        progress: f32,
    ) -> Option<(f32, &VehicleId)> {
        let idx = direction.approach_index()?;
        Self::ahead_in(&self.heavy[idx], progress)
    }

    /// Nearest vehicle strictly ahead in either lane of the approach
    pub fn nearest_ahead(&self, direction: Direction, progress: f32) -> Option<(f32, &VehicleId)> {
        let idx = direction.approach_index()?;
        let general = Self::ahead_in(&self.general[idx], progress);
        let heavy = Self::ahead_in(&self.heavy[idx], progress);
        match (general, heavy) {
            (Some(g), Some(h)) => Some(if g.0 <= h.0 { g } else { h }),
            (Some(g), None) => Some(g),
            (None, Some(h)) => Some(h),
            (None, None) => None,
        }
    }
}
