//! Core types for the intersection simulation
//!
//! Standalone types shared across the simulation modules.

use std::fmt;

/// Registration plate identifying a vehicle
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VehicleId(pub String);

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Class of a vehicle, which fixes its cruise speed, its legal
/// reported-speed limit and the fine rate applied to it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VehicleClass {
    Regular,
    Heavy,
    Emergency,
}

impl VehicleClass {
    pub const ALL: [VehicleClass; 3] = [
        VehicleClass::Regular,
        VehicleClass::Heavy,
        VehicleClass::Emergency,
    ];

    /// On-screen cruise speed in pixels per second
    pub fn animation_speed(self) -> f32 {
        match self {
            VehicleClass::Regular => 20.0,
            VehicleClass::Heavy => 14.0,
            VehicleClass::Emergency => 30.0,
        }
    }

    /// Legal limit for the sensor-reported speed
    pub fn speed_limit(self) -> u32 {
        match self {
            VehicleClass::Regular => 60,
            VehicleClass::Heavy => 70,
            VehicleClass::Emergency => 90,
        }
    }
}

/// Signal axis grouping two opposing approaches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    NorthSouth,
    EastWest,
}

/// Travel direction of a vehicle.
///
/// The four base variants name the approach side the vehicle entered
/// from (a `North` vehicle enters at the top edge heading down). The
/// `Turn*` variants name the compass heading travelled after clearing
/// the intersection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    South,
    East,
    West,
    TurnNorth,
    TurnSouth,
    TurnEast,
    TurnWest,
}

impl Direction {
    pub const APPROACHES: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    /// True once this is a post-turn travel direction
    pub fn is_turned(self) -> bool {
        matches!(
            self,
            Direction::TurnNorth
                | Direction::TurnSouth
                | Direction::TurnEast
                | Direction::TurnWest
        )
    }

    /// Index into per-approach tables; `None` for post-turn variants
    pub fn approach_index(self) -> Option<usize> {
        match self {
            Direction::North => Some(0),
            Direction::South => Some(1),
            Direction::East => Some(2),
            Direction::West => Some(3),
            _ => None,
        }
    }

    pub fn axis(self) -> Axis {
        match self {
            Direction::North
            | Direction::South
            | Direction::TurnNorth
            | Direction::TurnSouth => Axis::NorthSouth,
            Direction::East | Direction::West | Direction::TurnEast | Direction::TurnWest => {
                Axis::EastWest
            }
        }
    }

    /// Unit vector of travel in scene coordinates (y grows downward)
    pub fn unit_vector(self) -> (f32, f32) {
        match self {
            Direction::North | Direction::TurnSouth => (0.0, 1.0),
            Direction::South | Direction::TurnNorth => (0.0, -1.0),
            Direction::East | Direction::TurnWest => (-1.0, 0.0),
            Direction::West | Direction::TurnEast => (1.0, 0.0),
        }
    }

    /// Heading in degrees for the rendering collaborator
    /// (0 = up, clockwise positive)
    pub fn heading_degrees(self) -> f32 {
        match self {
            Direction::South | Direction::TurnNorth => 0.0,
            Direction::West | Direction::TurnEast => 90.0,
            Direction::North | Direction::TurnSouth => 180.0,
            Direction::East | Direction::TurnWest => 270.0,
        }
    }
}

/// A 2D position in scene coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Position reached by travelling `distance` along `direction`
    pub fn advanced(self, direction: Direction, distance: f32) -> Position {
        let (ux, uy) = direction.unit_vector();
        Position {
            x: self.x + ux * distance,
            y: self.y + uy * distance,
        }
    }
}

/// Side length of the square scene, in pixels
pub const SCENE_SIZE: f32 = 800.0;

/// Margin past the scene edge after which a turned vehicle is pruned
pub const PRUNE_MARGIN: f32 = 60.0;

/// Minimum clear distance to the vehicle ahead before movement is allowed
pub const MIN_FOLLOWING_GAP: f32 = 50.0;

/// Spacing given to vehicles entering an approach behind its spawn anchor
pub const ADMISSION_HEADWAY: f32 = 30.0;
