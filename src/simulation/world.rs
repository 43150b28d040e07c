//! Simulation world that ties everything together
//!
//! Owns the active vehicle set, the signal controller, the admission
//! queues and the lane ordering, and drives one tick of the whole
//! simulation: admission, signal update, motion and turning, then speed
//! violation detection. Detected violations are handed to the
//! enforcement pipeline through a shared queue; the tick never waits on
//! the worker.

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use rand::distr::{Bernoulli, Distribution};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use crate::enforcement::{Violation, ViolationQueue};

use super::admission::AdmissionState;
use super::config::SimConfig;
use super::lane::{approach_table, ApproachLane, LaneIndex, TurnChoice};
use super::signal::{LightState, SignalController};
use super::types::{
    Direction, Position, VehicleClass, VehicleId, ADMISSION_HEADWAY, PRUNE_MARGIN, SCENE_SIZE,
};
use super::vehicle::{evaluate_move, SimVehicle};

const PLATE_LETTERS: &[u8] = b"ABCDEFGHJKLMNPRSTUVWXYZ";

/// Running totals kept for the summary output
#[derive(Debug, Clone, Copy, Default)]
pub struct SimStats {
    pub spawned: u64,
    pub admitted: u64,
    pub turned: u64,
    pub pruned: u64,
    pub violations: u64,
}

/// One vehicle as seen by the rendering collaborator
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleView {
    pub id: VehicleId,
    pub class: VehicleClass,
    pub direction: Direction,
    pub heading: f32,
    pub position: Position,
}

/// Snapshot of the world consumed by the rendering collaborator each tick
#[derive(Debug, Clone, PartialEq)]
pub struct WorldSnapshot {
    pub time: f32,
    pub cycle_remaining: f32,
    pub north_south: LightState,
    pub east_west: LightState,
    pub vehicles: Vec<VehicleView>,
}

/// The main simulation world
pub struct SimWorld {
    config: SimConfig,
    signal: SignalController,
    admission: AdmissionState,
    lanes: [ApproachLane; 4],
    lane_index: LaneIndex,
    vehicles: HashMap<VehicleId, SimVehicle>,
    violations: Arc<ViolationQueue>,

    /// Optional seeded RNG for reproducible simulations
    rng: Option<StdRng>,

    /// Simulation time in seconds
    time: f32,
    speed_step_acc: f32,
    next_seq: u64,
    stats: SimStats,
}

impl SimWorld {
    fn new_internal(
        config: SimConfig,
        violations: Arc<ViolationQueue>,
        rng: Option<StdRng>,
    ) -> Self {
        let signal = SignalController::new(config.signal);
        Self {
            config,
            signal,
            admission: AdmissionState::new(),
            lanes: approach_table(),
            lane_index: LaneIndex::new(),
            vehicles: HashMap::new(),
            violations,
            rng,
            time: 0.0,
            speed_step_acc: 0.0,
            next_seq: 0,
            stats: SimStats::default(),
        }
    }

    pub fn new(config: SimConfig, violations: Arc<ViolationQueue>) -> Self {
        Self::new_internal(config, violations, None)
    }

    /// Create a world with a seeded RNG so spawning and turning are
    /// reproducible
    pub fn with_seed(config: SimConfig, violations: Arc<ViolationQueue>, seed: u64) -> Self {
        Self::new_internal(config, violations, Some(StdRng::seed_from_u64(seed)))
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn signal(&self) -> &SignalController {
        &self.signal
    }

    pub fn stats(&self) -> SimStats {
        self.stats
    }

    pub fn vehicle(&self, id: &VehicleId) -> Option<&SimVehicle> {
        self.vehicles.get(id)
    }

    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    /// Active (un-turned) vehicles currently on an approach
    pub fn active_count(&self, direction: Direction) -> usize {
        self.lane_index.active_count(direction)
    }

    /// Vehicles still waiting in an approach's admission queue
    pub fn queued_count(&self, direction: Direction) -> usize {
        self.admission.queued(direction)
    }

    /// Get a random value in the given range, using the seeded RNG if
    /// one is attached
    fn random_range_u32(&mut self, range: std::ops::RangeInclusive<u32>) -> u32 {
        match &mut self.rng {
            Some(rng) => rng.random_range(range),
            None => rand::rng().random_range(range),
        }
    }

    fn random_index(&mut self, len: usize) -> usize {
        match &mut self.rng {
            Some(rng) => rng.random_range(0..len),
            None => rand::rng().random_range(0..len),
        }
    }

    /// Single Bernoulli draw, using the seeded RNG if one is attached
    fn random_bernoulli(&mut self, probability: f64) -> bool {
        let gate = match Bernoulli::new(probability) {
            Ok(gate) => gate,
            Err(_) => return false,
        };
        match &mut self.rng {
            Some(rng) => gate.sample(rng),
            None => gate.sample(&mut rand::rng()),
        }
    }

    /// Choose a random element from a slice, using the seeded RNG if
    /// one is attached
    fn choose_random<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        if slice.is_empty() {
            return None;
        }
        match &mut self.rng {
            Some(rng) => slice.choose(rng),
            None => slice.choose(&mut rand::rng()),
        }
    }

    fn make_vehicle(
        &mut self,
        direction: Direction,
        class: VehicleClass,
        position: Position,
    ) -> SimVehicle {
        let seq = self.next_seq;
        self.next_seq += 1;

        let first = PLATE_LETTERS[self.random_index(PLATE_LETTERS.len())] as char;
        let second = PLATE_LETTERS[self.random_index(PLATE_LETTERS.len())] as char;
        let plate = format!("{first}{second}-{:04}", seq % 10_000);

        let reported_speed = self.random_range_u32(1..=class.speed_limit());
        SimVehicle::new(
            VehicleId(plate),
            class,
            direction,
            position,
            reported_speed,
            seq,
        )
    }

    /// Queue a vehicle for admission on an approach. This is the same
    /// path the spawn timers use; returns `None` for post-turn
    /// directions.
    pub fn enqueue_vehicle(
        &mut self,
        direction: Direction,
        class: VehicleClass,
    ) -> Option<VehicleId> {
        let idx = direction.approach_index()?;
        let spawn = self.lanes[idx].spawn;
        let vehicle = self.make_vehicle(direction, class, spawn);
        let id = vehicle.id.clone();
        debug!("spawned {id} ({class:?}) waiting on {direction:?}");
        self.admission.enqueue(direction, vehicle);
        self.stats.spawned += 1;
        Some(id)
    }

    /// Place a vehicle directly into the active set at a given progress
    /// along its approach, bypassing the admission queue. Intended for
    /// scenario construction; the progress slot must be unoccupied.
    pub fn place_vehicle(
        &mut self,
        direction: Direction,
        class: VehicleClass,
        progress: f32,
    ) -> Option<VehicleId> {
        let idx = direction.approach_index()?;
        let position = self.lanes[idx].position_at(progress);
        let vehicle = self.make_vehicle(direction, class, position);
        let id = vehicle.id.clone();
        if !self.lane_index.insert(direction, class, progress, id.clone()) {
            return None;
        }
        self.vehicles.insert(id.clone(), vehicle);
        self.stats.spawned += 1;
        self.stats.admitted += 1;
        Some(id)
    }

    /// Whether the vehicle would be allowed to advance this tick
    pub fn can_move(&self, id: &VehicleId) -> bool {
        let Some(vehicle) = self.vehicles.get(id) else {
            return false;
        };
        if vehicle.turned {
            return true;
        }
        let Some(idx) = vehicle.direction.approach_index() else {
            return false;
        };
        evaluate_move(vehicle, &self.lanes[idx], &self.lane_index, &self.signal)
            .permits_movement()
    }

    /// Main simulation tick
    pub fn tick(&mut self, delta_secs: f32) {
        self.time += delta_secs;

        // Admission: fire spawn timers, then drain queues up to capacity
        let due = self.admission.advance(delta_secs, &self.config);
        for (direction, class) in due {
            if class == VehicleClass::Emergency {
                let Some(idx) = direction.approach_index() else {
                    continue;
                };
                let probability = self.config.spawn.emergency_probability[idx];
                if !self.random_bernoulli(probability) {
                    continue;
                }
            }
            self.enqueue_vehicle(direction, class);
        }
        self.release_queued();

        // Signal phases follow elapsed time, not per-light timers
        self.signal.update(self.time);

        self.step_reported_speeds(delta_secs);
        self.update_vehicles(delta_secs);
        self.detect_violations();
        self.prune_departed();
    }

    /// Drain each approach queue while the approach is under capacity
    fn release_queued(&mut self) {
        for idx in 0..self.lanes.len() {
            let direction = Direction::APPROACHES[idx];
            let capacity = self.config.capacities[idx];
            while self.lane_index.active_count(direction) < capacity {
                let Some(mut vehicle) = self.admission.pop(direction) else {
                    break;
                };
                // Enter behind the current rearmost vehicle, off-screen
                // if the approach is backed up to its spawn anchor
                let start = match self.lane_index.rearmost(direction) {
                    Some(rear) => (rear - ADMISSION_HEADWAY).min(0.0),
                    None => 0.0,
                };
                vehicle.position = self.lanes[idx].position_at(start);
                self.lane_index
                    .insert(direction, vehicle.class, start, vehicle.id.clone());
                debug!("admitted {} onto {:?} at {:.0}", vehicle.id, direction, start);
                self.vehicles.insert(vehicle.id.clone(), vehicle);
                self.stats.admitted += 1;
            }
        }
    }

    /// Global reporting timer: every interval, every un-turned vehicle's
    /// reported speed steps up by the configured amount
    fn step_reported_speeds(&mut self, delta_secs: f32) {
        let interval = self.config.speed_step_interval_secs;
        if interval <= 0.0 {
            return;
        }
        self.speed_step_acc += delta_secs;
        while self.speed_step_acc >= interval {
            self.speed_step_acc -= interval;
            for vehicle in self.vehicles.values_mut() {
                if !vehicle.turned {
                    vehicle.reported_speed += self.config.speed_step;
                }
            }
        }
    }

    /// Ids of all vehicles in admission order, for deterministic
    /// iteration under a seeded RNG
    fn ordered_ids(&self) -> Vec<VehicleId> {
        let mut order: Vec<(u64, VehicleId)> = self
            .vehicles
            .values()
            .map(|vehicle| (vehicle.seq, vehicle.id.clone()))
            .collect();
        order.sort_by_key(|(seq, _)| *seq);
        order.into_iter().map(|(_, id)| id).collect()
    }

    fn update_vehicles(&mut self, delta_secs: f32) {
        for id in self.ordered_ids() {
            if let Some(mut vehicle) = self.vehicles.remove(&id) {
                self.step_vehicle(&mut vehicle, delta_secs);
                self.vehicles.insert(id, vehicle);
            }
        }
    }

    fn step_vehicle(&mut self, vehicle: &mut SimVehicle, delta_secs: f32) {
        if vehicle.turned {
            vehicle.position = vehicle
                .position
                .advanced(vehicle.direction, vehicle.animation_speed * delta_secs);
            return;
        }

        let Some(idx) = vehicle.direction.approach_index() else {
            return;
        };
        let progress = self.lanes[idx].progress_of(vehicle.position);

        // Crossing the turn line consumes the whole tick
        if progress >= self.lanes[idx].turn_line {
            self.perform_turn(vehicle, idx, progress);
            return;
        }

        let decision = evaluate_move(vehicle, &self.lanes[idx], &self.lane_index, &self.signal);
        if decision.permits_movement() {
            let new_progress = progress + vehicle.animation_speed * delta_secs;
            vehicle.position = self.lanes[idx].position_at(new_progress);
            self.lane_index
                .reposition(vehicle.direction, vehicle.class, progress, new_progress);
        }
    }

    /// One-time exit choice: pick left/straight/right, move the vehicle
    /// onto the chosen outbound lane and reassign its travel direction
    fn perform_turn(&mut self, vehicle: &mut SimVehicle, idx: usize, progress: f32) {
        let choice = self
            .choose_random(&TurnChoice::ALL)
            .copied()
            .unwrap_or(TurnChoice::Straight);
        let exit = *self.lanes[idx].exit(choice);

        let closure_active = self
            .config
            .closure_window
            .is_some_and(|(start, end)| self.time >= start && self.time < end);

        let entry = if vehicle.class == VehicleClass::Heavy {
            exit.heavy
        } else if closure_active {
            exit.primary
        } else {
            let candidates = [exit.primary, exit.secondary];
            self.choose_random(&candidates)
                .copied()
                .unwrap_or(exit.primary)
        };

        self.lane_index
            .remove(vehicle.direction, vehicle.class, progress);

        debug!(
            "{} turned {choice:?} from {:?} onto {:?}",
            vehicle.id, vehicle.direction, exit.direction
        );
        vehicle.direction = exit.direction;
        vehicle.position = entry;
        vehicle.heading = exit.direction.heading_degrees();
        vehicle.turned = true;
        self.stats.turned += 1;
    }

    /// Emit a violation for every un-turned vehicle over its class limit
    /// and reset its reported speed so one excursion reports once
    fn detect_violations(&mut self) {
        for id in self.ordered_ids() {
            let Some(vehicle) = self.vehicles.get_mut(&id) else {
                continue;
            };
            if vehicle.turned || vehicle.reported_speed <= vehicle.class.speed_limit() {
                continue;
            }
            debug!(
                "violation: {} at {} (limit {})",
                vehicle.id,
                vehicle.reported_speed,
                vehicle.class.speed_limit()
            );
            self.violations.push(Violation {
                vehicle_id: vehicle.id.clone(),
                class: vehicle.class,
                reported_speed: vehicle.reported_speed,
                direction: vehicle.direction,
            });
            vehicle.reported_speed = 0;
            self.stats.violations += 1;
        }
    }

    /// Drop turned vehicles that have left the scene
    fn prune_departed(&mut self) {
        let out_of_bounds = |position: Position| {
            position.x < -PRUNE_MARGIN
                || position.x > SCENE_SIZE + PRUNE_MARGIN
                || position.y < -PRUNE_MARGIN
                || position.y > SCENE_SIZE + PRUNE_MARGIN
        };
        let departed: Vec<VehicleId> = self
            .vehicles
            .values()
            .filter(|vehicle| vehicle.turned && out_of_bounds(vehicle.position))
            .map(|vehicle| vehicle.id.clone())
            .collect();
        for id in departed {
            debug!("{id} left the scene");
            self.vehicles.remove(&id);
            self.stats.pruned += 1;
        }
    }

    /// State handed to the rendering/UI collaborator each tick
    pub fn snapshot(&self) -> WorldSnapshot {
        let mut vehicles: Vec<&SimVehicle> = self.vehicles.values().collect();
        vehicles.sort_by_key(|vehicle| vehicle.seq);
        WorldSnapshot {
            time: self.time,
            cycle_remaining: self.signal.remaining_in_cycle(self.time),
            north_south: self.signal.states().north_south,
            east_west: self.signal.states().east_west,
            vehicles: vehicles
                .into_iter()
                .map(|vehicle| VehicleView {
                    id: vehicle.id.clone(),
                    class: vehicle.class,
                    direction: vehicle.direction,
                    heading: vehicle.heading,
                    position: vehicle.position,
                })
                .collect(),
        }
    }
}
