//! Intersection Simulation Library
//!
//! Tick-driven traffic flow at a single signalized intersection plus an
//! asynchronous speed-enforcement pipeline. The library runs headless;
//! rendering and the user portal are external collaborators that consume
//! snapshots and ledger queries.

pub mod enforcement;
pub mod simulation;
