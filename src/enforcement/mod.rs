//! Speed-enforcement pipeline
//!
//! The simulation loop produces [`Violation`]s; a single background
//! worker drains them into [`Challan`]s held by the [`ChallanLedger`],
//! which the external portal queries and pays against.

mod ledger;
mod ticket;
mod violation;

pub use ledger::{
    Challan, ChallanLedger, ChallanStatus, PaymentOutcome, CHALLAN_DUE_DAYS,
};
pub use ticket::{FineSchedule, TicketWorker, FINE_SURCHARGE};
pub use violation::{Violation, ViolationQueue};
