//! Background worker that converts violations into ledger challans

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use log::{debug, info};

use crate::simulation::VehicleClass;

use super::ledger::{Challan, ChallanLedger};
use super::violation::ViolationQueue;

/// Surcharge multiplier applied on top of every base fine
pub const FINE_SURCHARGE: f64 = 1.17;

/// Base fine rates per vehicle class
#[derive(Debug, Clone)]
pub struct FineSchedule {
    pub regular_base: f64,
    pub heavy_base: f64,
    pub emergency_base: f64,
    /// Policy switch: when set, emergency violations are ticketed at a
    /// zero base rate. The challan is still issued, so every violation
    /// keeps producing exactly one ledger entry.
    pub emergency_exempt: bool,
}

impl Default for FineSchedule {
    fn default() -> Self {
        Self {
            regular_base: 5000.0,
            heavy_base: 7500.0,
            emergency_base: 10000.0,
            emergency_exempt: false,
        }
    }
}

impl FineSchedule {
    pub fn base_rate(&self, class: VehicleClass) -> f64 {
        match class {
            VehicleClass::Regular => self.regular_base,
            VehicleClass::Heavy => self.heavy_base,
            VehicleClass::Emergency => {
                if self.emergency_exempt {
                    0.0
                } else {
                    self.emergency_base
                }
            }
        }
    }

    /// Final payable amount: base rate plus the surcharge, rounded to
    /// two decimals
    pub fn payable_amount(&self, class: VehicleClass) -> f64 {
        round_to_cents(self.base_rate(class) * FINE_SURCHARGE)
    }
}

fn round_to_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Handle to the ticket worker thread.
///
/// The worker drains the violation queue in strict FIFO order. Each
/// entry is popped under the queue lock, but pricing and the ledger
/// append run with the lock released so producers are never blocked on
/// ticket work.
pub struct TicketWorker {
    queue: Arc<ViolationQueue>,
    handle: JoinHandle<u64>,
}

impl TicketWorker {
    /// Start the worker thread
    pub fn spawn(
        queue: Arc<ViolationQueue>,
        ledger: Arc<ChallanLedger>,
        fines: FineSchedule,
    ) -> Result<Self> {
        let worker_queue = Arc::clone(&queue);
        let handle = thread::Builder::new()
            .name("ticket-worker".into())
            .spawn(move || {
                let mut issued: u64 = 0;
                // recv returns None only after shutdown has drained the queue
                while let Some(violation) = worker_queue.recv() {
                    issued += 1;
                    let challan = Challan::issue(
                        format!("CH-{issued:05}"),
                        violation.vehicle_id.clone(),
                        fines.payable_amount(violation.class),
                        Utc::now(),
                    );
                    debug!(
                        "challan {} for {} ({:?} at {} heading {:?})",
                        challan.ticket_id,
                        violation.vehicle_id,
                        violation.class,
                        violation.reported_speed,
                        violation.direction,
                    );
                    ledger.append(challan);
                }
                info!("ticket worker drained, {issued} challan(s) issued");
                issued
            })
            .context("failed to spawn ticket worker")?;

        Ok(Self { queue, handle })
    }

    /// Signal shutdown and wait for the worker to drain and exit.
    ///
    /// Returns the number of challans issued over the worker's lifetime.
    /// A failed join means queued violations may have been lost, which
    /// is the one fatal condition of the pipeline.
    pub fn shutdown(self) -> Result<u64> {
        self.queue.request_shutdown();
        self.handle
            .join()
            .map_err(|_| anyhow!("ticket worker panicked before draining its queue"))
    }
}
