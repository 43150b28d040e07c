//! Challan records and the queryable ledger

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use log::info;

use crate::simulation::VehicleId;

/// Days until an issued challan falls due
pub const CHALLAN_DUE_DAYS: i64 = 3;

/// Payment state of a challan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallanStatus {
    Active,
    Paid,
}

/// A fine ticket held in the ledger
#[derive(Debug, Clone, PartialEq)]
pub struct Challan {
    pub ticket_id: String,
    pub vehicle_id: VehicleId,
    pub status: ChallanStatus,
    pub issued_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub payable_amount: f64,
}

impl Challan {
    /// Create a new Active challan due `CHALLAN_DUE_DAYS` after issue
    pub fn issue(
        ticket_id: String,
        vehicle_id: VehicleId,
        payable_amount: f64,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            ticket_id,
            vehicle_id,
            status: ChallanStatus::Active,
            issued_at,
            due_at: issued_at + Duration::days(CHALLAN_DUE_DAYS),
            payable_amount,
        }
    }
}

/// Outcome of a payment attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// The challan was Active and transitioned to Paid
    Success,
    /// The challan exists but the offered amount does not match
    AmountMismatch,
    /// No challan matches the vehicle/ticket pair
    NotFound,
    /// The challan was already settled; nothing changed
    AlreadyPaid,
}

fn cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Record store for issued challans.
///
/// Appended to by the ticket worker; read and conditionally mutated by
/// portal requests. One lock guards both sides.
#[derive(Debug, Default)]
pub struct ChallanLedger {
    entries: Mutex<Vec<Challan>>,
}

impl ChallanLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, challan: Challan) {
        self.entries.lock().unwrap().push(challan);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All challans recorded against a vehicle, in issue order
    pub fn challans_for(&self, vehicle_id: &VehicleId) -> Vec<Challan> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|challan| challan.vehicle_id == *vehicle_id)
            .cloned()
            .collect()
    }

    /// Most relevant challan for a vehicle: the earliest still-Active
    /// one, falling back to the most recent entry of any status
    pub fn lookup(&self, vehicle_id: &VehicleId) -> Option<Challan> {
        let entries = self.entries.lock().unwrap();
        entries
            .iter()
            .find(|challan| {
                challan.vehicle_id == *vehicle_id && challan.status == ChallanStatus::Active
            })
            .or_else(|| {
                entries
                    .iter()
                    .rev()
                    .find(|challan| challan.vehicle_id == *vehicle_id)
            })
            .cloned()
    }

    /// Settle a challan. The vehicle, the ticket and the exact payable
    /// amount must all match; anything else leaves the ledger untouched.
    pub fn pay(&self, vehicle_id: &VehicleId, ticket_id: &str, amount: f64) -> PaymentOutcome {
        let mut entries = self.entries.lock().unwrap();
        let challan = match entries
            .iter_mut()
            .find(|challan| challan.vehicle_id == *vehicle_id && challan.ticket_id == ticket_id)
        {
            Some(challan) => challan,
            None => return PaymentOutcome::NotFound,
        };

        if challan.status == ChallanStatus::Paid {
            return PaymentOutcome::AlreadyPaid;
        }
        if cents(amount) != cents(challan.payable_amount) {
            return PaymentOutcome::AmountMismatch;
        }

        challan.status = ChallanStatus::Paid;
        info!("challan {} paid by {}", challan.ticket_id, vehicle_id);
        PaymentOutcome::Success
    }

    /// Portal entry point: the amount arrives as text. Anything that
    /// does not parse as a number is treated as a mismatched amount.
    pub fn pay_from_input(
        &self,
        vehicle_id: &VehicleId,
        ticket_id: &str,
        amount: &str,
    ) -> PaymentOutcome {
        match amount.trim().parse::<f64>() {
            Ok(amount) => self.pay(vehicle_id, ticket_id, amount),
            Err(_) => PaymentOutcome::AmountMismatch,
        }
    }
}
