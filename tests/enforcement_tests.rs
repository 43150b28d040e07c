//! Enforcement pipeline validation
//!
//! Covers challan pricing, violation-to-challan conservation through the
//! background worker, drain-on-shutdown, and the payment rules of the
//! ledger.

use std::sync::Arc;

use chrono::{Duration, Utc};

use intersection_sim::enforcement::{
    Challan, ChallanLedger, ChallanStatus, FineSchedule, PaymentOutcome, TicketWorker, Violation,
    ViolationQueue, CHALLAN_DUE_DAYS,
};
use intersection_sim::simulation::{Direction, SimConfig, SimWorld, VehicleClass, VehicleId};

fn violation(plate: &str, class: VehicleClass) -> Violation {
    Violation {
        vehicle_id: VehicleId(plate.to_string()),
        class,
        reported_speed: 72,
        direction: Direction::North,
    }
}

fn start_pipeline(fines: FineSchedule) -> (Arc<ViolationQueue>, Arc<ChallanLedger>, TicketWorker) {
    let queue = Arc::new(ViolationQueue::new());
    let ledger = Arc::new(ChallanLedger::new());
    let worker = TicketWorker::spawn(Arc::clone(&queue), Arc::clone(&ledger), fines)
        .expect("worker should start");
    (queue, ledger, worker)
}

#[test]
fn test_regular_violations_price_with_surcharge() {
    // Three regular-class violations at a 5000 base rate come out at
    // 5850.00 each, active, due three days after issue
    let (queue, ledger, worker) = start_pipeline(FineSchedule::default());

    for plate in ["KA-0001", "KA-0002", "KA-0003"] {
        queue.push(violation(plate, VehicleClass::Regular));
    }
    let issued = worker.shutdown().expect("worker should drain and join");

    assert_eq!(issued, 3);
    assert_eq!(ledger.len(), 3);

    for plate in ["KA-0001", "KA-0002", "KA-0003"] {
        let challan = ledger
            .lookup(&VehicleId(plate.to_string()))
            .expect("challan should exist");
        assert_eq!(challan.payable_amount, 5850.0);
        assert_eq!(challan.status, ChallanStatus::Active);
        assert_eq!(
            challan.due_at - challan.issued_at,
            Duration::days(CHALLAN_DUE_DAYS)
        );
    }
}

#[test]
fn test_pipeline_conserves_every_violation() {
    let (queue, ledger, worker) = start_pipeline(FineSchedule::default());

    for i in 0..200 {
        let class = match i % 3 {
            0 => VehicleClass::Regular,
            1 => VehicleClass::Heavy,
            _ => VehicleClass::Emergency,
        };
        queue.push(violation(&format!("MH-{i:04}"), class));
    }
    let issued = worker.shutdown().expect("worker should drain and join");

    assert_eq!(issued, 200);
    assert_eq!(ledger.len(), 200);
    assert!(queue.is_empty());
}

#[test]
fn test_shutdown_drains_prefilled_queue() {
    // Violations queued before the worker even starts must still be
    // ticketed when shutdown follows immediately
    let queue = Arc::new(ViolationQueue::new());
    let ledger = Arc::new(ChallanLedger::new());
    for i in 0..50 {
        queue.push(violation(&format!("DL-{i:04}"), VehicleClass::Regular));
    }

    let worker = TicketWorker::spawn(
        Arc::clone(&queue),
        Arc::clone(&ledger),
        FineSchedule::default(),
    )
    .expect("worker should start");
    let issued = worker.shutdown().expect("worker should drain and join");

    assert_eq!(issued, 50);
    assert_eq!(ledger.len(), 50);
}

#[test]
fn test_queue_is_strict_fifo() {
    let queue = ViolationQueue::new();
    queue.push(violation("AA-0001", VehicleClass::Regular));
    queue.push(violation("AA-0002", VehicleClass::Heavy));
    queue.push(violation("AA-0003", VehicleClass::Emergency));

    assert_eq!(queue.recv().unwrap().vehicle_id, VehicleId("AA-0001".into()));
    assert_eq!(queue.recv().unwrap().vehicle_id, VehicleId("AA-0002".into()));
    assert_eq!(queue.recv().unwrap().vehicle_id, VehicleId("AA-0003".into()));

    queue.request_shutdown();
    assert!(queue.recv().is_none());
}

#[test]
fn test_fine_schedule_amounts() {
    let fines = FineSchedule::default();
    assert_eq!(fines.payable_amount(VehicleClass::Regular), 5850.0);
    assert_eq!(fines.payable_amount(VehicleClass::Heavy), 8775.0);
    assert_eq!(fines.payable_amount(VehicleClass::Emergency), 11700.0);
}

#[test]
fn test_emergency_exemption_zeroes_fine_but_keeps_challan() {
    let fines = FineSchedule {
        emergency_exempt: true,
        ..FineSchedule::default()
    };
    assert_eq!(fines.payable_amount(VehicleClass::Emergency), 0.0);
    assert_eq!(fines.payable_amount(VehicleClass::Regular), 5850.0);

    let (queue, ledger, worker) = start_pipeline(fines);
    queue.push(violation("EM-0001", VehicleClass::Emergency));
    let issued = worker.shutdown().expect("worker should drain and join");

    // Conservation still holds: the exempt violation produced a challan
    assert_eq!(issued, 1);
    let challan = ledger.lookup(&VehicleId("EM-0001".into())).unwrap();
    assert_eq!(challan.payable_amount, 0.0);
}

#[test]
fn test_payment_requires_exact_match() {
    let ledger = ChallanLedger::new();
    let vehicle = VehicleId("GJ-0042".to_string());
    ledger.append(Challan::issue(
        "CH-00001".to_string(),
        vehicle.clone(),
        5850.0,
        Utc::now(),
    ));

    assert_eq!(
        ledger.pay(&vehicle, "CH-00001", 100.0),
        PaymentOutcome::AmountMismatch
    );
    assert_eq!(
        ledger.lookup(&vehicle).unwrap().status,
        ChallanStatus::Active
    );

    assert_eq!(
        ledger.pay(&vehicle, "CH-99999", 5850.0),
        PaymentOutcome::NotFound
    );
    assert_eq!(
        ledger.pay(&VehicleId("XX-0000".into()), "CH-00001", 5850.0),
        PaymentOutcome::NotFound
    );

    assert_eq!(
        ledger.pay(&vehicle, "CH-00001", 5850.0),
        PaymentOutcome::Success
    );
    assert_eq!(ledger.lookup(&vehicle).unwrap().status, ChallanStatus::Paid);

    // Settled challans do not transition twice
    assert_eq!(
        ledger.pay(&vehicle, "CH-00001", 5850.0),
        PaymentOutcome::AlreadyPaid
    );
}

#[test]
fn test_payment_from_text_input() {
    let ledger = ChallanLedger::new();
    let vehicle = VehicleId("TN-0007".to_string());
    ledger.append(Challan::issue(
        "CH-00001".to_string(),
        vehicle.clone(),
        5850.0,
        Utc::now(),
    ));

    // Non-numeric input is a mismatch, not an error
    assert_eq!(
        ledger.pay_from_input(&vehicle, "CH-00001", "oops"),
        PaymentOutcome::AmountMismatch
    );
    assert_eq!(
        ledger.pay_from_input(&vehicle, "CH-00001", " 5850.00 "),
        PaymentOutcome::Success
    );
}

#[test]
fn test_lookup_prefers_active_then_latest() {
    let ledger = ChallanLedger::new();
    let vehicle = VehicleId("UP-0100".to_string());
    ledger.append(Challan::issue(
        "CH-00001".to_string(),
        vehicle.clone(),
        5850.0,
        Utc::now(),
    ));
    ledger.append(Challan::issue(
        "CH-00002".to_string(),
        vehicle.clone(),
        8775.0,
        Utc::now(),
    ));

    assert_eq!(ledger.pay(&vehicle, "CH-00001", 5850.0), PaymentOutcome::Success);

    // The remaining active challan wins over the earlier paid one
    let found = ledger.lookup(&vehicle).unwrap();
    assert_eq!(found.ticket_id, "CH-00002");
    assert_eq!(found.status, ChallanStatus::Active);

    assert_eq!(ledger.pay(&vehicle, "CH-00002", 8775.0), PaymentOutcome::Success);

    // With nothing active, the most recent entry is returned
    let found = ledger.lookup(&vehicle).unwrap();
    assert_eq!(found.ticket_id, "CH-00002");
    assert_eq!(found.status, ChallanStatus::Paid);

    assert!(ledger.lookup(&VehicleId("ZZ-9999".into())).is_none());
}

#[test]
fn test_detector_feeds_pipeline_end_to_end() {
    // Run the full loop with the worker attached: every violation the
    // detector emits must end up as exactly one ledger entry
    let queue = Arc::new(ViolationQueue::new());
    let ledger = Arc::new(ChallanLedger::new());
    let worker = TicketWorker::spawn(
        Arc::clone(&queue),
        Arc::clone(&ledger),
        FineSchedule::default(),
    )
    .expect("worker should start");

    let mut world = SimWorld::with_seed(SimConfig::default(), Arc::clone(&queue), 99);
    for _ in 0..1500 {
        world.tick(0.1);
    }

    let issued = worker.shutdown().expect("worker should drain and join");
    assert!(issued > 0, "a 150s run should produce violations");
    assert_eq!(issued, world.stats().violations);
    assert_eq!(ledger.len() as u64, issued);
}
