//! Integration tests for best-response dynamics end to end.

mod common;

use fleet_charge::config::ScenarioConfig;
use fleet_charge::engine::EngineStatus;
use fleet_charge::schedule::FleetSchedule;
use fleet_charge::session::{SLOT_HOURS, SLOTS_PER_DAY};
use fleet_charge::solver::WaterFilling;

#[test]
fn two_identical_vehicles_converge_to_an_even_split() {
    let sessions = vec![common::overnight_session(8.0), common::overnight_session(8.0)];
    let engine = common::engine(WaterFilling::new(), common::flat_load(0.0), sessions.clone());
    let report = engine.run(FleetSchedule::random(2, 0));

    assert!(
        report.status.is_converged(),
        "identical vehicles should converge within 100 sweeps"
    );

    // the split is even: each vehicle ends with its full energy need
    for j in 0..2 {
        let delivered: f64 = report.schedule.row(j).iter().sum::<f64>() * SLOT_HOURS;
        assert!((delivered - 8.0).abs() <= 0.2 * SLOT_HOURS + 1e-9);
    }

    // the vehicles share the window: neither charges outside it, and the
    // combined fleet load is flat over the window within two increments
    let total = report.schedule.total_load_kw();
    for slot in 0..SLOTS_PER_DAY {
        if !sessions[0].contains(slot) {
            assert_eq!(total[slot], 0.0);
        }
    }
    let window: Vec<f64> = sessions[0]
        .window_slots()
        .iter()
        .map(|&slot| total[slot])
        .collect();
    let lo = window.iter().cloned().fold(f64::INFINITY, f64::min);
    let hi = window.iter().cloned().fold(0.0, f64::max);
    assert!(hi - lo <= 0.4 + 1e-9, "combined load spread {}", hi - lo);
}

#[test]
fn zero_sweep_budget_round_trips_the_initial_schedule() {
    let initial = FleetSchedule::random(1, 123);
    let engine = fleet_charge::engine::BestResponseEngine::new(
        common::small_model(),
        WaterFilling::new(),
        common::flat_load(10.0),
        vec![common::overnight_session(8.0)],
        1e-2,
        0,
        1e-9,
    );
    let report = engine.run(initial.clone());

    assert_eq!(report.schedule, initial);
    assert_eq!(report.status, EngineStatus::BudgetExhausted);
    assert!(report.trace.is_empty());
}

#[test]
fn identical_runs_produce_identical_trajectories() {
    let sessions = vec![
        common::overnight_session(8.0),
        common::overnight_session(12.0),
        fleet_charge::session::VehicleSession::new(20, 40, 6.0, 7.0),
    ];
    let run = |seed: u64| {
        common::engine(WaterFilling::new(), common::flat_load(30.0), sessions.clone())
            .run(FleetSchedule::random(3, seed))
    };

    let a = run(42);
    let b = run(42);
    assert_eq!(a.schedule, b.schedule);
    assert_eq!(a.trace, b.trace);
    assert_eq!(a.status, b.status);

    let c = run(43);
    assert_ne!(
        a.trace, c.trace,
        "different starting schedules should trace different paths"
    );
}

#[test]
fn baseline_preset_fleet_meets_every_need_under_water_filling() {
    let cfg = ScenarioConfig::baseline();
    assert!(cfg.validate().is_empty());

    let engine = fleet_charge::engine::BestResponseEngine::new(
        fleet_charge::grid::DispatchModel::new(fleet_charge::grid::GenerationStack::french_2019()),
        WaterFilling::new(),
        cfg.fixed_load_profile(),
        cfg.sessions(),
        cfg.engine.eta,
        cfg.engine.max_sweeps,
        cfg.engine.stabilizer_tolerance,
    );
    let report = engine.run(FleetSchedule::random(cfg.vehicles.len(), cfg.engine.seed));

    assert!(report.degraded.is_empty());
    for (j, session) in cfg.sessions().iter().enumerate() {
        let row = report.schedule.row(j);
        let delivered: f64 = row.iter().sum::<f64>() * SLOT_HOURS;
        assert!(
            (delivered - session.energy_need_kwh).abs() <= 0.2 * SLOT_HOURS + 1e-9,
            "vehicle {j} delivered {delivered} of {}",
            session.energy_need_kwh
        );
        for slot in 0..SLOTS_PER_DAY {
            assert!(row[slot] <= session.max_power_kw + 1e-9);
            if !session.contains(slot) {
                assert_eq!(row[slot], 0.0, "vehicle {j} charged outside window");
            }
        }
    }
}

#[test]
fn infeasible_vehicle_degrades_without_aborting_the_fleet() {
    // vehicle 1's window holds 0.5 kWh at its cap
    let sessions = vec![
        common::overnight_session(8.0),
        fleet_charge::session::VehicleSession::new(0, 1, 50.0, 1.0),
    ];
    let engine = common::engine(WaterFilling::new(), common::flat_load(0.0), sessions);
    let report = engine.run(FleetSchedule::zeros(2));

    assert!(!report.degraded.is_empty());
    assert!(report.degraded.iter().all(|d| d.vehicle == 1));
    assert!(report.schedule.row(1).iter().all(|&p| p == 0.0));

    let delivered: f64 = report.schedule.row(0).iter().sum::<f64>() * SLOT_HOURS;
    assert!((delivered - 8.0).abs() <= 0.2 * SLOT_HOURS + 1e-9);
}
