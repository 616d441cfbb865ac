//! Shared test fixtures for integration tests.

use fleet_charge::engine::BestResponseEngine;
use fleet_charge::grid::{DispatchModel, GenerationStack, Technology};
use fleet_charge::session::{SLOTS_PER_DAY, VehicleSession};
use fleet_charge::solver::ChargingStrategy;

/// Small three-technology stack with one free band and two priced bands.
pub fn small_stack() -> GenerationStack {
    GenerationStack::new(vec![
        Technology::new("clean", 100.0, 0.0),
        Technology::new("mid", 50.0, 400.0),
        Technology::new("dirty", 50.0, 900.0),
    ])
}

/// Dispatch model over [`small_stack`].
pub fn small_model() -> DispatchModel {
    DispatchModel::new(small_stack())
}

/// The original study's single-vehicle session: overnight window
/// (18:00 to 07:00), 8 kWh at a 7 kW cap.
pub fn overnight_session(energy_need_kwh: f64) -> VehicleSession {
    VehicleSession::new(36, 14, energy_need_kwh, 7.0)
}

/// Flat 48-slot load profile.
pub fn flat_load(kw: f64) -> Vec<f64> {
    vec![kw; SLOTS_PER_DAY]
}

/// Engine over [`small_model`] with the default tolerances
/// (`eta = 1e-2`, `K = 100`, stabilizer `1e-9`).
pub fn engine<S: ChargingStrategy>(
    strategy: S,
    fixed_load_kw: Vec<f64>,
    sessions: Vec<VehicleSession>,
) -> BestResponseEngine<S> {
    BestResponseEngine::new(small_model(), strategy, fixed_load_kw, sessions, 1e-2, 100, 1e-9)
}
