//! Single-vehicle charging solvers.
//!
//! Three interchangeable strategies share one contract: given the background
//! load created by everyone else, a session, and the dispatch model, produce
//! a 48-slot charging profile or a structured failure.

pub mod linear;
pub mod milp;
pub mod water_filling;

pub use linear::LinearProgram;
pub use milp::MeritOrderMilp;
pub use water_filling::WaterFilling;

use std::error::Error;
use std::fmt;

use crate::grid::DispatchModel;
use crate::session::{SLOTS_PER_DAY, VehicleSession};

/// Failure of one single-vehicle solve.
///
/// These are per-vehicle conditions: the engine degrades the offending
/// vehicle for the current sweep and carries on. Only configuration errors
/// abort a run.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveError {
    /// The energy need cannot fit in the availability window at the power
    /// cap.
    Infeasible {
        need_kwh: f64,
        deliverable_kwh: f64,
    },
    /// The water-filling loop ran out of eligible slots before the need was
    /// met.
    Degenerate { delivered_kwh: f64 },
    /// The LP/MILP backend returned a non-optimal status.
    Solver(String),
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Infeasible {
                need_kwh,
                deliverable_kwh,
            } => write!(
                f,
                "infeasible session: needs {need_kwh:.3} kWh but the window holds {deliverable_kwh:.3} kWh"
            ),
            Self::Degenerate { delivered_kwh } => write!(
                f,
                "water-filling exhausted all eligible slots after {delivered_kwh:.3} kWh"
            ),
            Self::Solver(status) => write!(f, "solver failure: {status}"),
        }
    }
}

impl Error for SolveError {}

/// Rejects sessions whose energy need exceeds the window's deliverable
/// energy, so solvers fail before handing an overconstrained equality to a
/// backend.
pub(crate) fn check_feasible(session: &VehicleSession) -> Result<(), SolveError> {
    if session.is_feasible() {
        Ok(())
    } else {
        Err(SolveError::Infeasible {
            need_kwh: session.energy_need_kwh,
            deliverable_kwh: session.max_deliverable_kwh(),
        })
    }
}

/// One single-vehicle charging strategy.
pub trait ChargingStrategy {
    /// Computes a 48-slot charging profile (kW) for `session` against the
    /// fixed `background_kw` load profile.
    ///
    /// The profile is zero outside the availability window and never exceeds
    /// the session power cap.
    ///
    /// # Errors
    ///
    /// Returns a [`SolveError`] when the session is infeasible or the solve
    /// fails; callers treat this as a degraded, non-fatal outcome.
    fn plan(
        &self,
        model: &DispatchModel,
        background_kw: &[f64],
        session: &VehicleSession,
    ) -> Result<Vec<f64>, SolveError>;

    /// Whether the engine should damp near-equal-cost re-solves of this
    /// strategy (the optimization-based strategies oscillate between
    /// solutions of numerically identical cost; the heuristic does not).
    fn uses_stabilizer(&self) -> bool {
        false
    }
}

/// Strategy selector, parsed from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Greedy water-filling heuristic.
    WaterFilling,
    /// Continuous LP relaxation with frozen marginal costs.
    LinearProgram,
    /// Exact merit-order MILP.
    MeritOrderMilp,
}

impl Strategy {
    /// Recognized configuration names, in display order.
    pub const NAMES: &[&str] = &["water-filling", "lp", "milp"];

    /// Parses a configuration name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "water-filling" => Some(Self::WaterFilling),
            "lp" => Some(Self::LinearProgram),
            "milp" => Some(Self::MeritOrderMilp),
            _ => None,
        }
    }

    /// The configuration name of this strategy.
    pub fn name(self) -> &'static str {
        match self {
            Self::WaterFilling => "water-filling",
            Self::LinearProgram => "lp",
            Self::MeritOrderMilp => "milp",
        }
    }
}

impl ChargingStrategy for Strategy {
    fn plan(
        &self,
        model: &DispatchModel,
        background_kw: &[f64],
        session: &VehicleSession,
    ) -> Result<Vec<f64>, SolveError> {
        match self {
            Self::WaterFilling => WaterFilling::default().plan(model, background_kw, session),
            Self::LinearProgram => LinearProgram.plan(model, background_kw, session),
            Self::MeritOrderMilp => MeritOrderMilp.plan(model, background_kw, session),
        }
    }

    fn uses_stabilizer(&self) -> bool {
        match self {
            Self::WaterFilling => false,
            Self::LinearProgram | Self::MeritOrderMilp => true,
        }
    }
}

/// Asserts the shared background-profile length once, in one place.
pub(crate) fn check_background(background_kw: &[f64]) {
    assert_eq!(background_kw.len(), SLOTS_PER_DAY);
}
