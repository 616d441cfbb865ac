//! Best-response dynamics over the vehicle fleet.

use crate::grid::DispatchModel;
use crate::schedule::FleetSchedule;
use crate::session::{SLOT_HOURS, SLOTS_PER_DAY, VehicleSession};
use crate::solver::{ChargingStrategy, SolveError};

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    /// Total variation fell below the tolerance after this many sweeps.
    Converged { sweeps: usize },
    /// The sweep budget ran out before the schedule stabilized.
    BudgetExhausted,
}

impl EngineStatus {
    /// Returns `true` for a converged run.
    pub fn is_converged(&self) -> bool {
        matches!(self, Self::Converged { .. })
    }
}

/// One sweep's displacement of the fleet schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationRecord {
    /// 1-based sweep index.
    pub sweep: usize,
    /// Sum of squared cell differences against the schedule before the
    /// sweep.
    pub total_variation: f64,
}

/// A vehicle whose solve failed during one sweep; its row was left
/// unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct DegradedVehicle {
    pub vehicle: usize,
    pub sweep: usize,
    pub error: SolveError,
}

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct EngineReport {
    /// Final fleet schedule (converged or best-so-far).
    pub schedule: FleetSchedule,
    pub status: EngineStatus,
    /// Per-sweep total-variation trace.
    pub trace: Vec<IterationRecord>,
    /// Solver failures, in the order they occurred.
    pub degraded: Vec<DegradedVehicle>,
}

/// Best-response engine: repeatedly re-solves each vehicle against the load
/// created by everyone else until the fleet schedule stabilizes.
///
/// Updates are Gauss-Seidel: vehicles are visited in ascending index order
/// and each new row is immediately visible to the vehicles after it in the
/// same sweep. The update order is part of the observable contract: it
/// changes the trajectory, so it must not be parallelized away.
///
/// Generic over `S: ChargingStrategy` for static dispatch; pass a
/// [`crate::solver::Strategy`] for the config-selected dynamic form.
pub struct BestResponseEngine<S: ChargingStrategy> {
    model: DispatchModel,
    strategy: S,
    fixed_load_kw: Vec<f64>,
    sessions: Vec<VehicleSession>,
    eta: f64,
    max_sweeps: usize,
    stabilizer_tolerance_tons: f64,
}

impl<S: ChargingStrategy> BestResponseEngine<S> {
    /// Creates an engine.
    ///
    /// # Arguments
    ///
    /// * `model` - Dispatch/emissions model
    /// * `strategy` - Single-vehicle solver strategy
    /// * `fixed_load_kw` - Exogenous 48-slot load profile (kW)
    /// * `sessions` - One session per vehicle
    /// * `eta` - Convergence threshold on total variation
    /// * `max_sweeps` - Sweep budget `K` (0 performs no sweeps)
    /// * `stabilizer_tolerance_tons` - Marginal-emissions delta below which
    ///   a re-solve is discarded (optimization strategies only)
    ///
    /// # Panics
    ///
    /// Panics if the fixed load is not 48 non-negative values, or a
    /// tolerance is negative.
    pub fn new(
        model: DispatchModel,
        strategy: S,
        fixed_load_kw: Vec<f64>,
        sessions: Vec<VehicleSession>,
        eta: f64,
        max_sweeps: usize,
        stabilizer_tolerance_tons: f64,
    ) -> Self {
        assert_eq!(fixed_load_kw.len(), SLOTS_PER_DAY);
        assert!(fixed_load_kw.iter().all(|&load| load >= 0.0));
        assert!(eta >= 0.0);
        assert!(stabilizer_tolerance_tons >= 0.0);

        Self {
            model,
            strategy,
            fixed_load_kw,
            sessions,
            eta,
            max_sweeps,
            stabilizer_tolerance_tons,
        }
    }

    /// Returns the dispatch model.
    pub fn model(&self) -> &DispatchModel {
        &self.model
    }

    /// Returns the exogenous fixed load.
    pub fn fixed_load_kw(&self) -> &[f64] {
        &self.fixed_load_kw
    }

    /// Runs best-response dynamics from the given starting schedule.
    ///
    /// # Panics
    ///
    /// Panics if the schedule's vehicle count differs from the session
    /// count.
    pub fn run(&self, initial: FleetSchedule) -> EngineReport {
        assert_eq!(initial.vehicles(), self.sessions.len());

        let mut profile = initial;
        let mut trace = Vec::new();
        let mut degraded = Vec::new();
        let mut status = EngineStatus::BudgetExhausted;

        for sweep in 1..=self.max_sweeps {
            let before = profile.clone();
            // running column sums, updated as rows change mid-sweep
            let mut aggregate = profile.total_load_kw();

            for j in 0..self.sessions.len() {
                let row = profile.row(j);
                let background: Vec<f64> = (0..SLOTS_PER_DAY)
                    .map(|slot| self.fixed_load_kw[slot] + aggregate[slot] - row[slot])
                    .collect();

                match self.strategy.plan(&self.model, &background, &self.sessions[j]) {
                    Ok(candidate) => {
                        if self.strategy.uses_stabilizer()
                            && self.marginal_delta_tons(&background, row, &candidate).abs()
                                < self.stabilizer_tolerance_tons
                        {
                            continue;
                        }
                        for slot in 0..SLOTS_PER_DAY {
                            aggregate[slot] += candidate[slot] - row[slot];
                        }
                        profile.set_row(j, candidate);
                    }
                    Err(error) => degraded.push(DegradedVehicle {
                        vehicle: j,
                        sweep,
                        error,
                    }),
                }
            }

            let total_variation = profile.total_variation(&before);
            trace.push(IterationRecord {
                sweep,
                total_variation,
            });
            if total_variation < self.eta {
                status = EngineStatus::Converged { sweeps: sweep };
                break;
            }
        }

        EngineReport {
            schedule: profile,
            status,
            trace,
            degraded,
        }
    }

    /// Marginal-emissions difference between a candidate row and the current
    /// row, priced at the background load (tons CO2).
    ///
    /// Damps the oscillation between near-equal-cost optima that the LP and
    /// MILP strategies otherwise bounce between.
    fn marginal_delta_tons(&self, background_kw: &[f64], old: &[f64], new: &[f64]) -> f64 {
        (0..SLOTS_PER_DAY)
            .map(|slot| {
                self.model.marginal_rate(background_kw[slot])
                    * (new[slot] - old[slot])
                    * SLOT_HOURS
                    / 1e6
            })
            .sum()
    }
}
