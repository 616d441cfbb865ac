//! Post-hoc emissions and convergence reporting.

use std::fmt;

use crate::engine::EngineReport;
use crate::grid::DispatchModel;
use crate::session::SLOTS_PER_DAY;

/// Aggregate results of one engine run, computed post-hoc from the final
/// schedule so the report always matches the returned data.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Emissions of the fixed load alone (tons CO2).
    pub baseline_tons: f64,
    /// Emissions of fixed load plus fleet charging (tons CO2).
    pub total_tons: f64,
    /// Emissions the fleet added on top of the baseline (tons CO2).
    pub added_tons: f64,
    /// Sweeps actually performed.
    pub sweeps_run: usize,
    /// Whether the run converged within budget.
    pub converged: bool,
    /// Total variation of the last sweep, if any sweep ran.
    pub final_total_variation: Option<f64>,
    /// Peak combined load over the day (kW).
    pub peak_load_kw: f64,
    /// Number of distinct vehicles that degraded at least once.
    pub degraded_vehicles: usize,
}

impl RunReport {
    /// Computes the report for a finished run.
    pub fn from_run(model: &DispatchModel, fixed_load_kw: &[f64], run: &EngineReport) -> Self {
        let fleet = run.schedule.total_load_kw();
        let combined: Vec<f64> = (0..SLOTS_PER_DAY)
            .map(|slot| fixed_load_kw[slot] + fleet[slot])
            .collect();

        let baseline_tons = model.profile_emissions_tons(fixed_load_kw);
        let total_tons = model.profile_emissions_tons(&combined);

        let mut degraded: Vec<usize> = run.degraded.iter().map(|d| d.vehicle).collect();
        degraded.sort_unstable();
        degraded.dedup();

        Self {
            baseline_tons,
            total_tons,
            added_tons: total_tons - baseline_tons,
            sweeps_run: run.trace.len(),
            converged: run.status.is_converged(),
            final_total_variation: run.trace.last().map(|r| r.total_variation),
            peak_load_kw: combined.iter().cloned().fold(0.0, f64::max),
            degraded_vehicles: degraded.len(),
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Run Report ---")?;
        writeln!(f, "Baseline emissions:   {:.4} t CO2", self.baseline_tons)?;
        writeln!(f, "Total emissions:      {:.4} t CO2", self.total_tons)?;
        writeln!(f, "Added by fleet:       {:.4} t CO2", self.added_tons)?;
        writeln!(f, "Peak combined load:   {:.2} kW", self.peak_load_kw)?;
        writeln!(
            f,
            "Sweeps:               {} ({})",
            self.sweeps_run,
            if self.converged {
                "converged"
            } else {
                "budget exhausted"
            }
        )?;
        if let Some(tv) = self.final_total_variation {
            writeln!(f, "Final variation:      {tv:.6}")?;
        }
        write!(f, "Degraded vehicles:    {}", self.degraded_vehicles)
    }
}
