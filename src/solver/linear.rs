//! Continuous LP relaxation with frozen marginal costs.

use good_lp::{Expression, ProblemVariables, Solution, SolverModel, constraint, default_solver, variable};

use crate::grid::DispatchModel;
use crate::session::{SLOT_HOURS, SLOTS_PER_DAY, VehicleSession};

use super::{ChargingStrategy, SolveError, check_background, check_feasible};

/// LP strategy: minimize `Σ c_i x_i` over the window slots, where `c_i` is
/// the marginal emission rate of the background load at slot `i`, frozen
/// once per solve.
///
/// This linearizes the true, load-dependent marginal cost: the LP treats the
/// current marginal technology's intensity as constant no matter how much
/// power the vehicle adds at that slot. The exact strategy
/// ([`super::MeritOrderMilp`]) removes that approximation.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearProgram;

impl ChargingStrategy for LinearProgram {
    fn plan(
        &self,
        model: &DispatchModel,
        background_kw: &[f64],
        session: &VehicleSession,
    ) -> Result<Vec<f64>, SolveError> {
        check_background(background_kw);
        check_feasible(session)?;

        let window = session.window_slots();
        if session.energy_need_kwh == 0.0 {
            return Ok(vec![0.0; SLOTS_PER_DAY]);
        }

        // tons CO2 per kW-slot, evaluated at the background load
        let costs: Vec<f64> = window
            .iter()
            .map(|&slot| model.marginal_rate(background_kw[slot]) * SLOT_HOURS / 1e6)
            .collect();

        let mut vars = ProblemVariables::new();
        let x = vars.add_vector(
            variable().min(0.0).max(session.max_power_kw),
            window.len(),
        );

        let objective = x
            .iter()
            .zip(&costs)
            .map(|(&xi, &ci)| ci * xi)
            .sum::<Expression>();
        let total = x.iter().map(|&xi| Expression::from(xi)).sum::<Expression>();
        let target = session.energy_need_kwh / SLOT_HOURS;

        let solution = vars
            .minimise(objective)
            .using(default_solver)
            .with(constraint!(total == target))
            .solve()
            .map_err(|e| SolveError::Solver(e.to_string()))?;

        let mut schedule = vec![0.0; SLOTS_PER_DAY];
        for (k, &slot) in window.iter().enumerate() {
            // clamp solver noise out of the non-negativity bound
            schedule[slot] = solution.value(x[k]).max(0.0);
        }
        Ok(schedule)
    }

    fn uses_stabilizer(&self) -> bool {
        true
    }
}
