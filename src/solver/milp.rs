//! Exact single-vehicle optimization over the true merit-order cost.

use good_lp::{
    Expression, ProblemVariables, Solution, SolverModel, Variable, constraint, default_solver,
    variable,
};

use crate::grid::DispatchModel;
use crate::session::{SLOT_HOURS, SLOTS_PER_DAY, VehicleSession};

use super::{ChargingStrategy, SolveError, check_background, check_feasible};

/// One reachable capacity block at one slot.
struct Block {
    usage: Variable,
    /// Indicator that this block is opened; the first reachable block per
    /// slot needs none.
    open: Option<Variable>,
    headroom_kw: f64,
    cost_tons_per_kw: f64,
}

/// MILP strategy encoding the merit-order stack directly.
///
/// The background load at each window slot fixes a position between two
/// cumulative-capacity breakpoints; the vehicle's power first fills the rest
/// of that block, then the next, in stack order. Because block intensities
/// are not monotone along the merit order, contiguous filling has to be
/// enforced with binary indicators; otherwise the optimizer would skip an
/// expensive block and charge into a cleaner one further up the stack, which
/// the physical dispatch never does.
///
/// Load beyond the stack's total capacity is unserved and unattributed in
/// [`DispatchModel::dispatch`]; the encoding mirrors that with a final
/// zero-cost block above the stack top.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeritOrderMilp;

impl ChargingStrategy for MeritOrderMilp {
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

        let stack = model.stack();
        let cumulative = stack.cumulative_kw();
        let total_capacity = stack.total_capacity_kw();

        let mut vars = ProblemVariables::new();
        let mut slots: Vec<(usize, Vec<Block>)> = Vec::with_capacity(window.len());

        for &slot in &window {
            let background = background_kw[slot];
            let ceiling = background + session.max_power_kw;
            let mut blocks = Vec::new();

            let first = cumulative.iter().position(|&cum| background < cum);
            if let Some(first) = first {
                for b in first..stack.len() {
                    let floor = if b == 0 { 0.0 } else { cumulative[b - 1] };
                    let lo = background.max(floor);
                    let hi = cumulative[b].min(ceiling);
                    if hi <= lo {
                        break;
                    }
                    let headroom_kw = hi - lo;
                    let open = if blocks.is_empty() {
                        None
                    } else {
                        Some(vars.add(variable().binary()))
                    };
                    blocks.push(Block {
                        usage: vars.add(variable().min(0.0).max(headroom_kw)),
                        open,
                        headroom_kw,
                        cost_tons_per_kw: model.block_cost_tons_per_kw(b),
                    });
                }
            }

            // unattributed region above the stack top, mirroring the
            // permissive dispatch
            if ceiling > total_capacity {
                let lo = background.max(total_capacity);
                let headroom_kw = ceiling - lo;
                let open = if blocks.is_empty() {
                    None
                } else {
                    Some(vars.add(variable().binary()))
                };
                blocks.push(Block {
                    usage: vars.add(variable().min(0.0).max(headroom_kw)),
                    open,
                    headroom_kw,
                    cost_tons_per_kw: 0.0,
                });
            }

            slots.push((slot, blocks));
        }

        let objective = slots
            .iter()
            .flat_map(|(_, blocks)| blocks.iter())
            .map(|block| block.cost_tons_per_kw * block.usage)
            .sum::<Expression>();
        let energy = slots
            .iter()
            .flat_map(|(_, blocks)| blocks.iter())
            .map(|block| Expression::from(block.usage))
            .sum::<Expression>();
        let target = session.energy_need_kwh / SLOT_HOURS;

        let mut problem = vars
            .minimise(objective)
            .using(default_solver)
            .with(constraint!(energy == target));

        for (_, blocks) in &slots {
            for (k, block) in blocks.iter().enumerate() {
                if let Some(open) = block.open {
                    // usage only once opened, opening only in stack order,
                    // and only once the previous block is full
                    problem = problem.with(constraint!(block.usage <= block.headroom_kw * open));
                    let previous = &blocks[k - 1];
                    if let Some(previous_open) = previous.open {
                        problem = problem.with(constraint!(open <= previous_open));
                    }
                    problem = problem
                        .with(constraint!(previous.usage >= previous.headroom_kw * open));
                }
            }

            let slot_power = blocks
                .iter()
                .map(|block| Expression::from(block.usage))
                .sum::<Expression>();
            problem = problem.with(constraint!(slot_power <= session.max_power_kw));
        }

        let solution = problem
            .solve()
            .map_err(|e| SolveError::Solver(e.to_string()))?;

        let mut schedule = vec![0.0; SLOTS_PER_DAY];
        for (slot, blocks) in &slots {
            let power: f64 = blocks.iter().map(|block| solution.value(block.usage)).sum();
            schedule[*slot] = power.clamp(0.0, session.max_power_kw);
        }
        Ok(schedule)
    }

    fn uses_stabilizer(&self) -> bool {
        true
    }
}
