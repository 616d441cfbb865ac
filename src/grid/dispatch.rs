//! Merit-order dispatch: load in, emissions and marginal rate out.

use crate::session::SLOT_HOURS;

use super::stack::GenerationStack;

/// Grams per ton, for emission mass conversion.
const GRAMS_PER_TON: f64 = 1e6;

/// Outcome of dispatching one instantaneous load against the stack.
#[derive(Debug, Clone)]
pub struct DispatchResult {
    /// Production per technology, in stack order (kW).
    pub production_kw: Vec<f64>,
    /// Total production across the stack (kW).
    pub served_kw: f64,
    /// Demand left unserved when the load exceeds total capacity (kW).
    pub shortfall_kw: f64,
    /// Emissions of serving this load for one slot (tons CO2).
    pub emissions_tons: f64,
}

/// Pure emissions model over a fixed generation stack.
///
/// Stateless beyond the immutable stack passed in at construction; every
/// query walks the same precomputed merit order.
#[derive(Debug, Clone)]
pub struct DispatchModel {
    stack: GenerationStack,
}

impl DispatchModel {
    /// Creates a model over the given stack.
    pub fn new(stack: GenerationStack) -> Self {
        Self { stack }
    }

    /// Returns the underlying stack.
    pub fn stack(&self) -> &GenerationStack {
        &self.stack
    }

    /// Dispatches `load_kw` through the merit order.
    ///
    /// Each technology supplies `min(capacity, remaining)`; the walk stops
    /// once the load is served. Load above total stack capacity is left
    /// unserved and unattributed: it appears in `shortfall_kw` and
    /// contributes no emissions. Callers must pass `load_kw >= 0`.
    pub fn dispatch(&self, load_kw: f64) -> DispatchResult {
        let mut production_kw = vec![0.0; self.stack.len()];
        let mut emissions_g = 0.0;
        let mut remaining = load_kw;

        for (i, tech) in self.stack.technologies().iter().enumerate() {
            if remaining <= 0.0 {
                break;
            }
            let produced = tech.capacity_kw.min(remaining);
            production_kw[i] = produced;
            emissions_g += produced * SLOT_HOURS * tech.intensity_g_per_kwh;
            remaining -= produced;
        }

        DispatchResult {
            production_kw,
            served_kw: load_kw - remaining.max(0.0),
            shortfall_kw: remaining.max(0.0),
            emissions_tons: emissions_g / GRAMS_PER_TON,
        }
    }

    /// Emission intensity of the technology serving the next load increment
    /// (gCO2/kWh).
    ///
    /// This is the discrete sub-gradient of [`DispatchModel::dispatch`] with
    /// respect to load. Above total capacity it stays at the last block's
    /// intensity.
    pub fn marginal_rate(&self, load_kw: f64) -> f64 {
        self.stack.technologies()[self.stack.block_index(load_kw)].intensity_g_per_kwh
    }

    /// Emissions of one slot at the given load (tons CO2).
    pub fn slot_emissions_tons(&self, load_kw: f64) -> f64 {
        self.dispatch(load_kw).emissions_tons
    }

    /// Emissions of a whole daily load profile (tons CO2).
    pub fn profile_emissions_tons(&self, profile_kw: &[f64]) -> f64 {
        profile_kw
            .iter()
            .map(|&load| self.slot_emissions_tons(load))
            .sum()
    }

    /// Cost of one kW charged for one slot inside the given block
    /// (tons CO2 per kW-slot).
    pub fn block_cost_tons_per_kw(&self, block: usize) -> f64 {
        self.stack.technologies()[block].intensity_g_per_kwh * SLOT_HOURS / GRAMS_PER_TON
    }
}
