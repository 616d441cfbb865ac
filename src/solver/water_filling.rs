//! Greedy water-filling heuristic.

use crate::grid::DispatchModel;
use crate::session::{SLOT_HOURS, SLOTS_PER_DAY, VehicleSession};

use super::{ChargingStrategy, SolveError, check_background};

/// Divisor applied to the power cap to derive the default fill increment
/// (7 kW cap gives the original 0.2 kW step).
const DEFAULT_INCREMENT_DIVISOR: f64 = 35.0;

/// Water-filling strategy: repeatedly add a small power increment to the
/// eligible slot whose combined load (background plus own charging so far)
/// is currently lowest, flattening the profile without any cost model.
#[derive(Debug, Clone, Copy, Default)]
pub struct WaterFilling {
    increment_kw: Option<f64>,
}

impl WaterFilling {
    /// Strategy with the default increment, `max_power / 35` per session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Strategy with a fixed fill increment.
    ///
    /// # Panics
    ///
    /// Panics if the increment is not positive.
    pub fn with_increment(increment_kw: f64) -> Self {
        assert!(increment_kw > 0.0);
        Self {
            increment_kw: Some(increment_kw),
        }
    }

    fn increment_for(&self, session: &VehicleSession) -> f64 {
        self.increment_kw
            .unwrap_or(session.max_power_kw / DEFAULT_INCREMENT_DIVISOR)
    }
}

impl ChargingStrategy for WaterFilling {
    fn plan(
        &self,
        _model: &DispatchModel,
        background_kw: &[f64],
        session: &VehicleSession,
    ) -> Result<Vec<f64>, SolveError> {
        check_background(background_kw);

        let mut level = vec![0.0; SLOTS_PER_DAY];
        // work in kW-slot units: one slot at 1 kW delivers SLOT_HOURS kWh
        let target = session.energy_need_kwh / SLOT_HOURS;
        let increment = self.increment_for(session);
        let mut delivered = 0.0;

        while delivered < target {
            // lowest combined load among eligible slots, first index on ties
            let mut best: Option<(usize, f64)> = None;
            for slot in 0..SLOTS_PER_DAY {
                if !session.contains(slot) || level[slot] >= session.max_power_kw {
                    continue;
                }
                let combined = background_kw[slot] + level[slot];
                if best.is_none_or(|(_, lowest)| combined < lowest) {
                    best = Some((slot, combined));
                }
            }

            let Some((slot, _)) = best else {
                return Err(SolveError::Degenerate {
                    delivered_kwh: delivered * SLOT_HOURS,
                });
            };

            let step = increment.min(session.max_power_kw - level[slot]);
            level[slot] += step;
            delivered += step;
        }

        Ok(level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{GenerationStack, Technology};

    fn model() -> DispatchModel {
        DispatchModel::new(GenerationStack::new(vec![Technology::new(
            "flat", 1e6, 100.0,
        )]))
    }

    fn flat_background(kw: f64) -> Vec<f64> {
        vec![kw; SLOTS_PER_DAY]
    }

    #[test]
    fn spreads_evenly_over_tied_slots() {
        // the original single-vehicle scenario: overnight window of 26 slots,
        // zero background, all slots tied
        let session = VehicleSession::new(36, 14, 8.0, 7.0);
        let schedule = WaterFilling::new()
            .plan(&model(), &flat_background(0.0), &session)
            .unwrap();

        let delivered: f64 = schedule.iter().sum::<f64>() * SLOT_HOURS;
        assert!((delivered - 8.0).abs() <= 0.2 * SLOT_HOURS + 1e-9);

        // 16 kW-slots spread over 26 tied slots in 0.2 kW steps: every
        // window slot ends within one increment of every other
        let window: Vec<f64> = session.window_slots().iter().map(|&s| schedule[s]).collect();
        let lo = window.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = window.iter().cloned().fold(0.0, f64::max);
        assert!(hi - lo <= 0.2 + 1e-9);

        for slot in 0..SLOTS_PER_DAY {
            if !session.contains(slot) {
                assert_eq!(schedule[slot], 0.0);
            }
        }
    }

    #[test]
    fn fills_valleys_first() {
        let session = VehicleSession::new(0, 4, 2.0, 7.0);
        let mut background = flat_background(10.0);
        background[2] = 0.0; // deep valley
        let schedule = WaterFilling::new()
            .plan(&model(), &background, &session)
            .unwrap();

        // 2 kWh = 4 kW-slots; the valley is 10 kW deep so everything lands
        // in slot 2
        assert!((schedule[2] - 4.0).abs() < 1e-9);
        assert_eq!(schedule[0], 0.0);
        assert_eq!(schedule[1], 0.0);
        assert_eq!(schedule[3], 0.0);
    }

    #[test]
    fn respects_power_cap() {
        // window of 4 slots, tiny cap: everything saturates at the cap
        let session = VehicleSession::new(0, 4, 2.0, 1.0);
        let schedule = WaterFilling::new()
            .plan(&model(), &flat_background(0.0), &session)
            .unwrap();
        for slot in 0..4 {
            assert!(schedule[slot] <= 1.0 + 1e-12);
        }
        let delivered: f64 = schedule.iter().sum::<f64>() * SLOT_HOURS;
        assert!((delivered - 2.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_session_fails_instead_of_spinning() {
        // 1-slot window at 1 kW holds 0.5 kWh, need 5
        let session = VehicleSession::new(0, 1, 5.0, 1.0);
        let err = WaterFilling::new()
            .plan(&model(), &flat_background(0.0), &session)
            .unwrap_err();
        assert!(matches!(err, SolveError::Degenerate { .. }));
    }

    #[test]
    fn zero_need_returns_zero_schedule() {
        let session = VehicleSession::new(0, 4, 0.0, 7.0);
        let schedule = WaterFilling::new()
            .plan(&model(), &flat_background(3.0), &session)
            .unwrap();
        assert!(schedule.iter().all(|&p| p == 0.0));
    }

    #[test]
    fn ties_break_toward_lowest_slot() {
        let session = VehicleSession::new(0, 4, 0.1, 7.0);
        // single 0.2 kW increment: lands on the first of the tied slots
        let schedule = WaterFilling::new()
            .plan(&model(), &flat_background(5.0), &session)
            .unwrap();
        assert!(schedule[0] > 0.0);
        assert_eq!(schedule[1], 0.0);
    }

    #[test]
    fn fixed_increment_overrides_default() {
        let session = VehicleSession::new(0, 4, 1.0, 7.0);
        let schedule = WaterFilling::with_increment(0.5)
            .plan(&model(), &flat_background(0.0), &session)
            .unwrap();
        // 2 kW-slots in 0.5 kW steps: four increments
        let steps: usize = schedule.iter().map(|&p| (p / 0.5).round() as usize).sum();
        assert_eq!(steps, 4);
    }
}
