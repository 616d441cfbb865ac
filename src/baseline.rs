//! Non-strategic reference charging heuristics.
//!
//! Comparison baselines only: neither looks at the grid or at other
//! vehicles, so they sit outside the best-response engine.

use crate::schedule::FleetSchedule;
use crate::session::{SLOT_HOURS, SLOTS_PER_DAY, VehicleSession};

/// First slot of the off-peak tariff period (23:00).
pub const OFF_PEAK_START_SLOT: usize = 44;

/// Charges at full power from the arrival slot until the need is met.
pub fn plug_and_charge(session: &VehicleSession) -> Vec<f64> {
    charge_through(session, session.window_slots())
}

/// Charges at full power, but overnight sessions wait for the off-peak
/// period: charging starts no earlier than slot 44.
pub fn off_peak(session: &VehicleSession) -> Vec<f64> {
    if !session.is_overnight() {
        return plug_and_charge(session);
    }
    let start = session.arrival_slot.max(OFF_PEAK_START_SLOT);
    let slots = (start..SLOTS_PER_DAY)
        .chain(0..session.departure_slot)
        .collect();
    charge_through(session, slots)
}

/// One plug-and-charge row per session.
pub fn plug_and_charge_fleet(sessions: &[VehicleSession]) -> FleetSchedule {
    FleetSchedule::from_rows(sessions.iter().map(plug_and_charge).collect())
}

/// One off-peak row per session.
pub fn off_peak_fleet(sessions: &[VehicleSession]) -> FleetSchedule {
    FleetSchedule::from_rows(sessions.iter().map(off_peak).collect())
}

fn charge_through(session: &VehicleSession, slots: Vec<usize>) -> Vec<f64> {
    let mut schedule = vec![0.0; SLOTS_PER_DAY];
    let mut remaining_kwh = session.energy_need_kwh;

    for slot in slots {
        if remaining_kwh <= 0.0 {
            break;
        }
        let power = session.max_power_kw.min(remaining_kwh / SLOT_HOURS);
        schedule[slot] = power;
        remaining_kwh -= power * SLOT_HOURS;
    }
    schedule
}
