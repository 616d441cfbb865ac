//! Daily time grid and vehicle charging sessions.

/// Number of half-hour slots in one simulated day.
pub const SLOTS_PER_DAY: usize = 48;

/// Duration of one slot in hours.
pub const SLOT_HOURS: f64 = 0.5;

/// One vehicle's charging session for a single day.
///
/// The availability window is cyclic: a session with
/// `arrival_slot >= departure_slot` spans midnight (the vehicle plugs in
/// during the evening and leaves the next morning) and covers
/// `{i : i >= arrival_slot || i < departure_slot}`. Otherwise the window is
/// the contiguous `{i : arrival_slot <= i < departure_slot}`.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleSession {
    /// First slot at which the vehicle is connected.
    pub arrival_slot: usize,
    /// First slot at which the vehicle is gone (exclusive bound).
    pub departure_slot: usize,
    /// Energy the vehicle must receive before departure (kWh).
    pub energy_need_kwh: f64,
    /// Charger power cap (kW).
    pub max_power_kw: f64,
}

impl VehicleSession {
    /// Creates a new session.
    ///
    /// # Panics
    ///
    /// Panics if a slot index is out of range, the energy need is negative,
    /// or the power cap is not positive.
    pub fn new(
        arrival_slot: usize,
        departure_slot: usize,
        energy_need_kwh: f64,
        max_power_kw: f64,
    ) -> Self {
        assert!(arrival_slot < SLOTS_PER_DAY);
        assert!(departure_slot < SLOTS_PER_DAY);
        assert!(energy_need_kwh >= 0.0);
        assert!(max_power_kw > 0.0);

        Self {
            arrival_slot,
            departure_slot,
            energy_need_kwh,
            max_power_kw,
        }
    }

    /// Returns `true` when the window spans midnight.
    pub fn is_overnight(&self) -> bool {
        self.arrival_slot >= self.departure_slot
    }

    /// Returns `true` when the vehicle is connected during `slot`.
    pub fn contains(&self, slot: usize) -> bool {
        if self.is_overnight() {
            slot >= self.arrival_slot || slot < self.departure_slot
        } else {
            slot >= self.arrival_slot && slot < self.departure_slot
        }
    }

    /// Window slots in chronological order, starting at arrival and wrapping
    /// past midnight for overnight sessions.
    pub fn window_slots(&self) -> Vec<usize> {
        if self.is_overnight() {
            (self.arrival_slot..SLOTS_PER_DAY)
                .chain(0..self.departure_slot)
                .collect()
        } else {
            (self.arrival_slot..self.departure_slot).collect()
        }
    }

    /// Number of slots in the availability window.
    pub fn window_len(&self) -> usize {
        if self.is_overnight() {
            SLOTS_PER_DAY - self.arrival_slot + self.departure_slot
        } else {
            self.departure_slot - self.arrival_slot
        }
    }

    /// Maximum energy deliverable inside the window at the power cap (kWh).
    pub fn max_deliverable_kwh(&self) -> f64 {
        self.max_power_kw * SLOT_HOURS * self.window_len() as f64
    }

    /// Returns `true` when the energy need fits inside the window.
    pub fn is_feasible(&self) -> bool {
        self.energy_need_kwh <= self.max_deliverable_kwh()
    }

    /// Returns a copy with the energy need scaled by `multiplier`.
    ///
    /// Used by fleet-size experiments where one simulated vehicle stands in
    /// for many real ones.
    pub fn scaled(&self, multiplier: f64) -> Self {
        Self {
            energy_need_kwh: self.energy_need_kwh * multiplier,
            ..self.clone()
        }
    }
}
