//! Fleet schedule matrix: one charging profile row per vehicle.

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::session::SLOTS_PER_DAY;

/// J×48 matrix of charging powers (kW), one row per vehicle.
///
/// The best-response engine owns exactly one of these for the duration of a
/// run and mutates it row by row; everyone else reads it as plain data.
#[derive(Debug, Clone, PartialEq)]
pub struct FleetSchedule {
    rows: Vec<Vec<f64>>,
}

impl FleetSchedule {
    /// All-zero schedule for `vehicles` vehicles.
    pub fn zeros(vehicles: usize) -> Self {
        Self {
            rows: vec![vec![0.0; SLOTS_PER_DAY]; vehicles],
        }
    }

    /// Schedule from explicit rows.
    ///
    /// # Panics
    ///
    /// Panics if any row is not exactly [`SLOTS_PER_DAY`] long or contains a
    /// negative value.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Self {
        for row in &rows {
            assert_eq!(row.len(), SLOTS_PER_DAY);
            assert!(row.iter().all(|&p| p >= 0.0));
        }
        Self { rows }
    }

    /// Random starting schedule with values in `[0, 1)` kW, reproducible for
    /// a fixed seed.
    pub fn random(vehicles: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let rows = (0..vehicles)
            .map(|_| (0..SLOTS_PER_DAY).map(|_| rng.random::<f64>()).collect())
            .collect();
        Self { rows }
    }

    /// Number of vehicles (rows).
    pub fn vehicles(&self) -> usize {
        self.rows.len()
    }

    /// Charging profile of vehicle `j`.
    pub fn row(&self, j: usize) -> &[f64] {
        &self.rows[j]
    }

    /// Replaces the charging profile of vehicle `j`.
    ///
    /// # Panics
    ///
    /// Panics if the row is not exactly [`SLOTS_PER_DAY`] long.
    pub fn set_row(&mut self, j: usize, row: Vec<f64>) {
        assert_eq!(row.len(), SLOTS_PER_DAY);
        self.rows[j] = row;
    }

    /// Per-slot sum over all vehicles (kW).
    pub fn total_load_kw(&self) -> Vec<f64> {
        let mut total = vec![0.0; SLOTS_PER_DAY];
        for row in &self.rows {
            for (slot, power) in row.iter().enumerate() {
                total[slot] += power;
            }
        }
        total
    }

    /// Sum of squared cell differences against another schedule.
    ///
    /// # Panics
    ///
    /// Panics if the schedules have different vehicle counts.
    pub fn total_variation(&self, other: &FleetSchedule) -> f64 {
        assert_eq!(self.vehicles(), other.vehicles());
        self.rows
            .iter()
            .zip(&other.rows)
            .flat_map(|(a, b)| a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)))
            .sum()
    }
}
