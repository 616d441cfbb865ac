//! CSV readers for fixed-load profiles and vehicle session scenarios.

use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::config::VehicleConfig;
use crate::session::SLOTS_PER_DAY;

/// Data-file error with source description.
#[derive(Debug)]
pub struct DataError {
    /// What was being read (file path or stream description).
    pub source: String,
    /// Human-readable problem description.
    pub message: String,
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data error: {} — {}", self.source, self.message)
    }
}

impl std::error::Error for DataError {}

#[derive(Debug, Deserialize)]
struct LoadRow {
    slot: usize,
    load_kw: f64,
}

#[derive(Debug, Deserialize)]
struct SessionRow {
    arrival_slot: usize,
    departure_slot: usize,
    energy_need_kwh: f64,
}

/// Reads a 48-slot fixed-load profile from a CSV file with
/// `slot,load_kw` columns.
///
/// # Errors
///
/// Returns a [`DataError`] if the file cannot be read, a row does not
/// parse, slots are out of order, a load is negative, or the file does not
/// hold exactly 48 rows.
pub fn read_fixed_load_csv(path: &Path) -> Result<Vec<f64>, DataError> {
    let source = path.display().to_string();
    let mut rdr = csv::Reader::from_path(path).map_err(|e| DataError {
        source: source.clone(),
        message: e.to_string(),
    })?;

    let mut profile = Vec::with_capacity(SLOTS_PER_DAY);
    for (index, row) in rdr.deserialize::<LoadRow>().enumerate() {
        let row = row.map_err(|e| DataError {
            source: source.clone(),
            message: e.to_string(),
        })?;
        if row.slot != index {
            return Err(DataError {
                source,
                message: format!("expected slot {index}, found {}", row.slot),
            });
        }
        if row.load_kw < 0.0 {
            return Err(DataError {
                source,
                message: format!("negative load {} at slot {index}", row.load_kw),
            });
        }
        profile.push(row.load_kw);
    }

    if profile.len() != SLOTS_PER_DAY {
        return Err(DataError {
            source,
            message: format!("expected {SLOTS_PER_DAY} rows, found {}", profile.len()),
        });
    }
    Ok(profile)
}

/// Reads vehicle sessions from a CSV file with
/// `arrival_slot,departure_slot,energy_need_kwh` columns.
///
/// # Errors
///
/// Returns a [`DataError`] if the file cannot be read, a row does not
/// parse, or a slot index is out of range.
pub fn read_sessions_csv(path: &Path) -> Result<Vec<VehicleConfig>, DataError> {
    let source = path.display().to_string();
    let mut rdr = csv::Reader::from_path(path).map_err(|e| DataError {
        source: source.clone(),
        message: e.to_string(),
    })?;

    let mut vehicles = Vec::new();
    for (index, row) in rdr.deserialize::<SessionRow>().enumerate() {
        let row = row.map_err(|e| DataError {
            source: source.clone(),
            message: e.to_string(),
        })?;
        if row.arrival_slot >= SLOTS_PER_DAY || row.departure_slot >= SLOTS_PER_DAY {
            return Err(DataError {
                source,
                message: format!("row {index}: slot indices must be < {SLOTS_PER_DAY}"),
            });
        }
        vehicles.push(VehicleConfig {
            arrival_slot: row.arrival_slot,
            departure_slot: row.departure_slot,
            energy_need_kwh: row.energy_need_kwh,
        });
    }
    Ok(vehicles)
}
