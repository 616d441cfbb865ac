//! CSV export for fleet schedules and iteration traces.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::engine::IterationRecord;
use crate::schedule::FleetSchedule;
use crate::session::SLOTS_PER_DAY;

/// Fixed columns preceding the per-vehicle columns in a schedule export.
const SCHEDULE_HEADER_PREFIX: &str = "slot,fixed_kw,fleet_kw,total_kw";

/// Column header for iteration-trace export.
const TRACE_HEADER: &str = "sweep,total_variation";

/// Exports a fleet schedule to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_schedule_csv(
    schedule: &FleetSchedule,
    fixed_load_kw: &[f64],
    path: &Path,
) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_schedule_csv(schedule, fixed_load_kw, buf)
}

/// Writes a fleet schedule as CSV: one row per slot, aggregate columns
/// first, then one column per vehicle. Produces deterministic output for
/// identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_schedule_csv(
    schedule: &FleetSchedule,
    fixed_load_kw: &[f64],
    writer: impl Write,
) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    let mut header: Vec<String> = SCHEDULE_HEADER_PREFIX
        .split(',')
        .map(str::to_string)
        .collect();
    for j in 0..schedule.vehicles() {
        header.push(format!("ev_{j}"));
    }
    wtr.write_record(&header)?;

    let fleet = schedule.total_load_kw();
    for slot in 0..SLOTS_PER_DAY {
        let mut record = vec![
            slot.to_string(),
            format!("{:.4}", fixed_load_kw[slot]),
            format!("{:.4}", fleet[slot]),
            format!("{:.4}", fixed_load_kw[slot] + fleet[slot]),
        ];
        for j in 0..schedule.vehicles() {
            record.push(format!("{:.4}", schedule.row(j)[slot]));
        }
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports an iteration trace to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_trace_csv(trace: &[IterationRecord], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_trace_csv(trace, buf)
}

/// Writes an iteration trace as CSV.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_trace_csv(trace: &[IterationRecord], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(TRACE_HEADER.split(','))?;
    for record in trace {
        wtr.write_record(&[record.sweep.to_string(), format!("{:.6}", record.total_variation)])?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schedule() -> FleetSchedule {
        let mut row0 = vec![0.0; SLOTS_PER_DAY];
        row0[0] = 3.5;
        let mut row1 = vec![0.0; SLOTS_PER_DAY];
        row1[1] = 7.0;
        FleetSchedule::from_rows(vec![row0, row1])
    }

    #[test]
    fn schedule_header_has_vehicle_columns() {
        let mut buf = Vec::new();
        write_schedule_csv(&sample_schedule(), &vec![10.0; SLOTS_PER_DAY], &mut buf).ok();
        let output = String::from_utf8(buf).ok();
        let first_line = output.as_deref().unwrap_or("").lines().next().unwrap_or("");
        assert_eq!(first_line, "slot,fixed_kw,fleet_kw,total_kw,ev_0,ev_1");
    }

    #[test]
    fn schedule_row_count_is_one_per_slot() {
        let mut buf = Vec::new();
        write_schedule_csv(&sample_schedule(), &vec![10.0; SLOTS_PER_DAY], &mut buf).ok();
        let output = String::from_utf8(buf).ok();
        let lines = output.as_deref().unwrap_or("").lines().count();
        assert_eq!(lines, 1 + SLOTS_PER_DAY);
    }

    #[test]
    fn schedule_aggregates_add_up() {
        let mut buf = Vec::new();
        write_schedule_csv(&sample_schedule(), &vec![10.0; SLOTS_PER_DAY], &mut buf).ok();
        let output = String::from_utf8(buf).unwrap_or_default();
        let row0: Vec<&str> = output.lines().nth(1).unwrap_or("").split(',').collect();
        assert_eq!(row0[0], "0");
        assert_eq!(row0[1], "10.0000");
        assert_eq!(row0[2], "3.5000");
        assert_eq!(row0[3], "13.5000");
        assert_eq!(row0[4], "3.5000");
        assert_eq!(row0[5], "0.0000");
    }

    #[test]
    fn deterministic_output() {
        let schedule = sample_schedule();
        let fixed = vec![10.0; SLOTS_PER_DAY];
        let mut buf1 = Vec::new();
        let mut buf2 = Vec::new();
        write_schedule_csv(&schedule, &fixed, &mut buf1).ok();
        write_schedule_csv(&schedule, &fixed, &mut buf2).ok();
        assert_eq!(buf1, buf2);
    }

    #[test]
    fn trace_round_trip_parseable() {
        let trace = vec![
            IterationRecord {
                sweep: 1,
                total_variation: 12.5,
            },
            IterationRecord {
                sweep: 2,
                total_variation: 0.003,
            },
        ];
        let mut buf = Vec::new();
        write_trace_csv(&trace, &mut buf).ok();

        let mut rdr = csv::ReaderBuilder::new().from_reader(buf.as_slice());
        let headers = rdr.headers().cloned().ok();
        assert_eq!(headers.as_ref().map(csv::StringRecord::len), Some(2));

        let mut rows = 0;
        for record in rdr.records() {
            let rec = record.ok();
            assert!(rec.is_some(), "every row should parse");
            let rec = rec.as_ref();
            let tv: Result<f64, _> = rec.unwrap()[1].parse();
            assert!(tv.is_ok(), "total_variation should parse as f64");
            rows += 1;
        }
        assert_eq!(rows, 2);
    }

    #[test]
    fn empty_trace_writes_header_only() {
        let mut buf = Vec::new();
        write_trace_csv(&[], &mut buf).ok();
        let output = String::from_utf8(buf).unwrap_or_default();
        assert_eq!(output.lines().count(), 1);
    }
}
