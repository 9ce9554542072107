//! CSV input traces and state output.
//!
//! Input files are comma separated with a header row naming at least the
//! `power` (W) and `ambient_temperature` (K) columns; an optional `time` (s)
//! column is checked for monotonicity. Column order is free, blank lines and
//! lines starting with `#` are skipped.

use crate::{ProjectError, ProjectResult};
use lion_sim::SimState;
use std::io::Write;
use std::path::Path;

/// Power and ambient temperature samples, one per simulation step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputTrace {
    pub time: Option<Vec<f64>>,
    pub power: Vec<f64>,
    pub ambient_temperature: Vec<f64>,
}

impl InputTrace {
    pub fn len(&self) -> usize {
        self.power.len()
    }

    pub fn is_empty(&self) -> bool {
        self.power.is_empty()
    }

    /// Largest deviation of the time column spacing from `step_seconds`,
    /// `None` without a time column.
    pub fn spacing_error(&self, step_seconds: f64) -> Option<f64> {
        let time = self.time.as_ref()?;
        Some(
            time.windows(2)
                .map(|w| ((w[1] - w[0]) - step_seconds).abs())
                .fold(0.0, f64::max),
        )
    }
}

fn trace_error(line: usize, what: impl Into<String>) -> ProjectError {
    ProjectError::Trace {
        line,
        what: what.into(),
    }
}

/// Parse an input trace from CSV text.
pub fn parse_input_trace(content: &str) -> ProjectResult<InputTrace> {
    let mut rows = content
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty() && !l.starts_with('#'));

    let (header_line, header) = rows
        .next()
        .ok_or_else(|| trace_error(0, "missing header row"))?;
    let columns: Vec<&str> = header.split(',').map(str::trim).collect();
    let column = |name: &str| columns.iter().position(|c| c.eq_ignore_ascii_case(name));
    let power_col = column("power")
        .ok_or_else(|| trace_error(header_line, "header has no 'power' column"))?;
    let ambient_col = column("ambient_temperature").ok_or_else(|| {
        trace_error(header_line, "header has no 'ambient_temperature' column")
    })?;
    let time_col = column("time");

    let mut trace = InputTrace {
        time: time_col.map(|_| Vec::new()),
        ..InputTrace::default()
    };
    for (line, row) in rows {
        let fields: Vec<&str> = row.split(',').map(str::trim).collect();
        if fields.len() != columns.len() {
            return Err(trace_error(
                line,
                format!("expected {} fields, found {}", columns.len(), fields.len()),
            ));
        }
        let value = |col: usize| -> ProjectResult<f64> {
            let v: f64 = fields[col].parse().map_err(|_| {
                trace_error(
                    line,
                    format!("'{}' in column '{}' is not a number", fields[col], columns[col]),
                )
            })?;
            if !v.is_finite() {
                return Err(trace_error(
                    line,
                    format!("non-finite value in column '{}'", columns[col]),
                ));
            }
            Ok(v)
        };

        trace.power.push(value(power_col)?);
        trace.ambient_temperature.push(value(ambient_col)?);
        if let (Some(col), Some(time)) = (time_col, trace.time.as_mut()) {
            let t = value(col)?;
            if time.last().is_some_and(|&prev| t <= prev) {
                return Err(trace_error(line, "time column must be strictly increasing"));
            }
            time.push(t);
        }
    }

    if trace.is_empty() {
        return Err(trace_error(header_line, "trace has no samples"));
    }
    Ok(trace)
}

/// Read an input trace from a CSV file.
pub fn read_input_trace(path: &Path) -> ProjectResult<InputTrace> {
    let content = std::fs::read_to_string(path)?;
    let trace = parse_input_trace(&content)?;
    tracing::debug!(path = %path.display(), samples = trace.len(), "input trace loaded");
    Ok(trace)
}

/// Column names written by [`write_states`].
pub const STATE_COLUMNS: [&str; 21] = [
    "time",
    "step",
    "power",
    "ambient_temperature",
    "soc_nominal",
    "internal_temperature",
    "voltage",
    "current",
    "ref_open_circuit_voltage",
    "open_circuit_voltage",
    "internal_resistance",
    "ehc",
    "generated_heat",
    "surface_temperature",
    "kappa",
    "capacity_nominal",
    "soc_use",
    "capacity_use",
    "cycle",
    "soh",
    "acc_discharge",
];

/// Write a header and one row per state.
pub fn write_states<W: Write>(mut out: W, states: &[SimState]) -> ProjectResult<()> {
    writeln!(out, "{}", STATE_COLUMNS.join(","))?;
    for s in states {
        let d = &s.derived;
        writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            s.time,
            s.step,
            s.inputs.power,
            s.inputs.ambient_temperature,
            s.integrated.soc_nominal,
            s.integrated.internal_temperature,
            d.voltage,
            d.current,
            d.ref_open_circuit_voltage,
            d.open_circuit_voltage,
            d.internal_resistance,
            d.ehc,
            d.generated_heat,
            d.surface_temperature,
            d.kappa,
            d.capacity_nominal,
            d.soc_use,
            d.capacity_use,
            s.degradation.cycle,
            s.degradation.soh,
            s.degradation.acc_discharge,
        )?;
    }
    out.flush()?;
    Ok(())
}

/// Write states to a CSV file, replacing it.
pub fn save_states(path: &Path, states: &[SimState]) -> ProjectResult<()> {
    let file = std::fs::File::create(path)?;
    write_states(std::io::BufWriter::new(file), states)?;
    tracing::debug!(path = %path.display(), rows = states.len(), "states written");
    Ok(())
}
