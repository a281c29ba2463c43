//! Logging of parameter values during a run.

use std::io;

use cs_core::{ParameterValue, SystemParameter, ValueKind};
use indexmap::IndexMap;
use serde::Serialize;

/// Accumulates one row per logging tick.
#[derive(Clone, Debug)]
pub struct Recorder {
    columns: Vec<SystemParameter>,
    logging_multiple: u64,
    time: Vec<f64>,
    rows: Vec<Vec<ParameterValue>>,
}

impl Recorder {
    pub fn new(columns: Vec<SystemParameter>, logging_multiple: u64) -> Self {
        Self {
            columns,
            logging_multiple: logging_multiple.max(1),
            time: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Pre-allocate for a run of `ticks` exchange steps.
    pub fn with_ticks(mut self, ticks: u64) -> Self {
        let rows = (ticks / self.logging_multiple) as usize;
        self.time.reserve(rows);
        self.rows.reserve(rows);
        self
    }

    pub fn columns(&self) -> &[SystemParameter] {
        &self.columns
    }

    pub fn logging_multiple(&self) -> u64 {
        self.logging_multiple
    }

    pub fn should_record(&self, tick: u64) -> bool {
        tick % self.logging_multiple == 0
    }

    /// Append a row. `values` must follow column order.
    pub fn record(&mut self, time: f64, values: Vec<ParameterValue>) {
        debug_assert_eq!(values.len(), self.columns.len());
        self.time.push(time);
        self.rows.push(values);
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Freeze into results, attaching the unit and value kind of each column.
    pub fn finish(
        self,
        units: IndexMap<String, Option<String>>,
        kinds: IndexMap<String, Option<ValueKind>>,
    ) -> SimulationResults {
        SimulationResults {
            columns: self.columns.iter().map(SystemParameter::log_name).collect(),
            time: self.time,
            rows: self.rows,
            units,
            kinds,
        }
    }
}

/// Logged series of a completed run.
///
/// Rows are ordered by time; columns are named `"<system>.<parameter>"` in
/// the order they were requested.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SimulationResults {
    columns: Vec<String>,
    time: Vec<f64>,
    rows: Vec<Vec<ParameterValue>>,
    units: IndexMap<String, Option<String>>,
    kinds: IndexMap<String, Option<ValueKind>>,
}

impl SimulationResults {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<(f64, &[ParameterValue])> {
        Some((*self.time.get(index)?, self.rows.get(index)?.as_slice()))
    }

    pub fn rows(&self) -> impl Iterator<Item = (f64, &[ParameterValue])> {
        self.time
            .iter()
            .copied()
            .zip(self.rows.iter().map(Vec::as_slice))
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column(&self, name: &str) -> Option<Vec<&ParameterValue>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Column as reals; `None` if missing or any value is not numeric.
    pub fn real_column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.column_index(name)?;
        self.rows.iter().map(|row| row[idx].as_real()).collect()
    }

    pub fn last(&self, name: &str) -> Option<&ParameterValue> {
        let idx = self.column_index(name)?;
        self.rows.last().map(|row| &row[idx])
    }

    pub fn units(&self) -> &IndexMap<String, Option<String>> {
        &self.units
    }

    pub fn unit(&self, name: &str) -> Option<&str> {
        self.units.get(name)?.as_deref()
    }

    /// Value kind of each column, `None` where the entity could not report one.
    pub fn kinds(&self) -> &IndexMap<String, Option<ValueKind>> {
        &self.kinds
    }

    pub fn kind(&self, name: &str) -> Option<ValueKind> {
        *self.kinds.get(name)?
    }

    /// Write as CSV with a `time` column first.
    ///
    /// Header cells carry the unit in brackets when one is known.
    pub fn write_csv<W: io::Write>(&self, mut out: W) -> io::Result<()> {
        let mut header = vec!["time".to_string()];
        for name in &self.columns {
            match self.unit(name) {
                Some(unit) => header.push(format!("{name} [{unit}]")),
                None => header.push(name.clone()),
            }
        }
        writeln!(out, "{}", header.join(","))?;
        for (t, row) in self.rows() {
            let mut line = t.to_string();
            for value in row {
                line.push(',');
                line.push_str(&csv_cell(value));
            }
            writeln!(out, "{line}")?;
        }
        Ok(())
    }

    pub fn to_csv(&self) -> String {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write_csv(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

fn csv_cell(value: &ParameterValue) -> String {
    let text = value.to_string();
    if text.contains([',', '"', '\n']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text
    }
}
