//! Rectangular feature matrices
//!
//! One column per hardware event (in first-seen order), one row per retained
//! tick. Matrices are rectangular by construction: the pivot engine truncates
//! ragged columns before a `FeatureMatrix` exists, so downstream consumers
//! never see missing cells.

use std::fs;
use std::path::Path;

use ndarray::Array2;

use crate::error::{Error, Result};

/// Aligned tick-by-event matrix, the on-disk interchange format between the
/// pivot step and dataset assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    events: Vec<String>,
    /// Column-major storage; every column holds exactly `rows` values.
    columns: Vec<Vec<f64>>,
    rows: usize,
}

impl FeatureMatrix {
    /// Build from rectangular columns. Panics if the columns are ragged;
    /// ragged input must go through [`crate::pivot`] first.
    pub fn new(events: Vec<String>, columns: Vec<Vec<f64>>) -> Self {
        assert_eq!(events.len(), columns.len());
        let rows = columns.first().map_or(0, Vec::len);
        assert!(
            columns.iter().all(|c| c.len() == rows),
            "ragged columns handed to FeatureMatrix::new"
        );
        Self {
            events,
            columns,
            rows,
        }
    }

    pub fn empty() -> Self {
        Self {
            events: Vec::new(),
            columns: Vec::new(),
            rows: 0,
        }
    }

    /// Event identifiers in first-seen order.
    pub fn events(&self) -> &[String] {
        &self.events
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn column(&self, idx: usize) -> &[f64] {
        &self.columns[idx]
    }

    pub fn column_by_name(&self, event: &str) -> Option<&[f64]> {
        self.events
            .iter()
            .position(|e| e == event)
            .map(|idx| self.columns[idx].as_slice())
    }

    pub fn value(&self, row: usize, col: usize) -> f64 {
        self.columns[col][row]
    }

    /// Restrict to the named events, in the given order. An unknown name is
    /// an integration error: it means the selection came from a ranking over
    /// a different feature set.
    pub fn select(&self, events: &[String]) -> Result<Self> {
        let mut columns = Vec::with_capacity(events.len());
        for event in events {
            match self.column_by_name(event) {
                Some(col) => columns.push(col.to_vec()),
                None => {
                    return Err(Error::ExternalTool(format!(
                        "selected event '{event}' does not exist in the feature matrix"
                    )))
                }
            }
        }
        Ok(Self::new(events.to_vec(), columns))
    }

    /// Drop events whose every retained sample is zero. Returns the removed
    /// identifiers.
    pub fn drop_zero_events(&mut self) -> Vec<String> {
        let mut removed = Vec::new();
        let mut idx = 0;
        while idx < self.events.len() {
            if self.columns[idx].iter().all(|v| *v == 0.0) {
                removed.push(self.events.remove(idx));
                self.columns.remove(idx);
            } else {
                idx += 1;
            }
        }
        removed
    }

    /// Row-major copy for model input.
    pub fn to_array(&self) -> Array2<f64> {
        let mut data = Vec::with_capacity(self.rows * self.events.len());
        for row in 0..self.rows {
            for col in &self.columns {
                data.push(col[row]);
            }
        }
        Array2::from_shape_vec((self.rows, self.events.len()), data)
            .expect("rectangular by construction")
    }

    pub fn to_csv(&self) -> String {
        let mut output = String::new();
        let header: Vec<String> = self.events.iter().map(|e| escape_field(e)).collect();
        output.push_str(&header.join(","));
        output.push('\n');
        for row in 0..self.rows {
            let fields: Vec<String> = self
                .columns
                .iter()
                .map(|col| format!("{}", col[row]))
                .collect();
            output.push_str(&fields.join(","));
            output.push('\n');
        }
        output
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_csv())?;
        Ok(())
    }

    pub fn from_csv_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_csv(&contents, path)
    }

    fn from_csv(contents: &str, path: &Path) -> Result<Self> {
        let mut lines = contents.lines().enumerate();
        let (_, header) = lines
            .next()
            .ok_or_else(|| Error::parse(path, 1, "empty matrix file, expected a header row"))?;
        let events: Vec<String> = split_line(header);
        if events.is_empty() || events.iter().all(String::is_empty) {
            return Err(Error::parse(path, 1, "header row names no events"));
        }

        let mut columns: Vec<Vec<f64>> = vec![Vec::new(); events.len()];
        for (idx, line) in lines {
            if line.trim().is_empty() {
                continue;
            }
            let lineno = idx + 1;
            let fields = split_line(line);
            if fields.len() != events.len() {
                return Err(Error::parse(
                    path,
                    lineno,
                    format!("expected {} fields, got {}", events.len(), fields.len()),
                ));
            }
            for (col, field) in columns.iter_mut().zip(&fields) {
                let value: f64 = field.parse().map_err(|_| {
                    Error::parse(path, lineno, format!("non-numeric cell '{field}'"))
                })?;
                col.push(value);
            }
        }

        Ok(Self::new(events, columns))
    }
}

/// Escape a CSV field (handle commas, quotes, newlines).
pub(crate) fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn split_line(line: &str) -> Vec<String> {
    line.split(',')
        .map(|f| f.trim().trim_matches('"').to_string())
        .collect()
}
