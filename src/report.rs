//! Results-table accumulation and persistence
//!
//! Each invocation accumulates one row per evaluated held-out set and
//! overwrites its result files wholesale, so re-running is always safe.
//! The optional training/test-set export writes the assembled feature blocks
//! with a trailing label column for external learners.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};

use crate::config::{ModelKind, UncoreMode};
use crate::dataset::AssembledSet;
use crate::error::Result;
use crate::matrix::escape_field;

/// Ordered columns plus accumulated rows.
#[derive(Debug, Clone)]
pub struct ResultsTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl ResultsTable {
    pub fn new(columns: Vec<&str>) -> Self {
        Self {
            columns: columns.into_iter().map(String::from).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn to_csv(&self) -> String {
        let mut output = String::new();
        let header: Vec<String> = self.columns.iter().map(|c| escape_field(c)).collect();
        output.push_str(&header.join(","));
        output.push('\n');
        for row in &self.rows {
            let fields: Vec<String> = row.iter().map(|f| escape_field(f)).collect();
            output.push_str(&fields.join(","));
            output.push('\n');
        }
        output
    }

    /// Overwrites the target wholesale.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_csv())?;
        Ok(())
    }

    pub fn to_json(&self) -> String {
        let rows: Vec<Value> = self
            .rows
            .iter()
            .map(|row| {
                let map: serde_json::Map<String, Value> = self
                    .columns
                    .iter()
                    .cloned()
                    .zip(row.iter().map(|v| json!(v)))
                    .collect();
                Value::Object(map)
            })
            .collect();
        serde_json::to_string_pretty(&rows).expect("string table serializes")
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json())?;
        Ok(())
    }

    /// Aligned text rendering for the terminal.
    pub fn render(&self) -> String {
        let mut widths: Vec<usize> = self.columns.iter().map(String::len).collect();
        for row in &self.rows {
            for (idx, field) in row.iter().enumerate() {
                widths[idx] = widths[idx].max(field.len());
            }
        }

        let mut output = String::new();
        let render_row = |fields: &[String]| -> String {
            fields
                .iter()
                .enumerate()
                .map(|(idx, f)| format!("{:width$}", f, width = widths[idx]))
                .collect::<Vec<_>>()
                .join("  ")
        };
        output.push_str(&render_row(&self.columns));
        output.push('\n');
        for row in &self.rows {
            output.push_str(&render_row(row));
            output.push('\n');
        }
        output
    }
}

/// Result file name for a full-feature evaluation sweep.
pub fn results_filename(kind: ModelKind, configs: &[String], uncore: UncoreMode) -> String {
    format!(
        "{}_results_{}_uncore_{}.csv",
        kind.as_str(),
        configs.join("_"),
        uncore.as_str()
    )
}

/// Result file name for a feature-limited evaluation sweep.
pub const SELECT_RESULTS_FILE: &str = "svm_machine_aware.csv";

/// Write the assembled training (and, with a holdout, test) blocks as CSVs
/// with a trailing `Y` column.
///
/// Classification exports carry Y/N class labels derived from the cutoff;
/// regression exports keep the numeric normalized runtime.
pub fn export_training_sets(
    root: &Path,
    set: &AssembledSet,
    holdout_label: &str,
    configs: &[String],
    uncore: UncoreMode,
    kind: ModelKind,
    cutoff: f64,
) -> Result<Vec<PathBuf>> {
    let configs_label = configs.join("_");
    let mut written = Vec::new();

    let label = |value: f64| -> String {
        match kind {
            ModelKind::Svc => {
                if value >= cutoff {
                    "Y".to_string()
                } else {
                    "N".to_string()
                }
            }
            ModelKind::Svr => format!("{value}"),
        }
    };

    let block_csv = |x: &ndarray::Array2<f64>, y: &ndarray::Array1<f64>| -> String {
        let mut output = String::new();
        let mut header: Vec<String> = set.events.iter().map(|e| escape_field(e)).collect();
        header.push("Y".to_string());
        output.push_str(&header.join(","));
        output.push('\n');
        for (row, value) in x.rows().into_iter().zip(y.iter()) {
            let mut fields: Vec<String> = row.iter().map(|v| format!("{v}")).collect();
            fields.push(label(*value));
            output.push_str(&fields.join(","));
            output.push('\n');
        }
        output
    };

    if holdout_label.is_empty() {
        let path = root.join(format!(
            "svm_complete_{}_uncore_{}.csv",
            configs_label,
            uncore.as_str()
        ));
        fs::write(&path, block_csv(&set.x, &set.y))?;
        written.push(path);
    } else {
        let holdout_file_label = holdout_label.replace(' ', "_");
        let training = root.join(format!(
            "svm_training_without_{}_{}_uncore_{}.csv",
            holdout_file_label,
            configs_label,
            uncore.as_str()
        ));
        fs::write(&training, block_csv(&set.x, &set.y))?;
        written.push(training);

        let test = root.join(format!(
            "svm_test_{}_{}_uncore_{}.csv",
            holdout_file_label,
            configs_label,
            uncore.as_str()
        ));
        fs::write(&test, block_csv(&set.x_test, &set.y_test))?;
        written.push(test);
    }

    Ok(written)
}
