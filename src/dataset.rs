//! Training/test assembly across configurations and pairs
//!
//! Walks the runtime table, reads each completed pair's interchange matrix,
//! labels its rows with the pair's normalized runtime, and routes them to the
//! training or test set under a leave-application-out protocol: a pair lands
//! in the test set the moment either member is held out, so every interaction
//! of a held-out application stays hidden from training.

use std::collections::HashSet;
use std::path::Path;

use ndarray::{Array1, Array2};
use tracing::{debug, warn};

use crate::config::UncoreMode;
use crate::error::{Error, Result};
use crate::matrix::FeatureMatrix;
use crate::runtimes::{AppName, RuntimeRecord, RuntimeTable};

/// Sentinel file a pair directory carries once its collection finished.
pub const COMPLETION_MARKER: &str = "completed";

/// Held-out application set.
///
/// Membership is a whitelist of application names, not pair identities: a
/// pair is withheld from training as soon as either member matches.
#[derive(Debug, Clone, Default)]
pub struct Holdout {
    names: HashSet<AppName>,
}

impl Holdout {
    pub fn new(names: impl IntoIterator<Item = AppName>) -> Self {
        Self {
            names: names.into_iter().collect(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &AppName) -> bool {
        self.names.contains(name)
    }

    /// Whether this pair involves a held-out application on either side.
    pub fn covers(&self, record: &RuntimeRecord) -> bool {
        self.contains(&record.a) || record.b.app().is_some_and(|b| self.contains(b))
    }

    /// Space-joined sorted names, for report rows and error messages.
    pub fn label(&self) -> String {
        let mut names: Vec<&str> = self.names.iter().map(AppName::as_str).collect();
        names.sort_unstable();
        names.join(" ")
    }
}

/// What to assemble.
#[derive(Debug, Clone)]
pub struct AssemblyOptions {
    /// Configuration whitelist; records of other configurations are ignored.
    pub configs: Vec<String>,
    /// Include solo (`Alone`) runs.
    pub include_alone: bool,
    /// Which per-pair interchange matrix to read.
    pub uncore: UncoreMode,
}

/// Assembled model input: training features/labels plus the held-out slice.
///
/// Labels are the raw normalized-runtime ratios; the evaluator derives
/// cutoff classes from them when fitting a classifier.
#[derive(Debug, Clone)]
pub struct AssembledSet {
    pub events: Vec<String>,
    pub x: Array2<f64>,
    pub y: Array1<f64>,
    pub x_test: Array2<f64>,
    pub y_test: Array1<f64>,
}

impl AssembledSet {
    pub fn train_samples(&self) -> usize {
        self.x.nrows()
    }

    pub fn test_samples(&self) -> usize {
        self.x_test.nrows()
    }

    /// Restrict both feature blocks to the named events, in the given order.
    pub fn restrict(&self, events: &[String]) -> Result<Self> {
        let indices: Vec<usize> = events
            .iter()
            .map(|event| {
                self.events.iter().position(|e| e == event).ok_or_else(|| {
                    Error::ExternalTool(format!(
                        "selected event '{event}' does not exist in the assembled feature set"
                    ))
                })
            })
            .collect::<Result<_>>()?;

        let pick = |block: &Array2<f64>| -> Array2<f64> {
            let mut out = Array2::zeros((block.nrows(), indices.len()));
            for (new_col, old_col) in indices.iter().enumerate() {
                out.column_mut(new_col).assign(&block.column(*old_col));
            }
            out
        };

        Ok(Self {
            events: events.to_vec(),
            x: pick(&self.x),
            y: self.y.clone(),
            x_test: pick(&self.x_test),
            y_test: self.y_test.clone(),
        })
    }
}

/// Collects labelled rows for one side of the split.
#[derive(Debug, Default)]
struct RowBucket {
    rows: Vec<f64>,
    labels: Vec<f64>,
    count: usize,
}

impl RowBucket {
    fn push_matrix(&mut self, matrix: &FeatureMatrix, label: f64) {
        for row in 0..matrix.rows() {
            for col in 0..matrix.events().len() {
                self.rows.push(matrix.value(row, col));
            }
            self.labels.push(label);
            self.count += 1;
        }
    }

    fn into_arrays(self, width: usize) -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_vec((self.count, width), self.rows)
            .expect("row bucket is rectangular by construction");
        (x, Array1::from_vec(self.labels))
    }
}

/// Assemble (X, Y, X_test, Y_test) from every completed pair of the
/// whitelisted configurations.
///
/// A pair directory without the completion marker is a partial run: excluded
/// with a logged notice, never fatal. A completed pair whose matrix file is
/// absent aborts the invocation — the pivot step was skipped for it.
pub fn assemble(
    root: &Path,
    table: &RuntimeTable,
    options: &AssemblyOptions,
    holdout: &Holdout,
) -> Result<AssembledSet> {
    let mut events: Option<Vec<String>> = None;
    let mut train = RowBucket::default();
    let mut test = RowBucket::default();

    for record in table.records() {
        if !options.configs.iter().any(|c| *c == record.config) {
            continue;
        }
        if record.b.is_alone() && !options.include_alone {
            debug!("skipping the solo samples of {}", record.a);
            continue;
        }

        let pair_dir = record.pair_dir(root);
        if !pair_dir.join(COMPLETION_MARKER).exists() {
            warn!("excluding unfinished run directory {}", pair_dir.display());
            continue;
        }

        let matrix_path = pair_dir.join(options.uncore.matrix_filename());
        if !matrix_path.exists() {
            return Err(Error::MissingArtifact(matrix_path));
        }
        let matrix = FeatureMatrix::from_csv_file(&matrix_path)?;

        match &events {
            None => events = Some(matrix.events().to_vec()),
            Some(expected) => {
                if expected != matrix.events() {
                    return Err(Error::parse(
                        &matrix_path,
                        1,
                        "event columns disagree with the other pair matrices",
                    ));
                }
            }
        }

        let bucket = if holdout.covers(record) {
            debug!(
                "adding {} vs {} to the test set ({})",
                record.a, record.b, record.normalized_runtime
            );
            &mut test
        } else {
            debug!(
                "adding {} vs {} to the training set ({})",
                record.a, record.b, record.normalized_runtime
            );
            &mut train
        };
        bucket.push_matrix(&matrix, record.normalized_runtime);
    }

    let events = events.unwrap_or_default();
    let width = events.len();
    let (x, y) = train.into_arrays(width);
    let (x_test, y_test) = test.into_arrays(width);

    Ok(AssembledSet {
        events,
        x,
        y,
        x_test,
        y_test,
    })
}
