//! Pivot engine: ragged sample logs into rectangular feature matrices
//!
//! Samples are grouped by (event, tick) with duplicate ticks summed
//! (multiplexed counter groups land on the same tick), each event's series is
//! re-indexed to a dense 0-based row position, and the resulting columns are
//! truncated at the earliest row where any column has no sample. Divergent
//! per-event sample counts past that point indicate runs that stopped being
//! directly comparable.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::UncoreMode;
use crate::error::Result;
use crate::matrix::FeatureMatrix;
use crate::samples::SampleLog;

/// Pivot one run's sample log into an aligned feature matrix.
///
/// Column order is the first-seen order of events in the log. The raw tick
/// values are dropped after grouping; only their relative order survives.
pub fn pivot(log: &SampleLog) -> FeatureMatrix {
    let mut order: Vec<String> = Vec::new();
    let mut grouped: HashMap<String, BTreeMap<u64, f64>> = HashMap::new();

    for sample in log.samples() {
        if !grouped.contains_key(&sample.event) {
            order.push(sample.event.clone());
        }
        *grouped
            .entry(sample.event.clone())
            .or_default()
            .entry(sample.tick)
            .or_insert(0.0) += sample.value;
    }

    let columns: Vec<Vec<f64>> = order
        .iter()
        .map(|event| grouped[event].values().copied().collect())
        .collect();

    let rows = valid_row_count(&columns);
    let truncated = columns
        .into_iter()
        .map(|mut col| {
            col.truncate(rows);
            col
        })
        .collect();

    FeatureMatrix::new(order, truncated)
}

/// Earliest row index at which some column has no sample, scanning rows in
/// order and stopping at the first hit. When all columns are equally long the
/// full row count is kept.
fn valid_row_count(columns: &[Vec<f64>]) -> usize {
    let longest = columns.iter().map(Vec::len).max().unwrap_or(0);
    for row in 0..longest {
        if columns.iter().any(|col| row >= col.len()) {
            return row;
        }
    }
    longest
}

/// Options for [`pivot_run`].
#[derive(Debug, Clone, Copy)]
pub struct PivotOptions {
    pub uncore: UncoreMode,
    /// Remove events whose every retained sample is zero.
    pub drop_zero_events: bool,
}

/// Pivot a run directory's raw log and write the interchange matrix next to
/// it. Returns the path of the written matrix file.
pub fn pivot_run(dir: &Path, options: &PivotOptions) -> Result<PathBuf> {
    let log = SampleLog::from_run_dir(dir)?;
    let mut matrix = pivot(&log);

    if options.drop_zero_events {
        let removed = matrix.drop_zero_events();
        if !removed.is_empty() {
            info!(
                "dropped {} all-zero event(s) from {}: {}",
                removed.len(),
                dir.display(),
                removed.join(", ")
            );
        }
    }

    let out = dir.join(options.uncore.matrix_filename());
    matrix.write_csv(&out)?;
    info!(
        "pivoted {} into {} ({} rows x {} events)",
        dir.display(),
        out.display(),
        matrix.rows(),
        matrix.events().len()
    );
    Ok(out)
}
