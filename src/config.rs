//! Configuration surface for the pipeline

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Normalized-runtime ratio at or above which a co-located run counts as a
/// meaningful slowdown.
pub const DEFAULT_SLOWDOWN_CUTOFF: f64 = 1.15;

/// Pairwise correlation at or above which two events are reported as
/// redundant.
pub const DEFAULT_CORRELATION_CUTOFF: f64 = 0.9;

/// Which uncore counters the interchange matrices were extracted with.
///
/// The mode only selects which matrix file a pair directory contributes;
/// extraction itself happens upstream of this pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum UncoreMode {
    All,
    Shared,
    Exclusive,
    None,
}

impl UncoreMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            UncoreMode::All => "all",
            UncoreMode::Shared => "shared",
            UncoreMode::Exclusive => "exclusive",
            UncoreMode::None => "none",
        }
    }

    /// Interchange matrix file name inside a pair directory.
    pub fn matrix_filename(&self) -> String {
        format!("matrix_X_uncore_{}.csv", self.as_str())
    }
}

impl std::fmt::Display for UncoreMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which support-vector model the evaluator fits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum ModelKind {
    /// RBF-kernel support-vector regressor over normalized-runtime labels.
    Svr,
    /// Linear-kernel support-vector classifier over cutoff-derived labels.
    Svc,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Svr => "svr",
            ModelKind::Svc => "svc",
        }
    }
}
