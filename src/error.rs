//! Error taxonomy for the analysis pipeline
//!
//! Data-quality issues local to a single pair (a run without its completion
//! marker) are recovered by exclusion with a logged notice and never appear
//! here. Everything in this enum aborts the invocation.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal pipeline errors
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed sample or runtime record. The caller must fix or re-collect
    /// the input; no partial recovery is attempted.
    #[error("{path}:{line}: malformed record: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// A pair directory carries the completion marker but its derived feature
    /// matrix is absent, meaning the offline pivot step was never run.
    #[error("feature matrix {0} not found; run `cotejar pivot` over the pair directories first")]
    MissingArtifact(PathBuf),

    /// No completed pair contributed any training rows.
    #[error("training set is empty, cannot fit a model")]
    EmptyTrainingSet,

    /// A holdout was requested but no completed pair landed in the test set.
    #[error("test set is empty for held-out application(s) {0}")]
    EmptyTestSet(String),

    /// The feature-grouping subprocess exited non-zero or produced output
    /// that does not match the expected one-identifier-per-line shape.
    #[error("feature grouping tool failed: {0}")]
    ExternalTool(String),

    /// Scaler or support-vector model failure.
    #[error("model evaluation failed: {0}")]
    Model(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn parse(path: &std::path::Path, line: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            path: path.to_path_buf(),
            line,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
