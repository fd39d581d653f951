//! Model fitting and metric reporting
//!
//! Scales features with a min-max scaler fitted on the training block only,
//! fits a support-vector model, predicts on the held-out block, and computes
//! the fixed metric set for the results table. The same fitted scaler is
//! applied to the test features, so the test distribution never leaks into
//! the scaling.

use linfa::prelude::*;
use linfa::Dataset;
use linfa_preprocessing::linear_scaling::LinearScaler;
use linfa_svm::Svm;
use ndarray::Array1;
use serde::Serialize;

use crate::config::ModelKind;
use crate::dataset::AssembledSet;
use crate::error::{Error, Result};

/// Penalty of the RBF-kernel regressor.
const SVR_C: f64 = 1.0;
/// Epsilon tube of the regressor.
const SVR_EPSILON: f64 = 0.1;
/// Per-class penalty of the linear-kernel classifier.
const SVC_C: f64 = 1.0;
/// Width parameter of the gaussian kernel.
const RBF_KERNEL_EPS: f64 = 80.0;

#[derive(Debug, Clone, Serialize)]
pub struct RegressionMetrics {
    pub explained_variance: f64,
    pub mean_absolute_error: f64,
    pub mean_squared_error: f64,
    pub median_absolute_error: f64,
    pub r2: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassificationMetrics {
    /// Misclassification rate on the held-out block.
    pub error: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Metrics {
    Regression(RegressionMetrics),
    Classification(ClassificationMetrics),
}

/// One results-table row: the outcome of evaluating one held-out set.
#[derive(Debug, Clone, Serialize)]
pub struct EvalOutcome {
    pub training_configs: String,
    pub held_out: String,
    pub samples_training: usize,
    pub samples_test: usize,
    pub metrics: Metrics,
}

impl EvalOutcome {
    /// Results-table header for the given model kind.
    pub fn columns(kind: ModelKind) -> Vec<&'static str> {
        let mut columns = vec![
            "Training Configs",
            "Tested Application",
            "Samples Training Total",
            "Samples Test Total",
        ];
        match kind {
            ModelKind::Svr => columns.extend([
                "Explained variance score",
                "Mean absolute error",
                "Mean squared error",
                "Median absolute error",
                "R2 score",
            ]),
            ModelKind::Svc => columns.extend(["Error", "Precision", "Recall", "F1 score"]),
        }
        columns
    }

    /// Results-table row, metric cells formatted to two decimals.
    pub fn row(&self) -> Vec<String> {
        let mut row = vec![
            self.training_configs.clone(),
            self.held_out.clone(),
            self.samples_training.to_string(),
            self.samples_test.to_string(),
        ];
        match &self.metrics {
            Metrics::Regression(m) => row.extend([
                format!("{:.2}", m.explained_variance),
                format!("{:.2}", m.mean_absolute_error),
                format!("{:.2}", m.mean_squared_error),
                format!("{:.2}", m.median_absolute_error),
                format!("{:.2}", m.r2),
            ]),
            Metrics::Classification(m) => row.extend([
                format!("{:.2}", m.error),
                format!("{:.2}", m.precision),
                format!("{:.2}", m.recall),
                format!("{:.2}", m.f1),
            ]),
        }
        row
    }
}

/// Cutoff-derived class labels: at or above the cutoff means slowdown.
pub fn classify(labels: &Array1<f64>, cutoff: f64) -> Array1<bool> {
    labels.mapv(|v| v >= cutoff)
}

/// Scale, fit, predict, score.
///
/// `holdout` only labels the error message when the test block is empty.
pub fn evaluate(
    set: &AssembledSet,
    kind: ModelKind,
    cutoff: f64,
    holdout: &str,
) -> Result<Metrics> {
    if set.train_samples() == 0 {
        return Err(Error::EmptyTrainingSet);
    }
    if set.test_samples() == 0 {
        return Err(Error::EmptyTestSet(holdout.to_string()));
    }

    match kind {
        ModelKind::Svr => {
            let train = Dataset::new(set.x.clone(), set.y.clone());
            let test = Dataset::new(set.x_test.clone(), set.y_test.clone());
            let scaler = LinearScaler::min_max().fit(&train).map_err(model_err)?;
            let train = scaler.transform(train);
            let test = scaler.transform(test);

            let model = Svm::<f64, f64>::params()
                .gaussian_kernel(RBF_KERNEL_EPS)
                .c_eps(SVR_C, SVR_EPSILON)
                .fit(&train)
                .map_err(model_err)?;
            let pred = model.predict(&test);

            Ok(Metrics::Regression(RegressionMetrics {
                explained_variance: pred.explained_variance(&test).map_err(model_err)?,
                mean_absolute_error: pred.mean_absolute_error(&test).map_err(model_err)?,
                mean_squared_error: pred.mean_squared_error(&test).map_err(model_err)?,
                median_absolute_error: pred.median_absolute_error(&test).map_err(model_err)?,
                r2: pred.r2(&test).map_err(model_err)?,
            }))
        }
        ModelKind::Svc => {
            let train = Dataset::new(set.x.clone(), classify(&set.y, cutoff));
            let test = Dataset::new(set.x_test.clone(), classify(&set.y_test, cutoff));
            let scaler = LinearScaler::min_max().fit(&train).map_err(model_err)?;
            let train = scaler.transform(train);
            let test = scaler.transform(test);

            let model = Svm::<f64, bool>::params()
                .linear_kernel()
                .pos_neg_weights(SVC_C, SVC_C)
                .fit(&train)
                .map_err(model_err)?;
            let pred = model.predict(&test);
            let confusion = pred.confusion_matrix(&test).map_err(model_err)?;

            Ok(Metrics::Classification(ClassificationMetrics {
                error: 1.0 - f64::from(confusion.accuracy()),
                precision: f64::from(confusion.precision()),
                recall: f64::from(confusion.recall()),
                f1: f64::from(confusion.f1_score()),
            }))
        }
    }
}

fn model_err<E: std::fmt::Display>(e: E) -> Error {
    Error::Model(e.to_string())
}
