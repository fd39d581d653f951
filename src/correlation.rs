//! Correlation-based feature redundancy analysis
//!
//! Computes the pairwise Pearson correlation matrix over event columns and
//! derives the artifacts used for manual redundant-feature elimination: the
//! full matrix, a per-event correlated-partner report with a degree
//! histogram, and a greedy exclusion list.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::matrix::FeatureMatrix;

pub const MATRIX_REPORT: &str = "correlation_matrix.csv";
pub const PARTNERS_REPORT: &str = "correlated_events.txt";
pub const EXCLUDED_REPORT: &str = "excluded_events.txt";

/// Symmetric pairwise correlation over event columns, diagonal 1.
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    events: Vec<String>,
    /// Row-major n*n values in [-1, 1].
    values: Vec<f64>,
}

impl CorrelationMatrix {
    /// Pearson correlation of every column pair. A zero-variance column
    /// correlates 0 with everything else and 1 with itself.
    pub fn compute(matrix: &FeatureMatrix) -> Self {
        let n = matrix.events().len();
        let rows = matrix.rows();
        let mut values = vec![0.0; n * n];

        let means: Vec<f64> = (0..n)
            .map(|col| matrix.column(col).iter().sum::<f64>() / rows.max(1) as f64)
            .collect();

        for i in 0..n {
            values[i * n + i] = 1.0;
            for j in (i + 1)..n {
                let r = pearson(matrix.column(i), matrix.column(j), means[i], means[j]);
                values[i * n + j] = r;
                values[j * n + i] = r;
            }
        }

        Self {
            events: matrix.events().to_vec(),
            values,
        }
    }

    pub fn events(&self) -> &[String] {
        &self.events
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.events.len() + j]
    }

    /// For each event, the indices of the other events whose correlation
    /// with it is at or above the cutoff, in original column order.
    pub fn partners(&self, cutoff: f64) -> Vec<Vec<usize>> {
        let n = self.events.len();
        (0..n)
            .map(|i| {
                (0..n)
                    .filter(|j| i != *j && self.get(i, *j) >= cutoff)
                    .collect()
            })
            .collect()
    }

    /// Events grouped by their partner count, keyed by count.
    pub fn degree_histogram(&self, cutoff: f64) -> BTreeMap<usize, Vec<usize>> {
        let mut histogram: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (event, partners) in self.partners(cutoff).iter().enumerate() {
            histogram.entry(partners.len()).or_default().push(event);
        }
        histogram
    }

    /// Greedy redundancy elimination: scanning events in original column
    /// order, an event correlated at or above the cutoff with any earlier
    /// retained event is excluded.
    pub fn excluded_events(&self, cutoff: f64) -> Vec<String> {
        let mut kept: Vec<usize> = Vec::new();
        let mut excluded = Vec::new();
        for i in 0..self.events.len() {
            if kept.iter().any(|k| self.get(i, *k) >= cutoff) {
                excluded.push(self.events[i].clone());
            } else {
                kept.push(i);
            }
        }
        excluded
    }

    /// Tab-delimited square matrix keyed by event identifier.
    pub fn to_tsv(&self) -> String {
        let mut output = String::new();
        output.push('\t');
        output.push_str(&self.events.join("\t"));
        output.push('\n');
        for (i, event) in self.events.iter().enumerate() {
            output.push_str(event);
            for j in 0..self.events.len() {
                output.push_str(&format!("\t{}", self.get(i, j)));
            }
            output.push('\n');
        }
        output
    }

    /// Per-event partner listing plus the degree-histogram trailer,
    /// largest partner count first.
    pub fn partner_report(&self, cutoff: f64) -> String {
        let partners = self.partners(cutoff);
        let mut output = String::new();

        for (i, event_partners) in partners.iter().enumerate() {
            output.push_str(&format!(
                "Event {} {} ({})\n",
                i,
                self.events[i],
                event_partners.len()
            ));
            for &j in event_partners {
                output.push_str(&format!(
                    "\t{:3} {:.2} {}\n",
                    j,
                    self.get(i, j),
                    self.events[j]
                ));
            }
        }

        output.push_str(&"-".repeat(50));
        output.push('\n');
        for (count, events) in self.degree_histogram(cutoff).iter().rev() {
            let ids: Vec<String> = events.iter().map(usize::to_string).collect();
            output.push_str(&format!("{} ({}): {}\n", count, events.len(), ids.join(", ")));
        }
        output
    }
}

fn pearson(x: &[f64], y: &[f64], mean_x: f64, mean_y: f64) -> f64 {
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return 0.0;
    }
    cov / (var_x.sqrt() * var_y.sqrt())
}

/// Write the three correlation artifacts into `output_dir`.
pub fn write_reports(
    matrix: &FeatureMatrix,
    cutoff: f64,
    output_dir: &Path,
) -> Result<CorrelationMatrix> {
    let correlation = CorrelationMatrix::compute(matrix);
    fs::write(output_dir.join(MATRIX_REPORT), correlation.to_tsv())?;
    fs::write(
        output_dir.join(PARTNERS_REPORT),
        correlation.partner_report(cutoff),
    )?;
    let mut excluded = correlation.excluded_events(cutoff).join("\n");
    if !excluded.is_empty() {
        excluded.push('\n');
    }
    fs::write(output_dir.join(EXCLUDED_REPORT), excluded)?;
    Ok(correlation)
}
