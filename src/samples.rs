//! Raw per-event sample log reader
//!
//! A run directory holds one `results.csv` with a row per counter sample:
//! the event name, the sampling timestamp, and the counter delta. Timestamps
//! arrive as fractional seconds and are mapped to integer millisecond ticks
//! before pivoting; only the relative tick order matters downstream.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// File name of the raw sample log inside a run directory.
pub const RESULTS_FILE: &str = "results.csv";

const EVENT_COLUMN: &str = "EVENT_NAME";
const TIME_COLUMN: &str = "TIME";
const VALUE_COLUMN: &str = "SAMPLE_VALUE";

/// One counter sample as logged by the collection subsystem.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub event: String,
    /// Discrete sampling interval index (milliseconds since run start).
    pub tick: u64,
    pub value: f64,
}

/// Ordered sequence of samples for one run.
///
/// May contain multiple samples per (event, tick) pair; those are additive
/// (multiplexed counter groups landing on the same tick) and are summed by
/// the pivot engine.
#[derive(Debug, Clone, Default)]
pub struct SampleLog {
    samples: Vec<Sample>,
}

impl SampleLog {
    pub fn new(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    /// Load the sample log of a run directory (`<dir>/results.csv`).
    pub fn from_run_dir(dir: &Path) -> Result<Self> {
        Self::from_file(&dir.join(RESULTS_FILE))
    }

    /// Parse a raw sample log file.
    ///
    /// The header must name at least EVENT_NAME, TIME and SAMPLE_VALUE;
    /// extra columns are ignored. A non-numeric time or value field is a
    /// fatal parse error — the run has to be re-collected.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents, path)
    }

    fn parse(contents: &str, path: &Path) -> Result<Self> {
        let mut lines = contents.lines().enumerate();

        let (_, header) = lines
            .next()
            .ok_or_else(|| Error::parse(path, 1, "empty file, expected a header row"))?;
        let columns: Vec<&str> = header.split(',').map(str::trim).collect();
        let event_idx = find_column(&columns, EVENT_COLUMN, path)?;
        let time_idx = find_column(&columns, TIME_COLUMN, path)?;
        let value_idx = find_column(&columns, VALUE_COLUMN, path)?;

        let mut samples = Vec::new();
        for (idx, line) in lines {
            if line.trim().is_empty() {
                continue;
            }
            let lineno = idx + 1;
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            if fields.len() < columns.len() {
                return Err(Error::parse(
                    path,
                    lineno,
                    format!("expected {} fields, got {}", columns.len(), fields.len()),
                ));
            }

            let time: f64 = fields[time_idx].parse().map_err(|_| {
                Error::parse(
                    path,
                    lineno,
                    format!("non-numeric time field '{}'", fields[time_idx]),
                )
            })?;
            let value: f64 = fields[value_idx].parse().map_err(|_| {
                Error::parse(
                    path,
                    lineno,
                    format!("non-numeric sample value '{}'", fields[value_idx]),
                )
            })?;

            samples.push(Sample {
                event: fields[event_idx].to_string(),
                tick: (time * 1000.0).round() as u64,
                value,
            });
        }

        Ok(Self { samples })
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

fn find_column(columns: &[&str], name: &str, path: &Path) -> Result<usize> {
    columns
        .iter()
        .position(|c| *c == name)
        .ok_or_else(|| Error::parse(path, 1, format!("missing required column {name}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn log_from(contents: &str) -> Result<SampleLog> {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        SampleLog::from_file(file.path())
    }

    #[test]
    fn test_parses_basic_log() {
        let log = log_from("EVENT_NAME, TIME, SAMPLE_VALUE\nCYCLES, 0.001, 12\nCYCLES, 0.002, 9\n")
            .unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log.samples()[0].event, "CYCLES");
        assert_eq!(log.samples()[0].tick, 1);
        assert_eq!(log.samples()[1].tick, 2);
        assert_eq!(log.samples()[1].value, 9.0);
    }

    #[test]
    fn test_time_converts_to_millisecond_ticks() {
        let log = log_from("EVENT_NAME, TIME, SAMPLE_VALUE\nE, 1.5, 3\n").unwrap();
        assert_eq!(log.samples()[0].tick, 1500);
    }

    #[test]
    fn test_extra_columns_are_ignored() {
        let log = log_from("EVENT_NAME, CPU, TIME, SAMPLE_VALUE\nE, 3, 0.001, 7\n").unwrap();
        assert_eq!(log.samples()[0].value, 7.0);
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let log = log_from("EVENT_NAME, TIME, SAMPLE_VALUE\n\nE, 0.001, 1\n\n").unwrap();
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_non_numeric_value_is_parse_error() {
        let err = log_from("EVENT_NAME, TIME, SAMPLE_VALUE\nE, 0.001, twelve\n").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }));
    }

    #[test]
    fn test_missing_column_is_parse_error() {
        let err = log_from("EVENT_NAME, TIME\nE, 0.001\n").unwrap_err();
        assert!(err.to_string().contains("SAMPLE_VALUE"));
    }

    #[test]
    fn test_empty_data_section_gives_empty_log() {
        let log = log_from("EVENT_NAME, TIME, SAMPLE_VALUE\n").unwrap();
        assert!(log.is_empty());
    }
}
