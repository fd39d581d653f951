//! Paired-run runtime table
//!
//! `runtimes.csv` at the data root records one row per (application A,
//! co-runner B, configuration) with the normalized runtime ratio
//! wall-clock(A with B) / wall-clock(A alone). The co-runner may be the
//! literal `Alone` for solo executions. Application identifiers are typed so
//! holdout membership is a set predicate, never a loose string comparison.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// File name of the runtime table at the data root.
pub const RUNTIMES_FILE: &str = "runtimes.csv";

const APP_COLUMN: &str = "A";
const CORUNNER_COLUMN: &str = "B";
const CONFIG_COLUMN: &str = "config";
const RUNTIME_COLUMN: &str = "normalized_runtime";
const ALONE: &str = "Alone";

/// Application identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AppName(String);

impl AppName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AppName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The B side of a pair: another application, or a solo run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CoRunner {
    Alone,
    App(AppName),
}

impl CoRunner {
    fn parse(field: &str) -> Self {
        if field == ALONE {
            CoRunner::Alone
        } else {
            CoRunner::App(AppName::new(field))
        }
    }

    pub fn is_alone(&self) -> bool {
        matches!(self, CoRunner::Alone)
    }

    pub fn app(&self) -> Option<&AppName> {
        match self {
            CoRunner::Alone => None,
            CoRunner::App(name) => Some(name),
        }
    }
}

impl fmt::Display for CoRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoRunner::Alone => f.write_str(ALONE),
            CoRunner::App(name) => write!(f, "{name}"),
        }
    }
}

/// One paired-run measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeRecord {
    pub a: AppName,
    pub b: CoRunner,
    pub config: String,
    pub normalized_runtime: f64,
}

impl RuntimeRecord {
    /// Run directory of this pair under the data root:
    /// `{root}/{config}/{A}_vs_{B}`, or `{root}/{config}/{A}` for solo runs.
    pub fn pair_dir(&self, root: &Path) -> PathBuf {
        let leaf = match &self.b {
            CoRunner::Alone => self.a.as_str().to_string(),
            CoRunner::App(b) => format!("{}_vs_{}", self.a, b),
        };
        root.join(&self.config).join(leaf)
    }
}

/// All runtime records of one experiment campaign.
#[derive(Debug, Clone, Default)]
pub struct RuntimeTable {
    records: Vec<RuntimeRecord>,
}

impl RuntimeTable {
    /// Load `runtimes.csv` from the data root.
    pub fn load(root: &Path) -> Result<Self> {
        Self::from_file(&root.join(RUNTIMES_FILE))
    }

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
        let a_idx = column(&columns, APP_COLUMN, path)?;
        let b_idx = column(&columns, CORUNNER_COLUMN, path)?;
        let config_idx = column(&columns, CONFIG_COLUMN, path)?;
        let runtime_idx = column(&columns, RUNTIME_COLUMN, path)?;

        let mut records = Vec::new();
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
            let normalized_runtime: f64 = fields[runtime_idx].parse().map_err(|_| {
                Error::parse(
                    path,
                    lineno,
                    format!("non-numeric normalized runtime '{}'", fields[runtime_idx]),
                )
            })?;
            records.push(RuntimeRecord {
                a: AppName::new(fields[a_idx]),
                b: CoRunner::parse(fields[b_idx]),
                config: fields[config_idx].to_string(),
                normalized_runtime,
            });
        }

        Ok(Self { records })
    }

    pub fn records(&self) -> &[RuntimeRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sorted distinct configuration labels.
    pub fn configurations(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self.records.iter().map(|r| r.config.as_str()).collect();
        set.into_iter().map(String::from).collect()
    }

    /// Sorted distinct applications (the A side), used by the leave-one-out
    /// driver loop.
    pub fn applications(&self) -> Vec<AppName> {
        let set: BTreeSet<&AppName> = self.records.iter().map(|r| &r.a).collect();
        set.into_iter().cloned().collect()
    }

    /// Records of one configuration, in table order.
    pub fn by_config<'a>(&'a self, config: &'a str) -> impl Iterator<Item = &'a RuntimeRecord> {
        self.records.iter().filter(move |r| r.config == config)
    }
}

fn column(columns: &[&str], name: &str, path: &Path) -> Result<usize> {
    columns
        .iter()
        .position(|c| *c == name)
        .ok_or_else(|| Error::parse(path, 1, format!("missing required column {name}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "A, B, config, normalized_runtime\n\
                         swim, milc, L3-SMT, 1.3\n\
                         swim, Alone, L3-SMT, 1.0\n\
                         milc, swim, L3-SMT-cores, 1.05\n";

    fn table() -> RuntimeTable {
        RuntimeTable::parse(TABLE, Path::new("runtimes.csv")).unwrap()
    }

    #[test]
    fn test_parses_records() {
        let t = table();
        assert_eq!(t.records().len(), 3);
        assert_eq!(t.records()[0].a, AppName::new("swim"));
        assert_eq!(t.records()[0].normalized_runtime, 1.3);
    }

    #[test]
    fn test_alone_is_typed_not_a_string() {
        let t = table();
        assert!(t.records()[1].b.is_alone());
        assert_eq!(t.records()[0].b.app(), Some(&AppName::new("milc")));
    }

    #[test]
    fn test_pair_dir_layout() {
        let t = table();
        let root = Path::new("/data");
        assert_eq!(
            t.records()[0].pair_dir(root),
            Path::new("/data/L3-SMT/swim_vs_milc")
        );
        assert_eq!(t.records()[1].pair_dir(root), Path::new("/data/L3-SMT/swim"));
    }

    #[test]
    fn test_applications_sorted_unique() {
        let apps = table().applications();
        assert_eq!(apps, vec![AppName::new("milc"), AppName::new("swim")]);
    }

    #[test]
    fn test_configurations_sorted_unique() {
        assert_eq!(table().configurations(), vec!["L3-SMT", "L3-SMT-cores"]);
    }

    #[test]
    fn test_by_config_filters() {
        let t = table();
        assert_eq!(t.by_config("L3-SMT").count(), 2);
        assert_eq!(t.by_config("unknown").count(), 0);
    }

    #[test]
    fn test_non_numeric_runtime_is_parse_error() {
        let err = RuntimeTable::parse(
            "A, B, config, normalized_runtime\nswim, milc, L3-SMT, fast\n",
            Path::new("runtimes.csv"),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }));
    }

    #[test]
    fn test_missing_column_is_parse_error() {
        let err = RuntimeTable::parse("A, B, config\n", Path::new("runtimes.csv")).unwrap_err();
        assert!(err.to_string().contains(RUNTIME_COLUMN));
    }
}
