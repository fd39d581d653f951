//! CLI argument parsing for Cotejar

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{ModelKind, UncoreMode, DEFAULT_CORRELATION_CUTOFF, DEFAULT_SLOWDOWN_CUTOFF};

#[derive(Parser, Debug)]
#[command(name = "cotejar")]
#[command(version)]
#[command(about = "Offline analysis of paired hardware performance-counter runs", long_about = None)]
pub struct Cli {
    /// Enable debug logging to stderr
    #[arg(long)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Pivot a run directory's raw sample log into a feature matrix
    Pivot {
        /// Run directory containing results.csv
        #[arg(long = "data", value_name = "DIR")]
        data: PathBuf,

        /// Which uncore counters the matrix file name reflects
        #[arg(long, value_enum, default_value = "shared")]
        uncore: UncoreMode,

        /// Drop events whose samples are all zero
        #[arg(long = "drop-zero")]
        drop_zero: bool,
    },

    /// Report pairwise event correlations for one feature matrix
    Correlate {
        /// Feature matrix file to analyze
        #[arg(long = "matrix", value_name = "FILE")]
        matrix: PathBuf,

        /// Correlation at or above which two events count as redundant
        #[arg(long, default_value_t = DEFAULT_CORRELATION_CUTOFF)]
        cutoff: f64,

        /// Directory for the report files (defaults to the matrix's directory)
        #[arg(long, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// Leave-application-out model evaluation over the full feature set
    Evaluate {
        /// Data directory root
        #[arg(long = "data", value_name = "DIR")]
        data: PathBuf,

        /// Which model to fit
        #[arg(long, value_enum, default_value = "svr")]
        model: ModelKind,

        /// Which configurations to include (L3-SMT, L3-SMT-cores, ...)
        #[arg(long = "config", num_args = 1.., default_values_t = [String::from("L3-SMT"), String::from("L3-SMT-cores")])]
        configs: Vec<String>,

        /// Applications to hold out as the test set; omitted means one
        /// leave-one-out evaluation per application
        #[arg(long = "tests", num_args = 1..)]
        tests: Vec<String>,

        /// Include solo (Alone) runs
        #[arg(long)]
        alone: bool,

        /// Which uncore counters to include
        #[arg(long, value_enum, default_value = "shared")]
        uncore: UncoreMode,

        /// Normalized-runtime cutoff for labelling a run as slowed down
        #[arg(long, default_value_t = DEFAULT_SLOWDOWN_CUTOFF)]
        cutoff: f64,

        /// Also export the assembled training/test sets as labelled CSVs
        #[arg(long)]
        export: bool,

        /// Also write the results table as JSON
        #[arg(long)]
        json: bool,
    },

    /// Feature-limited evaluation using the external grouping tool
    Select {
        /// Data directory root
        #[arg(long = "data", value_name = "DIR")]
        data: PathBuf,

        /// Path of the external feature-grouping executable
        #[arg(long, value_name = "BIN")]
        tool: PathBuf,

        /// Ranking file with reduced, relevant features; omitted means the
        /// per-application default under the data root
        #[arg(long, value_name = "FILE")]
        ranking: Option<PathBuf>,

        /// Which configurations to include (L3-SMT, L3-SMT-cores, ...)
        #[arg(long = "config", num_args = 1.., default_values_t = [String::from("L3-SMT"), String::from("L3-SMT-cores")])]
        configs: Vec<String>,

        /// Applications to hold out as the test set; omitted means one
        /// leave-one-out evaluation per application
        #[arg(long = "tests", num_args = 1..)]
        tests: Vec<String>,

        /// Include solo (Alone) runs
        #[arg(long)]
        alone: bool,

        /// Which uncore counters to include
        #[arg(long, value_enum, default_value = "shared")]
        uncore: UncoreMode,

        /// Normalized-runtime cutoff for labelling a run as slowed down
        #[arg(long, default_value_t = DEFAULT_SLOWDOWN_CUTOFF)]
        cutoff: f64,

        /// Cap on how many selected events are kept, in ranking order
        #[arg(long = "max-features", value_name = "N")]
        max_features: Option<usize>,

        /// Also write the results table as JSON
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_pivot() {
        let cli = Cli::parse_from(["cotejar", "pivot", "--data", "out/L3-SMT/swim_vs_milc"]);
        match cli.command {
            Command::Pivot {
                data,
                uncore,
                drop_zero,
            } => {
                assert_eq!(data, PathBuf::from("out/L3-SMT/swim_vs_milc"));
                assert_eq!(uncore, UncoreMode::Shared);
                assert!(!drop_zero);
            }
            _ => panic!("expected pivot"),
        }
    }

    #[test]
    fn test_cli_evaluate_defaults() {
        let cli = Cli::parse_from(["cotejar", "evaluate", "--data", "out"]);
        match cli.command {
            Command::Evaluate {
                model,
                configs,
                tests,
                alone,
                cutoff,
                ..
            } => {
                assert_eq!(model, ModelKind::Svr);
                assert_eq!(configs, vec!["L3-SMT", "L3-SMT-cores"]);
                assert!(tests.is_empty());
                assert!(!alone);
                assert_eq!(cutoff, DEFAULT_SLOWDOWN_CUTOFF);
            }
            _ => panic!("expected evaluate"),
        }
    }

    #[test]
    fn test_cli_evaluate_accepts_multiple_tests_and_configs() {
        let cli = Cli::parse_from([
            "cotejar", "evaluate", "--data", "out", "--config", "L3-SMT", "--tests", "swim",
            "milc", "--model", "svc", "--alone",
        ]);
        match cli.command {
            Command::Evaluate {
                model,
                configs,
                tests,
                alone,
                ..
            } => {
                assert_eq!(model, ModelKind::Svc);
                assert_eq!(configs, vec!["L3-SMT"]);
                assert_eq!(tests, vec!["swim", "milc"]);
                assert!(alone);
            }
            _ => panic!("expected evaluate"),
        }
    }

    #[test]
    fn test_cli_select_requires_tool() {
        assert!(Cli::try_parse_from(["cotejar", "select", "--data", "out"]).is_err());
        let cli = Cli::parse_from([
            "cotejar",
            "select",
            "--data",
            "out",
            "--tool",
            "target/release/grouper",
            "--max-features",
            "10",
        ]);
        match cli.command {
            Command::Select {
                tool, max_features, ..
            } => {
                assert_eq!(tool, PathBuf::from("target/release/grouper"));
                assert_eq!(max_features, Some(10));
            }
            _ => panic!("expected select"),
        }
    }

    #[test]
    fn test_cli_correlate_cutoff_default() {
        let cli = Cli::parse_from(["cotejar", "correlate", "--matrix", "m.csv"]);
        match cli.command {
            Command::Correlate { cutoff, output, .. } => {
                assert_eq!(cutoff, DEFAULT_CORRELATION_CUTOFF);
                assert!(output.is_none());
            }
            _ => panic!("expected correlate"),
        }
    }
}
