use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cotejar::cli::{Cli, Command};
use cotejar::config::{ModelKind, UncoreMode};
use cotejar::correlation;
use cotejar::dataset::{assemble, AssemblyOptions, Holdout};
use cotejar::evaluate::{evaluate, EvalOutcome};
use cotejar::grouping::GroupingTool;
use cotejar::pivot::{pivot_run, PivotOptions};
use cotejar::report::{self, ResultsTable};
use cotejar::runtimes::{AppName, RuntimeTable};

/// Initialize tracing subscriber for progress and skip notices
fn init_tracing(debug: bool) {
    let level = if debug {
        tracing::Level::TRACE
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();
}

/// One holdout per sorted application when no explicit test set was given,
/// otherwise the given applications as a single holdout.
fn resolve_holdouts(table: &RuntimeTable, tests: &[String]) -> Vec<Holdout> {
    if tests.is_empty() {
        table
            .applications()
            .into_iter()
            .map(|app| Holdout::new([app]))
            .collect()
    } else {
        vec![Holdout::new(tests.iter().map(AppName::new))]
    }
}

fn run_correlate(matrix_path: &Path, cutoff: f64, output: Option<PathBuf>) -> Result<()> {
    let matrix = cotejar::matrix::FeatureMatrix::from_csv_file(matrix_path)?;
    let output_dir = match output {
        Some(dir) => dir,
        None => matrix_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    let correlation = correlation::write_reports(&matrix, cutoff, &output_dir)?;
    let excluded = correlation.excluded_events(cutoff);
    info!(
        "correlation reports written to {} ({} events, {} redundant at cutoff {})",
        output_dir.display(),
        correlation.events().len(),
        excluded.len(),
        cutoff
    );
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_evaluate(
    data: &Path,
    model: ModelKind,
    configs: &[String],
    tests: &[String],
    alone: bool,
    uncore: UncoreMode,
    cutoff: f64,
    export: bool,
    json: bool,
) -> Result<()> {
    let table = RuntimeTable::load(data)?;
    let options = AssemblyOptions {
        configs: configs.to_vec(),
        include_alone: alone,
        uncore,
    };
    let configs_label = configs.join(" ");
    let mut results = ResultsTable::new(EvalOutcome::columns(model));

    if export && tests.is_empty() {
        // Whole-campaign export: every completed pair lands in the training
        // block when nothing is held out.
        let set = assemble(data, &table, &options, &Holdout::empty())?;
        let written =
            report::export_training_sets(data, &set, "", configs, uncore, model, cutoff)?;
        info!("exported complete feature block to {}", written[0].display());
    }

    for holdout in resolve_holdouts(&table, tests) {
        let label = holdout.label();
        let set = assemble(data, &table, &options, &holdout)?;
        if export {
            report::export_training_sets(data, &set, &label, configs, uncore, model, cutoff)?;
        }
        let metrics = evaluate(&set, model, cutoff, &label)?;
        info!(
            "evaluated held-out {} ({} training / {} test samples)",
            label,
            set.train_samples(),
            set.test_samples()
        );
        results.push(
            EvalOutcome {
                training_configs: configs_label.clone(),
                held_out: label,
                samples_training: set.train_samples(),
                samples_test: set.test_samples(),
                metrics,
            }
            .row(),
        );
    }

    print!("{}", results.render());
    let csv_path = data.join(report::results_filename(model, configs, uncore));
    results.write_csv(&csv_path)?;
    info!("results table written to {}", csv_path.display());
    if json {
        results.write_json(&csv_path.with_extension("json"))?;
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_select(
    data: &Path,
    tool: &Path,
    ranking: Option<PathBuf>,
    configs: &[String],
    tests: &[String],
    alone: bool,
    uncore: UncoreMode,
    cutoff: f64,
    max_features: Option<usize>,
    json: bool,
) -> Result<()> {
    let table = RuntimeTable::load(data)?;
    let tool = GroupingTool::new(tool);
    let options = AssemblyOptions {
        configs: configs.to_vec(),
        include_alone: alone,
        uncore,
    };
    let configs_label = configs.join(" ");
    let mut results = ResultsTable::new(EvalOutcome::columns(ModelKind::Svc));

    for holdout in resolve_holdouts(&table, tests) {
        let label = holdout.label();
        let ranking_file = match &ranking {
            Some(path) => path.clone(),
            None => {
                let default = data.join(format!(
                    "topk_svm_{}_{}.csv",
                    label.replace(' ', "_"),
                    configs.join("_")
                ));
                if !default.exists() {
                    warn!(
                        "skipping {} because the ranking file {} does not exist",
                        label,
                        default.display()
                    );
                    continue;
                }
                default
            }
        };

        let mut events = tool.select_events(&ranking_file)?;
        if let Some(cap) = max_features {
            events.truncate(cap);
        }
        info!("evaluating {} with {} selected events", label, events.len());

        let set = assemble(data, &table, &options, &holdout)?.restrict(&events)?;
        let metrics = evaluate(&set, ModelKind::Svc, cutoff, &label)?;
        results.push(
            EvalOutcome {
                training_configs: configs_label.clone(),
                held_out: label,
                samples_training: set.train_samples(),
                samples_test: set.test_samples(),
                metrics,
            }
            .row(),
        );
    }

    print!("{}", results.render());
    let csv_path = data.join(report::SELECT_RESULTS_FILE);
    results.write_csv(&csv_path)?;
    info!("results table written to {}", csv_path.display());
    if json {
        results.write_json(&csv_path.with_extension("json"))?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match cli.command {
        Command::Pivot {
            data,
            uncore,
            drop_zero,
        } => {
            let options = PivotOptions {
                uncore,
                drop_zero_events: drop_zero,
            };
            pivot_run(&data, &options)?;
        }
        Command::Correlate {
            matrix,
            cutoff,
            output,
        } => run_correlate(&matrix, cutoff, output)?,
        Command::Evaluate {
            data,
            model,
            configs,
            tests,
            alone,
            uncore,
            cutoff,
            export,
            json,
        } => run_evaluate(
            &data, model, &configs, &tests, alone, uncore, cutoff, export, json,
        )?,
        Command::Select {
            data,
            tool,
            ranking,
            configs,
            tests,
            alone,
            uncore,
            cutoff,
            max_features,
            json,
        } => run_select(
            &data,
            &tool,
            ranking,
            &configs,
            &tests,
            alone,
            uncore,
            cutoff,
            max_features,
            json,
        )?,
    }

    Ok(())
}
