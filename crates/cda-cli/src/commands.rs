//! Command implementations.

use std::time::Duration;

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use cda_ingest::load_raw_dir;
use cda_model::{CancelToken, ResourceKind, RunReport, TransformOptions};
use cda_report::{create_or_extend, read_graph, write_graph, write_validation_report};
use cda_transform::TransformationPipeline;
use cda_validate::{Checkpoint, validate, validate_kind};

use crate::cli::{TransformArgs, ValidateArgs};
use cda_cli::types::RunOutcome;

pub fn run_transform(args: &TransformArgs) -> anyhow::Result<RunOutcome> {
    let (tables, stats) = load_raw_dir(&args.raw_dir)
        .with_context(|| format!("loading raw extract from {}", args.raw_dir.display()))?;
    info!(
        subjects = tables.subjects.len(),
        filtered = stats.filtered_subjects,
        "raw extract loaded"
    );

    let options = TransformOptions {
        sample_size: args.n_subjects,
        diagnosis_limit: args.n_diagnosis,
        file_limit: args.n_files,
        include_files: args.include_files,
        include_treatment: !args.no_treatment,
        include_condition: !args.no_condition,
        include_mutation: args.include_mutation,
        seed: args.seed,
    };

    let spinner = spinner("mapping and resolving");
    let pipeline = TransformationPipeline::new(&tables, options);
    let (graph, run) = pipeline.run();
    spinner.finish_and_clear();

    let summary = validate(&graph);

    let (output_dir, written) = if args.dry_run {
        (None, Vec::new())
    } else {
        let dir = args
            .output_dir
            .clone()
            .unwrap_or_else(|| args.raw_dir.join("META"));
        let written = if args.extend {
            create_or_extend(&graph, &dir)
        } else {
            write_graph(&graph, &dir)
        }
        .with_context(|| format!("writing ndjson to {}", dir.display()))?;
        (Some(dir), written)
    };

    if let Some(path) = &args.report {
        write_validation_report(&summary, Some(&run), path)
            .with_context(|| format!("writing validation report to {}", path.display()))?;
    }

    Ok(RunOutcome {
        summary,
        run,
        output_dir,
        written,
    })
}

pub fn run_validate(args: &ValidateArgs) -> anyhow::Result<RunOutcome> {
    let graph = read_graph(&args.meta_dir)
        .with_context(|| format!("reading emitted graph from {}", args.meta_dir.display()))?;

    // Validate kind by kind through a checkpoint so large graphs report
    // progress and an interrupted run could resume per kind.
    let cancel = CancelToken::new();
    let kinds: Vec<ResourceKind> = graph.kinds().collect();
    let bar = ProgressBar::new(kinds.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{msg} [{bar:30}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar.set_message("validating");
    let mut checkpoint = Checkpoint::new();
    for kind in kinds {
        if cancel.is_cancelled() {
            break;
        }
        checkpoint.summary.merge(validate_kind(&graph, kind));
        checkpoint.completed.insert(kind);
        bar.inc(1);
    }
    bar.finish_and_clear();

    if let Some(path) = &args.report {
        write_validation_report(&checkpoint.summary, None, path)
            .with_context(|| format!("writing validation report to {}", path.display()))?;
    }

    Ok(RunOutcome {
        summary: checkpoint.summary,
        run: RunReport::default(),
        output_dir: None,
        written: Vec::new(),
    })
}

pub fn run_kinds() {
    for kind in ResourceKind::ALL {
        println!("{kind}");
    }
}

fn spinner(message: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}
