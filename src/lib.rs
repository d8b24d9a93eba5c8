//! fidedu - In-place hardlink deduplication
//!
//! Walks one or more folders, finds regular files whose content and
//! attributes (mode, owner, group, size, mtime) are identical, and replaces
//! every duplicate on the same device with a hard link to one canonical
//! copy. Without `--compress` the run only reports what it would do.
//!
//! # Pipeline
//!
//! 1. [`scanner::Walker`] yields [`scanner::FileCandidate`]s
//! 2. [`duplicates::bucket_by_size`] discards files with a unique size
//! 3. [`duplicates::hash_bucket`] fingerprints the rest on a bounded pool
//! 4. [`duplicates::group_by_device`] splits matches per device
//! 5. [`duplicates::select_canonical`] picks the inode to keep
//! 6. [`actions::apply`] relinks (or, in dry-run, only plans)
//!
//! Fingerprints are trusted: content is not re-compared byte by byte
//! before linking.

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;

use crate::actions::{apply, ApplyConfig, DedupReport};
use crate::cli::{Cli, OutputFormat};
use crate::config::Config;
use crate::duplicates::{DuplicateFinder, FinderConfig};
use crate::error::ExitCode;
use crate::output::{JsonOutput, TextReport};
use crate::progress::{Progress, ProgressCallback, PHASE_WALKING};
use crate::scanner::{VisitedDirs, Walker};

/// Run one deduplication pass as described by `cli`.
///
/// # Errors
///
/// Returns an error for fatal conditions only: an unreadable configuration,
/// a hashing pool that cannot start, interruption during detection, or a
/// failure writing the report. Per-file problems are reported and reflected
/// in the returned [`ExitCode`].
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let config = Config::load(cli.config.as_deref())
        .context("Failed to load configuration")?
        .apply_cli(&cli);
    log::debug!("Effective configuration: {:?}", config);

    let handler = signal::install_handler()?;
    let shutdown = handler.get_flag();

    let text_output = cli.output == OutputFormat::Text;
    let show_progress = config.progress && !cli.quiet && text_output;
    let progress: Arc<dyn ProgressCallback> = Arc::new(Progress::new(!show_progress));

    if text_output && cli.verbose > 0 {
        let roots: Vec<String> = cli
            .folders
            .iter()
            .map(|p| {
                p.canonicalize()
                    .unwrap_or_else(|_| p.clone())
                    .display()
                    .to_string()
            })
            .collect();
        println!("[cfg] roots={}", roots.join(", "));
        println!("[cfg] workers={}", config.workers);
        println!(
            "[cfg] mode={}",
            if cli.compress { "EXECUTE" } else { "DRY-RUN" }
        );
    }

    // Walk
    let walker = Walker::new(cli.folders.clone(), config.walker_config())
        .with_shutdown_flag(Arc::clone(&shutdown))
        .with_progress_callback(Arc::clone(&progress));
    let mut visited = VisitedDirs::new();
    let mut candidates = Vec::new();
    let mut scan_warnings = Vec::new();

    progress.on_phase_start(PHASE_WALKING, 0);
    for item in walker.walk(&mut visited) {
        match item {
            Ok(candidate) => candidates.push(candidate),
            Err(e) => {
                log::warn!("Skipping entry: {}", e);
                scan_warnings.push(e.to_string());
            }
        }
    }
    progress.on_phase_end(PHASE_WALKING);
    log::info!(
        "Found {} candidate file(s) in {} director(y/ies)",
        candidates.len(),
        visited.len()
    );

    // Detect
    let finder = DuplicateFinder::new(
        FinderConfig::default()
            .with_workers(config.workers)
            .with_buffer_size(config.buffer_size)
            .with_shutdown_flag(Arc::clone(&shutdown))
            .with_progress_callback(Arc::clone(&progress)),
    );
    let outcome = finder.find_duplicates(candidates)?;

    // Plan and (optionally) relink
    let apply_config = ApplyConfig::default()
        .with_dry_run(!cli.compress)
        .with_verbose(cli.verbose > 0 || !text_output)
        .with_shutdown_flag(Arc::clone(&shutdown))
        .with_progress_callback(Arc::clone(&progress));
    let report = apply(&outcome.duplicates, &outcome.sizes, &apply_config);

    let exit_code = exit_code_for(
        &report,
        scan_warnings.len() + outcome.summary.warning_count(),
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match cli.output {
        OutputFormat::Text => {
            TextReport::new(&report)
                .write_to(&mut out)
                .context("Failed to write report")?;
        }
        OutputFormat::Json => {
            JsonOutput::new(&report, &outcome.summary, scan_warnings, exit_code)
                .write_to(&mut out, true)
                .context("Failed to write JSON report")?;
        }
    }
    out.flush().context("Failed to flush report")?;

    Ok(exit_code)
}

/// Exit code for a finished run.
///
/// `other_warnings` counts scan and hashing problems outside the report.
#[must_use]
pub fn exit_code_for(report: &DedupReport, other_warnings: usize) -> ExitCode {
    if report.interrupted {
        ExitCode::Interrupted
    } else if report.has_warnings() || other_warnings > 0 {
        ExitCode::PartialSuccess
    } else if report.is_empty() {
        ExitCode::NoDuplicates
    } else {
        ExitCode::Success
    }
}
