//! Running a [`ModificationRequest`] over all of its targets.
//!
//! Each archive is upgraded independently; a failure is recorded against its
//! file and the batch moves on to the next one.

use crate::archive::{self, TransformReport};
use crate::error::UpgradeError;
use crate::request::{ModificationRequest, OutputMode};
use crate::ui::{paint, Tone};
use anyhow::{Context, Result};
use byte_unit::{Byte, UnitType};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

/// The result of upgrading a single file.
#[derive(Debug)]
pub struct FileOutcome {
    pub source: PathBuf,
    pub result: Result<TransformReport, UpgradeError>,
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub outcomes: Vec<FileOutcome>,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&PathBuf, &UpgradeError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (&o.source, e)))
    }

    pub fn all_succeeded(&self) -> bool {
        self.succeeded() == self.total()
    }
}

/// Upgrade every target of `request`, showing progress on the terminal.
///
/// Only setup problems (such as an output folder that can't be created) are
/// returned as errors; per-file failures end up in the summary.
pub fn run(request: &ModificationRequest, progress: &ProgressBar) -> Result<BatchSummary> {
    if let OutputMode::Folder(dir) = &request.output {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output folder '{}'", dir.display()))?;
    }

    let fragment = request.fragment();
    let description = request.describe();
    let mut summary = BatchSummary::default();

    for source in &request.targets {
        let destination = request.output.destination(source);
        progress.set_message(format!("{} ({description})", source.display()));
        log::info!(
            "upgrading '{}' -> '{}'",
            source.display(),
            destination.display()
        );

        let result = if !request.output.is_destructive() && same_file(source, &destination) {
            Err(UpgradeError::DestinationIsSource {
                path: source.clone(),
            })
        } else {
            archive::transform(source, &fragment, &destination)
        };
        match &result {
            Ok(report) => progress.println(paint(done_line(report), Tone::Success)),
            Err(e) => {
                log::error!("failed to upgrade '{}': {e}", source.display());
                progress.println(paint(
                    format!("  Error: {} - {e}", source.display()),
                    Tone::Danger,
                ));
            }
        }

        summary.outcomes.push(FileOutcome {
            source: source.clone(),
            result,
        });
        progress.inc(1);
    }

    progress.finish_and_clear();
    Ok(summary)
}

/// True if both paths exist and name the same file.
fn same_file(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// The per-file success line, e.g. `Done: out/a.epub (12 entries, 1.2 MiB)`.
fn done_line(report: &TransformReport) -> String {
    let size = Byte::from_u64(report.bytes_written).get_appropriate_unit(UnitType::Binary);
    let mut line = format!(
        "  Done: {} ({} entries, {size:.1})",
        report.destination.display(),
        report.entries_written
    );
    if report.created_stylesheet {
        line.push_str(&format!(", created {}", report.stylesheet));
    }
    line
}

/// A progress bar sized for `request`, styled like the rest of the CLI.
pub fn progress_bar(request: &ModificationRequest) -> ProgressBar {
    let progress = ProgressBar::new(request.targets.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("can parse progress style")
            .progress_chars("#>-"),
    );
    progress
}

/// Print the closing `Processed k of n files` report.
pub fn print_summary(request: &ModificationRequest, summary: &BatchSummary) {
    println!();
    let line = format!(
        "Processed {} of {} files",
        summary.succeeded(),
        summary.total()
    );
    let tone = if summary.all_succeeded() {
        Tone::Success
    } else {
        Tone::Warning
    };
    println!("{}", paint(line, tone));

    for (source, error) in summary.failures() {
        println!("  {}", paint(format!("{}: {error}", source.display()), Tone::Danger));
    }

    if let OutputMode::Folder(dir) = &request.output {
        if summary.succeeded() > 0 {
            println!("Saved into '{}'", dir.display());
        }
    }
}
