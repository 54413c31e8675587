use anyhow::{anyhow, Context, Result};
use cli::Cli;
use config::{Settings, SETTINGS_FILE};
use css::ModificationKind;
use discovery::Exclusions;
use request::{ModificationRequestBuilder, OutputMode};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use ui::{paint, Tone};

mod archive;
mod batch;
mod cli;
mod config;
mod css;
mod discovery;
mod error;
mod interactive;
mod request;
mod stylesheet;
mod ui;

fn main() -> ExitCode {
    match try_main() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{}: {e:#}", console::style("Error").red());
            ExitCode::FAILURE
        }
    }
}

/// Returns whether every selected file was upgraded.
fn try_main() -> Result<bool> {
    use clap::Parser;
    let cli = Cli::parse();

    let _logger = flexi_logger::Logger::try_with_env_or_str(cli.log_spec())
        .with_context(|| "Failed to configure logging")?
        .start()
        .with_context(|| "Failed to start logging")?;

    let settings = Settings::load(Path::new(SETTINGS_FILE))?;
    let exclusions = Exclusions::new(&settings.suffix)?;

    if cli.interactive {
        let candidates = discovery::scan(Path::new("."), &exclusions)?;
        return interactive::run(settings, candidates);
    }

    let targets = select_targets(&cli, Path::new("."), &exclusions)?;

    let kind = if cli.both {
        ModificationKind::Both
    } else if cli.hyphens {
        ModificationKind::Hyphens
    } else {
        ModificationKind::Margins
    };
    let output = if cli.overwrite {
        OutputMode::Overwrite
    } else if let Some(dir) = cli.output {
        OutputMode::Folder(dir)
    } else {
        OutputMode::Suffixed(settings.suffix.clone())
    };

    let request = ModificationRequestBuilder::default()
        .kind(kind)
        .margin_px(cli.margin.unwrap_or(settings.margin))
        .output(output)
        .targets(targets)
        .build()
        .with_context(|| "Failed to build modification request")?;

    println!(
        "Upgrading {} files ({}):",
        request.targets.len(),
        request.describe()
    );
    for target in &request.targets {
        println!("  - {}", target.display());
    }
    println!();
    if request.output.is_destructive() {
        log::warn!("overwriting {} original files in place", request.targets.len());
    }

    let progress = batch::progress_bar(&request);
    let summary = batch::run(&request, &progress)?;
    batch::print_summary(&request, &summary);

    Ok(summary.all_succeeded())
}

/// The files named on the command line, or every candidate in `dir` when none
/// were given (or `--all` was passed). Errors when nothing is left to process.
fn select_targets(cli: &Cli, dir: &Path, exclusions: &Exclusions) -> Result<Vec<PathBuf>> {
    if cli.all || cli.files.is_empty() {
        let found = discovery::scan(dir, exclusions)?;
        if found.is_empty() {
            return Err(anyhow!("No .epub files found in '{}'", dir.display()));
        }
        println!("Found {} .epub files in '{}'", found.len(), dir.display());
        return Ok(found);
    }

    let resolved = discovery::resolve(&cli.files, exclusions);
    for skipped in &resolved.skipped {
        println!(
            "{}",
            paint(
                format!("Skipping {}: {}", skipped.path.display(), skipped.reason),
                Tone::Muted
            )
        );
    }
    if resolved.targets.is_empty() {
        return Err(anyhow!("No files to process (see --help)"));
    }
    Ok(resolved.targets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::tests::write_epub;
    use clap::Parser;
    use tempfile::TempDir;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("epub-upgrade").chain(args.iter().copied()))
            .expect("can parse")
    }

    fn exclusions() -> Exclusions {
        Exclusions::new("-upgrade").expect("valid suffix")
    }

    #[test]
    fn empty_directory_has_nothing_to_process() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();

        let err = select_targets(&cli(&[]), dir.path(), &exclusions()).unwrap_err();
        assert!(err.to_string().contains("No .epub files found"), "{err:#}");
    }

    #[test]
    fn unresolvable_arguments_have_nothing_to_process() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.epub");
        let generated = dir.path().join("book-upgrade.epub");
        write_epub(&generated, &[]);

        let args = [missing.to_string_lossy(), generated.to_string_lossy()];
        let args: Vec<&str> = args.iter().map(|a| a.as_ref()).collect();
        let err = select_targets(&cli(&args), dir.path(), &exclusions()).unwrap_err();
        assert!(err.to_string().contains("No files to process"), "{err:#}");
    }

    #[test]
    fn scan_skips_generated_output() {
        let dir = TempDir::new().unwrap();
        write_epub(&dir.path().join("book.epub"), &[]);
        write_epub(&dir.path().join("book-upgrade.epub"), &[]);

        let targets = select_targets(&cli(&["--all"]), dir.path(), &exclusions()).unwrap();
        assert_eq!(targets, vec![dir.path().join("book.epub")]);
    }
}
