//! Interactive menus for choosing what to upgrade and how.
//!
//! The flow is a small state machine: every prompt takes the choices made so
//! far and returns the next [`Step`]. "Back" options simply return an earlier
//! step, so there is no ad-hoc control flow between prompts.

use crate::batch;
use crate::config::Settings;
use crate::css::{ModificationKind, MARGIN_CAUTION_PX};
use crate::request::{ModificationRequest, ModificationRequestBuilder, OutputMode};
use crate::ui::{banner, paint, Tone};
use anyhow::{anyhow, Context, Result};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};
use indicatif::ProgressBar;
use std::cell::Cell;
use std::path::PathBuf;

const WIDTH: usize = 50;

/// Where the menu flow currently is, along with everything chosen so far.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    ChooseKind,
    ChooseMargin {
        kind: ModificationKind,
    },
    ChooseOutput {
        kind: ModificationKind,
        margin_px: i32,
    },
    ConfirmOverwrite {
        kind: ModificationKind,
        margin_px: i32,
    },
    ChooseFiles {
        kind: ModificationKind,
        margin_px: i32,
        output: OutputMode,
    },
    Confirm(ModificationRequest),
    Process(ModificationRequest),
    AskContinue,
    Done,
}

/// Menu entries for the first prompt; the final entry exits.
fn kind_items() -> Vec<String> {
    ModificationKind::all()
        .iter()
        .map(ToString::to_string)
        .chain(std::iter::once("Exit".to_string()))
        .collect()
}

/// Map a kind-menu index to the next step.
fn after_kind(selection: usize, default_margin: i32) -> Step {
    match ModificationKind::all().get(selection) {
        Some(kind) if kind.uses_margin() => Step::ChooseMargin { kind: *kind },
        Some(kind) => Step::ChooseOutput {
            kind: *kind,
            margin_px: default_margin,
        },
        None => Step::Done,
    }
}

/// Map a file-menu index to the selected files: each file on its own, then
/// "all files", then "back" (`None`).
fn selected_files(candidates: &[PathBuf], selection: usize) -> Option<Vec<PathBuf>> {
    match selection {
        i if i < candidates.len() => Some(vec![candidates[i].clone()]),
        i if i == candidates.len() => Some(candidates.to_vec()),
        _ => None,
    }
}

/// Run one batch to completion and print its summary.
///
/// Returns whether every file was upgraded. A batch that can't start (for
/// example because the output folder can't be created) is reported here rather
/// than ending the session.
fn run_batch(request: &ModificationRequest, progress: &ProgressBar) -> bool {
    match batch::run(request, progress) {
        Ok(summary) => {
            batch::print_summary(request, &summary);
            summary.all_succeeded()
        }
        Err(e) => {
            progress.finish_and_clear();
            log::error!("batch failed: {e:#}");
            println!("{}", paint(format!("Error: {e:#}"), Tone::Danger));
            false
        }
    }
}

struct Session {
    theme: ColorfulTheme,
    settings: Settings,
    candidates: Vec<PathBuf>,
    all_succeeded: Cell<bool>,
}

impl Session {
    fn advance(&self, step: Step) -> Result<Step> {
        match step {
            Step::ChooseKind => self.choose_kind(),
            Step::ChooseMargin { kind } => self.choose_margin(kind),
            Step::ChooseOutput { kind, margin_px } => self.choose_output(kind, margin_px),
            Step::ConfirmOverwrite { kind, margin_px } => {
                self.confirm_overwrite(kind, margin_px)
            }
            Step::ChooseFiles {
                kind,
                margin_px,
                output,
            } => self.choose_files(kind, margin_px, output),
            Step::Confirm(request) => self.confirm(request),
            Step::Process(request) => self.process(request),
            Step::AskContinue => self.ask_continue(),
            Step::Done => Ok(Step::Done),
        }
    }

    fn choose_kind(&self) -> Result<Step> {
        println!("\n{}", banner("MODIFICATION", WIDTH, Tone::Heading));
        let selection = Select::with_theme(&self.theme)
            .with_prompt("What do you want to change?")
            .items(&kind_items())
            .default(0)
            .interact()
            .with_context(|| "Failed to obtain modification kind")?;
        Ok(after_kind(selection, self.settings.margin))
    }

    fn choose_margin(&self, kind: ModificationKind) -> Result<Step> {
        println!("\n{}", banner("MARGIN SIZE", WIDTH, Tone::Heading));
        println!("Margins are pulled outwards by this many pixels.");
        println!(
            "{} values above {MARGIN_CAUTION_PX} can push text off the screen.",
            paint("Caution:", Tone::Warning)
        );
        let margin_px: i32 = Input::with_theme(&self.theme)
            .with_prompt("Margin reduction in pixels")
            .default(self.settings.margin)
            .interact()
            .with_context(|| "Failed to obtain margin size")?;
        if margin_px > MARGIN_CAUTION_PX {
            println!(
                "{}",
                paint(
                    format!("Using {margin_px}px; check the result on your device."),
                    Tone::Warning
                )
            );
        }
        Ok(Step::ChooseOutput { kind, margin_px })
    }

    fn choose_output(&self, kind: ModificationKind, margin_px: i32) -> Result<Step> {
        println!("\n{}", banner("SAVING", WIDTH, Tone::Heading));
        let folder = OutputMode::Folder(self.settings.output_dir.clone());
        let items = [
            format!("Into the '{}' folder", self.settings.output_dir.display()),
            "Replace the original files".to_string(),
            "Back".to_string(),
        ];
        let selection = Select::with_theme(&self.theme)
            .with_prompt("Where should upgraded books go?")
            .items(&items)
            .default(0)
            .interact()
            .with_context(|| "Failed to obtain output mode")?;
        Ok(match selection {
            0 => Step::ChooseFiles {
                kind,
                margin_px,
                output: folder,
            },
            1 => Step::ConfirmOverwrite { kind, margin_px },
            _ => Step::ChooseKind,
        })
    }

    fn confirm_overwrite(&self, kind: ModificationKind, margin_px: i32) -> Result<Step> {
        println!("\n{}", banner("WARNING", WIDTH, Tone::Danger));
        println!("{}", paint("You chose to replace the original files!", Tone::Warning));
        println!("{}", paint("  - originals are changed permanently", Tone::Danger));
        println!("{}", paint("  - no backup copies are made", Tone::Danger));
        println!("{}", paint("  - the change cannot be undone", Tone::Danger));
        println!(
            "{}",
            paint(
                format!(
                    "Saving into '{}' is the safer choice.",
                    self.settings.output_dir.display()
                ),
                Tone::Success
            )
        );
        let confirmed = Confirm::with_theme(&self.theme)
            .with_prompt("Do you REALLY want to replace the original files?")
            .default(false)
            .interact()
            .with_context(|| "Failed to obtain overwrite confirmation")?;
        if confirmed {
            Ok(Step::ChooseFiles {
                kind,
                margin_px,
                output: OutputMode::Overwrite,
            })
        } else {
            println!("{}", paint("Cancelled, back to choosing where to save.", Tone::Success));
            Ok(Step::ChooseOutput { kind, margin_px })
        }
    }

    fn choose_files(
        &self,
        kind: ModificationKind,
        margin_px: i32,
        output: OutputMode,
    ) -> Result<Step> {
        let title = format!("FOUND {} EPUB FILES", self.candidates.len());
        println!("\n{}", banner(&title, WIDTH, Tone::Heading));
        let items: Vec<String> = self
            .candidates
            .iter()
            .map(|p| p.display().to_string())
            .chain(["All files".to_string(), "Back".to_string()])
            .collect();
        let selection = Select::with_theme(&self.theme)
            .with_prompt("Which books?")
            .items(&items)
            .default(self.candidates.len())
            .interact()
            .with_context(|| "Failed to obtain file selection")?;

        let Some(targets) = selected_files(&self.candidates, selection) else {
            return Ok(Step::ChooseKind);
        };
        let request = ModificationRequestBuilder::default()
            .kind(kind)
            .margin_px(margin_px)
            .output(output)
            .targets(targets)
            .build()
            .with_context(|| "Failed to build modification request")?;
        Ok(Step::Confirm(request))
    }

    fn confirm(&self, request: ModificationRequest) -> Result<Step> {
        println!("\n{}", banner("CONFIRM", WIDTH, Tone::Heading));
        println!("Modification: {}", request.describe());
        println!("Saving:       {}", request.output);
        println!("Files:        {}", request.targets.len());
        if request.output.is_destructive() {
            println!("{}", paint("Originals will be replaced.", Tone::Danger));
        }
        let go = Confirm::with_theme(&self.theme)
            .with_prompt("Start processing?")
            .default(true)
            .interact()
            .with_context(|| "Failed to obtain confirmation")?;
        Ok(if go {
            Step::Process(request)
        } else {
            Step::ChooseKind
        })
    }

    fn process(&self, request: ModificationRequest) -> Result<Step> {
        println!("\n{}", banner("PROCESSING", WIDTH, Tone::Heading));
        let progress = batch::progress_bar(&request);
        if !run_batch(&request, &progress) {
            self.all_succeeded.set(false);
        }
        Ok(Step::AskContinue)
    }

    fn ask_continue(&self) -> Result<Step> {
        let again = Confirm::with_theme(&self.theme)
            .with_prompt("Upgrade another batch?")
            .default(false)
            .interact()
            .with_context(|| "Failed to obtain answer")?;
        Ok(if again { Step::ChooseKind } else { Step::Done })
    }
}

/// Run the menu flow over the given candidate files until the user exits.
///
/// Returns whether every batch processed during the session fully succeeded.
pub fn run(settings: Settings, candidates: Vec<PathBuf>) -> Result<bool> {
    println!("{}", banner("EPUB UPGRADE", 60, Tone::Heading));
    println!("{}", paint("Tighter margins and no hyphenation for e-readers", Tone::Info));

    if candidates.is_empty() {
        return Err(anyhow!(
            "No EPUB files found; put some .epub files in the current directory"
        ));
    }

    let session = Session {
        theme: ColorfulTheme::default(),
        settings,
        candidates,
        all_succeeded: Cell::new(true),
    };

    let mut step = Step::ChooseKind;
    while step != Step::Done {
        step = session.advance(step)?;
    }
    println!("\nAll done.");
    Ok(session.all_succeeded.get())
}
