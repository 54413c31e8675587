use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about)]
pub struct Cli {
    /// EPUB files or glob patterns to upgrade (defaults to every .epub in the current directory)
    pub files: Vec<String>,

    /// Upgrade every .epub in the current directory, ignoring FILES
    #[clap(long)]
    pub all: bool,

    /// Margin reduction in pixels [default: 20, or `margin` from epub-upgrade.toml]
    #[clap(long, allow_negative_numbers = true)]
    pub margin: Option<i32>,

    /// Disable hyphenation instead of reducing margins
    #[clap(long, conflicts_with = "both")]
    pub hyphens: bool,

    /// Reduce margins and disable hyphenation
    #[clap(long)]
    pub both: bool,

    /// Write upgraded copies into this folder instead of beside the originals
    #[clap(long, value_name = "DIR", conflicts_with = "overwrite")]
    pub output: Option<PathBuf>,

    /// Replace the original files in place (no backups are kept)
    #[clap(long)]
    pub overwrite: bool,

    /// Choose everything through interactive menus
    #[clap(short, long, conflicts_with_all = ["files", "all"])]
    pub interactive: bool,

    /// Print more diagnostics (repeat for more)
    #[clap(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only print errors
    #[clap(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Log level specification handed to the logger.
    pub fn log_spec(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}
