//! Finding the EPUB files a run should process.
//!
//! Files can come from a scan of a directory or from explicit arguments, which
//! may be literal paths or glob patterns. Files this tool generated earlier are
//! recognised by their name and left out of directory scans, so running the tool
//! twice in the same folder does not upgrade its own output.

use anyhow::{Context, Result};
use globset::{Glob, GlobMatcher, GlobSet, GlobSetBuilder};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Name fragments that mark a file as output of a previous run.
pub const OUTPUT_MARKERS: &[&str] = &[
    "-margins.epub",
    "-no-hyphens.epub",
    "-enhanced.epub",
    "-upgrade.epub",
];

/// Recognises file names produced by earlier runs.
#[derive(Debug, Clone)]
pub struct Exclusions {
    markers: GlobSet,
}

impl Exclusions {
    /// Build the exclusion set from [`OUTPUT_MARKERS`] plus the suffix
    /// currently configured for side-by-side output.
    pub fn new(suffix: &str) -> Result<Self> {
        let configured = format!("{suffix}.epub");
        let mut builder = GlobSetBuilder::new();
        for marker in OUTPUT_MARKERS
            .iter()
            .copied()
            .chain(std::iter::once(configured.as_str()))
        {
            let pattern = format!("*{}*", glob::Pattern::escape(marker));
            builder.add(
                Glob::new(&pattern)
                    .with_context(|| format!("Invalid output marker '{marker}'"))?,
            );
        }
        let markers = builder
            .build()
            .with_context(|| "Failed to build output marker set")?;
        Ok(Exclusions { markers })
    }

    /// True if `path`'s file name carries an output marker.
    pub fn is_generated(&self, path: &Path) -> bool {
        path.file_name()
            .map(|name| self.markers.is_match(Path::new(name)))
            .unwrap_or(false)
    }
}

/// Why an argument was not turned into a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NotFound,
    NotAFile,
    NotEpub,
    AlreadyUpgraded,
    NoMatches,
    BadPattern(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotFound => write!(f, "not found"),
            SkipReason::NotAFile => write!(f, "not a file"),
            SkipReason::NotEpub => write!(f, "not an .epub file"),
            SkipReason::AlreadyUpgraded => write!(f, "already an upgraded file"),
            SkipReason::NoMatches => write!(f, "pattern matched nothing"),
            SkipReason::BadPattern(e) => write!(f, "invalid pattern: {e}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// The outcome of resolving arguments: what to process and what was passed over.
#[derive(Debug, Default)]
pub struct Discovery {
    pub targets: Vec<PathBuf>,
    pub skipped: Vec<Skipped>,
}

fn epub_matcher() -> Result<GlobMatcher> {
    Ok(Glob::new("*.epub")
        .with_context(|| "Failed to parse epub glob")?
        .compile_matcher())
}

fn has_epub_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("epub"))
        .unwrap_or(false)
}

/// Drop `.` components so `./a.epub` prints as `a.epub`.
fn strip_cur_dir(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Collects targets keyed on the file they resolve to, so different spellings
/// of one file (`./a.epub`, `a.epub`, `sub/../a.epub`) collapse into one.
#[derive(Debug, Default)]
struct TargetSet {
    by_file: BTreeMap<PathBuf, PathBuf>,
}

impl TargetSet {
    fn insert(&mut self, path: PathBuf) {
        let shown = strip_cur_dir(&path);
        let key = std::fs::canonicalize(&path).unwrap_or_else(|_| shown.clone());
        self.by_file.entry(key).or_insert(shown);
    }

    fn into_sorted(self) -> Vec<PathBuf> {
        let mut targets: Vec<PathBuf> = self.by_file.into_values().collect();
        targets.sort();
        targets
    }
}

fn is_pattern(arg: &str) -> bool {
    arg.contains(['*', '?', '['])
}

/// List every `*.epub` file directly inside `dir`, minus generated output.
///
/// The extension match is case-sensitive. Results are sorted by path.
pub fn scan(dir: &Path, exclusions: &Exclusions) -> Result<Vec<PathBuf>> {
    let matcher = epub_matcher()?;
    let mut found = Vec::new();

    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to list directory '{}'", dir.display()))?;
    for entry in entries {
        let entry =
            entry.with_context(|| format!("Failed to read entry in '{}'", dir.display()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if !matcher.is_match(Path::new(&entry.file_name())) {
            continue;
        }
        if exclusions.is_generated(&path) {
            log::debug!("skipping generated file '{}'", path.display());
            continue;
        }
        found.push(path);
    }

    found.sort();
    Ok(found)
}

/// Resolve explicit arguments into a deduplicated, sorted set of targets.
///
/// Bad arguments are collected into [`Discovery::skipped`] rather than failing
/// the whole resolution.
pub fn resolve<S: AsRef<str>>(args: &[S], exclusions: &Exclusions) -> Discovery {
    let mut targets = TargetSet::default();
    let mut skipped = Vec::new();

    for arg in args {
        let arg = arg.as_ref();
        if is_pattern(arg) {
            expand_pattern(arg, exclusions, &mut targets, &mut skipped);
            continue;
        }

        let path = PathBuf::from(arg);
        match check_literal(&path, exclusions) {
            Ok(()) => {
                targets.insert(path);
            }
            Err(reason) => skipped.push(Skipped { path, reason }),
        }
    }

    for skip in &skipped {
        log::warn!("skipping '{}': {}", skip.path.display(), skip.reason);
    }

    Discovery {
        targets: targets.into_sorted(),
        skipped,
    }
}

fn check_literal(path: &Path, exclusions: &Exclusions) -> Result<(), SkipReason> {
    if !path.exists() {
        return Err(SkipReason::NotFound);
    }
    if !path.is_file() {
        return Err(SkipReason::NotAFile);
    }
    if !has_epub_extension(path) {
        return Err(SkipReason::NotEpub);
    }
    if exclusions.is_generated(path) {
        return Err(SkipReason::AlreadyUpgraded);
    }
    Ok(())
}

fn expand_pattern(
    pattern: &str,
    exclusions: &Exclusions,
    targets: &mut TargetSet,
    skipped: &mut Vec<Skipped>,
) {
    let paths = match glob::glob(pattern) {
        Ok(paths) => paths,
        Err(e) => {
            skipped.push(Skipped {
                path: PathBuf::from(pattern),
                reason: SkipReason::BadPattern(e.to_string()),
            });
            return;
        }
    };

    let mut matched = 0;
    for path in paths {
        let path = match path {
            Ok(path) => path,
            Err(e) => {
                log::warn!("cannot read '{}': {}", e.path().display(), e.error());
                continue;
            }
        };
        // patterns only ever contribute epub files; anything else is silently passed over
        if !path.is_file() || !has_epub_extension(&path) {
            continue;
        }
        matched += 1;
        if exclusions.is_generated(&path) {
            log::debug!("pattern '{pattern}' matched generated file '{}'", path.display());
            continue;
        }
        targets.insert(path);
    }

    if matched == 0 {
        skipped.push(Skipped {
            path: PathBuf::from(pattern),
            reason: SkipReason::NoMatches,
        });
    }
}
