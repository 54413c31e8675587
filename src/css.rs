//! CSS fragments appended to a book's stylesheet.
//!
//! Every declaration carries `!important` so the appended rules win over the
//! book's own styles regardless of selector specificity. Fragments start and end
//! with a newline so they never fuse with the last line of the existing file.

use std::fmt;

/// Margin size used when nothing else is configured.
pub const DEFAULT_MARGIN_PX: i32 = 20;

/// Margins above this tend to push text off the screen on small readers.
pub const MARGIN_CAUTION_PX: i32 = 20;

/// Which rules get injected into the stylesheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModificationKind {
    Margins,
    Hyphens,
    Both,
}

impl ModificationKind {
    pub fn all() -> &'static [ModificationKind] {
        &[
            ModificationKind::Margins,
            ModificationKind::Hyphens,
            ModificationKind::Both,
        ]
    }

    /// Whether the margin size has any effect on the generated fragment.
    pub fn uses_margin(&self) -> bool {
        matches!(self, ModificationKind::Margins | ModificationKind::Both)
    }

    /// Generate the fragment for this kind of modification.
    pub fn fragment(&self, margin_px: i32) -> String {
        match self {
            ModificationKind::Margins => margins(margin_px),
            ModificationKind::Hyphens => hyphens(),
            ModificationKind::Both => both(margin_px),
        }
    }

    /// Short human description, e.g. `margins -20px + no hyphenation`.
    pub fn describe(&self, margin_px: i32) -> String {
        match self {
            ModificationKind::Margins => format!("margins -{margin_px}px"),
            ModificationKind::Hyphens => "no hyphenation".to_string(),
            ModificationKind::Both => format!("margins -{margin_px}px + no hyphenation"),
        }
    }
}

impl fmt::Display for ModificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModificationKind::Margins => write!(f, "Reduce margins"),
            ModificationKind::Hyphens => write!(f, "Disable hyphenation"),
            ModificationKind::Both => write!(f, "Reduce margins and disable hyphenation"),
        }
    }
}

/// Pull `html` and `body` outwards by `size` pixels on both sides.
///
/// The size is inserted verbatim after a minus sign; zero is still emitted.
pub fn margins(size: i32) -> String {
    format!(
        r#"
/* Reduced margins for e-readers */
html, body {{
    margin-left: -{size}px !important;
    margin-right: -{size}px !important;
    padding: 0 !important;
}}
"#
    )
}

/// Turn off hyphenation and aggressive word breaking.
///
/// The paragraph-level block repeats the rules because some renderers ignore
/// the universal selector for inherited text properties.
pub fn hyphens() -> String {
    r#"
/* Hyphenation disabled for e-readers */
* {
    -webkit-hyphens: none !important;
    -moz-hyphens: none !important;
    -ms-hyphens: none !important;
    hyphens: none !important;
    word-break: keep-all !important;
    overflow-wrap: normal !important;
}

p, div, span, td, th {
    -webkit-hyphens: none !important;
    -moz-hyphens: none !important;
    -ms-hyphens: none !important;
    hyphens: none !important;
    word-break: keep-all !important;
}
"#
    .to_string()
}

/// Margins block followed by the hyphenation block.
pub fn both(size: i32) -> String {
    let mut css = margins(size);
    css.push_str(&hyphens());
    css
}
