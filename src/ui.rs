//! Terminal styling helpers.
//!
//! Styling is a pure function of the text and a [`Tone`]; colour support is
//! decided by `console` per call, so nothing here holds global state.

use console::style;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Heading,
    Info,
    Success,
    Warning,
    Danger,
    Muted,
}

/// Render `text` in the given tone.
pub fn paint(text: impl AsRef<str>, tone: Tone) -> String {
    let text = text.as_ref();
    let styled = match tone {
        Tone::Heading => style(text).cyan().bold(),
        Tone::Info => style(text).white(),
        Tone::Success => style(text).green(),
        Tone::Warning => style(text).yellow().bold(),
        Tone::Danger => style(text).red(),
        Tone::Muted => style(text).dim(),
    };
    styled.to_string()
}

/// A centred title between two horizontal rules.
pub fn banner(title: &str, width: usize, tone: Tone) -> String {
    let rule = "=".repeat(width);
    format!(
        "{}\n{}\n{}",
        paint(&rule, tone),
        paint(format!("{title:^width$}"), tone),
        paint(&rule, tone)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_survives_styling() {
        console::set_colors_enabled(false);
        assert_eq!(paint("done", Tone::Success), "done");
    }

    #[test]
    fn banner_centres_title() {
        console::set_colors_enabled(false);
        let lines: Vec<_> = banner("HI", 6, Tone::Heading)
            .lines()
            .map(str::to_string)
            .collect();
        assert_eq!(lines, vec!["======", "  HI  ", "======"]);
    }
}
