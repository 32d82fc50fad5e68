//! Dashboard — the text shown in the floating status panel.
//!
//! One line per command part, plus the flag alphabet with active flags
//! bracketed. Rendering only produces lines; the host decides how to draw
//! them. Lines never exceed the configured panel width (measured in
//! terminal columns, so wide chars count double).

use n_cmdline::ParsedCommand;
use n_cmdline::range::CmdRange;
use unicode_width::UnicodeWidthChar;

use crate::config::Settings;
use crate::session::SessionMode;

const LABEL_WIDTH: usize = 8;

/// Render the panel for the current command.
#[must_use]
pub fn render(cmd: Option<&ParsedCommand>, mode: SessionMode, settings: &Settings) -> Vec<String> {
    let width = settings.panel.width;
    let origin = match mode {
        SessionMode::Active => "compose",
        SessionMode::AutoDetected => "detected",
        SessionMode::Inactive => "inactive",
    };
    let mut lines = vec![format!("{} ({origin})", settings.panel.title)];

    let Some(cmd) = cmd else {
        lines.push("not a substitute command".to_string());
        return lines.into_iter().map(|l| truncate(&l, width)).collect();
    };

    let range = CmdRange::classify(&cmd.range);
    let dialect = cmd
        .dialect
        .map_or_else(|| "none".to_string(), |d| format!("{d}  {}", d.display_name()));

    lines.push(row("range", &format!("{}  {}", cmd.range, range.display_name())));
    lines.push(row("sep", &cmd.separator.to_string()));
    lines.push(row("dialect", &dialect));
    lines.push(row("search", &cmd.search));
    lines.push(row("replace", &cmd.replace));
    lines.push(row("flags", &flag_line(cmd, &settings.flags)));

    lines.into_iter().map(|l| truncate(&l, width)).collect()
}

fn row(label: &str, value: &str) -> String {
    format!("{label:<LABEL_WIDTH$}{value}")
}

/// `[g] c [i]`: the alphabet with active flags bracketed.
fn flag_line(cmd: &ParsedCommand, alphabet: &[char]) -> String {
    alphabet
        .iter()
        .map(|&f| {
            if cmd.flags.contains(f) {
                format!("[{f}]")
            } else {
                f.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Cut `line` to `width` columns, marking the cut with `…`.
fn truncate(line: &str, width: usize) -> String {
    let total: usize = line.chars().map(|c| c.width().unwrap_or(0)).sum();
    if total <= width {
        return line.to_string();
    }

    let budget = width.saturating_sub(1);
    let mut used = 0;
    let mut out = String::new();
    for ch in line.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push('…');
    out
}
