// Terminal stream filtering: ANSI stripping and ready-prompt detection.
//
// The CLI renders a full-screen TUI, so its output is a soup of escape
// sequences, redraws and partial frames. All reply framing decisions are
// made on the stripped text.

use regex::Regex;
use std::sync::OnceLock;

fn ansi_pattern() -> &'static Regex {
    static ANSI: OnceLock<Regex> = OnceLock::new();
    ANSI.get_or_init(|| {
        // CSI sequences, OSC sequences (BEL- or ST-terminated), charset
        // designations, then the remaining single-character ESC forms.
        Regex::new(
            r"\x1b\[[0-9;?!]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)?|\x1b[()*+][0-9A-Za-z]|\x1b[0-9=<>~@A-Z\\^_a-z]",
        )
        .unwrap()
    })
}

/// Remove ANSI/VT escape sequences. Pure and stateless.
pub fn strip_ansi(text: &str) -> String {
    ansi_pattern().replace_all(text, "").into_owned()
}

/// True when the stripped text looks like the CLI sitting idle at an input
/// prompt. Ordered signature table, first match wins, any single match is
/// sufficient:
///
///   1. trailing chevron (the bare `>` input line)
///   2. bordered input box (a `│ > ... │` row of the framed UI)
///   3. trailing `Human:` conversation label
///   4. trailing shell-style `$` prompt
///
/// The CLI exposes no structured end-of-turn signal, so this table is the
/// only way to tell "idle, awaiting input" from "still rendering". Output
/// format stability across CLI versions is not guaranteed; misdetection in
/// either direction is an accepted risk of the approach.
pub fn is_prompt_ready(text: &str) -> bool {
    let clean = strip_ansi(text);
    let trimmed = clean.trim_end();
    if trimmed.is_empty() {
        return false;
    }

    if trimmed.ends_with('>') {
        return true;
    }

    if clean.lines().rev().take(6).any(is_input_box_line) {
        return true;
    }

    if trimmed.ends_with("Human:") {
        return true;
    }

    if trimmed.ends_with('$') {
        return true;
    }

    false
}

/// A `│`-framed row whose content starts with the input chevron.
fn is_input_box_line(line: &str) -> bool {
    let t = line.trim();
    t.starts_with('│') && t.trim_start_matches('│').trim_start().starts_with('>')
}
