use fluxbase_core::{ClassifiedLine, LineLevel};
use once_cell::sync::Lazy;
use regex_lite::Regex;

const INFO_PREFIXES: &[&str] = &[
    "Download",
    "Downloading",
    "Check",
    "Checking",
    "Compile",
    "Compiling",
];

static ANSI_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").expect("static ANSI regex is valid"));

static WARNING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^warning:?").expect("static warning regex is valid"));

/// Strips ANSI/CSI escape sequences — colour, cursor movement, clear, and
/// extended 256/RGB forms all end in a letter after a `ESC [` prefix
/// (spec §4.D).
pub fn strip_ansi(line: &str) -> String {
    ANSI_RE.replace_all(line, "").into_owned()
}

/// Classifies an already-stripped (or raw — classification is idempotent
/// under stripping, spec §8) stderr line.
pub fn classify(line: &str) -> LineLevel {
    let cleaned = strip_ansi(line);
    let trimmed = cleaned.trim_start();

    if INFO_PREFIXES.iter().any(|p| trimmed.starts_with(p)) {
        LineLevel::Info
    } else if WARNING_RE.is_match(trimmed) {
        LineLevel::Warn
    } else {
        LineLevel::Error
    }
}

pub fn classify_line(line: &str) -> ClassifiedLine {
    ClassifiedLine {
        level: classify(line),
        text: strip_ansi(line),
    }
}

/// Byte-accurate truncation (spec §4.D): returns `s` unchanged if it
/// already fits; otherwise a prefix plus `"..."`, with `max < 3` handled
/// as a degenerate case that can still cut a multi-byte character at the
/// boundary.
pub fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    if max < 3 {
        return "...".chars().take(max).collect();
    }

    let keep = max - 3;
    let mut boundary = keep;
    while boundary > 0 && !s.is_char_boundary(boundary) {
        boundary -= 1;
    }

    let mut out = String::with_capacity(max);
    out.push_str(&s[..boundary]);
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_color_codes() {
        let line = "\x1b[31mError:\x1b[0m something broke";
        assert_eq!(strip_ansi(line), "Error: something broke");
    }

    #[test]
    fn strips_cursor_and_clear_sequences() {
        let line = "\x1b[2K\x1b[1Gprogress 50%";
        assert_eq!(strip_ansi(line), "progress 50%");
    }

    #[test]
    fn classifies_download_lines_as_info() {
        assert_eq!(classify("Downloading crate foo v1.0"), LineLevel::Info);
        assert_eq!(classify("Compiling foo v1.0"), LineLevel::Info);
    }

    #[test]
    fn classifies_warning_lines_case_insensitively() {
        assert_eq!(classify("warning: unused variable"), LineLevel::Warn);
        assert_eq!(classify("Warning unused import"), LineLevel::Warn);
    }

    #[test]
    fn classifies_everything_else_as_error() {
        assert_eq!(classify("thread panicked at src/main.rs"), LineLevel::Error);
        assert_eq!(classify(""), LineLevel::Error);
    }

    #[test]
    fn classification_is_stable_under_ansi_stripping() {
        let raw = "\x1b[33mwarning: deprecated\x1b[0m";
        assert_eq!(classify(raw), classify(&strip_ansi(raw)));
    }

    #[test]
    fn truncate_returns_source_when_it_already_fits() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello", 5), "hello");
    }

    #[test]
    fn truncate_appends_ellipsis_when_over_budget() {
        assert_eq!(truncate("hello world", 8), "hello...");
        assert_eq!(truncate("hello world", 8).len(), 8);
    }

    #[test]
    fn truncate_handles_degenerate_small_budgets() {
        assert_eq!(truncate("hello", 2), "..".to_string());
        assert_eq!(truncate("hello", 0), "".to_string());
    }

    #[test]
    fn truncate_never_splits_a_multibyte_character() {
        let s = "a\u{1F600}bcdef";
        let truncated = truncate(s, 5);
        assert!(truncated.len() <= 5);
        assert!(std::str::from_utf8(truncated.as_bytes()).is_ok());
    }
}
