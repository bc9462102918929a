//! Unit Tests for Output Normalization

use manlook::fetcher::{
    man_command, normalize, normalize_line_endings, strip_ansi, strip_overstrike, NO_ENTRY_MESSAGE,
    TIMEOUT_MESSAGE,
};
use manlook::config::FetchConfig;
use manlook::process::ProcessResult;

#[test]
fn test_overstrike_bold_and_underline() {
    assert_eq!(strip_overstrike("f\x08foo\x08o"), "foo");
    assert_eq!(strip_overstrike("B\x08BO\x08OL\x08LD\x08D"), "BOLD");
    assert_eq!(strip_overstrike("_\x08u_\x08l"), "ul");
}

#[test]
fn test_overstrike_removes_preceding_multibyte_char() {
    assert_eq!(strip_overstrike("é\x08é"), "é");
}

#[test]
fn test_overstrike_spans_newline() {
    assert_eq!(strip_overstrike("a\n\x08b"), "ab");
}

#[test]
fn test_lone_leading_backspace_is_kept() {
    assert_eq!(strip_overstrike("\x08x"), "\x08x");
}

#[test]
fn test_ansi_sequences_removed() {
    assert_eq!(strip_ansi("\x1b[1;31merror\x1b[0m: \x1b[Kdone"), "error: done");
}

#[test]
fn test_line_endings() {
    assert_eq!(normalize_line_endings("one\r\ntwo\r\n"), "one\ntwo");
    assert_eq!(normalize_line_endings("one\n\nthree\n"), "one\n\nthree");
}

#[test]
fn test_normalize_outcomes() {
    assert_eq!(
        normalize(&ProcessResult::completed(0, "N\x08NAME\n", ""), true),
        "NAME"
    );
    assert_eq!(normalize(&ProcessResult::completed(0, "", ""), true), NO_ENTRY_MESSAGE);
    assert_eq!(normalize(&ProcessResult::completed(0, "\n\n", ""), true), "\n");
    assert_eq!(
        normalize(&ProcessResult::completed(1, "", "No manual entry for xyz"), true),
        "No manual entry for xyz"
    );
    assert_eq!(normalize(&ProcessResult::timed_out(), true), TIMEOUT_MESSAGE);
}

#[test]
fn test_failure_with_empty_stderr_is_empty_text() {
    assert_eq!(normalize(&ProcessResult::completed(16, "", ""), true), "");
}

#[test]
fn test_man_command_shape() {
    let spec = man_command(&FetchConfig::default(), "getpid");
    assert_eq!(spec.to_string(), "man -S 2:3 getpid");
}
