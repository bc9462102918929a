//! Property-based tests for output normalization

use manlook::fetcher::{normalize, strip_overstrike, NO_ENTRY_MESSAGE, TIMEOUT_MESSAGE};
use manlook::process::ProcessResult;
use proptest::prelude::*;

proptest! {
    #[test]
    fn test_plain_text_is_untouched(text in "[^\\x08]{0,300}") {
        prop_assert_eq!(strip_overstrike(&text), text.as_str());
    }

    #[test]
    fn test_bold_text_reads_back(text in "[a-zA-Z0-9 ()_.,-]{0,80}") {
        let bold: String = text.chars().flat_map(|c| [c, '\x08', c]).collect();
        prop_assert_eq!(strip_overstrike(&bold), text.as_str());
    }

    #[test]
    fn test_underlined_text_reads_back(text in "[a-zA-Z0-9 ()_.,-]{0,80}") {
        let underlined: String = text.chars().flat_map(|c| ['_', '\x08', c]).collect();
        prop_assert_eq!(strip_overstrike(&underlined), text.as_str());
    }

    #[test]
    fn test_successful_output_is_never_blank(text in "[a-z\\x08\\n ]{0,200}") {
        let shown = normalize(&ProcessResult::completed(0, text, ""), true);
        prop_assert!(!shown.is_empty());
    }

    #[test]
    fn test_failed_output_is_stderr_regardless_of_stdout(
        code in 1i32..255,
        stdout in "\\PC{0,100}",
        stderr in "[a-zA-Z ]{1,80}",
    ) {
        let shown = normalize(&ProcessResult::completed(code, stdout, stderr.clone()), true);
        prop_assert_eq!(shown, stderr);
    }

    #[test]
    fn test_timeout_text_is_fixed(strip in any::<bool>()) {
        prop_assert_eq!(normalize(&ProcessResult::timed_out(), strip), TIMEOUT_MESSAGE);
    }

    #[test]
    fn test_empty_success_is_no_entry(newlines in 0usize..2) {
        let stdout = "\n".repeat(newlines);
        prop_assert_eq!(normalize(&ProcessResult::completed(0, stdout, ""), true), NO_ENTRY_MESSAGE);
    }
}
