//! Term extraction
//!
//! Derives the identifier to look up from a text buffer and a caret
//! position, or takes the user's selection as-is.

use crate::error::{Error, Result};
use std::fmt;

/// Whether `c` can be part of an identifier (letters, digits, underscore)
pub fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Extract the lookup term from a buffer.
///
/// A selection wins over the caret and is only case-folded, never trimmed.
/// Without a selection, the term is the maximal run of identifier
/// characters touching `caret_offset`. The offset counts characters and is
/// clamped to the buffer length. Returns an empty string when the caret
/// does not touch an identifier.
///
/// ```
/// use manlook::term::extract_term;
///
/// assert_eq!(extract_term("ptr = Malloc(16);", 8, None), "malloc");
/// assert_eq!(extract_term("a  b", 2, None), "");
/// assert_eq!(extract_term("ignored", 0, Some(" Open ")), " open ");
/// ```
pub fn extract_term(buffer_text: &str, caret_offset: usize, selected_text: Option<&str>) -> String {
    if let Some(selection) = selected_text {
        return selection.to_lowercase();
    }

    let chars: Vec<char> = buffer_text.chars().collect();
    let caret = caret_offset.min(chars.len());

    let start = chars[..caret]
        .iter()
        .rposition(|c| !is_identifier_char(*c))
        .map_or(0, |boundary| boundary + 1);

    let end = chars[caret..]
        .iter()
        .position(|c| !is_identifier_char(*c))
        .map_or(chars.len(), |boundary| caret + boundary);

    if start == end {
        return String::new();
    }

    chars[start..end].iter().collect::<String>().to_lowercase()
}

/// A validated lookup term: never empty, always lowercase
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LookupRequest {
    term: String,
}

impl LookupRequest {
    /// Build a request from a raw term, lowercasing it
    pub fn new(term: impl AsRef<str>) -> Result<Self> {
        let term = term.as_ref().to_lowercase();
        if term.is_empty() {
            return Err(Error::EmptyTerm);
        }
        Ok(Self { term })
    }

    /// Extract a term from a buffer and caret, see [`extract_term`]
    pub fn from_buffer(
        buffer_text: &str,
        caret_offset: usize,
        selected_text: Option<&str>,
    ) -> Result<Self> {
        Self::new(extract_term(buffer_text, caret_offset, selected_text))
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn into_term(self) -> String {
        self.term
    }
}

impl fmt::Display for LookupRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.term)
    }
}
