//! A single validated expression, as produced by an upstream validator.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One expression in a CAS session.
///
/// An entry carries the text exactly as it was produced upstream, the
/// validity verdict of the upstream validator, and the state that a
/// [`Session`](crate::session::Session) fills in from the engine's reply:
/// the computed value, its display form, and any error text.
///
/// Entries are plain values. A session owns its entries exclusively and
/// clones them whenever they cross a session boundary, so two sessions never
/// share one.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CasEntry {
    key: String,
    raw: String,
    valid: bool,
    value: Option<String>,
    display: Option<String>,
    errors: Vec<String>,
    answernote: Option<String>,
    feedback: Option<String>,
}

impl CasEntry {
    /// Creates a valid entry. An empty key makes the entry anonymous; the
    /// session will label it `dumvarN` (N = its position) for the duration
    /// of one batch command.
    pub fn new(key: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            raw: raw.into(),
            valid: true,
            value: None,
            display: None,
            errors: Vec::new(),
            answernote: None,
            feedback: None,
        }
    }

    /// Creates an entry the upstream validator rejected, carrying its error
    /// text. A session holding such an entry refuses to evaluate at all.
    pub fn invalid(
        key: impl Into<String>,
        raw: impl Into<String>,
        errors: Vec<String>,
    ) -> Self {
        Self { valid: false, errors, ..Self::new(key, raw) }
    }

    /// The entry's key, possibly empty.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The expression text as produced upstream. Immutable for the life of
    /// the entry.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Whether the entry may be sent to the engine.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn set_valid(&mut self, valid: bool) {
        self.valid = valid;
    }

    /// The computed value, once the session has been evaluated. `None` means
    /// no value was returned.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = Some(value.into());
    }

    /// The rendering-oriented form of the value, which may differ from
    /// [`value`](Self::value) (e.g. pretty-printed LaTeX).
    pub fn display(&self) -> Option<&str> {
        self.display.as_deref()
    }

    pub fn set_display(&mut self, display: impl Into<String>) {
        self.display = Some(display.into());
    }

    /// Accumulated error text, upstream and evaluation-time. Append-only.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn answernote(&self) -> Option<&str> {
        self.answernote.as_deref()
    }

    pub fn set_answernote(&mut self, note: impl Into<String>) {
        self.answernote = Some(note.into());
    }

    pub fn feedback(&self) -> Option<&str> {
        self.feedback.as_deref()
    }

    pub fn set_feedback(&mut self, feedback: impl Into<String>) {
        self.feedback = Some(feedback.into());
    }

    /// Whether the raw text mentions any of the given keywords as a whole
    /// word. Used to screen student input against engine commands the caller
    /// has forbidden.
    pub fn contains_forbidden_words(&self, keywords: &[&str]) -> bool {
        keywords.iter().any(|word| contains_word(&self.raw, word))
    }
}

/// Whole-word containment: `word` must not be flanked by identifier
/// characters, so `diff` is not found inside `undiffused`.
fn contains_word(haystack: &str, word: &str) -> bool {
    if word.is_empty() {
        return false;
    }
    haystack.match_indices(word).any(|(at, _)| {
        let before = haystack[..at].chars().next_back();
        let after = haystack[at + word.len()..].chars().next();
        !before.is_some_and(|c| c.is_alphanumeric() || c == '_')
            && !after.is_some_and(|c| c.is_alphanumeric() || c == '_')
    })
}
