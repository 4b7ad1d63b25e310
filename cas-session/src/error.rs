//! Session-level diagnostics as data.
//!
//! Evaluation failures never abort a session; they accumulate here as
//! structured reports. The core produces plain text only — escaping for
//! HTML or other rich-text targets is a presentation concern left to
//! whoever renders the reports.

use std::fmt;

/// What stage of the session produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// An entry arrived invalid from the upstream validator, so the whole
    /// batch was refused.
    Validation,

    /// The engine evaluated an entry and raised an error for it.
    Evaluation,

    /// The reply carried no record for an entry's position.
    MissingValue,

    /// No entry received any record at all; the round trip itself failed.
    Transport,
}

/// One session-level diagnostic: which entry it concerns (if any) and a
/// plain-text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub kind: ReportKind,
    pub key: Option<String>,
    pub message: String,
}

impl ErrorReport {
    /// Creates a report. An empty key is recorded as no key, matching the
    /// anonymous-entry convention.
    pub fn new(kind: ReportKind, key: &str, message: impl Into<String>) -> Self {
        let key = (!key.is_empty()).then(|| key.to_string());
        Self { kind, key, message: message.into() }
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Message prefixed to an entry's raw text when its position is absent from
/// the reply.
pub(crate) const FAILED_RETURN: &str = "The CAS failed to return a value for:";

/// Joins an entry's raw text to the error the engine raised for it.
pub(crate) const ERROR_CAUSED: &str = "caused the following error:";

/// The single aggregate message a total failure collapses to.
pub(crate) const ALL_FAILED: &str =
    "The CAS failed to return any evaluated expressions. Please check the connection to the CAS.";

/// Protects `$` in engine error text so accumulated errors can be embedded
/// in text where `$` would open a maths environment.
pub(crate) fn protect_dollars(text: &str) -> String {
    text.replace('$', "\\$")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_key_is_anonymous() {
        let report = ErrorReport::new(ReportKind::MissingValue, "", "no value");
        assert_eq!(report.key, None);
        let report = ErrorReport::new(ReportKind::Evaluation, "a", "bad");
        assert_eq!(report.key.as_deref(), Some("a"));
    }

    #[test]
    fn dollars_are_protected() {
        assert_eq!(protect_dollars("cost is $5"), "cost is \\$5");
        assert_eq!(protect_dollars("no dollars"), "no dollars");
    }
}
