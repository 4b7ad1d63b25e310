//! The boundary between a session and the engine that evaluates it.
//!
//! A session hands one command string to a [`Transport`] and gets back a
//! [`Reply`]: a positionally indexed sequence of per-expression records. The
//! reply is deliberately positional, not keyed — position `i` in the reply
//! answers the entry at position `i` in the session, and a missing position
//! means that entry failed to return, not that the whole call failed.

use std::fmt::Debug;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One decoded result from the engine.
///
/// `error` is always present (empty when the expression evaluated cleanly);
/// every other field is independently optional, and a partially filled
/// record is normal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReplyRecord {
    pub value: Option<String>,
    pub display: Option<String>,
    pub valid: Option<bool>,
    pub error: String,
    pub answernote: Option<String>,
    pub feedback: Option<String>,
}

impl ReplyRecord {
    /// A record holding just a value, the common case in tests and probes.
    pub fn with_value(value: impl Into<String>) -> Self {
        Self { value: Some(value.into()), ..Self::default() }
    }
}

/// The engine's answer to one batch command: records by position, plus
/// whatever debug text the transport collected along the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Reply {
    records: Vec<Option<ReplyRecord>>,
    debug: String,
}

impl Reply {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a record at the given position, growing the sequence as
    /// needed. Positions never written stay empty.
    pub fn insert(&mut self, index: usize, record: ReplyRecord) {
        if self.records.len() <= index {
            self.records.resize(index + 1, None);
        }
        self.records[index] = Some(record);
    }

    /// The record at a position, if the engine returned one.
    pub fn record(&self, index: usize) -> Option<&ReplyRecord> {
        self.records.get(index).and_then(Option::as_ref)
    }

    /// Whether any position holds a record. A reply where this is `false`
    /// is a total failure.
    pub fn any_records(&self) -> bool {
        self.records.iter().any(Option::is_some)
    }

    pub fn debug(&self) -> &str {
        &self.debug
    }

    pub fn set_debug(&mut self, debug: impl Into<String>) {
        self.debug = debug.into();
    }
}

/// Why a transport could not produce a reply at all.
///
/// Per-expression failures are not transport errors; they are absent or
/// error-carrying records inside an `Ok` reply. A `TransportError` means the
/// round trip itself broke, and a session absorbs it as a total failure.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The engine could not be reached or its process failed.
    #[error("failed to reach the CAS: {0}")]
    Connection(String),

    /// The engine answered, but its output carried no decodable reply frame.
    #[error("the CAS reply could not be decoded: {0}")]
    Decode(String),
}

/// A collaborator that performs one blocking round trip to the engine.
///
/// Implementations own everything beyond the command/reply text contract:
/// process management, caching, timeouts, retries, and any concurrency
/// control over shared backends.
pub trait Transport: Debug {
    fn compute(&mut self, command: &str) -> Result<Reply, TransportError>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_grows_and_leaves_gaps_empty() {
        let mut reply = Reply::new();
        reply.insert(2, ReplyRecord::with_value("3"));
        assert!(reply.record(0).is_none());
        assert!(reply.record(1).is_none());
        assert_eq!(reply.record(2).unwrap().value.as_deref(), Some("3"));
        assert!(reply.any_records());
    }

    #[test]
    fn empty_reply_has_no_records() {
        assert!(!Reply::new().any_records());
    }
}
