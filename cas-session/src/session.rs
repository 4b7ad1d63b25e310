//! The session engine.
//!
//! A [`Session`] owns an ordered batch of [`CasEntry`] values, encodes all of
//! them plus a random seed into one command string, sends it through its
//! [`Transport`] in a single round trip, and walks its own entry list to
//! redistribute the reply by position. Evaluation is lazy and idempotent:
//! the first query that needs values triggers it, and it runs at most once
//! per generation of entries.

use crate::entry::CasEntry;
use crate::error::{
    protect_dollars, ErrorReport, ReportKind, ALL_FAILED, ERROR_CAUSED, FAILED_RETURN,
};
use crate::options::{CasCommands, SessionOptions};
use crate::transport::{Reply, Transport};
use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// Placeholder the command substitutes for a literal `?`, which would
/// otherwise collide with the engine's own unknown syntax. Reversed when the
/// reply is decoded back onto entries.
const QMCHAR: &str = "QMCHAR";

/// The memoized outcome of validating a session's entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Validity {
    /// Not validated since the last change to the entry list.
    #[default]
    Unknown,
    Valid,
    Invalid,
}

/// Whether the session has been sent to the engine. Monotonic within one
/// generation of entries: once `Done`, further evaluate calls are no-ops
/// until an append resets it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Instantiation {
    #[default]
    NotRun,
    Done,
}

/// An ordered batch of expressions evaluated together in one round trip.
#[derive(Debug)]
pub struct Session {
    entries: Vec<CasEntry>,
    options: SessionOptions,
    seed: i64,
    validity: Validity,
    instantiation: Instantiation,
    reports: Vec<ErrorReport>,
    debug: String,
    transport: Box<dyn Transport>,
}

impl Session {
    /// Creates a session over the given entries. A `None` seed falls back to
    /// wall-clock seconds, so repeated attempts randomize differently unless
    /// the caller pins the seed.
    pub fn new(
        entries: Vec<CasEntry>,
        options: SessionOptions,
        seed: Option<i64>,
        transport: Box<dyn Transport>,
    ) -> Self {
        let seed = seed.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| elapsed.as_secs() as i64)
                .unwrap_or(0)
        });
        Self {
            entries,
            options,
            seed,
            validity: Validity::Unknown,
            instantiation: Instantiation::NotRun,
            reports: Vec::new(),
            debug: String::new(),
            transport,
        }
    }

    /// The entries, in positional order.
    pub fn entries(&self) -> &[CasEntry] {
        &self.entries
    }

    /// The seed the engine's random-number generator is set to before the
    /// batch runs.
    pub fn seed(&self) -> i64 {
        self.seed
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// The memoized validation state. [`is_valid`](Self::is_valid) computes
    /// it on demand; this just reports it.
    pub fn validity(&self) -> Validity {
        self.validity
    }

    /// Whether the session has been sent to the engine in its current
    /// generation.
    pub fn instantiation(&self) -> Instantiation {
        self.instantiation
    }

    /// Validates the batch, memoized until the entry list changes.
    ///
    /// An empty session is always valid. Otherwise every entry must have
    /// passed the upstream validator: one invalid entry invalidates the
    /// whole batch (fail-together), and each invalid entry's error text is
    /// recorded on the session.
    pub fn is_valid(&mut self) -> bool {
        if self.validity == Validity::Unknown {
            self.validate();
        }
        self.validity == Validity::Valid
    }

    fn validate(&mut self) -> bool {
        if self.entries.is_empty() {
            self.validity = Validity::Valid;
            return true;
        }
        let mut valid = true;
        for entry in &self.entries {
            if !entry.is_valid() {
                valid = false;
                for error in entry.errors() {
                    self.reports
                        .push(ErrorReport::new(ReportKind::Validation, entry.key(), error));
                }
            }
        }
        self.validity = if valid { Validity::Valid } else { Validity::Invalid };
        valid
    }

    /// Builds the single command string encoding the whole batch: one shared
    /// scope declaring every label plus the seed variable, the option
    /// preamble, and one error-isolated clause per entry, each tagged with
    /// its position so the reply is self-describing.
    pub fn construct_command(&self) -> String {
        let CasCommands { names, commands } = self.options.cas_commands();

        let mut csnames = String::new();
        for name in &names {
            csnames.push_str(&format!(", {name}"));
        }
        let mut csvars = String::new();
        for command in &commands {
            csvars.push_str(&format!(", {command}"));
        }

        let mut clauses = String::new();
        for (i, entry) in self.entries.iter().enumerate() {
            let label = entry_label(entry.key(), i);
            let cmd = entry.raw().replace('?', QMCHAR);
            csnames.push_str(&format!(", {label}"));
            clauses.push_str(&format!(
                ", print(\"{i}=[ error= [\"), cte(\"{label}\",errcatch({label}:{cmd})) "
            ));
        }

        let mut cass = String::from("cab:block([ RANDOM_SEED");
        cass.push_str(&csnames);
        cass.push_str("], cas_randseed(");
        cass.push_str(&format!("{})", self.seed));
        cass.push_str(&csvars);
        cass.push_str(&format!(
            ", print(\"[TimeStamp= [ {} ], Locals= [ \") ",
            self.seed
        ));
        cass.push_str(&clauses);
        cass.push_str(", print(\"] ]\") , return(true) ); \n ");
        cass
    }

    /// Sends the batch to the engine and distributes the reply onto the
    /// entries.
    ///
    /// Returns `false` only when validation fails; the transport is never
    /// contacted in that case. An already-instantiated or empty session
    /// returns `true` without a round trip. Every evaluation-time failure is
    /// recorded as entry/session state rather than returned: a missing reply
    /// position becomes a per-entry "failed to return" error, and a reply
    /// with no records at all collapses the session reports to one aggregate
    /// transport failure.
    pub fn evaluate(&mut self) -> bool {
        if self.validity == Validity::Unknown {
            self.validate();
        }
        if self.validity == Validity::Invalid {
            return false;
        }
        if self.instantiation == Instantiation::Done || self.entries.is_empty() {
            return true;
        }

        let command = self.construct_command();
        debug!(seed = self.seed, entries = self.entries.len(), "sending batch to the CAS");
        let reply = match self.transport.compute(&command) {
            Ok(reply) => reply,
            Err(err) => {
                warn!(%err, "CAS transport failed");
                let mut reply = Reply::new();
                reply.set_debug(format!("CAS transport error: {err}"));
                reply
            }
        };
        self.debug = reply.debug().to_string();

        // Walk our own entries, not the reply, so missing positions are
        // visible as failures.
        let mut new_reports = Vec::new();
        let mut all_fail = true;
        for (i, entry) in self.entries.iter_mut().enumerate() {
            let label = entry_label(entry.key(), i);
            let mut gotvalue = false;

            if let Some(record) = reply.record(i) {
                all_fail = false;

                if let Some(value) = &record.value {
                    entry.set_value(value.replace(QMCHAR, "?"));
                    gotvalue = true;
                }
                if let Some(display) = &record.display {
                    entry.set_display(display.clone());
                }
                if let Some(valid) = record.valid {
                    entry.set_valid(valid);
                }
                if let Some(note) = &record.answernote {
                    entry.set_answernote(note.clone());
                }
                if let Some(feedback) = &record.feedback {
                    entry.set_feedback(feedback.clone());
                }
                if !record.error.is_empty() {
                    let error = protect_dollars(&record.error);
                    entry.add_error(error.clone());
                    new_reports.push(ErrorReport::new(
                        ReportKind::Evaluation,
                        &label,
                        format!("{} {ERROR_CAUSED} {error}", entry.raw()),
                    ));
                }
            }

            if !gotvalue {
                let message = format!("{FAILED_RETURN} {}", entry.raw());
                entry.add_error(message.clone());
                new_reports.push(ErrorReport::new(ReportKind::MissingValue, &label, message));
            }
        }

        self.reports.extend(new_reports);
        if all_fail {
            // Total failure is reported once, not N times.
            self.reports = vec![ErrorReport::new(ReportKind::Transport, "", ALL_FAILED)];
        }
        self.instantiation = Instantiation::Done;
        true
    }

    /// Validates, and evaluates if that has not happened yet. Shared by
    /// every query that needs computed values.
    pub(crate) fn ensure_instantiated(&mut self) {
        if self.validity == Validity::Unknown {
            self.validate();
        }
        if self.validity == Validity::Valid && self.instantiation == Instantiation::NotRun {
            self.evaluate();
        }
    }

    fn find_latest(&self, key: &str) -> Option<&CasEntry> {
        self.entries.iter().rev().find(|entry| entry.key() == key)
    }

    /// The raw text of the most recently appended entry with this key. Does
    /// not trigger evaluation.
    pub fn raw_of(&mut self, key: &str) -> Option<&str> {
        if self.validity == Validity::Unknown {
            self.validate();
        }
        self.find_latest(key).map(CasEntry::raw)
    }

    /// The computed value of the most recently appended entry with this key,
    /// evaluating first if needed. `None` when no entry has the key or no
    /// value came back for it.
    pub fn value_of(&mut self, key: &str) -> Option<&str> {
        self.ensure_instantiated();
        self.find_latest(key).and_then(CasEntry::value)
    }

    /// Like [`value_of`](Self::value_of), for the display form.
    pub fn display_of(&mut self, key: &str) -> Option<&str> {
        self.ensure_instantiated();
        self.find_latest(key).and_then(CasEntry::display)
    }

    /// The accumulated error text of the most recently appended entry with
    /// this key, evaluating first if needed. `with_debug` appends the
    /// session's transport debug text.
    pub fn errors_of(&mut self, key: &str, with_debug: bool) -> Option<String> {
        self.ensure_instantiated();
        let errors = self.find_latest(key)?.errors().join(" ");
        if with_debug {
            Some(format!("{errors}{}", self.debug))
        } else {
            Some(errors)
        }
    }

    /// Distinct keys across all entries, in order of first appearance.
    /// Anonymous entries contribute the empty key once.
    pub fn all_keys(&mut self) -> Vec<String> {
        if self.validity == Validity::Unknown {
            self.validate();
        }
        let mut seen = HashSet::new();
        let mut keys = Vec::new();
        for entry in &self.entries {
            if seen.insert(entry.key()) {
                keys.push(entry.key().to_string());
            }
        }
        keys
    }

    /// Every raw expression, in positional order.
    pub fn all_raw(&self) -> Vec<&str> {
        self.entries.iter().map(CasEntry::raw).collect()
    }

    /// Session-level error text: the accumulated reports joined into one
    /// string, with the transport debug text appended on request.
    pub fn errors(&mut self, with_debug: bool) -> String {
        if self.validity == Validity::Unknown {
            self.validate();
        }
        let mut text = self
            .reports
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        if with_debug {
            text.push_str(&self.debug);
        }
        text
    }

    /// The structured session-level reports behind [`errors`](Self::errors).
    pub fn error_reports(&self) -> &[ErrorReport] {
        &self.reports
    }

    /// Raw debug text captured from the transport during evaluation.
    pub fn debug_info(&self) -> &str {
        &self.debug
    }

    /// Whether any entry mentions one of the keywords as a whole word.
    pub fn contains_forbidden_words(&mut self, keywords: &[&str]) -> bool {
        if self.validity == Validity::Unknown {
            self.validate();
        }
        self.entries
            .iter()
            .any(|entry| entry.contains_forbidden_words(keywords))
    }

    /// Appends clones of the given entries to the tail of the session.
    ///
    /// Each appended entry resets instantiation, validity and the session
    /// reports: the grown batch must be validated again and will be
    /// re-evaluated on the next query. Appending nothing changes nothing.
    pub fn append_entries(&mut self, entries: &[CasEntry]) {
        for entry in entries {
            self.instantiation = Instantiation::NotRun;
            self.validity = Validity::Unknown;
            self.reports.clear();
            self.entries.push(entry.clone());
        }
    }

    /// Appends clones of another session's entries, keeping this session's
    /// options and seed. Merging an empty session is a no-op.
    pub fn merge(&mut self, other: &Session) {
        self.append_entries(other.entries());
    }

    /// Truncates the session to its first `len` entries.
    ///
    /// Deliberately leaves validity and instantiation untouched: a pruned,
    /// previously instantiated session still reports itself instantiated.
    /// Callers needing fresh evaluation must append or rebuild.
    pub fn prune(&mut self, len: usize) {
        self.entries.truncate(len);
    }

    /// A compact, order-sensitive fingerprint of the session for external
    /// cache keys: `key:val; ` per entry (`val; ` when anonymous), using raw
    /// text before instantiation and computed values after.
    pub fn keyval_representation(&self) -> String {
        let mut keyvals = String::new();
        for entry in &self.entries {
            let val = match self.instantiation {
                Instantiation::NotRun => entry.raw(),
                Instantiation::Done => entry.value().unwrap_or_default(),
            };
            if entry.key().is_empty() {
                keyvals.push_str(&format!("{val}; "));
            } else {
                keyvals.push_str(&format!("{}:{val}; ", entry.key()));
            }
        }
        keyvals.trim().to_string()
    }
}

/// The label an entry is bound to inside one batch command: its key, or the
/// synthetic `dumvarN` when the key is empty.
pub(crate) fn entry_label(key: &str, index: usize) -> String {
    if key.is_empty() {
        format!("dumvar{index}")
    } else {
        key.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;
    use crate::transport::ReplyRecord;
    use pretty_assertions::assert_eq;

    fn session_with(
        entries: Vec<CasEntry>,
        replies: Vec<Reply>,
    ) -> (Session, std::rc::Rc<std::cell::Cell<usize>>) {
        let transport = MockTransport::returning(replies);
        let (calls, _) = transport.counters();
        let options = SessionOptions { simplify: Some(true), assume_positive: None };
        (Session::new(entries, options, Some(1234), Box::new(transport)), calls)
    }

    fn reply_with(records: Vec<(usize, ReplyRecord)>) -> Reply {
        let mut reply = Reply::new();
        for (index, record) in records {
            reply.insert(index, record);
        }
        reply
    }

    #[test]
    fn empty_session_is_valid_and_evaluates_without_transport() {
        let (mut session, calls) = session_with(vec![], vec![]);
        assert!(session.is_valid());
        assert!(session.evaluate());
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn command_is_assembled_exactly() {
        let entries = vec![CasEntry::new("a", "x^2"), CasEntry::new("", "1/0")];
        let (session, _) = session_with(entries, vec![]);
        assert_eq!(
            session.construct_command(),
            "cab:block([ RANDOM_SEED, simp, a, dumvar1], cas_randseed(1234), simp:true, \
             print(\"[TimeStamp= [ 1234 ], Locals= [ \") \
             , print(\"0=[ error= [\"), cte(\"a\",errcatch(a:x^2)) \
             , print(\"1=[ error= [\"), cte(\"dumvar1\",errcatch(dumvar1:1/0)) \
             , print(\"] ]\") , return(true) ); \n ",
        );
    }

    #[test]
    fn question_marks_are_escaped_in_the_command() {
        let (session, _) = session_with(vec![CasEntry::new("a", "x = ?")], vec![]);
        let command = session.construct_command();
        assert!(command.contains("a:x = QMCHAR"));
        assert!(!command.contains("a:x = ?"));
    }

    #[test]
    fn evaluate_is_idempotent() {
        let reply = reply_with(vec![(0, ReplyRecord::with_value("3"))]);
        let (mut session, calls) = session_with(vec![CasEntry::new("a", "1+2")], vec![reply]);
        assert!(session.evaluate());
        assert!(session.evaluate());
        assert_eq!(calls.get(), 1);
        assert_eq!(session.value_of("a"), Some("3"));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn one_invalid_entry_fails_the_whole_batch() {
        let entries = vec![
            CasEntry::new("a", "1+1"),
            CasEntry::invalid("b", "sin(", vec!["missing )".to_string()]),
            CasEntry::new("c", "2+2"),
        ];
        let (mut session, calls) = session_with(entries, vec![]);
        assert!(!session.is_valid());
        assert!(!session.evaluate());
        assert_eq!(calls.get(), 0);
        assert_eq!(session.error_reports().len(), 1);
        assert_eq!(session.error_reports()[0].kind, ReportKind::Validation);
        assert!(session.errors(false).contains("missing )"));
    }

    #[test]
    fn partial_reply_correlates_by_position() {
        let entries = vec![CasEntry::new("x", "1+1"), CasEntry::new("", "2+2")];
        let reply = reply_with(vec![(0, ReplyRecord::with_value("2"))]);
        let (mut session, _) = session_with(entries, vec![reply]);
        assert!(session.evaluate());

        assert_eq!(session.value_of("x"), Some("2"));
        // The anonymous entry got no record; its synthetic label carries the
        // missing-value report, and no value lookup can reach it.
        assert_eq!(session.value_of("dumvar1"), None);
        let missing: Vec<_> = session
            .error_reports()
            .iter()
            .filter(|report| report.kind == ReportKind::MissingValue)
            .collect();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].key.as_deref(), Some("dumvar1"));
        assert!(session.entries()[1].has_errors());
        assert!(!session.entries()[0].has_errors());
    }

    #[test]
    fn engine_error_is_recorded_on_entry_and_session() {
        let record = ReplyRecord {
            value: Some("und".to_string()),
            error: "Division by $0$".to_string(),
            ..ReplyRecord::default()
        };
        let (mut session, _) =
            session_with(vec![CasEntry::new("a", "1/0")], vec![reply_with(vec![(0, record)])]);
        assert!(session.evaluate());
        // Dollars are protected before the error is stored anywhere.
        assert_eq!(session.entries()[0].errors(), ["Division by \\$0\\$"]);
        let text = session.errors(false);
        assert!(text.contains("1/0 caused the following error: Division by \\$0\\$"));
    }

    #[test]
    fn total_failure_collapses_to_one_report() {
        let entries = vec![CasEntry::new("a", "1+1"), CasEntry::new("b", "2+2")];
        let (mut session, _) = session_with(entries, vec![Reply::new()]);
        assert!(session.evaluate());

        // One aggregate report at session level, not one per entry...
        assert_eq!(session.error_reports().len(), 1);
        assert_eq!(session.error_reports()[0].kind, ReportKind::Transport);
        assert_eq!(session.errors(false), ALL_FAILED);
        // ...while the per-entry messages survive on the entries.
        assert!(session.entries().iter().all(CasEntry::has_errors));
    }

    #[test]
    fn dead_transport_reads_as_total_failure() {
        let (mut session, calls) = session_with(vec![CasEntry::new("a", "1+1")], vec![]);
        assert!(session.evaluate());
        assert_eq!(calls.get(), 1);
        assert_eq!(session.error_reports()[0].kind, ReportKind::Transport);
        assert!(session.debug_info().contains("CAS transport error"));
    }

    #[test]
    fn reply_fields_are_copied_independently() {
        let record = ReplyRecord {
            value: Some("x^2+QMCHAR".to_string()),
            display: Some("x^{2}".to_string()),
            valid: Some(false),
            error: String::new(),
            answernote: Some("missing_var".to_string()),
            feedback: Some("Check your variable.".to_string()),
        };
        let (mut session, _) =
            session_with(vec![CasEntry::new("a", "x^2+?")], vec![reply_with(vec![(0, record)])]);
        assert!(session.evaluate());
        let entry = &session.entries()[0];
        // QMCHAR is unescaped back to the unknown token on the way in.
        assert_eq!(entry.value(), Some("x^2+?"));
        assert_eq!(entry.display(), Some("x^{2}"));
        assert!(!entry.is_valid());
        assert_eq!(entry.answernote(), Some("missing_var"));
        assert_eq!(entry.feedback(), Some("Check your variable."));
    }

    #[test]
    fn value_lookup_prefers_the_latest_entry() {
        let entries = vec![CasEntry::new("k", "1"), CasEntry::new("k", "2")];
        let reply = reply_with(vec![
            (0, ReplyRecord::with_value("1")),
            (1, ReplyRecord::with_value("2")),
        ]);
        let (mut session, _) = session_with(entries, vec![reply]);
        assert_eq!(session.value_of("k"), Some("2"));
        assert_eq!(session.raw_of("k"), Some("2"));
    }

    #[test]
    fn append_resets_instantiation_and_reevaluates() {
        let first = reply_with(vec![(0, ReplyRecord::with_value("2"))]);
        let second = reply_with(vec![
            (0, ReplyRecord::with_value("2")),
            (1, ReplyRecord::with_value("4")),
        ]);
        let (mut session, calls) =
            session_with(vec![CasEntry::new("a", "1+1")], vec![first, second]);
        assert!(session.evaluate());
        assert_eq!(calls.get(), 1);

        session.append_entries(&[CasEntry::new("b", "2+2")]);
        assert_eq!(session.value_of("b"), Some("4"));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn appending_an_invalid_entry_invalidates_an_evaluated_session() {
        let reply = reply_with(vec![(0, ReplyRecord::with_value("2"))]);
        let (mut session, _) = session_with(vec![CasEntry::new("a", "1+1")], vec![reply]);
        assert!(session.evaluate());
        session.append_entries(&[CasEntry::invalid("b", ")", vec!["bad".to_string()])]);
        assert!(!session.is_valid());
    }

    #[test]
    fn merge_clones_entries() {
        let reply = reply_with(vec![(0, ReplyRecord::with_value("2"))]);
        let (mut target, _) = session_with(vec![], vec![reply]);
        let (mut other, _) = session_with(vec![CasEntry::new("a", "1+1")], vec![]);
        target.merge(&other);
        assert_eq!(target.entries().len(), 1);

        // The merged copy is independent of the source session.
        other.prune(0);
        assert_eq!(target.entries().len(), 1);
        assert_eq!(target.value_of("a"), Some("2"));
        assert_eq!(other.value_of("a"), None);
    }

    #[test]
    fn merging_an_empty_session_changes_nothing() {
        let reply = reply_with(vec![(0, ReplyRecord::with_value("2"))]);
        let (mut target, calls) = session_with(vec![CasEntry::new("a", "1+1")], vec![reply]);
        assert!(target.evaluate());
        let (empty, _) = session_with(vec![], vec![]);
        target.merge(&empty);
        // No entries were appended, so instantiation was not reset.
        assert_eq!(target.value_of("a"), Some("2"));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn prune_keeps_instantiation() {
        // Known asymmetry versus append_entries: pruning truncates the entry
        // list but leaves the session claiming it is instantiated, so no
        // fresh round trip happens.
        let reply = reply_with(vec![
            (0, ReplyRecord::with_value("2")),
            (1, ReplyRecord::with_value("4")),
        ]);
        let entries = vec![CasEntry::new("a", "1+1"), CasEntry::new("b", "2+2")];
        let (mut session, calls) = session_with(entries, vec![reply]);
        assert!(session.evaluate());
        session.prune(1);
        assert_eq!(session.entries().len(), 1);
        assert_eq!(session.value_of("b"), None);
        assert_eq!(session.value_of("a"), Some("2"));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn keyval_representation_switches_from_raw_to_value() {
        let reply = reply_with(vec![
            (0, ReplyRecord::with_value("2")),
            (1, ReplyRecord::with_value("4")),
        ]);
        let entries = vec![CasEntry::new("a", "1+1"), CasEntry::new("", "2+2")];
        let (mut session, _) = session_with(entries, vec![reply]);

        assert_eq!(session.keyval_representation(), "a:1+1; 2+2;");
        // Stable across repeated calls with no mutation.
        assert_eq!(session.keyval_representation(), "a:1+1; 2+2;");

        assert!(session.evaluate());
        assert_eq!(session.keyval_representation(), "a:2; 4;");
    }

    #[test]
    fn keyval_representation_is_order_sensitive() {
        let (one, _) =
            session_with(vec![CasEntry::new("a", "1"), CasEntry::new("b", "2")], vec![]);
        let (two, _) =
            session_with(vec![CasEntry::new("b", "2"), CasEntry::new("a", "1")], vec![]);
        assert_ne!(one.keyval_representation(), two.keyval_representation());
    }

    #[test]
    fn all_keys_are_distinct_in_first_appearance_order() {
        let entries = vec![
            CasEntry::new("a", "1"),
            CasEntry::new("", "2"),
            CasEntry::new("a", "3"),
            CasEntry::new("b", "4"),
        ];
        let (mut session, _) = session_with(entries, vec![]);
        assert_eq!(session.all_keys(), ["a", "", "b"]);
        assert_eq!(session.all_raw(), ["1", "2", "3", "4"]);
    }

    #[test]
    fn forbidden_words_are_found_across_entries() {
        let entries = vec![CasEntry::new("a", "1+1"), CasEntry::new("b", "system(\"ls\")")];
        let (mut session, _) = session_with(entries, vec![]);
        assert!(session.contains_forbidden_words(&["system"]));
        assert!(!session.contains_forbidden_words(&["load"]));
    }

    #[test]
    fn errors_of_joins_entry_errors_and_can_append_debug() {
        let record = ReplyRecord { error: "boom".to_string(), ..ReplyRecord::default() };
        let mut reply = reply_with(vec![(0, record)]);
        reply.set_debug("\n-- raw engine chatter --");
        let (mut session, _) = session_with(vec![CasEntry::new("a", "1/0")], vec![reply]);
        let plain = session.errors_of("a", false).unwrap();
        assert!(plain.contains("boom"));
        assert!(!plain.contains("chatter"));
        let with_debug = session.errors_of("a", true).unwrap();
        assert!(with_debug.contains("chatter"));
    }

    #[test]
    fn explicit_seed_lands_in_the_command() {
        let transport = MockTransport::returning(vec![]);
        let session = Session::new(
            vec![CasEntry::new("a", "rand(6)")],
            SessionOptions::default(),
            Some(77),
            Box::new(transport),
        );
        assert_eq!(session.seed(), 77);
        assert!(session.construct_command().contains("cas_randseed(77)"));
        assert!(session.construct_command().contains("TimeStamp= [ 77 ]"));
    }
}
