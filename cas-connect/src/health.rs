//! End-to-end probe of the engine connection.
//!
//! Builds a small fixed session covering the interesting decoder paths
//! (plain arithmetic, a derivative, a matrix with nested brackets),
//! evaluates it over the given transport, and reports what came back. Used
//! by the `healthcheck` binary after installing or upgrading the engine.

use cas_session::{CasEntry, Session, SessionOptions, Transport};

/// The probe expressions, keyed for lookup in the report.
const PROBES: [(&str, &str); 3] = [
    ("arith", "1+2"),
    ("deriv", "diff(x^4/(1+x^4),x)"),
    ("mat", "matrix([1,2],[3,4])"),
];

/// What happened to one probe expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub key: String,
    pub raw: String,
    pub value: Option<String>,
    pub errors: String,
}

/// The outcome of a health check run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    /// True when every probe returned a value and nothing errored.
    pub ok: bool,
    pub probes: Vec<ProbeOutcome>,
    pub session_errors: String,
    /// Raw transport debug text, for inspection when the check fails.
    pub debug: String,
}

/// Evaluates the probe session over `transport` and reports per-probe
/// outcomes. The seed is pinned so repeated checks are comparable.
pub fn run(transport: Box<dyn Transport>) -> HealthReport {
    let entries = PROBES
        .iter()
        .map(|(key, raw)| CasEntry::new(*key, *raw))
        .collect();
    let mut session = Session::new(entries, SessionOptions::default(), Some(1), transport);
    session.evaluate();

    let mut probes = Vec::new();
    let mut ok = true;
    for (key, raw) in PROBES {
        let value = session.value_of(key).map(str::to_string);
        let errors = session.errors_of(key, false).unwrap_or_default();
        ok = ok && value.is_some() && errors.is_empty();
        probes.push(ProbeOutcome {
            key: key.to_string(),
            raw: raw.to_string(),
            value,
            errors,
        });
    }

    HealthReport {
        ok,
        probes,
        session_errors: session.errors(false),
        debug: session.debug_info().to_string(),
    }
}
