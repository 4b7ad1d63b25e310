//! Transport collaborators for `cas-session`.
//!
//! The core crate defines the [`Transport`](cas_session::Transport)
//! boundary; this crate supplies implementations of it: a decoder for the
//! engine's printed output, a transport that spawns the engine as a child
//! process, a caching wrapper keyed on command text, and a health-check
//! probe with a small CLI (`healthcheck`).

pub mod cache;
pub mod decode;
pub mod health;
pub mod process;

pub use cache::CachedTransport;
pub use decode::decode_reply;
pub use health::HealthReport;
pub use process::{ProcessSettings, ProcessTransport};

#[cfg(test)]
pub(crate) mod testing {
    use cas_session::{Reply, Transport, TransportError};

    /// Serves one fixed reply on every call and counts calls. `dead()`
    /// models an unreachable engine.
    #[derive(Debug)]
    pub(crate) struct FixedTransport {
        pub reply: Option<Reply>,
        pub calls: usize,
    }

    impl FixedTransport {
        pub fn new(reply: Reply) -> Self {
            Self { reply: Some(reply), calls: 0 }
        }

        pub fn dead() -> Self {
            Self { reply: None, calls: 0 }
        }
    }

    impl Transport for FixedTransport {
        fn compute(&mut self, _command: &str) -> Result<Reply, TransportError> {
            self.calls += 1;
            self.reply
                .clone()
                .ok_or_else(|| TransportError::Connection("engine unreachable".to_string()))
        }
    }
}
