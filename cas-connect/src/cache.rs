//! An in-memory reply cache keyed by exact command text.

use cas_session::{Reply, Transport, TransportError};
use std::collections::HashMap;
use tracing::debug;

/// Wraps a transport and replays stored replies for identical command text.
///
/// Two sessions with the same entries in the same order, the same options
/// and the same seed construct byte-identical commands, so re-rendering a
/// question attempt skips the engine entirely. Only successful replies are
/// stored; failures are retried on the next call.
#[derive(Debug)]
pub struct CachedTransport<T> {
    inner: T,
    cache: HashMap<String, Reply>,
    hits: u64,
    misses: u64,
}

impl<T> CachedTransport<T> {
    pub fn new(inner: T) -> Self {
        Self { inner, cache: HashMap::new(), hits: 0, misses: 0 }
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Drops every stored reply, e.g. after the engine has been upgraded.
    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

impl<T: Transport> Transport for CachedTransport<T> {
    fn compute(&mut self, command: &str) -> Result<Reply, TransportError> {
        if let Some(reply) = self.cache.get(command) {
            self.hits += 1;
            debug!(hits = self.hits, "CAS reply cache hit");
            return Ok(reply.clone());
        }
        self.misses += 1;
        debug!(misses = self.misses, "CAS reply cache miss");
        let reply = self.inner.compute(command)?;
        self.cache.insert(command.to_string(), reply.clone());
        Ok(reply)
    }
}
