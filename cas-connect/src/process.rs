//! A transport that spawns the engine as a child process per round trip.

use crate::decode::decode_reply;
use cas_session::{Reply, Transport, TransportError};
use std::io::Write;
use std::process::{Command, Stdio};
use tracing::debug;

/// How to launch the engine executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSettings {
    /// The executable to run.
    pub command: String,

    /// Arguments passed on every launch.
    pub args: Vec<String>,
}

impl Default for ProcessSettings {
    fn default() -> Self {
        Self {
            command: "maxima".to_string(),
            args: vec!["--quiet".to_string()],
        }
    }
}

/// Spawns one engine process per [`compute`](Transport::compute) call,
/// writes the batch command to its stdin, reads stdout to end of file, and
/// decodes it.
///
/// The call blocks until the process exits. Callers wanting a wall-clock
/// limit should point [`ProcessSettings::command`] at an OS-level timeout
/// wrapper around the engine.
#[derive(Debug)]
pub struct ProcessTransport {
    settings: ProcessSettings,
}

impl ProcessTransport {
    pub fn new(settings: ProcessSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ProcessSettings {
        &self.settings
    }
}

impl Transport for ProcessTransport {
    fn compute(&mut self, command: &str) -> Result<Reply, TransportError> {
        debug!(executable = %self.settings.command, "spawning CAS process");
        let mut child = Command::new(&self.settings.command)
            .args(&self.settings.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| {
                TransportError::Connection(format!(
                    "failed to launch {}: {err}",
                    self.settings.command
                ))
            })?;

        // Dropping stdin signals end of input so the engine terminates.
        {
            let mut stdin = child.stdin.take().ok_or_else(|| {
                TransportError::Connection("engine stdin unavailable".to_string())
            })?;
            stdin.write_all(command.as_bytes()).map_err(|err| {
                TransportError::Connection(format!("failed to send the command: {err}"))
            })?;
        }

        let output = child.wait_with_output().map_err(|err| {
            TransportError::Connection(format!("engine process failed: {err}"))
        })?;
        let stdout = String::from_utf8_lossy(&output.stdout);

        let mut reply = decode_reply(&stdout)?;
        reply.set_debug(format!("CAS command:\n{command}\nCAS output:\n{stdout}"));
        Ok(reply)
    }
}
