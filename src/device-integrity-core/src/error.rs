//! Error types for probe execution.
//!
//! These never leave the engine: every probe converts a `ProbeError` into
//! "signal absent" at its boundary. They exist so that sub-probes can use `?`
//! and so the reason for a degraded probe shows up in the logs.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while a probe gathers its signal.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Reading a file or pseudo-file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A subordinate command could not be started.
    #[error("Failed to spawn `{command}`: {source}")]
    Spawn {
        /// Command line that failed.
        command: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A subordinate command did not finish in time and was killed.
    #[error("Command `{command}` timed out after {timeout:?}")]
    CommandTimeout {
        /// Command line that timed out.
        command: String,
        /// Configured limit.
        timeout: Duration,
    },

    /// A loopback connection attempt failed (refused, timed out, ...).
    #[error("Connection to 127.0.0.1:{port} failed: {source}")]
    Connect {
        /// Target port.
        port: u16,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Data was present but could not be parsed.
    #[error("Malformed {what}: {detail}")]
    Malformed {
        /// What was being parsed.
        what: &'static str,
        /// Offending input or parse error.
        detail: String,
    },

    /// The host did not provide this capability.
    #[error("Capability not available on this platform: {capability}")]
    Unavailable {
        /// Name of the missing capability.
        capability: &'static str,
    },

    /// The host platform reported an error.
    #[error("Platform error: {message}")]
    Platform {
        /// Error message from the platform layer.
        message: String,
    },

    /// A capability implementation panicked.
    #[error("Probe panicked: {message}")]
    Panicked {
        /// Panic payload, if it was a string.
        message: String,
    },
}

impl ProbeError {
    /// Create an I/O error for a path.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a platform error from any displayable value.
    #[must_use]
    pub fn platform(message: impl std::fmt::Display) -> Self {
        Self::Platform {
            message: message.to_string(),
        }
    }

    /// Create a malformed-data error.
    #[must_use]
    pub fn malformed(what: &'static str, detail: impl Into<String>) -> Self {
        Self::Malformed {
            what,
            detail: detail.into(),
        }
    }

    /// Check if this error means the file or capability simply isn't there.
    ///
    /// Such failures are the normal case on clean devices and are logged
    /// at a lower level than genuine faults.
    #[must_use]
    pub fn is_absent(&self) -> bool {
        match self {
            Self::Unavailable { .. } => true,
            Self::Io { source, .. } | Self::Spawn { source, .. } => {
                source.kind() == std::io::ErrorKind::NotFound
            },
            _ => false,
        }
    }
}
