//! Error taxonomy surfaced to callers of the board accessor.
//!
//! Transport failures are [`DispatchError`]s; the gateway translates them
//! into a [`BoardError`] whose message is safe to show in a UI. Paths,
//! socket names and raw backend stderr stay in the `debug` logs.

use std::fmt;
use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BoardError>;

/// Category of a caller-visible failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No issue store exists at the expected location.
    NotInitialized,
    /// The backend process or daemon cannot be reached, or refuses work.
    BackendUnavailable,
    /// The circuit breaker is open; no backend call was attempted.
    CircuitOpen,
    /// The referenced issue does not exist.
    NotFound,
    /// Caller-supplied data violates a documented constraint.
    InvalidInput,
    /// The backend did not answer within the operation's time budget.
    Timeout,
    /// Anything else.
    Internal,
}

impl ErrorKind {
    /// Stable snake_case name, matching the wire encoding.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotInitialized => "not_initialized",
            Self::BackendUnavailable => "backend_unavailable",
            Self::CircuitOpen => "circuit_open",
            Self::NotFound => "not_found",
            Self::InvalidInput => "invalid_input",
            Self::Timeout => "timeout",
            Self::Internal => "internal",
        }
    }

    /// Kinds caused by the request rather than by backend health.
    ///
    /// A backend that answers "not found" is working; these outcomes count
    /// as a success for the circuit breaker.
    #[must_use]
    pub fn is_caller_error(self) -> bool {
        matches!(self, Self::NotFound | Self::InvalidInput)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed failure returned by every public accessor operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct BoardError {
    kind: ErrorKind,
    message: String,
}

impl BoardError {
    /// Creates an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    /// Shorthand for [`ErrorKind::InvalidInput`].
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    /// Shorthand for [`ErrorKind::NotFound`] on an issue identifier.
    #[must_use]
    pub fn issue_not_found(id: &str) -> Self {
        Self::new(ErrorKind::NotFound, format!("issue {id} not found"))
    }

    /// Shorthand for [`ErrorKind::Internal`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// The failure category.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The caller-safe message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether a caller should degrade gracefully (skip the feature) rather
    /// than report a hard failure.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self.kind, ErrorKind::NotInitialized | ErrorKind::CircuitOpen)
    }
}

/// A failure of one backend round trip, before translation.
///
/// The `Display` output may contain environment details and is only ever
/// logged, never returned to a caller.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The backend program could not be started.
    #[error("failed to spawn backend: {0}")]
    Spawn(#[source] io::Error),
    /// The daemon endpoint refused or dropped the connection.
    #[error("backend unreachable: {0}")]
    Unavailable(String),
    /// The backend process exited unsuccessfully.
    #[error("backend exited with status {code:?}: {stderr}")]
    Exit {
        /// Exit code, if the process was not killed by a signal.
        code: Option<i32>,
        /// Captured standard error.
        stderr: String,
    },
    /// The response could not be decoded or had the wrong shape.
    #[error("malformed backend response: {0}")]
    Malformed(String),
    /// Reading from or writing to the backend failed mid-exchange.
    #[error("backend I/O failed: {0}")]
    Io(#[from] io::Error),
    /// A replayed cassette had no interaction or held a recorded error.
    #[error("cassette: {0}")]
    Cassette(String),
}

impl DispatchError {
    /// Converts this transport failure into the caller-facing error.
    #[must_use]
    pub fn into_board_error(self) -> BoardError {
        match self {
            Self::Spawn(_) | Self::Unavailable(_) | Self::Io(_) => {
                BoardError::new(ErrorKind::BackendUnavailable, "issue backend is unavailable")
            }
            Self::Exit { code, .. } => BoardError::new(
                ErrorKind::BackendUnavailable,
                match code {
                    Some(code) => format!("issue backend failed with exit code {code}"),
                    None => "issue backend was terminated".to_string(),
                },
            ),
            Self::Malformed(_) => {
                BoardError::internal("issue backend returned a malformed response")
            }
            Self::Cassette(_) => BoardError::internal("recorded backend interaction unavailable"),
        }
    }
}
