//! Failures surfaced by snapshot requests.

use std::fmt;

/// Message reported when no media session is active.
pub const NO_ACTIVE_SESSION: &str = "No media is currently playing";

/// Reasons a snapshot could not be produced.
///
/// Artwork failures are not listed: they degrade to a null artwork field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// No media session is active.
    NoActiveSession,
    /// The session collaborator failed; carries its message.
    QueryFailed(String),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::NoActiveSession => f.write_str(NO_ACTIVE_SESSION),
            SessionError::QueryFailed(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<anyhow::Error> for SessionError {
    fn from(err: anyhow::Error) -> Self {
        SessionError::QueryFailed(format!("{err:#}"))
    }
}
