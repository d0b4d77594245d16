//! # Design
//!
//! - One error type covers every remote-facing operation so callers can classify failures.
//! - Messages stay constant; context fields carry the operation, URL, and status.
//! - No variant stores credentials, so rendering an error never leaks a secret.

use reqwest::StatusCode;
use thiserror::Error;

use crate::retry::FailureClass;

/// Longest response body excerpt kept on an error.
const BODY_SNIPPET_LIMIT: usize = 200;

/// Result alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors raised by the daemon and tracker clients.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A credential, site, or category lookup missed.
    #[error("missing configuration")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Name of the missing entry.
        subject: String,
    },
    /// Input was rejected before any remote call.
    #[error("invalid input")]
    Validation {
        /// Operation identifier.
        operation: &'static str,
        /// Machine-readable reason for the rejection.
        reason: &'static str,
    },
    /// The remote could not be reached or the transfer broke off.
    #[error("remote endpoint unreachable")]
    Connectivity {
        /// Operation identifier.
        operation: &'static str,
        /// URL used for the request.
        url: String,
        /// Source HTTP client error.
        source: reqwest::Error,
    },
    /// The login exchange was explicitly rejected.
    #[error("authentication rejected")]
    Auth {
        /// Operation identifier.
        operation: &'static str,
        /// Login URL.
        url: String,
        /// HTTP status returned by the login endpoint.
        status: u16,
        /// Leading excerpt of the response body.
        body: String,
    },
    /// The remote answered with a non-success status.
    #[error("remote returned an error status")]
    Remote {
        /// Operation identifier.
        operation: &'static str,
        /// URL used for the request.
        url: String,
        /// HTTP status returned by the remote.
        status: u16,
        /// Leading excerpt of the response body.
        body: String,
    },
    /// A response body was not valid JSON of the expected shape.
    #[error("response could not be decoded")]
    Decode {
        /// Operation identifier.
        operation: &'static str,
        /// URL used for the request.
        url: String,
        /// Source decoding error.
        source: serde_json::Error,
    },
    /// A downloaded payload failed the torrent format check.
    #[error("payload format invalid")]
    Format {
        /// Operation identifier.
        operation: &'static str,
        /// Machine-readable reason for the rejection.
        reason: &'static str,
    },
    /// A lookup yielded nothing.
    #[error("torrent not found")]
    NotFound {
        /// Operation identifier.
        operation: &'static str,
        /// Hash or description of what was looked up.
        subject: String,
    },
    /// A forced reconnect failed after an earlier failure.
    #[error("reconnect failed")]
    Reconnect {
        /// Operation identifier.
        operation: &'static str,
        /// Failure reported by the reconnect attempt.
        source: Box<ClientError>,
    },
    /// The HTTP client could not be constructed.
    #[error("http client construction failed")]
    Transport {
        /// Source HTTP client error.
        source: reqwest::Error,
    },
}

/// Taxonomy class of a [`ClientError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or unknown configuration entry.
    Config,
    /// Malformed input rejected locally.
    Validation,
    /// Transport failure.
    Connectivity,
    /// Explicit login rejection.
    Auth,
    /// Non-success status or undecodable body.
    Remote,
    /// Payload failed the sentinel/non-empty check.
    Format,
    /// Lookup yielded nothing.
    NotFound,
    /// Reconnect after a failure did not succeed.
    Reconnect,
}

impl ClientError {
    /// Taxonomy class for this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Config { .. } => ErrorKind::Config,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Connectivity { .. } | Self::Transport { .. } => ErrorKind::Connectivity,
            Self::Auth { .. } => ErrorKind::Auth,
            Self::Remote { .. } | Self::Decode { .. } => ErrorKind::Remote,
            Self::Format { .. } => ErrorKind::Format,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Reconnect { .. } => ErrorKind::Reconnect,
        }
    }

    /// Operation that produced the error, when known.
    #[must_use]
    pub const fn operation(&self) -> Option<&'static str> {
        match self {
            Self::Config { operation, .. }
            | Self::Validation { operation, .. }
            | Self::Connectivity { operation, .. }
            | Self::Auth { operation, .. }
            | Self::Remote { operation, .. }
            | Self::Decode { operation, .. }
            | Self::Format { operation, .. }
            | Self::NotFound { operation, .. }
            | Self::Reconnect { operation, .. } => Some(*operation),
            Self::Transport { .. } => None,
        }
    }

    /// Retry classification used by [`crate::retry::decide`].
    #[must_use]
    pub fn failure_class(&self) -> FailureClass {
        match self {
            Self::Connectivity { .. } => FailureClass::Transport,
            Self::Auth { .. } => FailureClass::Unauthorized,
            Self::Remote { status, .. } => StatusCode::from_u16(*status)
                .map_or(FailureClass::Status, FailureClass::from_status),
            _ => FailureClass::Content,
        }
    }

    /// Human-readable detail without the operation prefix.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::Config { subject, .. } => format!("no configuration for '{subject}'"),
            Self::Validation { reason, .. } => format!("invalid input ({reason})"),
            Self::Connectivity { url, source, .. } => format!("{url} unreachable: {source}"),
            Self::Auth { status, body, .. } => {
                format!("login rejected (status {status}): {body}")
            }
            Self::Remote { status, body, .. } if body.is_empty() => {
                format!("request failed with status {status}")
            }
            Self::Remote { status, body, .. } => {
                format!("request failed with status {status}: {body}")
            }
            Self::Decode { source, .. } => format!("unexpected response: {source}"),
            Self::Format { reason, .. } => format!("invalid torrent file ({reason})"),
            Self::NotFound { subject, .. } => format!("torrent {subject} not found"),
            Self::Reconnect { source, .. } => format!("reconnect failed: {}", source.detail()),
            Self::Transport { source } => format!("http client unavailable: {source}"),
        }
    }
}

/// Trim a response body to a short single-line excerpt.
pub(crate) fn body_snippet(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let trimmed = text.trim();
    let mut snippet: String = trimmed
        .chars()
        .take(BODY_SNIPPET_LIMIT)
        .map(|ch| if ch.is_control() { ' ' } else { ch })
        .collect();
    if trimmed.chars().count() > BODY_SNIPPET_LIMIT {
        snippet.push('…');
    }
    snippet
}
