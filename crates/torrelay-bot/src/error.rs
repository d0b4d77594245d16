//! Error types for link handling and callback decoding.

use std::fmt;

use thiserror::Error;
use torrelay_client::ClientError;

/// Failures while recognizing a tracker link.
#[derive(Debug, Error)]
pub enum LinkError {
    /// No URL of a known tracker appears in the text.
    #[error("no tracker link found")]
    NoMatch,
    /// A known tracker URL was found but carries no usable torrent id.
    #[error("torrent id missing from tracker link")]
    Extraction {
        /// Site whose URL was recognized.
        site: String,
    },
    /// A site pattern failed to compile.
    #[error("invalid tracker link pattern")]
    Pattern {
        /// Regex compilation failure.
        #[source]
        source: regex::Error,
    },
}

/// Pipeline stage that failed during a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitStage {
    /// Downloading the payload from the tracker.
    Fetch,
    /// Handing the payload to the daemon.
    Add,
}

impl fmt::Display for SubmitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fetch => "fetching the torrent from the tracker",
            Self::Add => "adding the torrent to the daemon",
        })
    }
}

/// Failure of the fetch-then-add pipeline, tagged with the failing stage.
#[derive(Debug, Error)]
#[error("submission failed while {stage}")]
pub struct SubmitError {
    /// Stage that failed.
    pub stage: SubmitStage,
    /// Underlying client failure, unchanged.
    #[source]
    pub source: ClientError,
}

/// Failures while decoding a callback token.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// The leading verb is not one the router understands.
    #[error("unknown callback verb")]
    UnknownVerb {
        /// Verb as received.
        verb: String,
    },
    /// The verb is known but its arguments are missing or malformed.
    #[error("malformed callback token")]
    Malformed {
        /// Token as received.
        token: String,
    },
}
