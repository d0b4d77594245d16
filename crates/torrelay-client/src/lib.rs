#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

//! Authenticated HTTP clients for the torrent daemon and tracker sites.
//!
//! Layout:
//! - `session.rs`: cookie-bound `RemoteSession` with liveness cache and reconnect
//! - `retry.rs`: pure reconnect-and-retry policy
//! - `daemon.rs`: `DaemonClient` over the daemon's `/api/v2` surface
//! - `tracker.rs`: `TrackerClient` fetching raw torrent payloads
//! - `service.rs`: seam traits consumed by the conversation layer
//! - `model.rs`: torrent records as reported by the daemon

pub mod daemon;
pub mod error;
pub mod model;
pub mod retry;
pub mod service;
pub mod session;
pub mod tracker;

pub use daemon::{DaemonAuth, DaemonClient};
pub use error::{ClientError, ClientResult, ErrorKind};
pub use model::{TorrentFilter, TorrentRecord, TorrentState};
pub use retry::{FailureClass, MAX_RECONNECTS, RetryBudget, RetryDecision, decide};
pub use service::{PayloadFetcher, TorrentDaemon};
pub use session::{Authenticator, RemoteSession};
pub use tracker::{PAYLOAD_SENTINEL, TrackerAuth, TrackerClient};
