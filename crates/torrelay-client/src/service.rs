//! Seam traits implemented by the HTTP clients and consumed by the conversation layer.

use async_trait::async_trait;

use crate::error::{ClientError, ClientResult};
use crate::model::{TorrentFilter, TorrentRecord};

/// Torrent management operations against the daemon.
#[async_trait]
pub trait TorrentDaemon: Send + Sync {
    /// List torrents, optionally filtered server-side.
    async fn list(&self, filter: TorrentFilter) -> ClientResult<Vec<TorrentRecord>>;

    /// Upload a torrent payload and resolve the record it produced.
    async fn add(&self, payload: &[u8], save_path: Option<&str>) -> ClientResult<TorrentRecord>;

    /// Pause every listed torrent in one call.
    async fn pause_many(&self, hashes: &[String]) -> ClientResult<()>;

    /// Resume every listed torrent in one call.
    async fn resume_many(&self, hashes: &[String]) -> ClientResult<()>;

    /// Delete every listed torrent, optionally purging downloaded files.
    async fn delete_many(&self, hashes: &[String], purge_files: bool) -> ClientResult<()>;

    /// Drop the current session and log in on a fresh cookie store.
    async fn reconnect(&self) -> ClientResult<()>;

    /// Find one torrent by content hash (case-insensitive).
    async fn find_by_hash(&self, hash: &str) -> ClientResult<TorrentRecord> {
        self.list(TorrentFilter::All)
            .await?
            .into_iter()
            .find(|record| record.hash.eq_ignore_ascii_case(hash))
            .ok_or_else(|| ClientError::NotFound {
                operation: "daemon.find_by_hash",
                subject: hash.to_string(),
            })
    }

    /// Torrents whose name contains `term`, ignoring case.
    async fn find_by_name_contains(&self, term: &str) -> ClientResult<Vec<TorrentRecord>> {
        let needle = term.to_lowercase();
        Ok(self
            .list(TorrentFilter::All)
            .await?
            .into_iter()
            .filter(|record| record.name.to_lowercase().contains(&needle))
            .collect())
    }
}

/// Source of raw torrent payloads keyed by tracker site and id.
#[async_trait]
pub trait PayloadFetcher: Send + Sync {
    /// Download and validate the payload for `id` on `site`.
    async fn fetch_payload(&self, site: &str, id: &str) -> ClientResult<Vec<u8>>;
}
