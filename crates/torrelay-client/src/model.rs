//! Torrent records as reported by the daemon's `torrents/info` endpoint.
//!
//! Records are never cached: the daemon is the only source of truth and every
//! query fetches them fresh.

use serde::Deserialize;

/// One torrent as reported by the daemon. Identity is the content hash.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TorrentRecord {
    /// Display name; may change between polls.
    pub name: String,
    /// Content hash (stable identity key).
    pub hash: String,
    /// Total selected size in bytes.
    #[serde(default)]
    pub size: i64,
    /// Completion ratio in `[0, 1]`.
    #[serde(default)]
    pub progress: f64,
    /// Download rate in bytes per second.
    #[serde(default, rename = "dlspeed")]
    pub download_rate: i64,
    /// Upload rate in bytes per second.
    #[serde(default, rename = "upspeed")]
    pub upload_rate: i64,
    /// Lifecycle state.
    #[serde(default)]
    pub state: TorrentState,
    /// Connected seeds.
    #[serde(default, rename = "num_seeds")]
    pub seeds: i64,
    /// Connected peers.
    #[serde(default, rename = "num_leechs")]
    pub peers: i64,
    /// Unix timestamp of admission.
    #[serde(default)]
    pub added_on: i64,
    /// Unix timestamp of completion; zero or negative while incomplete.
    #[serde(default)]
    pub completion_on: i64,
    /// Estimated seconds to completion; the daemon reports a large sentinel when unknown.
    #[serde(default)]
    pub eta: i64,
    /// Directory the payload is written to.
    #[serde(default)]
    pub save_path: String,
    /// Daemon-side category label.
    #[serde(default)]
    pub category: String,
    /// Bytes still to download.
    #[serde(default)]
    pub amount_left: i64,
}

impl TorrentRecord {
    /// Progress clamped to `[0, 1]`.
    #[must_use]
    pub fn progress_ratio(&self) -> f64 {
        self.progress.clamp(0.0, 1.0)
    }

    /// Whether every selected byte has been downloaded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.progress_ratio() >= 1.0
    }
}

/// Lifecycle state reduced from the daemon's raw state strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum TorrentState {
    /// Actively downloading (including forced and metadata fetch).
    Downloading,
    /// Seeding or uploading.
    Seeding,
    /// Paused or stopped by the user.
    Paused,
    /// Downloading but no data is flowing.
    Stalled,
    /// Verifying data on disk.
    Checking,
    /// Any other state, kept verbatim.
    Other(String),
}

impl Default for TorrentState {
    fn default() -> Self {
        Self::Other("unknown".to_string())
    }
}

impl From<String> for TorrentState {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "downloading" | "forcedDL" | "metaDL" | "forcedMetaDL" => Self::Downloading,
            "uploading" | "seeding" | "forcedUP" | "stalledUP" => Self::Seeding,
            "pausedDL" | "pausedUP" | "stoppedDL" | "stoppedUP" => Self::Paused,
            "stalledDL" => Self::Stalled,
            "checkingDL" | "checkingUP" | "checkingResumeData" => Self::Checking,
            _ => Self::Other(raw),
        }
    }
}

impl TorrentState {
    /// Human-readable label.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Downloading => "Downloading",
            Self::Seeding => "Seeding",
            Self::Paused => "Paused",
            Self::Stalled => "Stalled",
            Self::Checking => "Checking",
            Self::Other(raw) => raw,
        }
    }
}

/// Server-side filter for the list endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TorrentFilter {
    /// No filter.
    #[default]
    All,
    /// Torrents currently downloading.
    Downloading,
    /// Torrents currently seeding.
    Seeding,
    /// Fully downloaded torrents.
    Completed,
    /// Paused torrents.
    Paused,
    /// Torrents with traffic.
    Active,
    /// Torrents without traffic.
    Inactive,
    /// Stalled torrents.
    Stalled,
    /// Torrents in an error state.
    Errored,
}

impl TorrentFilter {
    /// Query value for the `filter` parameter; `None` for [`TorrentFilter::All`].
    #[must_use]
    pub const fn query_value(self) -> Option<&'static str> {
        match self {
            Self::All => None,
            Self::Downloading => Some("downloading"),
            Self::Seeding => Some("seeding"),
            Self::Completed => Some("completed"),
            Self::Paused => Some("paused"),
            Self::Active => Some("active"),
            Self::Inactive => Some("inactive"),
            Self::Stalled => Some("stalled"),
            Self::Errored => Some("errored"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_decodes_daemon_field_names() -> anyhow::Result<()> {
        let record: TorrentRecord = serde_json::from_value(json!({
            "name": "Ubuntu 24.04",
            "hash": "ABC123",
            "size": 4_096,
            "progress": 0.5,
            "dlspeed": 1_024,
            "upspeed": 12,
            "state": "pausedDL",
            "num_seeds": 3,
            "num_leechs": 7,
            "added_on": 1_700_000_000,
            "completion_on": -1,
            "eta": 8_640_000,
            "save_path": "/downloads",
            "category": "",
            "amount_left": 2_048,
            "tags": "ignored"
        }))?;
        assert_eq!(record.state, TorrentState::Paused);
        assert_eq!(record.download_rate, 1_024);
        assert_eq!(record.peers, 7);
        assert!(!record.is_complete());
        Ok(())
    }

    #[test]
    fn sparse_records_fall_back_to_defaults() -> anyhow::Result<()> {
        let record: TorrentRecord =
            serde_json::from_value(json!({"name": "x", "hash": "h", "progress": 1.4}))?;
        assert_eq!(record.state, TorrentState::Other("unknown".into()));
        assert!((record.progress_ratio() - 1.0).abs() < f64::EPSILON);
        assert!(record.is_complete());
        Ok(())
    }

    #[test]
    fn unknown_states_keep_raw_label() {
        let state = TorrentState::from("moving".to_string());
        assert_eq!(state.label(), "moving");
        assert_eq!(TorrentState::from("stalledDL".to_string()), TorrentState::Stalled);
        assert_eq!(TorrentState::from("checkingUP".to_string()), TorrentState::Checking);
    }

    #[test]
    fn all_filter_has_no_query_value() {
        assert_eq!(TorrentFilter::All.query_value(), None);
        assert_eq!(TorrentFilter::Paused.query_value(), Some("paused"));
    }
}
