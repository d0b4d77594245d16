//! Text rendering for replies.

use std::error::Error;
use std::fmt::Write as _;

use chrono::DateTime;
use torrelay_client::{ClientError, TorrentRecord, TorrentState};

use crate::keyboard::{clamp_page, page_count};

/// Torrents per page in the status summary.
pub const STATUS_PAGE_SIZE: usize = 10;
/// Torrents per page in the selection list.
pub const LIST_PAGE_SIZE: usize = 20;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Human-readable size in 1024-based units.
#[must_use]
pub fn format_size(bytes: i64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;
    const TB: f64 = GB * 1024.0;
    let bytes = u64::try_from(bytes).unwrap_or(0);
    let value = bytes_to_f64(bytes);
    if value >= TB {
        format!("{:.2} TB", value / TB)
    } else if value >= GB {
        format!("{:.2} GB", value / GB)
    } else if value >= MB {
        format!("{:.2} MB", value / MB)
    } else if value >= KB {
        format!("{:.2} KB", value / KB)
    } else {
        format!("{bytes} B")
    }
}

fn bytes_to_f64(value: u64) -> f64 {
    let high = u32::try_from(value >> 32).unwrap_or(u32::MAX);
    let low = u32::try_from(value & 0xFFFF_FFFF).unwrap_or(u32::MAX);
    f64::from(high) * 4_294_967_296.0 + f64::from(low)
}

/// Transfer rate per second.
#[must_use]
pub fn format_speed(bytes_per_sec: i64) -> String {
    format!("{}/s", format_size(bytes_per_sec))
}

/// Progress ratio as a percentage with one decimal.
#[must_use]
pub fn format_progress(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

/// Remaining time as `Hh Mm Ss`, dropping leading zero units; negative means unknown.
#[must_use]
pub fn format_eta(seconds: i64) -> String {
    if seconds < 0 {
        return "∞".to_string();
    }
    let (hours, minutes, secs) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
    if hours > 0 {
        format!("{hours}h {minutes}m {secs}s")
    } else if minutes > 0 {
        format!("{minutes}m {secs}s")
    } else {
        format!("{secs}s")
    }
}

/// Unix timestamp rendered in UTC.
#[must_use]
pub fn format_timestamp(unix_secs: i64) -> String {
    DateTime::from_timestamp(unix_secs, 0).map_or_else(
        || unix_secs.to_string(),
        |at| at.format(TIMESTAMP_FORMAT).to_string(),
    )
}

/// Full details view for one torrent.
#[must_use]
pub fn torrent_details(record: &TorrentRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "📥 *{}*\n", record.name);
    let _ = writeln!(out, "Status: {}", record.state.label());
    let _ = writeln!(out, "Progress: {}", format_progress(record.progress_ratio()));
    match record.state {
        TorrentState::Downloading => {
            let _ = writeln!(out, "Download Speed: {}", format_speed(record.download_rate));
            let _ = writeln!(out, "ETA: {}", format_eta(record.eta));
        }
        TorrentState::Seeding => {
            let _ = writeln!(out, "Upload Speed: {}", format_speed(record.upload_rate));
        }
        _ => {}
    }
    let _ = writeln!(out, "Size: {}", format_size(record.size));
    if !record.is_complete() {
        let _ = writeln!(
            out,
            "Downloaded: {}",
            format_size(record.size.saturating_sub(record.amount_left))
        );
        let _ = writeln!(out, "Remaining: {}", format_size(record.amount_left));
    }
    let _ = writeln!(out, "Seeds/Peers: {}/{}", record.seeds, record.peers);
    let _ = writeln!(out, "Added: {}", format_timestamp(record.added_on));
    if record.completion_on > 0 {
        let _ = writeln!(out, "Completed: {}", format_timestamp(record.completion_on));
    }
    let _ = writeln!(out, "Save Path: {}", record.save_path);
    let _ = write!(out, "\nHash: {}", record.hash);
    out
}

/// One page of the status summary, with `page` clamped into range.
///
/// Returns the text and the page actually rendered.
#[must_use]
pub fn status_page(records: &[TorrentRecord], page: usize) -> (String, usize) {
    if records.is_empty() {
        return ("No torrents found".to_string(), 0);
    }
    let page = clamp_page(page, records.len(), STATUS_PAGE_SIZE);
    let mut out = String::from("📥 *Torrent Status:*\n\n");
    for record in records.iter().skip(page * STATUS_PAGE_SIZE).take(STATUS_PAGE_SIZE) {
        let progress = format_progress(record.progress_ratio());
        match record.state {
            TorrentState::Downloading => {
                let _ = writeln!(out, "🔽 *{}*", record.name);
                let _ = writeln!(out, "Status: Downloading");
                let _ = writeln!(out, "Progress: {progress}");
                let _ = writeln!(out, "Speed: {}", format_speed(record.download_rate));
                let _ = writeln!(out, "ETA: {}", format_eta(record.eta));
            }
            TorrentState::Seeding => {
                let _ = writeln!(out, "🔼 *{}*", record.name);
                let _ = writeln!(out, "Status: Seeding");
                let _ = writeln!(out, "Upload Speed: {}", format_speed(record.upload_rate));
            }
            TorrentState::Paused | TorrentState::Stalled | TorrentState::Checking => {
                let icon = match record.state {
                    TorrentState::Paused => "⏸",
                    TorrentState::Stalled => "⚠️",
                    _ => "🔍",
                };
                let _ = writeln!(out, "{icon} *{}*", record.name);
                let _ = writeln!(out, "Status: {}", record.state.label());
                let _ = writeln!(out, "Progress: {progress}");
            }
            TorrentState::Other(ref raw) => {
                let _ = writeln!(out, "📁 *{}*", record.name);
                let _ = writeln!(out, "Status: {raw}");
            }
        }
        let _ = writeln!(out, "Size: {}", format_size(record.size));
        let _ = writeln!(out, "Seeds/Peers: {}/{}\n", record.seeds, record.peers);
    }
    let _ = write!(
        out,
        "Showing page {} of {} (Total torrents: {})",
        page + 1,
        page_count(records.len(), STATUS_PAGE_SIZE),
        records.len()
    );
    (out, page)
}

/// Usage text listing the commands and the recognized sites.
pub fn help_text<'a>(sites: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = String::from(
        "*Torrent Bot Commands:*\n\
         /status - Show status of all torrents\n\
         /torrent [name] - Search for torrents by name\n\
         /list - Show a list of torrents to manage\n\
         /reconnect - Reconnect to the torrent daemon\n\n\
         *Other Features:*\n\
         - Send a link from a supported tracker to download it\n\
         - Use buttons to manage your torrents\n\n\
         *Supported Trackers:*",
    );
    for site in sites {
        let _ = write!(out, "\n- {site}");
    }
    out
}

/// User-facing description of a client failure: operation name plus detail.
#[must_use]
pub fn describe_client_error(err: &ClientError) -> String {
    err.operation().map_or_else(
        || err.detail(),
        |operation| format!("{operation}: {}", err.detail()),
    )
}

/// Walk an error chain into one line, rendering client failures with their operation.
#[must_use]
pub fn describe_error(err: &(dyn Error + 'static)) -> String {
    let mut parts = Vec::new();
    let mut current = Some(err);
    while let Some(layer) = current {
        if let Some(client) = layer.downcast_ref::<ClientError>() {
            parts.push(describe_client_error(client));
            break;
        }
        parts.push(layer.to_string());
        current = layer.source();
    }
    parts.join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{SubmitError, SubmitStage};

    #[test]
    fn sizes_use_binary_units() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.00 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024 * 1024), "3.00 TB");
        assert_eq!(format_size(-5), "0 B");
        assert_eq!(format_speed(2048), "2.00 KB/s");
    }

    #[test]
    fn eta_drops_leading_zero_units() {
        assert_eq!(format_eta(-1), "∞");
        assert_eq!(format_eta(42), "42s");
        assert_eq!(format_eta(125), "2m 5s");
        assert_eq!(format_eta(3_725), "1h 2m 5s");
    }

    #[test]
    fn progress_and_timestamps() {
        assert_eq!(format_progress(0.256), "25.6%");
        assert_eq!(format_timestamp(0), "1970-01-01 00:00:00");
        assert_eq!(format_timestamp(1_700_000_000), "2023-11-14 22:13:20");
    }

    fn record(name: &str, state: TorrentState) -> TorrentRecord {
        TorrentRecord {
            name: name.into(),
            hash: "abc".into(),
            size: 2048,
            progress: 0.5,
            amount_left: 1024,
            state,
            eta: 90,
            save_path: "/media".into(),
            ..TorrentRecord::default()
        }
    }

    #[test]
    fn details_include_state_specific_lines() {
        let text = torrent_details(&record("Ubuntu", TorrentState::Downloading));
        assert!(text.contains("📥 *Ubuntu*"));
        assert!(text.contains("ETA: 1m 30s"));
        assert!(text.contains("Remaining: 1.00 KB"));
        assert!(text.contains("Save Path: /media"));
        assert!(text.ends_with("Hash: abc"));
        assert!(!text.contains("Completed:"));
    }

    #[test]
    fn status_page_is_clamped() {
        let records: Vec<_> = (0..12)
            .map(|n| record(&format!("t{n}"), TorrentState::Paused))
            .collect();
        let (text, page) = status_page(&records, 5);
        assert_eq!(page, 1);
        assert!(text.contains("⏸ *t11*"));
        assert!(!text.contains("*t9*"));
        assert!(text.ends_with("Showing page 2 of 2 (Total torrents: 12)"));
        assert_eq!(status_page(&[], 0).0, "No torrents found");
    }

    #[test]
    fn help_lists_sites() {
        let text = help_text(["rutracker", "kinozal"]);
        assert!(text.contains("/reconnect"));
        assert!(text.ends_with("- rutracker\n- kinozal"));
    }

    #[test]
    fn errors_name_stage_and_operation() {
        let err = SubmitError {
            stage: SubmitStage::Fetch,
            source: ClientError::Format {
                operation: "tracker.fetch",
                reason: "missing_sentinel",
            },
        };
        assert_eq!(
            describe_error(&err),
            "submission failed while fetching the torrent from the tracker: \
             tracker.fetch: invalid torrent file (missing_sentinel)"
        );
    }
}
