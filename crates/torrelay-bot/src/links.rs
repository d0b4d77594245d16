//! Tracker link recognition and the fetch-then-add submission pipeline.

use std::sync::Arc;

use regex::Regex;
use tracing::{info, warn};

use torrelay_client::{PayloadFetcher, TorrentDaemon, TorrentRecord};
use torrelay_config::TrackerSite;

use crate::error::{LinkError, SubmitError, SubmitStage};

/// Characters allowed in the path and query of a recognized link.
const URL_TAIL: &str = r"[-a-zA-Z0-9@:%_+.~#?&/=]*";

/// A tracker link reduced to its site and numeric torrent id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerLink {
    /// Configured site name.
    pub site: String,
    /// Torrent id on that site.
    pub id: String,
}

struct SitePattern {
    name: String,
    id: Regex,
}

/// Matches free text against the configured tracker sites.
pub struct LinkRecognizer {
    url: Option<Regex>,
    sites: Vec<SitePattern>,
}

impl LinkRecognizer {
    /// Compile link patterns for `sites`.
    ///
    /// # Errors
    ///
    /// Returns `LinkError::Pattern` when a site name or id key produces an invalid pattern.
    pub fn new(sites: &[TrackerSite]) -> Result<Self, LinkError> {
        let compile =
            |pattern: &str| Regex::new(pattern).map_err(|source| LinkError::Pattern { source });

        let url = if sites.is_empty() {
            None
        } else {
            let names: Vec<String> = sites.iter().map(|site| regex::escape(&site.name)).collect();
            Some(compile(&format!(
                r"(?i)https?://(?:[a-z0-9-]+\.)*({})\.[a-z]{{2,4}}\b{URL_TAIL}",
                names.join("|")
            ))?)
        };

        let sites = sites
            .iter()
            .map(|site| {
                Ok(SitePattern {
                    name: site.name.clone(),
                    id: compile(&format!(r"[?&]{}=(\d+)", regex::escape(&site.id_key)))?,
                })
            })
            .collect::<Result<Vec<_>, LinkError>>()?;

        Ok(Self { url, sites })
    }

    /// Find the first tracker link in `text` and extract its id.
    ///
    /// # Errors
    ///
    /// `LinkError::NoMatch` when no known tracker URL appears, and
    /// `LinkError::Extraction` when one does but carries no id.
    pub fn recognize(&self, text: &str) -> Result<TrackerLink, LinkError> {
        let captures = self
            .url
            .as_ref()
            .and_then(|url| url.captures(text))
            .ok_or(LinkError::NoMatch)?;
        let (Some(whole), Some(host)) = (captures.get(0), captures.get(1)) else {
            return Err(LinkError::NoMatch);
        };
        let site = self
            .sites
            .iter()
            .find(|site| site.name.eq_ignore_ascii_case(host.as_str()))
            .ok_or(LinkError::NoMatch)?;

        site.id
            .captures(whole.as_str())
            .and_then(|found| found.get(1))
            .map(|id| TrackerLink {
                site: site.name.clone(),
                id: id.as_str().to_string(),
            })
            .ok_or_else(|| LinkError::Extraction {
                site: site.name.clone(),
            })
    }

    /// Names of the sites this recognizer knows.
    pub fn site_names(&self) -> impl Iterator<Item = &str> {
        self.sites.iter().map(|site| site.name.as_str())
    }
}

/// Drives a recognized link through the tracker and into the daemon.
pub struct LinkOrchestrator {
    recognizer: LinkRecognizer,
    tracker: Arc<dyn PayloadFetcher>,
    daemon: Arc<dyn TorrentDaemon>,
}

impl LinkOrchestrator {
    /// Assemble the pipeline from its collaborators.
    #[must_use]
    pub fn new(
        recognizer: LinkRecognizer,
        tracker: Arc<dyn PayloadFetcher>,
        daemon: Arc<dyn TorrentDaemon>,
    ) -> Self {
        Self {
            recognizer,
            tracker,
            daemon,
        }
    }

    /// Link recognizer used by this pipeline.
    #[must_use]
    pub const fn recognizer(&self) -> &LinkRecognizer {
        &self.recognizer
    }

    /// Shorthand for [`LinkRecognizer::recognize`].
    ///
    /// # Errors
    ///
    /// See [`LinkRecognizer::recognize`].
    pub fn recognize(&self, text: &str) -> Result<TrackerLink, LinkError> {
        self.recognizer.recognize(text)
    }

    /// Fetch the payload for torrent `id` on `site` and add it to the daemon.
    ///
    /// A blank `save_path` leaves the destination to the daemon.
    ///
    /// # Errors
    ///
    /// Returns `SubmitError` tagged with the failing stage; the client error is kept as-is.
    pub async fn submit(
        &self,
        site: &str,
        id: &str,
        save_path: Option<&str>,
    ) -> Result<TorrentRecord, SubmitError> {
        let payload = self
            .tracker
            .fetch_payload(site, id)
            .await
            .map_err(|source| {
                warn!(site, id, error = %source, "payload fetch failed");
                SubmitError {
                    stage: SubmitStage::Fetch,
                    source,
                }
            })?;

        let save_path = save_path.filter(|path| !path.trim().is_empty());
        let record = self
            .daemon
            .add(&payload, save_path)
            .await
            .map_err(|source| {
                warn!(site, id, error = %source, "daemon add failed");
                SubmitError {
                    stage: SubmitStage::Add,
                    source,
                }
            })?;

        info!(site, id, hash = %record.hash, "link submitted");
        Ok(record)
    }
}
