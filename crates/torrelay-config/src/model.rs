//! Typed configuration models.

use std::fmt;
use std::time::Duration;

use url::Url;

use crate::defaults::ID_PLACEHOLDER;

/// Fully validated application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Connection details for the torrent daemon.
    pub daemon: DaemonCredentials,
    /// Tracker sites recognised in inbound links, in match priority order.
    pub sites: Vec<TrackerSite>,
    /// Destination categories offered after a link is submitted.
    pub categories: Vec<Category>,
    /// Requester identities allowed to use the bot.
    pub allowed_users: Vec<i64>,
    /// Deadline applied to every outbound HTTP call.
    pub http_timeout: Duration,
}

impl AppConfig {
    /// Look up a tracker site by name.
    #[must_use]
    pub fn site(&self, name: &str) -> Option<&TrackerSite> {
        self.sites.iter().find(|site| site.name == name)
    }

    /// Look up a category by its callback key (including the delimiter).
    #[must_use]
    pub fn category(&self, key: &str) -> Option<&Category> {
        self.categories.iter().find(|category| category.key == key)
    }

    /// Whether the requester appears on the allow-list.
    #[must_use]
    pub fn is_allowed(&self, requester: i64) -> bool {
        self.allowed_users.contains(&requester)
    }
}

/// Credentials and endpoint for the torrent daemon's web API.
#[derive(Clone)]
pub struct DaemonCredentials {
    /// Base URL of the daemon web UI.
    pub url: Url,
    /// Login user name.
    pub username: String,
    /// Login password.
    pub password: String,
}

impl fmt::Debug for DaemonCredentials {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("DaemonCredentials")
            .field("url", &self.url.as_str())
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Login endpoint and form mapping for one tracker site.
#[derive(Clone)]
pub struct TrackerCredentials {
    /// Form POST target for the login exchange.
    pub login_url: Url,
    /// Form fields submitted verbatim, in order.
    pub form: Vec<(String, String)>,
    /// Text a successful login page must contain; `None` trusts a 2xx status.
    pub success_marker: Option<String>,
}

impl fmt::Debug for TrackerCredentials {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.form.iter().map(|(key, _)| key.as_str()).collect();
        formatter
            .debug_struct("TrackerCredentials")
            .field("login_url", &self.login_url.as_str())
            .field("form_fields", &fields)
            .field("success_marker", &self.success_marker)
            .finish()
    }
}

/// A tracker site that links can point at.
#[derive(Debug, Clone)]
pub struct TrackerSite {
    /// Short site name; also the domain label matched in links.
    pub name: String,
    /// Query key carrying the numeric torrent id (`t`, `id`, ...).
    pub id_key: String,
    /// Download URL with an `{id}` placeholder.
    pub download_template: String,
    /// Login details; `None` when the operator has not configured the site.
    pub credentials: Option<TrackerCredentials>,
}

impl TrackerSite {
    /// Expand the download template for the given torrent id.
    #[must_use]
    pub fn download_url(&self, id: &str) -> String {
        self.download_template.replace(ID_PLACEHOLDER, id)
    }
}

/// Download destination offered to the requester.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    /// Callback key, terminated by the category delimiter.
    pub key: String,
    /// Button label.
    pub label: String,
    /// Save path forwarded to the daemon; empty means the daemon default.
    pub save_path: String,
}
