//! Client for the torrent daemon's `/api/v2` web API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::REFERER;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use tracing::{debug, info};
use url::Url;

use torrelay_config::DaemonCredentials;

use crate::error::{ClientError, ClientResult, body_snippet};
use crate::model::{TorrentFilter, TorrentRecord};
use crate::service::TorrentDaemon;
use crate::session::{Authenticator, RemoteSession};

const LOGIN_PATH: &str = "api/v2/auth/login";
const VERSION_PATH: &str = "api/v2/app/version";
const LIST_PATH: &str = "api/v2/torrents/info";
const ADD_PATH: &str = "api/v2/torrents/add";
const PAUSE_PATH: &str = "api/v2/torrents/pause";
const RESUME_PATH: &str = "api/v2/torrents/resume";
const DELETE_PATH: &str = "api/v2/torrents/delete";

/// Substring of the login response body that signals success.
const LOGIN_OK_MARKER: &str = "Ok";
/// Body returned with a 200 status when the daemon refuses a torrent.
const ADD_FAILED_BODY: &str = "Fails.";
const HASH_SEPARATOR: &str = "|";
const UPLOAD_FILE_NAME: &str = "download.torrent";

/// Login exchange and liveness probe for the daemon.
pub struct DaemonAuth {
    base: Url,
    login_url: Url,
    probe_url: Url,
    username: String,
    password: String,
}

impl DaemonAuth {
    /// Derive the login and probe endpoints from the configured credentials.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Config` when the endpoints cannot be derived from the base URL.
    pub fn new(credentials: &DaemonCredentials) -> ClientResult<Self> {
        let base = normalize_base(&credentials.url);
        Ok(Self {
            login_url: endpoint(&base, LOGIN_PATH)?,
            probe_url: endpoint(&base, VERSION_PATH)?,
            base,
            username: credentials.username.clone(),
            password: credentials.password.clone(),
        })
    }
}

#[async_trait]
impl Authenticator for DaemonAuth {
    fn target(&self) -> &str {
        "daemon"
    }

    async fn login(&self, client: &Client) -> ClientResult<()> {
        let operation = "daemon.login";
        let response = client
            .post(self.login_url.clone())
            .header(REFERER, self.base.as_str())
            .form(&[
                ("username", self.username.as_str()),
                ("password", self.password.as_str()),
            ])
            .send()
            .await
            .map_err(|source| connectivity(operation, &self.login_url, source))?;

        let status = response.status();
        let body = read_body(operation, &self.login_url, response).await?;
        if status.is_success() && String::from_utf8_lossy(&body).contains(LOGIN_OK_MARKER) {
            Ok(())
        } else {
            Err(ClientError::Auth {
                operation,
                url: self.login_url.to_string(),
                status: status.as_u16(),
                body: body_snippet(&body),
            })
        }
    }

    async fn probe(&self, client: &Client) -> bool {
        match client.get(self.probe_url.clone()).send().await {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                debug!(error = %err, "daemon probe failed");
                false
            }
        }
    }
}

/// Torrent management client bound to one daemon session.
pub struct DaemonClient {
    base: Url,
    session: RemoteSession<DaemonAuth>,
}

impl DaemonClient {
    /// Build a client; the first operation performs the login.
    ///
    /// # Errors
    ///
    /// Returns an error when endpoints cannot be derived or the HTTP client cannot be built.
    pub fn new(credentials: &DaemonCredentials, timeout: Duration) -> ClientResult<Self> {
        Ok(Self {
            base: normalize_base(&credentials.url),
            session: RemoteSession::new(DaemonAuth::new(credentials)?, timeout)?,
        })
    }

    /// Underlying session, for liveness inspection.
    pub const fn session(&self) -> &RemoteSession<DaemonAuth> {
        &self.session
    }

    async fn post_hashes(
        &self,
        operation: &'static str,
        path: &str,
        hashes: &[String],
        extra: Option<(&str, &str)>,
    ) -> ClientResult<()> {
        if hashes.is_empty() {
            return Err(ClientError::Validation {
                operation,
                reason: "no_hashes",
            });
        }
        let client = self.session.ensure_authenticated().await?;
        let url = endpoint(&self.base, path)?;
        let joined = hashes.join(HASH_SEPARATOR);
        let mut form = vec![("hashes", joined.as_str())];
        form.extend(extra);

        let response = client
            .post(url.clone())
            .form(&form)
            .send()
            .await
            .map_err(|source| connectivity(operation, &url, source))?;
        read_success(operation, &url, response).await?;
        info!(operation, count = hashes.len(), "daemon batch action applied");
        Ok(())
    }
}

#[async_trait]
impl TorrentDaemon for DaemonClient {
    async fn list(&self, filter: TorrentFilter) -> ClientResult<Vec<TorrentRecord>> {
        let operation = "daemon.list";
        let client = self.session.ensure_authenticated().await?;
        let mut url = endpoint(&self.base, LIST_PATH)?;
        if let Some(value) = filter.query_value() {
            url.query_pairs_mut().append_pair("filter", value);
        }

        let response = client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| connectivity(operation, &url, source))?;
        let body = read_success(operation, &url, response).await?;
        serde_json::from_slice(&body).map_err(|source| ClientError::Decode {
            operation,
            url: url.to_string(),
            source,
        })
    }

    async fn add(&self, payload: &[u8], save_path: Option<&str>) -> ClientResult<TorrentRecord> {
        let operation = "daemon.add";
        if payload.is_empty() {
            return Err(ClientError::Validation {
                operation,
                reason: "empty_payload",
            });
        }

        let client = self.session.ensure_authenticated().await?;
        let url = endpoint(&self.base, ADD_PATH)?;
        let mut form = Form::new().part(
            "torrents",
            Part::bytes(payload.to_vec()).file_name(UPLOAD_FILE_NAME),
        );
        if let Some(path) = save_path.map(str::trim).filter(|path| !path.is_empty()) {
            form = form.text("savepath", path.to_string());
        }

        let response = client
            .post(url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|source| connectivity(operation, &url, source))?;
        let status = response.status();
        let body = read_success(operation, &url, response).await?;
        if body.trim_ascii() == ADD_FAILED_BODY.as_bytes() {
            return Err(ClientError::Remote {
                operation,
                url: url.to_string(),
                status: status.as_u16(),
                body: ADD_FAILED_BODY.to_string(),
            });
        }

        // The add endpoint returns no identifier; the newest admission is assumed to be ours.
        let record = newest_added(self.list(TorrentFilter::All).await?).ok_or_else(|| {
            ClientError::NotFound {
                operation,
                subject: "newly added torrent".to_string(),
            }
        })?;
        info!(name = %record.name, hash = %record.hash, "torrent added");
        Ok(record)
    }

    async fn pause_many(&self, hashes: &[String]) -> ClientResult<()> {
        self.post_hashes("daemon.pause", PAUSE_PATH, hashes, None)
            .await
    }

    async fn resume_many(&self, hashes: &[String]) -> ClientResult<()> {
        self.post_hashes("daemon.resume", RESUME_PATH, hashes, None)
            .await
    }

    async fn delete_many(&self, hashes: &[String], purge_files: bool) -> ClientResult<()> {
        let purge = if purge_files { "true" } else { "false" };
        self.post_hashes("daemon.delete", DELETE_PATH, hashes, Some(("deleteFiles", purge)))
            .await
    }

    async fn reconnect(&self) -> ClientResult<()> {
        self.session.reconnect().await.map(|_| ())
    }
}

/// Pick the record with the greatest admission timestamp; ties keep the first seen.
pub(crate) fn newest_added(records: Vec<TorrentRecord>) -> Option<TorrentRecord> {
    records.into_iter().fold(None, |best, record| match best {
        Some(current) if current.added_on >= record.added_on => Some(current),
        _ => Some(record),
    })
}

fn normalize_base(url: &Url) -> Url {
    let mut base = url.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}

fn endpoint(base: &Url, path: &str) -> ClientResult<Url> {
    base.join(path).map_err(|_| ClientError::Config {
        operation: "daemon.endpoint",
        subject: path.to_string(),
    })
}

fn connectivity(operation: &'static str, url: &Url, source: reqwest::Error) -> ClientError {
    ClientError::Connectivity {
        operation,
        url: url.to_string(),
        source,
    }
}

async fn read_body(
    operation: &'static str,
    url: &Url,
    response: Response,
) -> ClientResult<Vec<u8>> {
    response
        .bytes()
        .await
        .map(|bytes| bytes.to_vec())
        .map_err(|source| connectivity(operation, url, source))
}

/// Read the body of a 2xx response, or turn anything else into `ClientError::Remote`.
pub(crate) async fn read_success(
    operation: &'static str,
    url: &Url,
    response: Response,
) -> ClientResult<Vec<u8>> {
    let status = response.status();
    let body = read_body(operation, url, response).await?;
    if status.is_success() {
        Ok(body)
    } else {
        Err(ClientError::Remote {
            operation,
            url: url.to_string(),
            status: status.as_u16(),
            body: body_snippet(&body),
        })
    }
}
