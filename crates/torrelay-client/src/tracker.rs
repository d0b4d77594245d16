//! Authenticated payload downloads from tracker sites.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{info, warn};
use url::Url;

use torrelay_config::{TrackerCredentials, TrackerSite};

use crate::daemon::read_success;
use crate::error::{ClientError, ClientResult, body_snippet};
use crate::retry::{RetryBudget, RetryDecision, decide};
use crate::service::PayloadFetcher;
use crate::session::{Authenticator, RemoteSession};

/// First byte of every bencoded torrent file (a top-level dictionary).
pub const PAYLOAD_SENTINEL: u8 = b'd';

/// Form login against a single tracker site.
pub struct TrackerAuth {
    site: String,
    credentials: TrackerCredentials,
}

impl TrackerAuth {
    /// Bind a site name to its login form.
    #[must_use]
    pub const fn new(site: String, credentials: TrackerCredentials) -> Self {
        Self { site, credentials }
    }
}

#[async_trait]
impl Authenticator for TrackerAuth {
    fn target(&self) -> &str {
        &self.site
    }

    async fn login(&self, client: &Client) -> ClientResult<()> {
        let operation = "tracker.login";
        let url = &self.credentials.login_url;
        let response = client
            .post(url.clone())
            .form(&self.credentials.form)
            .send()
            .await
            .map_err(|source| ClientError::Connectivity {
                operation,
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        let body = response.bytes().await.unwrap_or_default();
        let marker_found = self
            .credentials
            .success_marker
            .as_deref()
            .is_none_or(|marker| String::from_utf8_lossy(&body).contains(marker));
        if status.is_success() && marker_found {
            return Ok(());
        }
        Err(ClientError::Auth {
            operation,
            url: url.to_string(),
            status: status.as_u16(),
            body: body_snippet(&body),
        })
    }
}

/// Fetches torrent payloads, holding one session per configured site.
pub struct TrackerClient {
    sites: HashMap<String, TrackerSite>,
    sessions: HashMap<String, RemoteSession<TrackerAuth>>,
}

impl TrackerClient {
    /// Build sessions for every site that carries credentials.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` if an HTTP client cannot be built.
    pub fn new(sites: &[TrackerSite], timeout: Duration) -> ClientResult<Self> {
        let mut sessions = HashMap::new();
        for site in sites {
            if let Some(credentials) = &site.credentials {
                let auth = TrackerAuth::new(site.name.clone(), credentials.clone());
                sessions.insert(site.name.clone(), RemoteSession::new(auth, timeout)?);
            }
        }
        Ok(Self {
            sites: sites
                .iter()
                .map(|site| (site.name.clone(), site.clone()))
                .collect(),
            sessions,
        })
    }

    fn resolve(&self, site: &str) -> ClientResult<(&TrackerSite, &RemoteSession<TrackerAuth>)> {
        let config = self.sites.get(site);
        let session = self.sessions.get(site);
        config.zip(session).ok_or_else(|| ClientError::Config {
            operation: "tracker.fetch",
            subject: site.to_string(),
        })
    }
}

#[async_trait]
impl PayloadFetcher for TrackerClient {
    async fn fetch_payload(&self, site: &str, id: &str) -> ClientResult<Vec<u8>> {
        let operation = "tracker.fetch";
        let (config, session) = self.resolve(site)?;
        let url: Url = config
            .download_url(id)
            .parse()
            .map_err(|_| ClientError::Config {
                operation,
                subject: config.download_template.clone(),
            })?;

        let mut client = match session.ensure_authenticated().await {
            Ok(client) => client,
            Err(err) if decide(err.failure_class(), 0) == RetryDecision::ReconnectAndRetry => {
                warn!(site, error = %err, "tracker login failed; reconnecting");
                relogin(session).await?
            }
            Err(err) => return Err(err),
        };

        let mut budget = RetryBudget::default();
        loop {
            let err = match download(&client, &url).await {
                Ok(payload) => {
                    validate_payload(&payload)?;
                    info!(site, id, bytes = payload.len(), "torrent payload fetched");
                    return Ok(payload);
                }
                Err(err) => err,
            };
            match budget.consume(err.failure_class()) {
                RetryDecision::ReconnectAndRetry => {
                    warn!(site, id, error = %err, "payload fetch failed; reconnecting");
                    client = relogin(session).await?;
                }
                RetryDecision::Fail => return Err(err),
            }
        }
    }
}

async fn relogin(session: &RemoteSession<TrackerAuth>) -> ClientResult<Client> {
    session
        .reconnect()
        .await
        .map_err(|source| ClientError::Reconnect {
            operation: "tracker.login",
            source: Box::new(source),
        })
}

async fn download(client: &Client, url: &Url) -> ClientResult<Vec<u8>> {
    let operation = "tracker.fetch";
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|source| ClientError::Connectivity {
            operation,
            url: url.to_string(),
            source,
        })?;
    read_success(operation, url, response).await
}

fn validate_payload(payload: &[u8]) -> ClientResult<()> {
    let reason = match payload.first() {
        None => "empty_payload",
        Some(&first) if first != PAYLOAD_SENTINEL => "missing_sentinel",
        Some(_) => return Ok(()),
    };
    Err(ClientError::Format {
        operation: "tracker.fetch",
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};

    use httpmock::prelude::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    use crate::error::ErrorKind;

    fn site_at(login_url: &str, download_template: String) -> TrackerSite {
        TrackerSite {
            name: "rutracker".into(),
            id_key: "t".into(),
            download_template,
            credentials: Some(TrackerCredentials {
                login_url: login_url.parse().expect("url"),
                form: vec![
                    ("login_username".into(), "reader".into()),
                    ("login_password".into(), "secret".into()),
                ],
                success_marker: None,
            }),
        }
    }

    fn site(server: &MockServer) -> TrackerSite {
        site_at(
            &server.url("/forum/login.php"),
            server.url("/forum/dl.php?t={id}"),
        )
    }

    /// One scripted answer; the last entry of a route repeats once exhausted.
    #[derive(Clone, Copy)]
    enum Scripted {
        Reply(u16, &'static str),
        Hangup,
    }

    /// Plain TCP server that answers each connection from a per-path script.
    struct ScriptedServer {
        addr: SocketAddr,
        hits: Arc<Mutex<HashMap<&'static str, usize>>>,
    }

    impl ScriptedServer {
        async fn start(routes: Vec<(&'static str, Vec<Scripted>)>) -> anyhow::Result<Self> {
            let listener = TcpListener::bind("127.0.0.1:0").await?;
            let addr = listener.local_addr()?;
            let hits = Arc::new(Mutex::new(HashMap::new()));
            let counter = Arc::clone(&hits);
            tokio::spawn(async move {
                while let Ok((mut stream, _)) = listener.accept().await {
                    let Some(path) = read_request_path(&mut stream).await else {
                        continue;
                    };
                    let Some((route, script)) =
                        routes.iter().find(|(prefix, _)| path.starts_with(*prefix))
                    else {
                        continue;
                    };
                    let seen = {
                        let mut hits = counter.lock().expect("hits");
                        let count = hits.entry(*route).or_insert(0);
                        *count += 1;
                        *count
                    };
                    match script[(seen - 1).min(script.len() - 1)] {
                        Scripted::Hangup => drop(stream),
                        Scripted::Reply(status, body) => {
                            let response = format!(
                                "HTTP/1.1 {status} Scripted\r\ncontent-length: {}\r\n\
                                 connection: close\r\n\r\n{body}",
                                body.len()
                            );
                            let _ = stream.write_all(response.as_bytes()).await;
                            let _ = stream.shutdown().await;
                        }
                    }
                }
            });
            Ok(Self { addr, hits })
        }

        fn url(&self, path: &str) -> String {
            format!("http://{}{path}", self.addr)
        }

        fn hits(&self, route: &str) -> usize {
            self.hits
                .lock()
                .expect("hits")
                .get(route)
                .copied()
                .unwrap_or(0)
        }

        fn site(&self) -> TrackerSite {
            site_at(&self.url(LOGIN), self.url("/forum/dl.php?t={id}"))
        }
    }

    const LOGIN: &str = "/forum/login.php";
    const DOWNLOAD: &str = "/forum/dl.php";

    async fn read_request_path(stream: &mut TcpStream) -> Option<String> {
        let mut buf = Vec::new();
        let mut chunk = [0_u8; 1024];
        let header_end = loop {
            let read = stream.read(&mut chunk).await.ok()?;
            if read == 0 {
                return None;
            }
            buf.extend_from_slice(&chunk[..read]);
            if let Some(pos) = buf.windows(4).position(|window| window == b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
        let length = head
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        while buf.len() < header_end + length {
            let read = stream.read(&mut chunk).await.ok()?;
            if read == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..read]);
        }
        head.split_whitespace().nth(1).map(str::to_string)
    }

    fn client(site: TrackerSite) -> TrackerClient {
        TrackerClient::new(&[site], Duration::from_secs(5)).expect("tracker client")
    }

    #[tokio::test]
    async fn fetch_logs_in_and_returns_bencoded_payload() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        let login = server.mock(|when, then| {
            when.method(POST)
                .path("/forum/login.php")
                .body("login_username=reader&login_password=secret");
            then.status(200).body("welcome");
        });
        let download = server.mock(|when, then| {
            when.method(GET).path("/forum/dl.php").query_param("t", "555");
            then.status(200).body("d8:announce3:urle");
        });

        let payload = client(site(&server)).fetch_payload("rutracker", "555").await?;
        assert_eq!(payload.first(), Some(&PAYLOAD_SENTINEL));
        login.assert_hits(1);
        download.assert_hits(1);
        Ok(())
    }

    #[tokio::test]
    async fn persistent_unauthorized_reconnects_exactly_once() {
        let server = MockServer::start_async().await;
        let login = server.mock(|when, then| {
            when.method(POST).path("/forum/login.php");
            then.status(200);
        });
        let download = server.mock(|when, then| {
            when.method(GET).path("/forum/dl.php");
            then.status(401).body("denied");
        });

        let err = client(site(&server))
            .fetch_payload("rutracker", "555")
            .await
            .expect_err("always unauthorized");
        assert!(matches!(err, ClientError::Remote { status: 401, .. }));
        download.assert_hits(2);
        login.assert_hits(2);
    }

    #[tokio::test]
    async fn other_statuses_fail_without_reconnect() {
        let server = MockServer::start_async().await;
        let login = server.mock(|when, then| {
            when.method(POST).path("/forum/login.php");
            then.status(200);
        });
        let download = server.mock(|when, then| {
            when.method(GET).path("/forum/dl.php");
            then.status(404);
        });

        let err = client(site(&server))
            .fetch_payload("rutracker", "1")
            .await
            .expect_err("missing torrent");
        assert_eq!(err.kind(), ErrorKind::Remote);
        download.assert_hits(1);
        login.assert_hits(1);
    }

    #[tokio::test]
    async fn non_bencoded_payload_is_a_format_error() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/forum/login.php");
            then.status(200);
        });
        server.mock(|when, then| {
            when.method(GET).path("/forum/dl.php");
            then.status(200).body("<html>please log in</html>");
        });

        let err = client(site(&server))
            .fetch_payload("rutracker", "2")
            .await
            .expect_err("html page");
        assert!(matches!(
            err,
            ClientError::Format {
                reason: "missing_sentinel",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn rejected_login_surfaces_reconnect_failure() {
        let server = MockServer::start_async().await;
        let login = server.mock(|when, then| {
            when.method(POST).path("/forum/login.php");
            then.status(403).body("bad credentials");
        });
        let download = server.mock(|when, then| {
            when.method(GET).path("/forum/dl.php");
            then.status(200).body("d4:infoe");
        });

        let err = client(site(&server))
            .fetch_payload("rutracker", "3")
            .await
            .expect_err("login rejected");
        assert_eq!(err.kind(), ErrorKind::Reconnect);
        assert!(err.detail().contains("bad credentials"));
        login.assert_hits(2);
        download.assert_hits(0);
    }

    #[tokio::test]
    async fn login_retry_leaves_download_reconnect_available() -> anyhow::Result<()> {
        let server = ScriptedServer::start(vec![
            (
                LOGIN,
                vec![Scripted::Reply(403, "bad credentials"), Scripted::Reply(200, "welcome")],
            ),
            (
                DOWNLOAD,
                vec![Scripted::Reply(401, "stale"), Scripted::Reply(200, "d4:infoe")],
            ),
        ])
        .await?;

        let payload = client(server.site()).fetch_payload("rutracker", "7").await?;
        assert_eq!(payload, b"d4:infoe");
        assert_eq!(server.hits(LOGIN), 3);
        assert_eq!(server.hits(DOWNLOAD), 2);
        Ok(())
    }

    #[tokio::test]
    async fn dropped_download_connection_reconnects_and_retries_once() -> anyhow::Result<()> {
        let server = ScriptedServer::start(vec![
            (LOGIN, vec![Scripted::Reply(200, "welcome")]),
            (DOWNLOAD, vec![Scripted::Hangup, Scripted::Reply(200, "d4:infoe")]),
        ])
        .await?;

        let payload = client(server.site()).fetch_payload("rutracker", "8").await?;
        assert_eq!(payload.first(), Some(&PAYLOAD_SENTINEL));
        assert_eq!(server.hits(DOWNLOAD), 2);
        assert_eq!(server.hits(LOGIN), 2, "initial login plus one reconnect");
        Ok(())
    }

    #[tokio::test]
    async fn persistent_hangups_fail_after_one_reconnect() -> anyhow::Result<()> {
        let server = ScriptedServer::start(vec![
            (LOGIN, vec![Scripted::Reply(200, "welcome")]),
            (DOWNLOAD, vec![Scripted::Hangup]),
        ])
        .await?;

        let err = client(server.site())
            .fetch_payload("rutracker", "9")
            .await
            .expect_err("connection always dropped");
        assert_eq!(err.kind(), ErrorKind::Connectivity);
        assert_eq!(server.hits(DOWNLOAD), 2);
        assert_eq!(server.hits(LOGIN), 2);
        Ok(())
    }

    #[tokio::test]
    async fn transport_and_unauthorized_failures_each_reconnect_once() -> anyhow::Result<()> {
        let server = ScriptedServer::start(vec![
            (LOGIN, vec![Scripted::Reply(200, "welcome")]),
            (
                DOWNLOAD,
                vec![
                    Scripted::Hangup,
                    Scripted::Reply(403, "expired"),
                    Scripted::Reply(200, "d4:infoe"),
                ],
            ),
        ])
        .await?;

        let payload = client(server.site()).fetch_payload("rutracker", "10").await?;
        assert_eq!(payload, b"d4:infoe");
        assert_eq!(server.hits(DOWNLOAD), 3);
        assert_eq!(server.hits(LOGIN), 3);
        Ok(())
    }

    #[tokio::test]
    async fn login_page_without_marker_is_rejected() {
        let server = MockServer::start_async().await;
        let login = server.mock(|when, then| {
            when.method(POST).path("/forum/login.php");
            then.status(200).body("<form>wrong password</form>");
        });
        let download = server.mock(|when, then| {
            when.method(GET).path("/forum/dl.php");
            then.status(200).body("d4:infoe");
        });
        let mut guarded = site(&server);
        if let Some(credentials) = guarded.credentials.as_mut() {
            credentials.success_marker = Some("logout.php".into());
        }

        let err = client(guarded)
            .fetch_payload("rutracker", "11")
            .await
            .expect_err("marker missing");
        assert_eq!(err.kind(), ErrorKind::Reconnect);
        assert!(err.detail().contains("wrong password"));
        login.assert_hits(2);
        download.assert_hits(0);
    }

    #[tokio::test]
    async fn login_page_with_marker_is_accepted() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        let login = server.mock(|when, then| {
            when.method(POST).path("/forum/login.php");
            then.status(200).body("<a href=\"logout.php\">Log out</a>");
        });
        server.mock(|when, then| {
            when.method(GET).path("/forum/dl.php");
            then.status(200).body("d4:infoe");
        });
        let mut guarded = site(&server);
        if let Some(credentials) = guarded.credentials.as_mut() {
            credentials.success_marker = Some("logout.php".into());
        }

        client(guarded).fetch_payload("rutracker", "12").await?;
        login.assert_hits(1);
        Ok(())
    }

    #[tokio::test]
    async fn unknown_or_unconfigured_sites_are_config_errors() {
        let server = MockServer::start_async().await;
        let mut bare = site(&server);
        bare.name = "kinozal".into();
        bare.credentials = None;
        let tracker = TrackerClient::new(&[site(&server), bare], Duration::from_secs(5))
            .expect("tracker client");

        for name in ["kinozal", "nnmclub"] {
            let err = tracker
                .fetch_payload(name, "1")
                .await
                .expect_err("not configured");
            assert_eq!(err.kind(), ErrorKind::Config);
        }
    }

    #[test]
    fn payload_validation_checks_first_byte() {
        assert!(validate_payload(b"d4:infoe").is_ok());
        assert!(matches!(
            validate_payload(b""),
            Err(ClientError::Format {
                reason: "empty_payload",
                ..
            })
        ));
    }
}
