use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use httpmock::prelude::*;
use serde_json::json;
use tokio::sync::RwLock;

use torrelay_bot::{
    ConversationRouter, InboundEvent, LinkOrchestrator, LinkRecognizer, PendingLinks, Reply,
    ReplySink, RequesterId, Route,
};
use torrelay_client::{DaemonClient, TrackerClient};
use torrelay_config::{AppConfig, Category, DaemonCredentials, TrackerCredentials, TrackerSite};

const OWNER: i64 = 1001;
const LINK: &str = "https://rutracker.xx/forum/dl.php?t=555";

#[derive(Default)]
struct CapturingSink {
    replies: RwLock<Vec<Reply>>,
}

#[async_trait]
impl ReplySink for CapturingSink {
    async fn deliver(&self, _requester: RequesterId, reply: Reply) {
        self.replies.write().await.push(reply);
    }
}

fn config(server: &MockServer) -> AppConfig {
    AppConfig {
        daemon: DaemonCredentials {
            url: server.base_url().parse().expect("daemon url"),
            username: "admin".into(),
            password: "adminadmin".into(),
        },
        sites: vec![TrackerSite {
            name: "rutracker".into(),
            id_key: "t".into(),
            download_template: server.url("/forum/dl.php?t={id}"),
            credentials: Some(TrackerCredentials {
                login_url: server.url("/forum/login.php").parse().expect("login url"),
                form: vec![
                    ("login_username".into(), "reader".into()),
                    ("login_password".into(), "secret".into()),
                ],
                success_marker: None,
            }),
        }],
        categories: vec![Category {
            key: "Movies.".into(),
            label: "Movies".into(),
            save_path: "/media/movies".into(),
        }],
        allowed_users: vec![OWNER],
        http_timeout: Duration::from_secs(5),
    }
}

fn router(config: &AppConfig, sink: Arc<CapturingSink>) -> ConversationRouter {
    let daemon = Arc::new(DaemonClient::new(&config.daemon, config.http_timeout).expect("daemon"));
    let tracker =
        Arc::new(TrackerClient::new(&config.sites, config.http_timeout).expect("tracker"));
    let recognizer = LinkRecognizer::new(&config.sites).expect("patterns");
    let orchestrator = LinkOrchestrator::new(recognizer, tracker, daemon.clone());
    ConversationRouter::new(config, Arc::new(PendingLinks::new()), orchestrator, daemon, sink)
}

fn mock_logins(server: &MockServer) {
    server.mock(|when, then| {
        when.method(POST).path("/api/v2/auth/login");
        then.status(200).body("Ok.");
    });
    server.mock(|when, then| {
        when.method(POST).path("/forum/login.php");
        then.status(200).body("welcome back");
    });
}

fn record(name: &str, hash: &str, added_on: i64) -> serde_json::Value {
    json!({
        "name": name,
        "hash": hash,
        "size": 734_003_200,
        "progress": 0.0,
        "state": "metaDL",
        "added_on": added_on,
        "save_path": "/media/movies"
    })
}

#[tokio::test]
async fn link_then_category_fetches_and_adds() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    mock_logins(&server);
    let download = server.mock(|when, then| {
        when.method(GET).path("/forum/dl.php").query_param("t", "555");
        then.status(200).body("d8:announce14:http://tracker4:infod4:name3:bbbee");
    });
    let upload = server.mock(|when, then| {
        when.method(POST).path("/api/v2/torrents/add");
        then.status(200).body("Ok.");
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/v2/torrents/info");
        then.status(200).json_body(json!([
            record("Old Release", "aaa", 10),
            record("Big Buck Bunny", "bbb", 30),
            record("Middle Release", "ccc", 20)
        ]));
    });

    let sink = Arc::new(CapturingSink::default());
    let router = router(&config(&server), sink.clone());

    assert_eq!(router.handle(InboundEvent::text(OWNER, LINK)).await, Route::LinkPending);
    assert_eq!(
        router.handle(InboundEvent::callback(OWNER, "Movies.")).await,
        Route::Submitted { ok: true }
    );

    download.assert_hits(1);
    upload.assert_hits(1);
    assert!(router.pending().is_empty());
    let replies = sink.replies.read().await;
    let result = replies.last().expect("result reply");
    assert!(result.text.contains("Big Buck Bunny"));
    assert!(result.text.contains("/media/movies"));
    Ok(())
}

#[tokio::test]
async fn non_torrent_payload_never_reaches_daemon() {
    let server = MockServer::start_async().await;
    mock_logins(&server);
    server.mock(|when, then| {
        when.method(GET).path("/forum/dl.php");
        then.status(200).body("<html>captcha</html>");
    });
    let upload = server.mock(|when, then| {
        when.method(POST).path("/api/v2/torrents/add");
        then.status(200).body("Ok.");
    });

    let sink = Arc::new(CapturingSink::default());
    let router = router(&config(&server), sink.clone());

    router.handle(InboundEvent::text(OWNER, LINK)).await;
    let route = router.handle(InboundEvent::callback(OWNER, "Movies.")).await;

    assert_eq!(route, Route::Submitted { ok: false });
    upload.assert_hits(0);
    assert!(router.pending().is_empty());
    let replies = sink.replies.read().await;
    assert!(replies.last().expect("reply").text.contains("invalid torrent file"));
}

#[tokio::test]
async fn pause_on_unknown_hash_issues_no_pause_call() {
    let server = MockServer::start_async().await;
    mock_logins(&server);
    server.mock(|when, then| {
        when.method(GET).path("/api/v2/torrents/info");
        then.status(200).json_body(json!([record("Other", "fff", 1)]));
    });
    let pause = server.mock(|when, then| {
        when.method(POST).path("/api/v2/torrents/pause");
        then.status(200);
    });

    let sink = Arc::new(CapturingSink::default());
    let router = router(&config(&server), sink.clone());

    let route = router.handle(InboundEvent::callback(OWNER, "pause:abc123")).await;

    assert_eq!(route, Route::Management);
    pause.assert_hits(0);
    let replies = sink.replies.read().await;
    assert!(replies.last().expect("reply").text.contains("abc123 not found"));
}
