//! Top-level dispatcher for inbound chat events.
//!
//! # Design
//! - Authorization is checked before any other work, for every event kind.
//! - Only category tokens touch the pending-link table; the entry is taken
//!   atomically so a submission clears it whatever the outcome.
//! - Daemon reads and actions report reconnect attempts to the requester as
//!   separate steps, and are retried at most once.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use tracing::{Instrument, debug, info, warn};

use torrelay_client::{
    ClientError, ClientResult, RetryDecision, TorrentDaemon, TorrentFilter, decide,
};
use torrelay_config::{AppConfig, Category};
use torrelay_telemetry::event_span;

use crate::error::LinkError;
use crate::event::{EventPayload, InboundEvent, RequesterId};
use crate::keyboard::{action_keyboard, category_keyboard, list_keyboard};
use crate::links::LinkOrchestrator;
use crate::pending::PendingLinks;
use crate::render::{
    LIST_PAGE_SIZE, STATUS_PAGE_SIZE, describe_client_error, describe_error, help_text,
    status_page, torrent_details,
};
use crate::reply::{Reply, ReplyMode, ReplySink};
use crate::token::{CallbackToken, LifecycleVerb};

const NOT_AUTHORIZED: &str = "You are not authorized to use this bot.";
const CATEGORY_PROMPT: &str = "What category should this download be saved as?";
const UNKNOWN_ACTION: &str = "❌ Unknown action";

/// How an event was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// The requester is not on the allow-list.
    Rejected,
    /// Free text that carried nothing actionable.
    Ignored,
    /// A link was stored and categories were offered.
    LinkPending,
    /// A link or category could not be used.
    LinkRejected,
    /// A pending link was submitted.
    Submitted {
        /// Whether the torrent reached the daemon.
        ok: bool,
    },
    /// A category arrived with no pending link.
    NoPendingLink,
    /// A management token was handled.
    Management,
    /// A known command was handled.
    Command,
    /// Unknown command or undecodable token.
    Unknown,
}

/// Routes inbound events to the link pipeline or to daemon management.
pub struct ConversationRouter {
    allowed: HashSet<i64>,
    categories: Vec<Category>,
    pending: Arc<PendingLinks>,
    orchestrator: LinkOrchestrator,
    daemon: Arc<dyn TorrentDaemon>,
    sink: Arc<dyn ReplySink>,
}

impl ConversationRouter {
    /// Build a router over an injected pending-link store.
    #[must_use]
    pub fn new(
        config: &AppConfig,
        pending: Arc<PendingLinks>,
        orchestrator: LinkOrchestrator,
        daemon: Arc<dyn TorrentDaemon>,
        sink: Arc<dyn ReplySink>,
    ) -> Self {
        Self {
            allowed: config.allowed_users.iter().copied().collect(),
            categories: config.categories.clone(),
            pending,
            orchestrator,
            daemon,
            sink,
        }
    }

    /// Pending-link store shared with this router.
    #[must_use]
    pub fn pending(&self) -> &PendingLinks {
        &self.pending
    }

    /// Handle one event inside its own tracing span.
    pub async fn handle(&self, event: InboundEvent) -> Route {
        let span = event_span(event.kind(), event.requester.0);
        self.dispatch(event).instrument(span).await
    }

    async fn dispatch(&self, event: InboundEvent) -> Route {
        let InboundEvent { requester, payload } = event;
        if !self.allowed.contains(&requester.0) {
            warn!("rejected event from requester outside the allow-list");
            self.reply(requester, Reply::send(NOT_AUTHORIZED)).await;
            return Route::Rejected;
        }

        match payload {
            EventPayload::Text(text) => self.on_text(requester, &text).await,
            EventPayload::Command { name, args } => {
                self.on_command(requester, &name.to_lowercase(), args.trim())
                    .await
            }
            EventPayload::Callback(raw) => self.on_callback(requester, &raw).await,
        }
    }

    async fn on_text(&self, requester: RequesterId, text: &str) -> Route {
        match self.orchestrator.recognize(text) {
            Ok(link) => {
                if self.pending.insert(requester, text).is_some() {
                    debug!("replaced earlier pending link");
                }
                info!(site = %link.site, id = %link.id, "link pending category choice");
                self.reply(
                    requester,
                    Reply::send(CATEGORY_PROMPT).with_keyboard(category_keyboard(&self.categories)),
                )
                .await;
                Route::LinkPending
            }
            Err(LinkError::NoMatch) => Route::Ignored,
            Err(err) => {
                let text = match &err {
                    LinkError::Extraction { site } => {
                        format!("❌ Could not find a torrent id in the {site} link")
                    }
                    other => format!("❌ Error processing link: {}", describe_error(other)),
                };
                self.reply(requester, Reply::send(text)).await;
                Route::LinkRejected
            }
        }
    }

    async fn on_callback(&self, requester: RequesterId, raw: &str) -> Route {
        let token = match raw.parse::<CallbackToken>() {
            Ok(token) => token,
            Err(err) => {
                debug!(token = raw, error = %err, "undecodable callback token");
                self.reply(requester, Reply::send(UNKNOWN_ACTION)).await;
                return Route::Unknown;
            }
        };

        match token {
            CallbackToken::Category(key) => self.on_category(requester, &key).await,
            CallbackToken::Manage { hash, page } => {
                self.show_details(requester, &hash, page).await;
                Route::Management
            }
            CallbackToken::Action { verb, hash } => {
                self.apply_action(requester, verb, &hash).await;
                Route::Management
            }
            CallbackToken::List { page } => {
                self.show_list(requester, page, ReplyMode::EditOrigin).await;
                Route::Management
            }
        }
    }

    async fn on_category(&self, requester: RequesterId, key: &str) -> Route {
        let Some(link_text) = self.pending.take(requester) else {
            self.reply(
                requester,
                Reply::send("There is no pending link. Send a tracker link first."),
            )
            .await;
            return Route::NoPendingLink;
        };
        let Some(category) = self.categories.iter().find(|category| category.key == key) else {
            warn!(category = key, "unknown category selected");
            self.reply(requester, Reply::send("❌ Invalid category selected"))
                .await;
            return Route::LinkRejected;
        };
        let link = match self.orchestrator.recognize(&link_text) {
            Ok(link) => link,
            Err(err) => {
                let text = format!("❌ Error processing link: {}", describe_error(&err));
                self.reply(requester, Reply::send(text)).await;
                return Route::LinkRejected;
            }
        };

        self.reply(requester, Reply::edit("Processing download request..."))
            .await;
        let save_path = (!category.save_path.is_empty()).then_some(category.save_path.as_str());
        match self.orchestrator.submit(&link.site, &link.id, save_path).await {
            Ok(record) => {
                let shown_path = save_path.unwrap_or(&record.save_path);
                let text = format!(
                    "✅ Torrent successfully added to download queue:\n📥 *{}*\n\
                     📂 Category: {}\n💾 Save path: {shown_path}",
                    record.name, category.label
                );
                self.reply(requester, Reply::edit(text).markdown()).await;
                Route::Submitted { ok: true }
            }
            Err(err) => {
                let text = format!("❌ Download failed: {}", describe_error(&err));
                self.reply(requester, Reply::send(text)).await;
                Route::Submitted { ok: false }
            }
        }
    }

    async fn on_command(&self, requester: RequesterId, name: &str, args: &str) -> Route {
        match name {
            "start" | "help" => {
                let text = help_text(self.orchestrator.recognizer().site_names());
                self.reply(requester, Reply::send(text).markdown()).await;
            }
            "status" => {
                let page = args.parse().unwrap_or(0);
                self.show_status(requester, page).await;
            }
            "torrent" => self.search(requester, args).await,
            "list" => self.show_list(requester, 0, ReplyMode::Send).await,
            "reconnect" => self.force_reconnect(requester).await,
            _ => {
                self.reply(
                    requester,
                    Reply::send("Unknown command. Type /help for available commands."),
                )
                .await;
                return Route::Unknown;
            }
        }
        Route::Command
    }

    async fn show_status(&self, requester: RequesterId, page: usize) {
        let Some(records) = self
            .with_reconnect(requester, "getting torrent status", || {
                self.daemon.list(TorrentFilter::All)
            })
            .await
        else {
            return;
        };
        let (text, page) = status_page(&records, page);
        let reply = Reply::send(text)
            .markdown()
            .with_keyboard(list_keyboard(&records, STATUS_PAGE_SIZE, page));
        self.reply(requester, reply).await;
    }

    async fn search(&self, requester: RequesterId, term: &str) {
        if term.is_empty() {
            self.reply(
                requester,
                Reply::send(
                    "Please provide a torrent name to search for. Example: /torrent ubuntu",
                ),
            )
            .await;
            return;
        }
        let Some(records) = self
            .with_reconnect(requester, "searching for torrents", || {
                self.daemon.find_by_name_contains(term)
            })
            .await
        else {
            return;
        };

        let reply = match records.as_slice() {
            [] => Reply::send("No matching torrents found"),
            [record] => Reply::send(torrent_details(record))
                .markdown()
                .with_keyboard(action_keyboard(&record.hash, None)),
            many => Reply::send(format!(
                "Found {} matching torrents:\n\nSelect a torrent to manage it:",
                many.len()
            ))
            .with_keyboard(list_keyboard(many, STATUS_PAGE_SIZE, 0)),
        };
        self.reply(requester, reply).await;
    }

    async fn show_list(&self, requester: RequesterId, page: usize, mode: ReplyMode) {
        let Some(records) = self
            .with_reconnect(requester, "listing torrents", || {
                self.daemon.list(TorrentFilter::All)
            })
            .await
        else {
            return;
        };
        if records.is_empty() {
            self.reply(requester, Reply::send("No torrents found")).await;
            return;
        }
        let reply = Reply {
            mode,
            ..Reply::send("Select a torrent to manage:")
        }
        .with_keyboard(list_keyboard(&records, LIST_PAGE_SIZE, page));
        self.reply(requester, reply).await;
    }

    async fn show_details(&self, requester: RequesterId, hash: &str, page: Option<usize>) {
        if let Some(record) = self
            .with_reconnect(requester, "getting torrent details", || {
                self.daemon.find_by_hash(hash)
            })
            .await
        {
            let reply = Reply::edit(torrent_details(&record))
                .markdown()
                .with_keyboard(action_keyboard(&record.hash, page));
            self.reply(requester, reply).await;
        }
    }

    async fn apply_action(&self, requester: RequesterId, verb: LifecycleVerb, hash: &str) {
        if let Some(reply) = self
            .with_reconnect(requester, "performing torrent action", || {
                self.perform(verb, hash)
            })
            .await
        {
            self.reply(requester, reply).await;
        }
    }

    /// Resolve the torrent first so an unknown hash never reaches the action endpoint.
    async fn perform(&self, verb: LifecycleVerb, hash: &str) -> ClientResult<Reply> {
        let record = self.daemon.find_by_hash(hash).await?;
        let hashes = [record.hash.clone()];
        let reply = match verb {
            LifecycleVerb::Pause => {
                self.daemon.pause_many(&hashes).await?;
                Reply::edit(format!("Paused: {}", record.name))
                    .with_keyboard(action_keyboard(&record.hash, None))
            }
            LifecycleVerb::Resume => {
                self.daemon.resume_many(&hashes).await?;
                Reply::edit(format!("Resumed: {}", record.name))
                    .with_keyboard(action_keyboard(&record.hash, None))
            }
            LifecycleVerb::Delete => {
                self.daemon.delete_many(&hashes, false).await?;
                Reply::edit(format!("Deleted torrent: {} (files were kept)", record.name))
            }
            LifecycleVerb::DeleteWithData => {
                self.daemon.delete_many(&hashes, true).await?;
                Reply::edit(format!("Deleted torrent and data: {}", record.name))
            }
            LifecycleVerb::Info => Reply::edit(torrent_details(&record))
                .markdown()
                .with_keyboard(action_keyboard(&record.hash, None)),
        };
        info!(verb = verb.as_str(), hash = %record.hash, "torrent action applied");
        Ok(reply)
    }

    async fn force_reconnect(&self, requester: RequesterId) {
        self.reply(
            requester,
            Reply::send("🔄 Attempting to reconnect to the torrent daemon..."),
        )
        .await;
        if self.reconnect_and_verify(requester).await {
            self.reply(
                requester,
                Reply::send("✅ Successfully reconnected to the torrent daemon"),
            )
            .await;
        }
    }

    /// Run `call`; on a session-shaped failure, reconnect visibly and retry once.
    ///
    /// Returns `None` once the failure has been reported to the requester.
    async fn with_reconnect<T, F, Fut>(
        &self,
        requester: RequesterId,
        activity: &str,
        call: F,
    ) -> Option<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = ClientResult<T>>,
    {
        let err = match call().await {
            Ok(value) => return Some(value),
            Err(err) => err,
        };
        if decide(err.failure_class(), 0) == RetryDecision::Fail {
            self.report(requester, "❌", &err).await;
            return None;
        }

        warn!(activity, error = %err, "daemon call failed; reconnecting");
        self.reply(
            requester,
            Reply::send(format!(
                "⚠️ Lost connection to the torrent daemon while {activity}. \
                 Attempting to reconnect..."
            )),
        )
        .await;
        if !self.reconnect_and_verify(requester).await {
            return None;
        }
        self.reply(
            requester,
            Reply::send("✅ Reconnected to the torrent daemon. Retrying operation..."),
        )
        .await;

        match call().await {
            Ok(value) => Some(value),
            Err(err) => {
                self.report(requester, "❌ Error even after reconnection:", &err)
                    .await;
                None
            }
        }
    }

    async fn reconnect_and_verify(&self, requester: RequesterId) -> bool {
        if let Err(err) = self.daemon.reconnect().await {
            self.report(requester, "❌ Failed to reconnect:", &err).await;
            return false;
        }
        if let Err(err) = self.daemon.list(TorrentFilter::All).await {
            self.report(requester, "❌ Reconnection failed during testing:", &err)
                .await;
            return false;
        }
        info!("daemon session re-established");
        true
    }

    async fn report(&self, requester: RequesterId, prefix: &str, err: &ClientError) {
        warn!(error = %err, operation = err.operation(), "daemon call failed");
        let text = format!("{prefix} {}", describe_client_error(err));
        self.reply(requester, Reply::send(text)).await;
    }

    async fn reply(&self, requester: RequesterId, reply: Reply) {
        self.sink.deliver(requester, reply).await;
    }
}
