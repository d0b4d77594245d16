//! Console chat adapter: stdin lines become inbound events, replies go to stdout.

use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use torrelay_bot::{ConversationRouter, InboundEvent, Reply, ReplyMode, ReplySink, RequesterId};

use crate::error::{AppError, AppResult};

/// Prefix marking a line as a button press.
const CALLBACK_PREFIX: char = '!';
/// Prefix marking a line as a command.
const COMMAND_PREFIX: char = '/';

/// Reply sink that prints to stdout.
#[derive(Debug, Default)]
pub struct ConsoleSink;

#[async_trait]
impl ReplySink for ConsoleSink {
    async fn deliver(&self, requester: RequesterId, reply: Reply) {
        println!("{}", render_reply(requester, &reply));
    }
}

/// Render a reply as plain text, with buttons listed as `[label] → token`.
#[must_use]
pub fn render_reply(requester: RequesterId, reply: &Reply) -> String {
    let marker = match reply.mode {
        ReplyMode::Send => "»",
        ReplyMode::EditOrigin => "✎",
    };
    let mut out = format!("{marker} [{requester}] {}", reply.text);
    if let Some(keyboard) = &reply.keyboard {
        for row in &keyboard.rows {
            let buttons: Vec<String> = row
                .iter()
                .map(|button| format!("[{}] → {}", button.label, button.token))
                .collect();
            let _ = write!(out, "\n    {}", buttons.join("   "));
        }
    }
    out
}

/// Turn one input line into an inbound event; blank lines yield nothing.
#[must_use]
pub fn parse_line(requester: i64, line: &str) -> Option<InboundEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if let Some(token) = line.strip_prefix(CALLBACK_PREFIX) {
        return Some(InboundEvent::callback(requester, token.trim()));
    }
    if let Some(command) = line.strip_prefix(COMMAND_PREFIX) {
        let (name, args) = command
            .split_once(char::is_whitespace)
            .unwrap_or((command, ""));
        return Some(InboundEvent::command(requester, name, args.trim()));
    }
    Some(InboundEvent::text(requester, line))
}

/// Read stdin line by line, handling each line as its own task.
///
/// Stops at end of input or on Ctrl-C, then waits for in-flight lines.
///
/// # Errors
///
/// Returns `AppError::Io` when stdin cannot be read.
pub async fn run(router: Arc<ConversationRouter>, requester: i64) -> AppResult<()> {
    info!(requester, "console adapter ready; use /command, !token, or plain text");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tasks = JoinSet::new();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.map_err(|err| AppError::io("console.read", err))?,
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received; draining in-flight events");
                None
            }
        };
        let Some(line) = line else { break };
        let Some(event) = parse_line(requester, &line) else {
            continue;
        };

        let router = Arc::clone(&router);
        tasks.spawn(async move {
            let route = router.handle(event).await;
            debug!(?route, "event handled");
        });
        while let Some(done) = tasks.try_join_next() {
            if let Err(err) = done {
                warn!(error = %err, "event task failed");
            }
        }
    }

    while let Some(done) = tasks.join_next().await {
        if let Err(err) = done {
            warn!(error = %err, "event task failed");
        }
    }
    Ok(())
}
