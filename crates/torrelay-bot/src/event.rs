//! Inbound events handed over by the chat transport.

use std::fmt;

/// Identity of the chat participant an event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequesterId(pub i64);

impl fmt::Display for RequesterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One inbound chat event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    /// Who sent it.
    pub requester: RequesterId,
    /// What was sent.
    pub payload: EventPayload,
}

/// Content of an inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventPayload {
    /// Free text.
    Text(String),
    /// A command with its raw argument string.
    Command {
        /// Command name without the leading slash.
        name: String,
        /// Remaining text after the command name.
        args: String,
    },
    /// A pressed button's callback token.
    Callback(String),
}

impl InboundEvent {
    /// Free-text message.
    pub fn text(requester: i64, text: impl Into<String>) -> Self {
        Self {
            requester: RequesterId(requester),
            payload: EventPayload::Text(text.into()),
        }
    }

    /// Command invocation.
    pub fn command(requester: i64, name: impl Into<String>, args: impl Into<String>) -> Self {
        Self {
            requester: RequesterId(requester),
            payload: EventPayload::Command {
                name: name.into(),
                args: args.into(),
            },
        }
    }

    /// Button press.
    pub fn callback(requester: i64, token: impl Into<String>) -> Self {
        Self {
            requester: RequesterId(requester),
            payload: EventPayload::Callback(token.into()),
        }
    }

    /// Short label for logs and spans.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self.payload {
            EventPayload::Text(_) => "text",
            EventPayload::Command { .. } => "command",
            EventPayload::Callback(_) => "callback",
        }
    }
}
