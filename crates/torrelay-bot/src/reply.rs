//! Outbound reply models handed to the chat transport.

use async_trait::async_trait;

use crate::event::RequesterId;

/// How the transport should place a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplyMode {
    /// Post a new message.
    #[default]
    Send,
    /// Replace the message whose button produced the event; transports
    /// without editing fall back to sending.
    EditOrigin,
}

/// One pressable choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    /// Text shown on the button.
    pub label: String,
    /// Callback token returned when pressed.
    pub token: String,
}

impl Button {
    /// Build a button from a label and its token.
    pub fn new(label: impl Into<String>, token: impl ToString) -> Self {
        Self {
            label: label.into(),
            token: token.to_string(),
        }
    }
}

/// Rows of buttons attached to a reply.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Keyboard {
    /// Buttons grouped by row, top to bottom.
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    /// Whether the keyboard has no buttons at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(Vec::is_empty)
    }

    /// Every button, row by row.
    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }
}

/// A message for the requester.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Message body.
    pub text: String,
    /// Optional choices.
    pub keyboard: Option<Keyboard>,
    /// Placement.
    pub mode: ReplyMode,
    /// Whether the body uses lightweight markup (`*bold*`).
    pub markdown: bool,
}

impl Reply {
    /// New plain-text message.
    pub fn send(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
            mode: ReplyMode::Send,
            markdown: false,
        }
    }

    /// Replacement for the originating message.
    pub fn edit(text: impl Into<String>) -> Self {
        Self {
            mode: ReplyMode::EditOrigin,
            ..Self::send(text)
        }
    }

    /// Attach a keyboard; empty keyboards are dropped.
    #[must_use]
    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = (!keyboard.is_empty()).then_some(keyboard);
        self
    }

    /// Mark the body as using markup.
    #[must_use]
    pub const fn markdown(mut self) -> Self {
        self.markdown = true;
        self
    }
}

/// Delivery side of the chat transport.
#[async_trait]
pub trait ReplySink: Send + Sync {
    /// Deliver `reply` to `requester`. Delivery failures are the transport's concern.
    async fn deliver(&self, requester: RequesterId, reply: Reply);
}
