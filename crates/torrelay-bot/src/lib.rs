#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

//! Conversation core for the torrent relay: link recognition, the
//! link-to-daemon submission pipeline, and callback dispatch.
//!
//! Layout:
//! - `event.rs`: inbound events as delivered by a chat transport
//! - `links.rs`: tracker link recognition and the fetch-then-add pipeline
//! - `token.rs`: callback token codec
//! - `pending.rs`: per-requester pending link store
//! - `router.rs`: `ConversationRouter`, the top-level dispatcher
//! - `reply.rs`, `keyboard.rs`, `render.rs`: outbound reply models and text

pub mod error;
pub mod event;
pub mod keyboard;
pub mod links;
pub mod pending;
pub mod render;
pub mod reply;
pub mod router;
pub mod token;

pub use error::{LinkError, SubmitError, SubmitStage, TokenError};
pub use event::{EventPayload, InboundEvent, RequesterId};
pub use links::{LinkOrchestrator, LinkRecognizer, TrackerLink};
pub use pending::PendingLinks;
pub use reply::{Button, Keyboard, Reply, ReplyMode, ReplySink};
pub use router::{ConversationRouter, Route};
pub use token::{CallbackToken, LifecycleVerb};
