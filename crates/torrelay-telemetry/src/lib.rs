#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

//! Telemetry primitives shared across the torrelay workspace.
//!
//! Layout: `init.rs` (subscriber installation and log format selection),
//! `context.rs` (application and per-event spans), `error.rs` (error type).

pub mod context;
pub mod error;
pub mod init;

pub use context::{GlobalContextGuard, event_span};
pub use error::{Result, TelemetryError};
pub use init::{
    DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, init_logging, log_format_from_str, release,
};
