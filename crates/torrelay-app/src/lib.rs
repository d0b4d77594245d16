#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

//! Torrelay application wiring.
//!
//! Layout: `cli.rs` (flags), `bootstrap.rs` (logging, config, client wiring),
//! `console.rs` (stdin/stdout chat adapter), `error.rs` (application errors).

/// Application bootstrap and service wiring.
pub mod bootstrap;
/// Command-line flags.
pub mod cli;
pub mod console;
/// Application error type.
pub mod error;

pub use bootstrap::run_app;
pub use error::{AppError, AppResult};
