#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

//! Binary entrypoint for the torrent relay.

use torrelay_app::{AppResult, run_app};

/// Boot the relay and block until input ends or the process is interrupted.
#[tokio::main]
async fn main() -> AppResult<()> {
    run_app().await
}
