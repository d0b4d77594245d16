#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

//! Environment-backed configuration for the torrelay services.
//!
//! Layout: `model.rs` (typed config models), `defaults.rs` (built-in sites and
//! categories), `loader.rs` (environment loading), `validate.rs` (parsing and
//! validation helpers).

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use defaults::CATEGORY_DELIMITER;
pub use error::{ConfigError, ConfigResult};
pub use model::{AppConfig, Category, DaemonCredentials, TrackerCredentials, TrackerSite};
