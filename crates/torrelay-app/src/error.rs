//! # Design
//!
//! - Application-level errors wrap each library's error with the operation that failed.
//! - Messages stay constant; context lives in fields.

use std::io;

use thiserror::Error;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: torrelay_config::ConfigError,
    },
    /// A remote client could not be built or used.
    #[error("client operation failed")]
    Client {
        /// Operation identifier.
        operation: &'static str,
        /// Source client error.
        source: torrelay_client::ClientError,
    },
    /// Tracker link patterns could not be prepared.
    #[error("link recognition setup failed")]
    Link {
        /// Operation identifier.
        operation: &'static str,
        /// Source link error.
        source: torrelay_bot::LinkError,
    },
    /// Logging could not be initialised.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: torrelay_telemetry::TelemetryError,
    },
    /// Console IO failed.
    #[error("io operation failed")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Source IO error.
        source: io::Error,
    },
}

impl AppError {
    pub(crate) const fn config(
        operation: &'static str,
        source: torrelay_config::ConfigError,
    ) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn client(
        operation: &'static str,
        source: torrelay_client::ClientError,
    ) -> Self {
        Self::Client { operation, source }
    }

    pub(crate) const fn link(operation: &'static str, source: torrelay_bot::LinkError) -> Self {
        Self::Link { operation, source }
    }

    pub(crate) const fn telemetry(
        operation: &'static str,
        source: torrelay_telemetry::TelemetryError,
    ) -> Self {
        Self::Telemetry { operation, source }
    }

    pub(crate) const fn io(operation: &'static str, source: io::Error) -> Self {
        Self::Io { operation, source }
    }
}
