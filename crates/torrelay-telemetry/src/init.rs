//! Subscriber installation and log format selection.
//!
//! `RUST_LOG` wins over the configured level when it is set. The release label
//! is recorded on the first call to [`init_logging`] and stays fixed afterwards.

use std::str::FromStr;

use once_cell::sync::OnceCell;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{Result, TelemetryError};

/// Level used when neither `RUST_LOG` nor `--log-level` says otherwise.
pub const DEFAULT_LOG_LEVEL: &str = "info";

static RELEASE: OnceCell<String> = OnceCell::new();

/// Install the global tracing subscriber described by `config`.
///
/// # Errors
///
/// Returns [`TelemetryError::SubscriberInstall`] when a global subscriber is
/// already in place.
pub fn init_logging(config: &LoggingConfig<'_>) -> Result<()> {
    let _ = RELEASE.set(format!("{}+{}", env!("CARGO_PKG_VERSION"), config.revision));

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.level));
    let (json, pretty) = match config.format {
        LogFormat::Json => (Some(fmt::layer().json().with_target(false)), None),
        LogFormat::Pretty => (None, Some(fmt::layer().with_target(false))),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(pretty)
        .try_init()
        .map_err(|source| TelemetryError::SubscriberInstall { source })
}

/// Release label recorded by [`init_logging`], or `unreleased` before it ran.
#[must_use]
pub fn release() -> &'static str {
    RELEASE.get().map_or("unreleased", String::as_str)
}

/// Inputs for [`init_logging`].
#[derive(Debug, Clone)]
pub struct LoggingConfig<'a> {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: &'a str,
    /// Output encoding.
    pub format: LogFormat,
    /// Source revision appended to the crate version in the release label.
    pub revision: &'a str,
}

impl Default for LoggingConfig<'_> {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL,
            format: LogFormat::infer(),
            revision: option_env!("TORRELAY_BUILD_SHA").unwrap_or("dev"),
        }
    }
}

/// Output encodings supported by the subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line.
    Json,
    /// Human-readable lines.
    Pretty,
}

impl LogFormat {
    /// Pretty output for debug builds, JSON otherwise.
    #[must_use]
    pub const fn infer() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" | "text" => Ok(Self::Pretty),
            other => Err(other.to_string()),
        }
    }
}

/// Resolve an optional format name from the command line or environment.
///
/// `None` stays `None`. Unrecognised names fall back to [`LogFormat::infer`].
#[must_use]
pub fn log_format_from_str(value: Option<&str>) -> Option<LogFormat> {
    value.map(|name| name.parse().unwrap_or_else(|_| LogFormat::infer()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_names_are_case_insensitive() {
        assert_eq!(log_format_from_str(Some("json")), Some(LogFormat::Json));
        assert_eq!(log_format_from_str(Some(" PRETTY ")), Some(LogFormat::Pretty));
        assert_eq!(log_format_from_str(Some("text")), Some(LogFormat::Pretty));
        assert_eq!(log_format_from_str(Some("yaml")), Some(LogFormat::infer()));
        assert!(log_format_from_str(None).is_none());
        assert_eq!("xml".parse::<LogFormat>(), Err("xml".to_string()));
    }

    #[test]
    fn second_install_is_rejected() {
        let config = LoggingConfig {
            level: "debug",
            format: LogFormat::Pretty,
            revision: "abc123",
        };
        let _ = init_logging(&config);
        assert!(matches!(
            init_logging(&config),
            Err(TelemetryError::SubscriberInstall { .. })
        ));
        assert!(release().ends_with("+abc123"));
    }
}
