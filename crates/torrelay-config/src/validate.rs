//! Parsing and validation helpers for configuration values.

use std::collections::HashSet;
use std::time::Duration;

use url::Url;

use crate::defaults::{CATEGORY_DELIMITER, ID_PLACEHOLDER};
use crate::error::{ConfigError, ConfigResult};
use crate::model::{AppConfig, Category, TrackerSite};

/// Parse an absolute `http`/`https` URL.
///
/// # Errors
///
/// Returns `ConfigError::InvalidField` when the value does not parse or uses
/// another scheme.
pub fn parse_url(section: &'static str, field: &str, raw: &str) -> ConfigResult<Url> {
    let url = Url::parse(raw)
        .map_err(|_| ConfigError::invalid(section, field, Some(raw.to_string()), "invalid_url"))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ConfigError::invalid(
            section,
            field,
            Some(raw.to_string()),
            "unsupported_scheme",
        )),
    }
}

/// Parse a `|`-separated list of requester identities.
///
/// Empty segments are skipped so a trailing separator is harmless.
///
/// # Errors
///
/// Returns `ConfigError::InvalidField` when any segment is not a signed 64-bit integer.
pub fn parse_allowed_users(field: &str, raw: Option<&str>) -> ConfigResult<Vec<i64>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split('|')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            segment.parse::<i64>().map_err(|_| {
                ConfigError::invalid("access", field, Some(segment.to_string()), "not_an_integer")
            })
        })
        .collect()
}

/// Parse the per-call timeout in whole seconds.
///
/// # Errors
///
/// Returns `ConfigError::InvalidField` for non-numeric or zero values.
pub fn parse_timeout(field: &str, raw: Option<&str>, default_secs: u64) -> ConfigResult<Duration> {
    let secs = match raw {
        None => default_secs,
        Some(raw) => raw.parse::<u64>().map_err(|_| {
            ConfigError::invalid("http", field, Some(raw.to_string()), "not_an_integer")
        })?,
    };
    if secs == 0 {
        return Err(ConfigError::invalid("http", field, Some("0".into()), "zero"));
    }
    Ok(Duration::from_secs(secs))
}

/// Check a tracker site definition for internal consistency.
///
/// # Errors
///
/// Returns `ConfigError::InvalidField` describing the first problem found.
pub fn validate_site(site: &TrackerSite) -> ConfigResult<()> {
    if site.name.is_empty() || !site.name.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '-')
    {
        return Err(ConfigError::invalid(
            "tracker",
            "name",
            Some(site.name.clone()),
            "invalid_site_name",
        ));
    }
    if site.id_key.is_empty() {
        return Err(ConfigError::invalid("tracker", format!("{}.id_key", site.name), None, "empty"));
    }
    if !site.download_template.contains(ID_PLACEHOLDER) {
        return Err(ConfigError::invalid(
            "tracker",
            format!("{}.download_template", site.name),
            Some(site.download_template.clone()),
            "missing_id_placeholder",
        ));
    }
    Ok(())
}

/// Check a category definition.
///
/// # Errors
///
/// Returns `ConfigError::InvalidField` when the key lacks the delimiter or the label is empty.
pub fn validate_category(category: &Category) -> ConfigResult<()> {
    if category.key.len() < 2 || !category.key.ends_with(CATEGORY_DELIMITER) {
        return Err(ConfigError::invalid(
            "categories",
            "key",
            Some(category.key.clone()),
            "missing_delimiter",
        ));
    }
    if category.label.trim().is_empty() {
        return Err(ConfigError::invalid(
            "categories",
            format!("{}.label", category.key),
            None,
            "empty",
        ));
    }
    Ok(())
}

/// Validate every site and category and reject duplicates.
///
/// # Errors
///
/// Returns the first validation failure encountered.
pub fn validate_config(config: &AppConfig) -> ConfigResult<()> {
    let mut names = HashSet::new();
    for site in &config.sites {
        validate_site(site)?;
        if !names.insert(site.name.as_str()) {
            return Err(ConfigError::invalid(
                "tracker",
                "name",
                Some(site.name.clone()),
                "duplicate",
            ));
        }
    }
    let mut keys = HashSet::new();
    for category in &config.categories {
        validate_category(category)?;
        if !keys.insert(category.key.as_str()) {
            return Err(ConfigError::invalid(
                "categories",
                "key",
                Some(category.key.clone()),
                "duplicate",
            ));
        }
    }
    Ok(())
}
