//! Environment loading for [`AppConfig`].

use tracing::{debug, warn};

use crate::defaults::{
    CATEGORIES, DEFAULT_DAEMON_URL, DEFAULT_HTTP_TIMEOUT_SECS, SITES, SiteDefaults,
};
use crate::error::ConfigResult;
use crate::model::{AppConfig, Category, DaemonCredentials, TrackerCredentials, TrackerSite};
use crate::validate::{parse_allowed_users, parse_timeout, parse_url, validate_config};

/// Daemon web UI base URL.
pub const ENV_DAEMON_URL: &str = "TORRELAY_DAEMON_URL";
/// Daemon login user.
pub const ENV_DAEMON_USER: &str = "TORRELAY_DAEMON_USER";
/// Daemon login password.
pub const ENV_DAEMON_PASSWORD: &str = "TORRELAY_DAEMON_PASSWORD";
/// `|`-separated requester allow-list.
pub const ENV_ALLOWED_USERS: &str = "TORRELAY_ALLOWED_USERS";
/// Per-call HTTP timeout in seconds.
pub const ENV_HTTP_TIMEOUT_SECS: &str = "TORRELAY_HTTP_TIMEOUT_SECS";

impl AppConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` when a value fails to parse or validate.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Blank values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` when a value fails to parse or validate.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let daemon_url = get(ENV_DAEMON_URL);
        let daemon = DaemonCredentials {
            url: parse_url(
                "daemon",
                ENV_DAEMON_URL,
                daemon_url.as_deref().unwrap_or(DEFAULT_DAEMON_URL),
            )?,
            username: get(ENV_DAEMON_USER).unwrap_or_default(),
            password: get(ENV_DAEMON_PASSWORD).unwrap_or_default(),
        };

        let allowed_users =
            parse_allowed_users(ENV_ALLOWED_USERS, get(ENV_ALLOWED_USERS).as_deref())?;
        let http_timeout = parse_timeout(
            ENV_HTTP_TIMEOUT_SECS,
            get(ENV_HTTP_TIMEOUT_SECS).as_deref(),
            DEFAULT_HTTP_TIMEOUT_SECS,
        )?;

        let sites = SITES
            .iter()
            .map(|defaults| build_site(defaults, &get))
            .collect::<ConfigResult<Vec<_>>>()?;

        let categories = CATEGORIES
            .iter()
            .map(|defaults| Category {
                key: defaults.key.to_string(),
                label: defaults.label.to_string(),
                save_path: get(defaults.path_env).unwrap_or_default(),
            })
            .collect();

        let config = Self {
            daemon,
            sites,
            categories,
            allowed_users,
            http_timeout,
        };
        validate_config(&config)?;

        if config.allowed_users.is_empty() {
            warn!("no allowed users configured; every requester will be rejected");
        }
        Ok(config)
    }
}

fn build_site<G>(defaults: &SiteDefaults, get: &G) -> ConfigResult<TrackerSite>
where
    G: Fn(&str) -> Option<String>,
{
    let credentials = if get(defaults.required_env).is_some() {
        Some(TrackerCredentials {
            login_url: parse_url("tracker", defaults.name, defaults.login_url)?,
            form: defaults
                .form
                .iter()
                .map(|(field, env)| ((*field).to_string(), get(env).unwrap_or_default()))
                .collect(),
            success_marker: get(defaults.marker_env),
        })
    } else {
        debug!(site = defaults.name, "tracker credentials not configured");
        None
    };

    Ok(TrackerSite {
        name: defaults.name.to_string(),
        id_key: defaults.id_key.to_string(),
        download_template: defaults.download_template.to_string(),
        credentials,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use super::*;
    use crate::ConfigError;

    fn load(pairs: &[(&str, &str)]) -> ConfigResult<AppConfig> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        AppConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let config = load(&[]).expect("config");
        assert_eq!(config.daemon.url.as_str(), "http://localhost:8080/");
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert!(config.allowed_users.is_empty());
        assert_eq!(config.sites.len(), 2);
        assert!(config.sites.iter().all(|site| site.credentials.is_none()));
        assert_eq!(config.categories.len(), 7);
        assert_eq!(config.categories[0].key, "Movies.");
        assert!(config.categories[0].save_path.is_empty());
    }

    #[test]
    fn environment_values_populate_credentials_and_paths() {
        let config = load(&[
            ("TORRELAY_DAEMON_URL", "http://nas:8081"),
            ("TORRELAY_DAEMON_USER", "admin"),
            ("TORRELAY_DAEMON_PASSWORD", "secret"),
            ("TORRELAY_ALLOWED_USERS", "10|20"),
            ("TORRELAY_RUTRACKER_USER", "ru"),
            ("TORRELAY_RUTRACKER_PASSWORD", "pw"),
            ("TORRELAY_RUTRACKER_LOGIN_MARKER", "logout.php"),
            ("TORRELAY_MOVIES_PATH", "/media/movies"),
            ("TORRELAY_HTTP_TIMEOUT_SECS", "12"),
        ])
        .expect("config");

        assert_eq!(config.daemon.username, "admin");
        assert!(config.is_allowed(20));
        assert!(!config.is_allowed(30));
        assert_eq!(config.http_timeout, Duration::from_secs(12));
        assert_eq!(
            config.category("Movies.").map(|c| c.save_path.as_str()),
            Some("/media/movies")
        );

        let rutracker = config.site("rutracker").expect("site");
        let credentials = rutracker.credentials.as_ref().expect("credentials");
        assert_eq!(
            credentials.form,
            vec![
                ("login_username".to_string(), "ru".to_string()),
                ("login_password".to_string(), "pw".to_string()),
                ("login".to_string(), String::new()),
            ]
        );
        assert_eq!(credentials.success_marker.as_deref(), Some("logout.php"));
        assert!(config.site("kinozal").expect("site").credentials.is_none());
    }

    #[test]
    fn invalid_values_surface_config_errors() {
        assert!(matches!(
            load(&[("TORRELAY_ALLOWED_USERS", "abc")]),
            Err(ConfigError::InvalidField { .. })
        ));
        assert!(matches!(
            load(&[("TORRELAY_DAEMON_URL", "localhost")]),
            Err(ConfigError::InvalidField { .. })
        ));
        assert!(load(&[("TORRELAY_HTTP_TIMEOUT_SECS", "0")]).is_err());
    }
}
