//! Built-in tracker sites, categories, and fallback values.
//!
//! # Design
//! - Site and category tables are static; only secrets and paths come from the environment.
//! - Environment variable names live next to the entries that consume them.

/// Daemon web UI address used when `TORRELAY_DAEMON_URL` is unset.
pub const DEFAULT_DAEMON_URL: &str = "http://localhost:8080";
/// Per-call HTTP deadline used when `TORRELAY_HTTP_TIMEOUT_SECS` is unset.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
/// Trailing character marking a callback token as a category key.
pub const CATEGORY_DELIMITER: char = '.';
/// Placeholder substituted with the torrent id in download templates.
pub(crate) const ID_PLACEHOLDER: &str = "{id}";

/// Static description of a supported tracker site.
pub(crate) struct SiteDefaults {
    pub(crate) name: &'static str,
    pub(crate) id_key: &'static str,
    pub(crate) login_url: &'static str,
    pub(crate) download_template: &'static str,
    /// Variable whose absence leaves the site without credentials.
    pub(crate) required_env: &'static str,
    /// `(form field, environment variable)` pairs for the login form.
    pub(crate) form: &'static [(&'static str, &'static str)],
    /// Variable holding text that only a logged-in page contains.
    pub(crate) marker_env: &'static str,
}

pub(crate) const SITES: &[SiteDefaults] = &[
    SiteDefaults {
        name: "rutracker",
        id_key: "t",
        login_url: "https://rutracker.org/forum/login.php",
        download_template: "https://rutracker.org/forum/dl.php?t={id}",
        required_env: "TORRELAY_RUTRACKER_USER",
        form: &[
            ("login_username", "TORRELAY_RUTRACKER_USER"),
            ("login_password", "TORRELAY_RUTRACKER_PASSWORD"),
            ("login", "TORRELAY_RUTRACKER_LOGIN"),
        ],
        marker_env: "TORRELAY_RUTRACKER_LOGIN_MARKER",
    },
    SiteDefaults {
        name: "kinozal",
        id_key: "id",
        login_url: "https://kinozal.tv/takelogin.php",
        download_template: "https://dl.kinozal.tv/download.php?id={id}",
        required_env: "TORRELAY_KINOZAL_USER",
        form: &[
            ("username", "TORRELAY_KINOZAL_USER"),
            ("password", "TORRELAY_KINOZAL_PASSWORD"),
        ],
        marker_env: "TORRELAY_KINOZAL_LOGIN_MARKER",
    },
];

/// Static description of a download category.
pub(crate) struct CategoryDefaults {
    pub(crate) key: &'static str,
    pub(crate) label: &'static str,
    pub(crate) path_env: &'static str,
}

pub(crate) const CATEGORIES: &[CategoryDefaults] = &[
    CategoryDefaults {
        key: "Movies.",
        label: "Movies",
        path_env: "TORRELAY_MOVIES_PATH",
    },
    CategoryDefaults {
        key: "TV Shows.",
        label: "TV Shows",
        path_env: "TORRELAY_TV_SHOWS_PATH",
    },
    CategoryDefaults {
        key: "Games.",
        label: "Games",
        path_env: "TORRELAY_GAMES_PATH",
    },
    CategoryDefaults {
        key: "AudioBooks.",
        label: "Audio Books",
        path_env: "TORRELAY_AUDIOBOOKS_PATH",
    },
    CategoryDefaults {
        key: "MultiParts.",
        label: "Parted media",
        path_env: "TORRELAY_MULTIPARTS_PATH",
    },
    CategoryDefaults {
        key: "MANGA.",
        label: "Manga",
        path_env: "TORRELAY_MANGA_PATH",
    },
    CategoryDefaults {
        key: "COMICS.",
        label: "Comics",
        path_env: "TORRELAY_COMICS_PATH",
    },
];
