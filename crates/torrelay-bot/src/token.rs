//! Callback token codec.
//!
//! Tokens are the strings attached to rendered buttons:
//! - `<key>.`: category selection (the key carries the category delimiter)
//! - `manage:<hash>[:page:<n>]`: open the management view for one torrent
//! - `<verb>:<hash>`: lifecycle action
//! - `list:page:<n>`: torrent list pagination

use std::fmt;
use std::str::FromStr;

use torrelay_config::CATEGORY_DELIMITER;

use crate::error::TokenError;

const SEPARATOR: char = ':';
const MANAGE: &str = "manage";
const LIST: &str = "list";
const PAGE: &str = "page";

/// Lifecycle actions offered on a torrent's action keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleVerb {
    /// Stop transferring.
    Pause,
    /// Resume transferring.
    Resume,
    /// Remove the torrent, keeping its files.
    Delete,
    /// Remove the torrent together with its files.
    DeleteWithData,
    /// Refresh the details view.
    Info,
}

impl LifecycleVerb {
    /// Wire form used inside tokens.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Delete => "delete",
            Self::DeleteWithData => "deletewithdata",
            Self::Info => "info",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        Some(match raw {
            "pause" => Self::Pause,
            "resume" => Self::Resume,
            "delete" => Self::Delete,
            "deletewithdata" => Self::DeleteWithData,
            "info" => Self::Info,
            _ => return None,
        })
    }
}

/// Decoded callback token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackToken {
    /// Category chosen for the pending link; holds the full key.
    Category(String),
    /// Management view for a torrent, remembering the list page it came from.
    Manage {
        /// Content hash.
        hash: String,
        /// List page to return to.
        page: Option<usize>,
    },
    /// Lifecycle action on a torrent.
    Action {
        /// Requested action.
        verb: LifecycleVerb,
        /// Content hash.
        hash: String,
    },
    /// Page of the torrent list.
    List {
        /// Zero-based page index.
        page: usize,
    },
}

impl CallbackToken {
    /// Whether the token touches the pending-link table.
    #[must_use]
    pub const fn is_category(&self) -> bool {
        matches!(self, Self::Category(_))
    }
}

impl FromStr for CallbackToken {
    type Err = TokenError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let malformed = || TokenError::Malformed {
            token: raw.to_string(),
        };

        if raw.is_empty() {
            return Err(malformed());
        }
        if raw.ends_with(CATEGORY_DELIMITER) && !raw.contains(SEPARATOR) {
            return if raw.len() > CATEGORY_DELIMITER.len_utf8() {
                Ok(Self::Category(raw.to_string()))
            } else {
                Err(malformed())
            };
        }

        let parts: Vec<&str> = raw.split(SEPARATOR).collect();
        match parts.as_slice() {
            [MANAGE, hash] if !hash.is_empty() => Ok(Self::Manage {
                hash: (*hash).to_string(),
                page: None,
            }),
            [MANAGE, hash, PAGE, page] if !hash.is_empty() => Ok(Self::Manage {
                hash: (*hash).to_string(),
                page: Some(page.parse().map_err(|_| malformed())?),
            }),
            [LIST, PAGE, page] => Ok(Self::List {
                page: page.parse().map_err(|_| malformed())?,
            }),
            [MANAGE | LIST, ..] => Err(malformed()),
            [verb, rest @ ..] => {
                let verb_kind = LifecycleVerb::parse(verb).ok_or_else(|| TokenError::UnknownVerb {
                    verb: (*verb).to_string(),
                })?;
                match rest {
                    [hash] if !hash.is_empty() => Ok(Self::Action {
                        verb: verb_kind,
                        hash: (*hash).to_string(),
                    }),
                    _ => Err(malformed()),
                }
            }
            [] => Err(malformed()),
        }
    }
}

impl fmt::Display for CallbackToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Category(key) => f.write_str(key),
            Self::Manage { hash, page: None } => write!(f, "{MANAGE}:{hash}"),
            Self::Manage {
                hash,
                page: Some(page),
            } => write!(f, "{MANAGE}:{hash}:{PAGE}:{page}"),
            Self::Action { verb, hash } => write!(f, "{}:{hash}", verb.as_str()),
            Self::List { page } => write!(f, "{LIST}:{PAGE}:{page}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Result<CallbackToken, TokenError> {
        raw.parse()
    }

    #[test]
    fn category_keys_end_with_delimiter() {
        assert_eq!(
            parse("TV Shows."),
            Ok(CallbackToken::Category("TV Shows.".into()))
        );
        assert!(parse("Movies.").is_ok_and(|token| token.is_category()));
        assert!(matches!(parse("."), Err(TokenError::Malformed { .. })));
    }

    #[test]
    fn management_tokens_decode_with_optional_page() {
        assert_eq!(
            parse("manage:abc123"),
            Ok(CallbackToken::Manage {
                hash: "abc123".into(),
                page: None
            })
        );
        assert_eq!(
            parse("manage:abc123:page:2"),
            Ok(CallbackToken::Manage {
                hash: "abc123".into(),
                page: Some(2)
            })
        );
        assert_eq!(parse("list:page:3"), Ok(CallbackToken::List { page: 3 }));
        assert_eq!(
            parse("deletewithdata:ff00"),
            Ok(CallbackToken::Action {
                verb: LifecycleVerb::DeleteWithData,
                hash: "ff00".into()
            })
        );
    }

    #[test]
    fn malformed_tokens_are_typed_errors() {
        for raw in [
            "",
            "pause",
            "pause:",
            "pause:a:b",
            "manage:",
            "manage:abc:page:x",
            "manage:abc:extra",
            "list:page:-1",
            "list",
        ] {
            assert!(
                matches!(parse(raw), Err(TokenError::Malformed { .. })),
                "{raw:?} should be malformed"
            );
        }
    }

    #[test]
    fn unknown_verbs_are_reported() {
        assert_eq!(
            parse("explode:abc"),
            Err(TokenError::UnknownVerb {
                verb: "explode".into()
            })
        );
        assert!(matches!(
            parse("gibberish"),
            Err(TokenError::UnknownVerb { .. })
        ));
    }

    #[test]
    fn display_matches_wire_form() {
        for raw in [
            "Movies.",
            "manage:abc",
            "manage:abc:page:1",
            "info:abc",
            "list:page:0",
        ] {
            assert_eq!(parse(raw).map(|token| token.to_string()), Ok(raw.to_string()));
        }
    }
}
