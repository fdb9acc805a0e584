//! Deployment configuration.
//!
//! Everything is read from the environment; the binary seeds it from a
//! `.env` file when one is present. Every key has a default, so an empty
//! environment yields a working configuration pointing at the production
//! endpoints.
//!
//! | Variable                   | Default          | Description                                  |
//! |----------------------------|------------------|----------------------------------------------|
//! | `TRACKS_API_URL`           | production URL   | Track catalog endpoint                       |
//! | `STATS_API_URL`            | production URL   | Listen statistics endpoint                   |
//! | `PLAYLIST_LIMIT`           | `50`             | Tracks requested for the session playlist    |
//! | `RESUME_GRACE_MS`          | `100`            | Delay before re-invoking play on track end   |
//! | `UPCOMING_COUNT`           | `5`              | Upcoming tracks shown on the player          |
//! | `IMPORT_DEFAULT_YEAR`      | `2024`           | Year used when a bulk line omits it          |
//! | `IMPORT_DEFAULT_ALBUM`     | `Single`         | Album used when a bulk line omits it         |
//! | `IMPORT_DEFAULT_COVER_URL` | empty            | Cover URL used when a bulk line omits it     |

use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_TRACKS_API_URL: &str =
    "https://functions.poehali.dev/cccbaa22-d573-4dc2-b723-98c10ad54675";
pub const DEFAULT_STATS_API_URL: &str =
    "https://functions.poehali.dev/4e37ebe7-1437-45c6-b23c-6975b0c6a201";

const DEFAULT_PLAYLIST_LIMIT: u32 = 50;
const DEFAULT_RESUME_GRACE_MS: u64 = 100;
const DEFAULT_UPCOMING_COUNT: usize = 5;

/// Values substituted for optional fields a bulk import line leaves out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDefaults {
    pub year: String,
    pub album: String,
    pub cover_url: String,
}

impl Default for ImportDefaults {
    fn default() -> Self {
        Self {
            year: "2024".to_string(),
            album: "Single".to_string(),
            cover_url: String::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub tracks_api_url: String,
    pub stats_api_url: String,
    pub playlist_limit: u32,
    /// Grace period after a natural track end before play is invoked again,
    /// covering the media sink's buffering gap.
    pub resume_grace: Duration,
    pub upcoming_count: usize,
    pub import_defaults: ImportDefaults,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tracks_api_url: DEFAULT_TRACKS_API_URL.to_string(),
            stats_api_url: DEFAULT_STATS_API_URL.to_string(),
            playlist_limit: DEFAULT_PLAYLIST_LIMIT,
            resume_grace: Duration::from_millis(DEFAULT_RESUME_GRACE_MS),
            upcoming_count: DEFAULT_UPCOMING_COUNT,
            import_defaults: ImportDefaults::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let import_defaults = ImportDefaults {
            year: lookup("IMPORT_DEFAULT_YEAR").unwrap_or(defaults.import_defaults.year),
            album: lookup("IMPORT_DEFAULT_ALBUM").unwrap_or(defaults.import_defaults.album),
            cover_url: lookup("IMPORT_DEFAULT_COVER_URL")
                .unwrap_or(defaults.import_defaults.cover_url),
        };

        Ok(Self {
            tracks_api_url: lookup("TRACKS_API_URL").unwrap_or(defaults.tracks_api_url),
            stats_api_url: lookup("STATS_API_URL").unwrap_or(defaults.stats_api_url),
            playlist_limit: parse(&lookup, "PLAYLIST_LIMIT")?.unwrap_or(defaults.playlist_limit),
            resume_grace: parse(&lookup, "RESUME_GRACE_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.resume_grace),
            upcoming_count: parse(&lookup, "UPCOMING_COUNT")?.unwrap_or(defaults.upcoming_count),
            import_defaults,
        })
    }
}

fn parse<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}
