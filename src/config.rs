use std::env::VarError;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;

use crate::browser::ResponseOrdering;
use crate::clients::errors::{Error, Result};

pub const DEFAULT_API_URL: &str = "https://itunes.apple.com/search";
pub const DEFAULT_ENTITY: &str = "song";
const DEFAULT_CONCURRENCY: usize = 4;
// The search API refuses larger pages
const MAX_LIMIT: u32 = 200;

const API_URL_VAR: &str = "SONGBROWSER_API_URL";
const ENTITY_VAR: &str = "SONGBROWSER_ENTITY";
const LIMIT_VAR: &str = "SONGBROWSER_LIMIT";
const TIMEOUT_VAR: &str = "SONGBROWSER_TIMEOUT_SECS";

/// Resolved settings for the search client and the browser.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_url: String,
    pub entity: String,
    pub limit: Option<u32>,
    pub timeout: Option<Duration>,
    pub ordering: ResponseOrdering,
    pub concurrency: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_url: DEFAULT_API_URL.to_string(),
            entity: DEFAULT_ENTITY.to_string(),
            limit: None,
            timeout: None,
            ordering: ResponseOrdering::default(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// Collects explicit settings; anything left unset is read from the
/// environment and finally from the defaults.
#[derive(Default)]
pub struct ConfigBuilder {
    api_url: Option<String>,
    entity: Option<String>,
    limit: Option<u32>,
    timeout: Option<Duration>,
    ordering: Option<ResponseOrdering>,
    concurrency: Option<usize>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = Some(api_url.into());
        self
    }

    #[must_use]
    pub fn entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn ordering(mut self, ordering: ResponseOrdering) -> Self {
        self.ordering = Some(ordering);
        self
    }

    #[must_use]
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = Some(concurrency);
        self
    }

    pub fn build(self) -> Result<Config> {
        self.build_with(|key| match std::env::var(key) {
            Ok(value) => Ok(Some(value)),
            Err(VarError::NotPresent) => Ok(None),
            Err(e) => Err(Error::from(e)),
        })
    }

    fn build_with(self, env: impl Fn(&str) -> Result<Option<String>>) -> Result<Config> {
        let defaults = Config::default();

        let api_url = match self.api_url {
            Some(url) => url,
            None => env(API_URL_VAR)?.unwrap_or(defaults.api_url),
        };
        let entity = match self.entity {
            Some(entity) => entity,
            None => env(ENTITY_VAR)?.unwrap_or(defaults.entity),
        };
        let limit = match self.limit {
            Some(limit) => Some(limit),
            None => env(LIMIT_VAR)?
                .map(|value| parse_var::<u32>(LIMIT_VAR, &value))
                .transpose()?,
        };
        let timeout = match self.timeout {
            Some(timeout) => Some(timeout),
            None => env(TIMEOUT_VAR)?
                .map(|value| parse_var::<u64>(TIMEOUT_VAR, &value).map(Duration::from_secs))
                .transpose()?,
        };
        let concurrency = self.concurrency.unwrap_or(defaults.concurrency);

        parse_api_url(&api_url)?;
        if entity.trim().is_empty() {
            return Err(Error::ConfigurationError("entity must not be empty".into()));
        }
        if let Some(limit) = limit
            && !(1..=MAX_LIMIT).contains(&limit)
        {
            return Err(Error::ConfigurationError(format!(
                "limit must be between 1 and {MAX_LIMIT}, got {limit}"
            )));
        }
        if timeout.is_some_and(|t| t.is_zero()) {
            return Err(Error::ConfigurationError("timeout must be positive".into()));
        }
        if concurrency == 0 {
            return Err(Error::ConfigurationError("concurrency must be positive".into()));
        }

        Ok(Config {
            api_url,
            entity,
            limit,
            timeout,
            ordering: self.ordering.unwrap_or(defaults.ordering),
            concurrency,
        })
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::ConfigurationError(format!("{key}={value:?}: {e}")))
}

/// Parses the search endpoint. Only absolute http(s) urls are accepted.
pub fn parse_api_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|e| Error::ConfigurationError(format!("invalid API url {raw:?}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::ConfigurationError(format!(
            "API url must be http or https, got {url}"
        )));
    }
    Ok(url)
}

/// Per-user env file, e.g. `~/.config/songbrowser/songbrowser.env` on Linux.
pub fn user_env_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("songbrowser").join("songbrowser.env"))
}

/// Loads `.env` from the working directory, then the per-user env file, and
/// returns the files that were read. Variables that are already set are never
/// overridden.
pub fn load_env_files() -> Vec<PathBuf> {
    let mut loaded = Vec::new();
    if let Ok(path) = dotenvy::dotenv() {
        loaded.push(path);
    }
    if let Some(path) = user_env_file()
        && path.exists()
        && dotenvy::from_path(&path).is_ok()
    {
        loaded.push(path);
    }
    loaded
}
