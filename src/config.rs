//! Runtime configuration pulled from the environment. Everything has a
//! default except the directory API key, which is allowed to be empty: the
//! directory will then reject searches and the UI reports it like any other
//! network failure.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".aviary";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "aviary.sqlite";
const LOG_DIR_NAME: &str = "logs";

pub const DEFAULT_API_URL: &str = "https://nuthatch.lastelm.software/v2";
pub const DEFAULT_PAGE_SIZE: u32 = 24;
const MAX_PAGE_SIZE: u32 = 100;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub api_base_url: String,
    pub api_key: String,
    pub page_size: u32,
    pub request_timeout: Duration,
    pub log_filter: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let home = BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf());
        Self::from_lookup(|key| std::env::var(key).ok(), home)
    }

    /// Build the configuration from an arbitrary key lookup so tests do not
    /// have to mutate the process environment.
    pub fn from_lookup<F>(lookup: F, home: Option<PathBuf>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let data_dir = match get("AVIARY_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => home
                .ok_or_else(|| anyhow!("could not locate home directory; set AVIARY_DATA_DIR"))?
                .join(DATA_DIR_NAME),
        };

        let page_size = match get("AVIARY_PAGE_SIZE") {
            Some(raw) => raw
                .parse::<u32>()
                .context("AVIARY_PAGE_SIZE must be a whole number")?,
            None => DEFAULT_PAGE_SIZE,
        };
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(anyhow!(
                "AVIARY_PAGE_SIZE must be between 1 and {MAX_PAGE_SIZE}"
            ));
        }

        let timeout_secs = match get("AVIARY_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .context("AVIARY_HTTP_TIMEOUT_SECS must be a whole number of seconds")?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            data_dir,
            api_base_url: get("NUTHATCH_API_URL")
                .unwrap_or_else(|| DEFAULT_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key: get("NUTHATCH_API_KEY").unwrap_or_default(),
            page_size,
            request_timeout: Duration::from_secs(timeout_secs.max(1)),
            log_filter: get("AVIARY_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        })
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join(LOG_DIR_NAME)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rstest::rstest;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned(), Some(PathBuf::from("/home/birder")))
    }

    #[test]
    fn defaults_apply_without_environment() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/home/birder/.aviary"));
        assert_eq!(
            config.database_path(),
            PathBuf::from("/home/birder/.aviary/aviary.sqlite")
        );
        assert_eq!(config.api_base_url, DEFAULT_API_URL);
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.log_filter, "info");
        assert!(config.api_key.is_empty());
    }

    #[test]
    fn overrides_are_trimmed_and_applied() {
        let config = config_from(&[
            ("AVIARY_DATA_DIR", " /tmp/aviary "),
            ("NUTHATCH_API_URL", "http://localhost:8080/v2/"),
            ("NUTHATCH_API_KEY", "secret"),
            ("AVIARY_PAGE_SIZE", "10"),
            ("AVIARY_HTTP_TIMEOUT_SECS", "5"),
            ("AVIARY_LOG", "aviary=debug"),
        ])
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/aviary"));
        assert_eq!(config.api_base_url, "http://localhost:8080/v2");
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.page_size, 10);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.log_filter, "aviary=debug");
        assert_eq!(config.log_dir(), PathBuf::from("/tmp/aviary/logs"));
    }

    #[rstest]
    #[case("0")]
    #[case("101")]
    #[case("many")]
    fn invalid_page_sizes_are_rejected(#[case] raw: &str) {
        assert!(config_from(&[("AVIARY_PAGE_SIZE", raw)]).is_err());
    }

    #[test]
    fn missing_home_requires_explicit_data_dir() {
        assert!(Config::from_lookup(|_| None, None).is_err());
        let config = Config::from_lookup(
            |key| (key == "AVIARY_DATA_DIR").then(|| "/srv/aviary".to_string()),
            None,
        )
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/aviary"));
    }
}
