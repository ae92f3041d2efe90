//! Console configuration.

use std::time::Duration;

use console_core::{ConsoleError, ConsoleResult};

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);
pub const DEFAULT_MAX_UNIVERSE_PAGES: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Base URL of the console REST API.
    pub api_url: String,
    pub api_token: Option<String>,
    pub page_size: u32,
    pub poll_interval: Duration,
    /// Quiet period before a typeahead search is sent.
    pub debounce: Duration,
    /// Upper bound on pages read when building a selection universe.
    pub max_universe_pages: usize,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_token: None,
            page_size: DEFAULT_PAGE_SIZE,
            poll_interval: DEFAULT_POLL_INTERVAL,
            debounce: DEFAULT_DEBOUNCE,
            max_universe_pages: DEFAULT_MAX_UNIVERSE_PAGES,
        }
    }
}

impl ConsoleConfig {
    /// Load from `CONSOLE_*` environment variables.
    pub fn from_env() -> ConsoleResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary key lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> ConsoleResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_url = lookup("CONSOLE_API_URL").unwrap_or_else(|| {
            tracing::warn!("CONSOLE_API_URL not set; using {}", DEFAULT_API_URL);
            defaults.api_url.clone()
        });
        let api_token = lookup("CONSOLE_API_TOKEN").filter(|t| !t.is_empty());

        let page_size = parse(&lookup, "CONSOLE_PAGE_SIZE")?.unwrap_or(defaults.page_size);
        if page_size == 0 {
            return Err(ConsoleError::InvalidPageSize(page_size));
        }

        let poll_interval = parse(&lookup, "CONSOLE_POLL_INTERVAL_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.poll_interval);
        let debounce = parse(&lookup, "CONSOLE_DEBOUNCE_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.debounce);
        let max_universe_pages =
            parse(&lookup, "CONSOLE_MAX_UNIVERSE_PAGES")?.unwrap_or(defaults.max_universe_pages);

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            api_token,
            page_size,
            poll_interval,
            debounce,
            max_universe_pages,
        })
    }
}

fn parse<F, V>(lookup: &F, key: &str) -> ConsoleResult<Option<V>>
where
    F: Fn(&str) -> Option<String>,
    V: std::str::FromStr,
    V::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<V>()
            .map(Some)
            .map_err(|e| ConsoleError::config(format!("{key}={raw}: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> ConsoleResult<ConsoleConfig> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ConsoleConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn empty_environment_yields_defaults() {
        assert_eq!(load(&[]).unwrap(), ConsoleConfig::default());
    }

    #[test]
    fn values_are_parsed() {
        let cfg = load(&[
            ("CONSOLE_API_URL", "https://console.example/api/"),
            ("CONSOLE_API_TOKEN", "abc"),
            ("CONSOLE_PAGE_SIZE", "50"),
            ("CONSOLE_POLL_INTERVAL_SECS", "5"),
            ("CONSOLE_DEBOUNCE_MS", "150"),
            ("CONSOLE_MAX_UNIVERSE_PAGES", "3"),
        ])
        .unwrap();
        assert_eq!(cfg.api_url, "https://console.example/api");
        assert_eq!(cfg.api_token.as_deref(), Some("abc"));
        assert_eq!(cfg.page_size, 50);
        assert_eq!(cfg.poll_interval, Duration::from_secs(5));
        assert_eq!(cfg.debounce, Duration::from_millis(150));
        assert_eq!(cfg.max_universe_pages, 3);
    }

    #[test]
    fn garbage_is_a_config_error() {
        let err = load(&[("CONSOLE_DEBOUNCE_MS", "soon")]).unwrap_err();
        match err {
            ConsoleError::Config(msg) => assert!(msg.contains("CONSOLE_DEBOUNCE_MS")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn zero_page_size_is_rejected() {
        assert_eq!(
            load(&[("CONSOLE_PAGE_SIZE", "0")]),
            Err(ConsoleError::InvalidPageSize(0))
        );
    }
}
