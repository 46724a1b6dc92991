//! Runtime configuration loaded from the environment (and `.env`).

use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_API_SERVER: &str = "http://localhost:8000";
pub const DEFAULT_BASE_PATH: &str = "/api";
pub const DEFAULT_DEBOUNCE_MS: u64 = 1000;
pub const DEFAULT_PAGE_SIZES: [usize; 5] = [5, 10, 15, 50, 100];
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

#[derive(Debug, Clone)]
pub struct Config {
    /// Backend origin, e.g. `http://localhost:8000`
    pub api_server: String,
    /// Path prefix all endpoints live under, e.g. `/api`
    pub base_path: String,
    /// Pre-issued bearer token, used when no interactive login happens
    pub token: Option<String>,
    /// Quiet period for debounced filter inputs
    pub debounce: Duration,
    /// Page size menu offered by the pagination controls
    pub page_sizes: Vec<usize>,
    /// TTL for cached categories / price range
    pub cache_ttl: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_server: DEFAULT_API_SERVER.to_string(),
            base_path: DEFAULT_BASE_PATH.to_string(),
            token: None,
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            page_sizes: DEFAULT_PAGE_SIZES.to_vec(),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_server = lookup("API_SERVER").unwrap_or(defaults.api_server);
        let base_path = lookup("SALES_MONITOR_API_BASE_PATH").unwrap_or(defaults.base_path);
        let token = lookup("SALES_MONITOR_TOKEN").filter(|t| !t.trim().is_empty());

        let debounce = match lookup("SALES_MONITOR_DEBOUNCE_MS") {
            Some(raw) => Duration::from_millis(parse_number("SALES_MONITOR_DEBOUNCE_MS", &raw)?),
            None => defaults.debounce,
        };

        let cache_ttl = match lookup("SALES_MONITOR_CACHE_TTL_SECS") {
            Some(raw) => Duration::from_secs(parse_number("SALES_MONITOR_CACHE_TTL_SECS", &raw)?),
            None => defaults.cache_ttl,
        };

        let page_sizes = match lookup("SALES_MONITOR_PAGE_SIZES") {
            Some(raw) => parse_page_sizes(&raw)?,
            None => defaults.page_sizes,
        };

        Ok(Self {
            api_server,
            base_path,
            token,
            debounce,
            page_sizes,
            cache_ttl,
        })
    }

    /// Absolute base URL, joined without duplicate slashes.
    pub fn api_base_url(&self) -> String {
        let server = self.api_server.trim_end_matches('/');
        let path = self.base_path.trim_matches('/');
        if path.is_empty() {
            server.to_string()
        } else {
            format!("{}/{}", server, path)
        }
    }
}

fn parse_number(name: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name,
        value: raw.to_string(),
    })
}

fn parse_page_sizes(raw: &str) -> Result<Vec<usize>, ConfigError> {
    let invalid = || ConfigError::InvalidValue {
        name: "SALES_MONITOR_PAGE_SIZES",
        value: raw.to_string(),
    };

    let sizes = raw
        .split(',')
        .map(|part| part.trim().parse::<usize>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| invalid())?;

    if sizes.is_empty() || sizes.contains(&0) {
        return Err(invalid());
    }
    Ok(sizes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.api_base_url(), "http://localhost:8000/api");
        assert_eq!(config.debounce, Duration::from_millis(1000));
        assert_eq!(config.page_sizes, vec![5, 10, 15, 50, 100]);
        assert!(config.token.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("API_SERVER", "https://sales.example.com/"),
            ("SALES_MONITOR_API_BASE_PATH", "/v2/"),
            ("SALES_MONITOR_TOKEN", "abc"),
            ("SALES_MONITOR_DEBOUNCE_MS", "250"),
            ("SALES_MONITOR_PAGE_SIZES", "5, 10,15"),
        ]))
        .unwrap();

        assert_eq!(config.api_base_url(), "https://sales.example.com/v2");
        assert_eq!(config.token.as_deref(), Some("abc"));
        assert_eq!(config.debounce, Duration::from_millis(250));
        assert_eq!(config.page_sizes, vec![5, 10, 15]);
    }

    #[test]
    fn test_blank_token_ignored() {
        let config = Config::from_lookup(lookup_from(&[("SALES_MONITOR_TOKEN", "  ")])).unwrap();
        assert!(config.token.is_none());
    }

    #[test]
    fn test_invalid_numbers_rejected() {
        assert!(Config::from_lookup(lookup_from(&[("SALES_MONITOR_DEBOUNCE_MS", "soon")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("SALES_MONITOR_PAGE_SIZES", "5,0")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("SALES_MONITOR_PAGE_SIZES", "")])).is_err());
    }

    #[test]
    fn test_empty_base_path() {
        let config = Config::from_lookup(lookup_from(&[("SALES_MONITOR_API_BASE_PATH", "/")])).unwrap();
        assert_eq!(config.api_base_url(), "http://localhost:8000");
    }
}
