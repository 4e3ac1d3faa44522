//! Service configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). The storage location is never baked
//! into the binary beyond a local-development default.

use std::net::SocketAddr;
use std::time::Duration;

/// Log output format selected by `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable single-line output.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Top-level service configuration.
///
/// Loaded once at startup via [`CrmConfig::from_env`].
#[derive(Debug, Clone)]
pub struct CrmConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:8000`).
    pub listen_addr: SocketAddr,

    /// SQLite connection string (e.g. `sqlite://wealthai.db`).
    pub database_url: String,

    /// Maximum number of database connections in the pool.
    pub database_max_connections: u32,

    /// Minimum idle connections in the pool.
    pub database_min_connections: u32,

    /// Timeout in seconds for acquiring a database connection.
    pub database_connect_timeout_secs: u64,

    /// Upper bound on the time a single HTTP request may take.
    pub request_timeout_secs: u64,

    /// Log output format.
    pub log_format: LogFormat,
}

impl CrmConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> Result<Self, std::net::AddrParseError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, std::net::AddrParseError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_addr: SocketAddr = lookup("LISTEN_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8000".to_string())
            .parse()?;

        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| "sqlite://wealthai.db".to_string());

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            Some("json") | Some("JSON") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            listen_addr,
            database_url,
            database_max_connections: parse_var(&lookup, "DATABASE_MAX_CONNECTIONS", 10),
            database_min_connections: parse_var(&lookup, "DATABASE_MIN_CONNECTIONS", 1),
            database_connect_timeout_secs: parse_var(&lookup, "DATABASE_CONNECT_TIMEOUT_SECS", 5),
            request_timeout_secs: parse_var(&lookup, "REQUEST_TIMEOUT_SECS", 30),
            log_format,
        })
    }

    /// Connection acquire timeout as a [`Duration`].
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.database_connect_timeout_secs)
    }

    /// Request timeout as a [`Duration`].
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Parses a variable as `T`, returning `default` on missing or invalid
/// values.
fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let Ok(cfg) = CrmConfig::from_lookup(lookup_from(&[])) else {
            panic!("defaults must parse");
        };
        assert_eq!(cfg.listen_addr.port(), 8000);
        assert_eq!(cfg.database_url, "sqlite://wealthai.db");
        assert_eq!(cfg.database_max_connections, 10);
        assert_eq!(cfg.log_format, LogFormat::Text);
    }

    #[test]
    fn overrides_are_read() {
        let Ok(cfg) = CrmConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("DATABASE_MAX_CONNECTIONS", "3"),
            ("LOG_FORMAT", "json"),
            ("REQUEST_TIMEOUT_SECS", "12"),
        ])) else {
            panic!("config must parse");
        };
        assert_eq!(cfg.database_url, "sqlite::memory:");
        assert_eq!(cfg.database_max_connections, 3);
        assert_eq!(cfg.log_format, LogFormat::Json);
        assert_eq!(cfg.request_timeout(), Duration::from_secs(12));
    }

    #[test]
    fn invalid_numbers_fall_back() {
        let Ok(cfg) =
            CrmConfig::from_lookup(lookup_from(&[("DATABASE_CONNECT_TIMEOUT_SECS", "soon")]))
        else {
            panic!("config must parse");
        };
        assert_eq!(cfg.database_connect_timeout_secs, 5);
    }

    #[test]
    fn bad_listen_addr_is_an_error() {
        assert!(CrmConfig::from_lookup(lookup_from(&[("LISTEN_ADDR", "nowhere")])).is_err());
    }
}
