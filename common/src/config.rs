//! Application configuration.
//!
//! Values come from the process environment, optionally seeded from a `.env`
//! file in the working directory.

use std::fmt;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 1337;

/// Runtime configuration shared by every request.
#[derive(Clone)]
pub struct AppConfig {
    /// Service name used in logs and the liveness response.
    pub service_name: String,
    /// Listen address.
    pub host: String,
    /// Listen port.
    pub port: u16,
    /// Connection string used when a request carries no descriptor header.
    pub default_connection: Option<String>,
    /// Passphrase for encrypted connection descriptors.
    pub crypto_key: Option<String>,
    /// Upper bound on connections in each per-request pool.
    pub max_connections: u32,
    /// Seconds allowed for establishing a connection.
    pub connect_timeout_secs: u64,
    /// Seconds allowed for the whole database portion of a request.
    pub query_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service_name: "pg-meta".to_string(),
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            default_connection: None,
            crypto_key: None,
            max_connections: 1,
            connect_timeout_secs: 10,
            query_timeout_secs: 60,
        }
    }
}

impl AppConfig {
    /// Loads configuration from the environment for the named service.
    ///
    /// A `.env` file is read first when present; variables already set in
    /// the environment take precedence.
    pub fn load_with_service(service_name: &str) -> Self {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!(error = %e, "Failed to read .env file");
            }
        }

        let mut config = Self::from_lookup(|key| std::env::var(key).ok());
        config.service_name = service_name.to_string();
        config
    }

    /// Builds a configuration from an arbitrary key lookup.
    ///
    /// Unparseable numeric values fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            service_name: defaults.service_name,
            host: non_empty("HOST").unwrap_or(defaults.host),
            port: non_empty("SERVER_PORT")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.port),
            default_connection: non_empty("PG_CONNECTION"),
            crypto_key: non_empty("CRYPTO_KEY"),
            max_connections: non_empty("DB_MAX_CONNECTIONS")
                .and_then(|v| v.trim().parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_connections),
            connect_timeout_secs: non_empty("DB_CONNECT_TIMEOUT_SECS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.connect_timeout_secs),
            query_timeout_secs: non_empty("DB_QUERY_TIMEOUT_SECS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.query_timeout_secs),
        }
    }

    /// Returns the `host:port` listen address.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("AppConfig")
            .field("service_name", &self.service_name)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("default_connection", &redact(&self.default_connection))
            .field("crypto_key", &redact(&self.crypto_key))
            .field("max_connections", &self.max_connections)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("query_timeout_secs", &self.query_timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = AppConfig::from_lookup(lookup(&[]));
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.max_connections, 1);
        assert!(config.default_connection.is_none());
        assert!(config.crypto_key.is_none());
    }

    #[test]
    fn test_reads_values() {
        let config = AppConfig::from_lookup(lookup(&[
            ("SERVER_PORT", "8080"),
            ("PG_CONNECTION", "postgres://postgres@db/postgres"),
            ("CRYPTO_KEY", "secret"),
            ("DB_MAX_CONNECTIONS", "4"),
            ("DB_QUERY_TIMEOUT_SECS", "5"),
        ]));
        assert_eq!(config.port, 8080);
        assert_eq!(config.listen_addr(), "0.0.0.0:8080");
        assert_eq!(config.crypto_key.as_deref(), Some("secret"));
        assert_eq!(config.max_connections, 4);
        assert_eq!(config.query_timeout_secs, 5);
    }

    #[test]
    fn test_bad_numbers_fall_back() {
        let config = AppConfig::from_lookup(lookup(&[
            ("SERVER_PORT", "not-a-port"),
            ("DB_MAX_CONNECTIONS", "0"),
            ("CRYPTO_KEY", "  "),
        ]));
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.max_connections, 1);
        assert!(config.crypto_key.is_none());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = AppConfig::from_lookup(lookup(&[
            ("PG_CONNECTION", "postgres://postgres:hunter2@db/postgres"),
            ("CRYPTO_KEY", "topsecret"),
        ]));
        let out = format!("{:?}", config);
        assert!(!out.contains("hunter2"));
        assert!(!out.contains("topsecret"));
        assert!(out.contains("<redacted>"));
    }
}
