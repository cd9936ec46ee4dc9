//! Connection descriptor models.
//!
//! A [`ConnectionConfig`] is the canonical form of a request's target
//! database. It is built per request, never persisted, and never logged with
//! its password.

use std::fmt;
use std::str::FromStr;

use percent_encoding::percent_decode_str;
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use url::Url;

use crate::errors::{AppError, AppResult};

const DEFAULT_PORT: u16 = 5432;
const DEFAULT_USER: &str = "postgres";
const DEFAULT_DATABASE: &str = "postgres";
const DEFAULT_APPLICATION_NAME: &str = "pg-meta";

/// TLS negotiation mode, using libpq's names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SslMode {
    Disable,
    Allow,
    #[default]
    Prefer,
    Require,
    VerifyCa,
    VerifyFull,
}

impl FromStr for SslMode {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "disable" => Ok(SslMode::Disable),
            "allow" => Ok(SslMode::Allow),
            "prefer" => Ok(SslMode::Prefer),
            "require" => Ok(SslMode::Require),
            "verify-ca" => Ok(SslMode::VerifyCa),
            "verify-full" => Ok(SslMode::VerifyFull),
            _ => Err(malformed("unknown sslmode")),
        }
    }
}

impl From<SslMode> for PgSslMode {
    fn from(mode: SslMode) -> Self {
        match mode {
            SslMode::Disable => PgSslMode::Disable,
            SslMode::Allow => PgSslMode::Allow,
            SslMode::Prefer => PgSslMode::Prefer,
            SslMode::Require => PgSslMode::Require,
            SslMode::VerifyCa => PgSslMode::VerifyCa,
            SslMode::VerifyFull => PgSslMode::VerifyFull,
        }
    }
}

/// Canonical connection parameters for one target database.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: Option<String>,
    pub ssl_mode: SslMode,
    /// Reported in `pg_stat_activity`; `pg-meta` when unset.
    pub application_name: Option<String>,
}

impl ConnectionConfig {
    /// Builds driver connect options from the individual fields.
    pub fn connect_options(&self) -> PgConnectOptions {
        let mut options = PgConnectOptions::new_without_pgpass()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .database(&self.database)
            .ssl_mode(self.ssl_mode.into())
            .application_name(
                self.application_name
                    .as_deref()
                    .unwrap_or(DEFAULT_APPLICATION_NAME),
            );
        if let Some(password) = &self.password {
            options = options.password(password);
        }
        options
    }

    /// Parses a `postgres://` URL.
    fn parse_url(input: &str) -> AppResult<Self> {
        let url = Url::parse(input).map_err(|_| malformed("invalid URL"))?;
        if !matches!(url.scheme(), "postgres" | "postgresql") {
            return Err(malformed("unsupported scheme"));
        }

        let host = url
            .host_str()
            .map(|h| h.trim_start_matches('[').trim_end_matches(']'))
            .filter(|h| !h.is_empty())
            .ok_or_else(|| malformed("missing host"))?
            .to_string();

        let user = decode_component(url.username())?;
        let password = url.password().map(decode_component).transpose()?;
        let database = decode_component(url.path().trim_start_matches('/'))?;

        let mut ssl_mode = SslMode::default();
        let mut application_name = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "sslmode" => ssl_mode = value.parse()?,
                "application_name" => application_name = Some(value.into_owned()),
                "connect_timeout" => {}
                _ => return Err(malformed("unknown parameter")),
            }
        }

        Ok(Self {
            host,
            port: url.port().unwrap_or(DEFAULT_PORT),
            database: non_empty_or(database, DEFAULT_DATABASE),
            user: non_empty_or(user, DEFAULT_USER),
            password,
            ssl_mode,
            application_name,
        })
    }

    /// Parses a libpq `key=value` string.
    fn parse_key_values(input: &str) -> AppResult<Self> {
        let mut host = None;
        let mut port = None;
        let mut database = None;
        let mut user = None;
        let mut password = None;
        let mut ssl_mode = SslMode::default();
        let mut application_name = None;

        for (key, value) in tokenize_key_values(input)? {
            match key.as_str() {
                "host" | "hostaddr" => host = Some(value),
                "port" => {
                    port = Some(value.parse::<u16>().map_err(|_| malformed("invalid port"))?)
                }
                "dbname" => database = Some(value),
                "user" => user = Some(value),
                "password" => password = Some(value),
                "sslmode" => ssl_mode = value.parse()?,
                "application_name" => application_name = Some(value),
                // The pool's acquire timeout governs connecting.
                "connect_timeout" => {}
                _ => return Err(malformed("unknown key")),
            }
        }

        Ok(Self {
            host: host
                .filter(|h| !h.is_empty())
                .ok_or_else(|| malformed("missing host"))?,
            port: port.unwrap_or(DEFAULT_PORT),
            database: non_empty_or(database.unwrap_or_default(), DEFAULT_DATABASE),
            user: non_empty_or(user.unwrap_or_default(), DEFAULT_USER),
            password,
            ssl_mode,
            application_name,
        })
    }
}

impl FromStr for ConnectionConfig {
    type Err = AppError;

    /// Parses either URL or `key=value` syntax.
    fn from_str(input: &str) -> AppResult<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(malformed("empty connection string"));
        }
        if input.contains("://") {
            Self::parse_url(input)
        } else {
            Self::parse_key_values(input)
        }
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("ssl_mode", &self.ssl_mode)
            .field("application_name", &self.application_name)
            .finish()
    }
}

fn malformed(reason: &str) -> AppError {
    AppError::Descriptor(format!("malformed connection string: {}", reason))
}

fn non_empty_or(value: String, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value
    }
}

fn decode_component(raw: &str) -> AppResult<String> {
    percent_decode_str(raw)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|_| malformed("invalid percent-encoding"))
}

/// Splits `key=value key2='quoted value'` into pairs.
fn tokenize_key_values(input: &str) -> AppResult<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    let mut chars = input.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if chars.peek().is_none() {
            break;
        }

        let mut key = String::new();
        while let Some(c) = chars.next_if(|c| *c != '=' && !c.is_whitespace()) {
            key.push(c);
        }
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if chars.next() != Some('=') || key.is_empty() {
            return Err(malformed("expected key=value pairs"));
        }
        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        let mut value = String::new();
        if chars.next_if_eq(&'\'').is_some() {
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '\\' => match chars.next() {
                        Some(escaped) => value.push(escaped),
                        None => break,
                    },
                    '\'' => {
                        closed = true;
                        break;
                    }
                    _ => value.push(c),
                }
            }
            if !closed {
                return Err(malformed("unterminated quoted value"));
            }
        } else {
            while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                if c == '\\' {
                    if let Some(escaped) = chars.next() {
                        value.push(escaped);
                    }
                } else {
                    value.push(c);
                }
            }
        }

        pairs.push((key.to_ascii_lowercase(), value));
    }

    if pairs.is_empty() {
        return Err(malformed("expected key=value pairs"));
    }
    Ok(pairs)
}
