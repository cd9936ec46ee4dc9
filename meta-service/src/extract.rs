//! Connection descriptor extractor.

use axum::{extract::FromRequestParts, http::request::Parts};

use common::errors::AppError;
use common::models::ConnectionConfig;

use crate::descriptor::{decrypt_failed, RawDescriptor};
use crate::state::AppState;

/// Header carrying an encrypted connection string.
pub const ENCRYPTED_CONNECTION_HEADER: &str = "x-connection-encrypted";

/// The target database of the current request.
///
/// Taken from `X-Connection-Encrypted` when present, otherwise from the
/// configured default connection.
#[derive(Debug, Clone)]
pub struct Connection(pub ConnectionConfig);

impl FromRequestParts<AppState> for Connection {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let raw = match parts.headers.get(ENCRYPTED_CONNECTION_HEADER) {
            Some(value) => {
                let blob = value.to_str().map_err(|_| decrypt_failed())?;
                RawDescriptor::Encrypted(blob.to_string())
            }
            None => match &state.config.default_connection {
                Some(text) => RawDescriptor::Plain(text.clone()),
                None => {
                    return Err(AppError::Descriptor(
                        "no connection descriptor supplied".into(),
                    ))
                }
            },
        };

        let config = state.codec.decode(&raw)?;
        tracing::debug!(host = %config.host, database = %config.database, "Connection resolved");
        Ok(Connection(config))
    }
}
