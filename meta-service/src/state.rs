//! Application state for the metadata service.

use std::sync::Arc;

use common::config::AppConfig;

use crate::descriptor::DescriptorCodec;
use crate::pool_manager::PoolManager;

/// Application state shared across handlers.
///
/// Immutable after startup; nothing here is mutated per request.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub codec: DescriptorCodec,
    pub pool_manager: Arc<PoolManager>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(config: AppConfig) -> Self {
        Self {
            codec: DescriptorCodec::new(config.crypto_key.clone()),
            pool_manager: Arc::new(PoolManager::new(&config)),
            config,
        }
    }
}
