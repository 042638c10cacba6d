use std::sync::Arc;

use crate::auth::TokenService;
use crate::config::Config;
use crate::error::AppError;
use crate::store::{MemoryStore, PgStore, Store};

/// Shared, immutable per-process state handed to every handler via `web::Data`.
/// Holds no per-request mutable data; all durable state lives in the store.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub tokens: TokenService,
    pub bcrypt_cost: u32,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, tokens: TokenService, bcrypt_cost: u32) -> Self {
        Self {
            store,
            tokens,
            bcrypt_cost,
        }
    }

    /// Connects to Postgres (running migrations) when `DATABASE_URL` is configured,
    /// otherwise falls back to the in-memory store.
    pub async fn from_config(config: &Config) -> Result<Self, AppError> {
        let store: Arc<dyn Store> = match &config.database_url {
            Some(url) => {
                let store = PgStore::connect(url, config.database_max_connections).await?;
                store.migrate().await?;
                log::info!("using postgres store");
                Arc::new(store)
            }
            None => {
                log::warn!("DATABASE_URL not set; data will be kept in memory only");
                Arc::new(MemoryStore::new())
            }
        };
        Ok(Self::new(
            store,
            TokenService::new(&config.jwt_secret, config.token_ttl_secs),
            config.bcrypt_cost,
        ))
    }
}
