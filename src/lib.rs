//! Coin Vault Backend
//!
//! Layered architecture:
//! - domain: Core entities and business rules
//! - repository: Data access abstractions and implementations
//! - reorder: Optimistic drag-reorder engine for a collection
//! - config: Application settings

use std::sync::Arc;

pub mod config;
pub mod domain;
pub mod repository;
pub mod reorder;

use config::{AppConfig, Backend};
use domain::DomainResult;
use repository::{init_db, CoinRepository, CollectionStore, DbState, RestCollectionStore};
use reorder::ReorderEngine;

/// Application state shared by the presentation layer
pub struct AppState {
    pub config: AppConfig,
    db_state: Option<DbState>,
    coins: Option<Arc<CoinRepository>>,
    store: Arc<dyn CollectionStore>,
}

impl AppState {
    /// Open the configured backend
    pub async fn open(config: AppConfig) -> DomainResult<Self> {
        match config.backend {
            Backend::Sqlite => {
                let db_state = init_db(&config.db_path).await?;
                let coins = Arc::new(CoinRepository::new(db_state.connection()));
                let store: Arc<dyn CollectionStore> = coins.clone();
                Ok(Self {
                    config,
                    db_state: Some(db_state),
                    coins: Some(coins),
                    store,
                })
            }
            Backend::Rest => {
                let store = Arc::new(RestCollectionStore::new(config.rest.clone())?);
                log::info!("using REST backend at {}", config.rest.base_url);
                Ok(Self {
                    config,
                    db_state: None,
                    coins: None,
                    store,
                })
            }
        }
    }

    pub fn store(&self) -> Arc<dyn CollectionStore> {
        Arc::clone(&self.store)
    }

    /// Local coin CRUD; only the SQLite backend has it
    pub fn coin_repo(&self) -> Option<&CoinRepository> {
        self.coins.as_deref()
    }

    /// Reorder engine for one owner's collection
    pub fn engine(&self, owner_key: &str) -> ReorderEngine<dyn CollectionStore> {
        ReorderEngine::new(owner_key, self.store(), self.config.reorder)
    }

    pub async fn close(&self) {
        if let Some(db) = &self.db_state {
            db.close().await;
        }
    }
}
