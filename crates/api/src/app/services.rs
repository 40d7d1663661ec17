use std::sync::Arc;

use stockroom_infra::config::{AppConfig, StoreBackend};
use stockroom_infra::store::{InMemoryLedgerStore, LedgerStore, SqliteLedgerStore, StoreResult};

/// Everything a handler needs, shared behind one `Arc`.
#[derive(Clone)]
pub struct AppServices {
    pub store: Arc<dyn LedgerStore>,
    pub config: AppConfig,
}

impl AppServices {
    pub fn new(store: Arc<dyn LedgerStore>, config: AppConfig) -> Self {
        Self { store, config }
    }

    /// In-memory services (tests/dev), ignoring `config.store`.
    pub fn in_memory(config: AppConfig) -> Self {
        let store = InMemoryLedgerStore::with_options(config.store_options);
        Self::new(Arc::new(store), config)
    }
}

/// Open the configured ledger store backend.
pub async fn build_services(config: AppConfig) -> StoreResult<AppServices> {
    match &config.store {
        StoreBackend::InMemory => {
            tracing::info!("using in-memory ledger store");
            Ok(AppServices::in_memory(config))
        }
        StoreBackend::Sqlite { url } => {
            let store = SqliteLedgerStore::connect(url, config.store_options).await?;
            Ok(AppServices::new(Arc::new(store), config))
        }
    }
}
