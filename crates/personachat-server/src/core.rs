use std::sync::Arc;

use personachat_relay::ChatClient;
use personachat_storage::Storage;

/// Core application state shared across all API handlers.
pub struct AppCore {
    pub storage: Arc<Storage>,
    pub relay: Arc<dyn ChatClient>,
}

impl AppCore {
    pub fn new(db_path: &str, relay: Arc<dyn ChatClient>) -> anyhow::Result<Self> {
        let storage = Arc::new(Storage::new(db_path)?);
        Ok(Self { storage, relay })
    }
}

/// Application state shared across all API handlers.
pub type AppState = Arc<AppCore>;
