use crate::models::AppData;
use crate::storage::Storage;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub storage: Storage,
    pub data: Arc<Mutex<AppData>>,
}

impl AppState {
    pub fn new(storage: Storage, data: AppData) -> Self {
        Self {
            storage,
            data: Arc::new(Mutex::new(data)),
        }
    }

    /// Empty, memory-only state.
    pub fn ephemeral() -> Self {
        Self::new(Storage::Memory, AppData::default())
    }
}
