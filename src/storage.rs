use crate::config::StorageKind;
use crate::errors::AppError;
use crate::models::AppData;
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info};

/// Where the data document lives between restarts.
#[derive(Debug, Clone)]
pub enum Storage {
    File(PathBuf),
    /// Nothing is read or written; data lasts for the process lifetime.
    Memory,
}

impl From<StorageKind> for Storage {
    fn from(kind: StorageKind) -> Self {
        match kind {
            StorageKind::File(path) => Self::File(path),
            StorageKind::Memory => Self::Memory,
        }
    }
}

impl Storage {
    /// Creates the data file's parent directory when needed.
    pub async fn prepare(&self) -> Result<(), std::io::Error> {
        if let Self::File(path) = self {
            if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
                fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }

    /// Missing or unreadable data starts the app empty rather than failing.
    pub async fn load(&self) -> AppData {
        let Self::File(path) = self else {
            return AppData::default();
        };

        match fs::read(path).await {
            Ok(bytes) => match serde_json::from_slice::<AppData>(&bytes) {
                Ok(data) => {
                    info!(path = %path.display(), users = data.users.len(), "loaded data file");
                    data
                }
                Err(err) => {
                    error!("failed to parse data file: {err}");
                    AppData::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => AppData::default(),
            Err(err) => {
                error!("failed to read data file: {err}");
                AppData::default()
            }
        }
    }

    pub async fn persist(&self, data: &AppData) -> Result<(), AppError> {
        let Self::File(path) = self else {
            return Ok(());
        };

        let payload = serde_json::to_vec_pretty(data)?;
        fs::write(path, payload).await?;
        Ok(())
    }
}
