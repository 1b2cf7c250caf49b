use std::path::PathBuf;

use async_trait::async_trait;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum PhotoStoreError {
    #[error("Invalid photo name: {0}")]
    InvalidName(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait PhotoStore: Send + Sync {
    /// Persists the bytes under `name`, replacing any previous photo of that name
    async fn save(&self, name: &str, bytes: &[u8]) -> Result<(), PhotoStoreError>;
}

/// Stores photos as files in the configured upload directory
#[derive(Debug, Clone)]
pub struct LocalPhotoStore {
    directory: PathBuf,
}

impl LocalPhotoStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && name.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

#[async_trait]
impl PhotoStore for LocalPhotoStore {
    async fn save(&self, name: &str, bytes: &[u8]) -> Result<(), PhotoStoreError> {
        if !is_plain_file_name(name) {
            return Err(PhotoStoreError::InvalidName(name.to_string()));
        }
        tokio::fs::create_dir_all(&self.directory).await?;
        let path = self.directory.join(name);
        tokio::fs::write(&path, bytes).await?;
        info!(path = %path.display(), size = bytes.len(), "stored photo");
        Ok(())
    }
}
