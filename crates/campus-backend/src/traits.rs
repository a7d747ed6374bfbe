use async_trait::async_trait;
use std::path::Path;

use crate::error::ConfigError;
use crate::types::{
    ConfigVersionRecord, DownloadBegin, DownloadProgress, DownloadResult, FileStat,
    RemoteConfigFile,
};

/// Persistent store of config version records.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Acquire a handle to the store.
    ///
    /// # Errors
    /// Returns [`ConfigError::StoreUnavailable`] when the backing storage
    /// cannot be opened.
    async fn open(&self) -> Result<Box<dyn ConfigStoreHandle>, ConfigError>;
}

#[async_trait]
pub trait ConfigStoreHandle: Send + Sync {
    async fn config_versions(&self) -> Result<Vec<ConfigVersionRecord>, ConfigError>;

    /// Insert or overwrite the given records in one batch.
    async fn update_config_versions(
        &self,
        updates: &[ConfigVersionRecord],
    ) -> Result<(), ConfigError>;
}

/// Receives transport-level events for a single download.
pub trait DownloadListener: Send + Sync {
    fn on_begin(&self, begin: &DownloadBegin);
    fn on_progress(&self, progress: &DownloadProgress);
}

pub struct DownloadRequest<'a> {
    pub from_url: &'a str,
    pub to_file: &'a Path,
    pub filename: &'a str,
    pub listener: &'a dyn DownloadListener,
}

/// Filesystem and download primitives used by the configuration manager.
#[async_trait]
pub trait FileTransport: Send + Sync {
    async fn exists(&self, path: &Path) -> Result<bool, ConfigError>;

    async fn read_to_string(&self, path: &Path) -> Result<String, ConfigError>;

    async fn create_dir_all(&self, path: &Path) -> Result<(), ConfigError>;

    async fn remove_file(&self, path: &Path) -> Result<(), ConfigError>;

    async fn remove_dir_all(&self, path: &Path) -> Result<(), ConfigError>;

    async fn move_file(&self, from: &Path, to: &Path) -> Result<(), ConfigError>;

    async fn stat(&self, path: &Path) -> Result<FileStat, ConfigError>;

    /// Download `from_url` into `to_file`.
    ///
    /// A response with a non-success HTTP status is reported through
    /// [`DownloadResult::status_code`], not as an error.
    ///
    /// # Errors
    /// Returns an error when the request cannot be sent or the body cannot be
    /// written to disk.
    async fn download_file(
        &self,
        request: DownloadRequest<'_>,
    ) -> Result<DownloadResult, ConfigError>;

    async fn remove_file_if_exists(&self, path: &Path) -> Result<bool, ConfigError> {
        if self.exists(path).await? {
            self.remove_file(path).await?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

/// Source of truth for the latest published config revisions.
#[async_trait]
pub trait RemoteVersionService: Send + Sync {
    async fn latest_versions(
        &self,
        app_version: &str,
    ) -> Result<Vec<RemoteConfigFile>, ConfigError>;
}

#[async_trait]
pub trait SemesterPreferences: Send + Sync {
    async fn set_current_semester(&self, index: usize) -> Result<(), ConfigError>;
}
