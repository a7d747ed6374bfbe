use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use campus_backend::{ConfigError, ConfigStore, ConfigStoreHandle, ConfigVersionRecord};
use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

#[derive(Debug, Default, Serialize, Deserialize)]
struct VersionFile {
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    records: Vec<ConfigVersionRecord>,
}

/// Version records kept in a single JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonConfigStore {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl JsonConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }
}

#[async_trait]
impl ConfigStore for JsonConfigStore {
    async fn open(&self) -> Result<Box<dyn ConfigStoreHandle>, ConfigError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|error| ConfigError::store_unavailable(error.to_string()))?;
        }

        // Refuse a corrupt file up front rather than on first read.
        load_version_file(&self.path)
            .await
            .map_err(|error| ConfigError::store_unavailable(error.to_string()))?;

        Ok(Box::new(JsonStoreHandle {
            path: self.path.clone(),
            write_lock: Arc::clone(&self.write_lock),
        }))
    }
}

struct JsonStoreHandle {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

#[async_trait]
impl ConfigStoreHandle for JsonStoreHandle {
    async fn config_versions(&self) -> Result<Vec<ConfigVersionRecord>, ConfigError> {
        Ok(load_version_file(&self.path).await?.records)
    }

    async fn update_config_versions(
        &self,
        updates: &[ConfigVersionRecord],
    ) -> Result<(), ConfigError> {
        let _guard = self.write_lock.lock().await;

        let mut file = load_version_file(&self.path).await?;
        for update in updates {
            match file.records.iter_mut().find(|r| r.name == update.name) {
                Some(record) => record.version = update.version,
                None => file.records.push(update.clone()),
            }
        }
        file.updated_at = Some(Utc::now());

        let data = serde_json::to_vec_pretty(&file)
            .map_err(|error| ConfigError::parse(self.path.display().to_string(), error))?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || persist_records(&path, &data))
            .await
            .map_err(|error| ConfigError::from(std::io::Error::other(error)))??;

        debug!(
            "Stored {} config version record(s) in {}",
            updates.len(),
            self.path.display()
        );
        Ok(())
    }
}

async fn load_version_file(path: &Path) -> Result<VersionFile, ConfigError> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => serde_json::from_str(&content)
            .map_err(|error| ConfigError::parse(path.display().to_string(), error)),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(VersionFile::default()),
        Err(error) => Err(error.into()),
    }
}

/// Replace the record file in one rename so readers never see a partial
/// document.
fn persist_records(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut staged = tempfile::Builder::new()
        .prefix(".config_versions")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    staged.write_all(data)?;
    staged.as_file().sync_all()?;
    staged.persist(path).map_err(|error| error.error)?;
    Ok(())
}
