use std::path::{Path, PathBuf};

use async_trait::async_trait;
use campus_backend::{ConfigError, SemesterPreferences};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Default, Serialize, Deserialize)]
struct PreferencesFile {
    #[serde(default)]
    current_semester: usize,
    #[serde(flatten)]
    other: Map<String, Value>,
}

/// User preferences stored as a small JSON document.
#[derive(Debug, Clone)]
pub struct JsonPreferences {
    path: PathBuf,
}

impl JsonPreferences {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Index of the semester the user last selected, `0` when unset.
    ///
    /// # Errors
    /// Returns an error when the preferences file exists but cannot be read
    /// or parsed.
    pub async fn current_semester(&self) -> Result<usize, ConfigError> {
        Ok(load(&self.path).await?.current_semester)
    }
}

async fn load(path: &Path) -> Result<PreferencesFile, ConfigError> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => serde_json::from_str(&content)
            .map_err(|error| ConfigError::parse(path.display().to_string(), error)),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            Ok(PreferencesFile::default())
        }
        Err(error) => Err(error.into()),
    }
}

#[async_trait]
impl SemesterPreferences for JsonPreferences {
    async fn set_current_semester(&self, index: usize) -> Result<(), ConfigError> {
        let mut preferences = load(&self.path).await?;
        preferences.current_semester = index;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(&preferences)
            .map_err(|error| ConfigError::parse(self.path.display().to_string(), error))?;
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use campus_backend::SemesterPreferences;

    use super::JsonPreferences;

    #[tokio::test]
    async fn unset_preference_defaults_to_first_semester() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let preferences = JsonPreferences::new(temp_dir.path().join("preferences.json"));

        let index = preferences
            .current_semester()
            .await
            .expect("missing file should read as default");

        assert_eq!(index, 0);
    }

    #[tokio::test]
    async fn set_current_semester_keeps_unrelated_keys() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let path = temp_dir.path().join("preferences.json");
        std::fs::write(&path, r#"{"current_semester": 2, "language": "fr"}"#)
            .expect("preferences should be written");
        let preferences = JsonPreferences::new(&path);

        preferences
            .set_current_semester(0)
            .await
            .expect("preference should be saved");

        assert_eq!(
            preferences
                .current_semester()
                .await
                .expect("preference should load"),
            0
        );
        let raw = std::fs::read_to_string(&path).expect("preferences should be readable");
        assert!(raw.contains("\"language\": \"fr\""));
    }
}
