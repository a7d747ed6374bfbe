use std::path::Path;

use campus_platform::AppPaths;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_server_url")]
    pub server_url: String,

    #[serde(default = "default_app_version")]
    pub app_version: String,

    #[serde(default)]
    pub debug_logging: bool,

    #[serde(default = "default_max_log_size_bytes")]
    pub max_log_size_bytes: u64,

    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// Only honored by debug builds.
    #[serde(default)]
    pub clear_config_on_start: bool,
}

fn default_server_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_app_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_max_log_size_bytes() -> u64 {
    5 * 1024 * 1024
}

fn default_http_timeout() -> u64 {
    30
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            app_version: default_app_version(),
            debug_logging: false,
            max_log_size_bytes: default_max_log_size_bytes(),
            http_timeout_secs: default_http_timeout(),
            clear_config_on_start: false,
        }
    }
}

impl AppSettings {
    pub fn load(paths: &AppPaths) -> Self {
        Self::load_from_path(&paths.settings_file())
    }

    fn load_from_path(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|error| {
                log::warn!("Ignoring invalid settings file {}: {error}", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self, paths: &AppPaths) -> Result<(), std::io::Error> {
        paths.ensure_dirs()?;
        self.save_to_path(&paths.settings_file())
    }

    fn save_to_path(&self, path: &Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::AppSettings;

    #[test]
    fn app_settings_defaults_match_expected_values() {
        let settings = AppSettings::default();

        assert_eq!(settings.server_url, "http://localhost:8080");
        assert_eq!(settings.app_version, env!("CARGO_PKG_VERSION"));
        assert_eq!(settings.http_timeout_secs, 30);
        assert_eq!(settings.max_log_size_bytes, 5 * 1024 * 1024);
        assert!(!settings.debug_logging);
        assert!(!settings.clear_config_on_start);
    }

    #[test]
    fn partial_settings_fill_in_defaults() {
        let value = json!({ "server_url": "https://config.example", "debug_logging": true });

        let settings: AppSettings =
            serde_json::from_value(value).expect("settings JSON should deserialize");

        assert_eq!(settings.server_url, "https://config.example");
        assert!(settings.debug_logging);
        assert_eq!(settings.http_timeout_secs, 30);
    }

    #[test]
    fn invalid_settings_file_falls_back_to_defaults() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let path = temp_dir.path().join("settings.json");
        std::fs::write(&path, "{not-valid-json").expect("invalid file should be written");

        assert_eq!(AppSettings::load_from_path(&path), AppSettings::default());
    }

    #[test]
    fn save_and_load_round_trip() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let path = temp_dir.path().join("settings.json");
        let settings = AppSettings {
            app_version: "3.0.1".to_string(),
            http_timeout_secs: 5,
            ..AppSettings::default()
        };

        settings.save_to_path(&path).expect("settings should save");

        assert_eq!(AppSettings::load_from_path(&path), settings);
    }
}
