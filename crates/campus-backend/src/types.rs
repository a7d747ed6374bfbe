use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name of the primary configuration file, relative to the config directory.
pub const APP_CONFIG: &str = "app_config.json";

pub const HTTP_OK: u16 = 200;

/// Strips the leading separator the remote index puts on file names
/// (`/app_config.json`), so names can be joined onto a directory.
#[must_use]
pub fn normalize_config_name(name: &str) -> &str {
    name.trim_start_matches('/')
}

#[must_use]
pub fn is_app_config(name: &str) -> bool {
    normalize_config_name(name) == APP_CONFIG
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigVersionRecord {
    pub name: String,
    pub version: u32,
}

impl ConfigVersionRecord {
    pub fn new(name: impl Into<String>, version: u32) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }
}

/// Latest published revision of one config file, as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfigFile {
    pub name: String,
    pub version: u32,
    pub size: u64,
    pub url: String,
}

/// A config file whose remote revision is newer than the one on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpdate {
    pub name: String,
    pub url: String,
    pub size: u64,
    pub old_version: u32,
    pub new_version: u32,
}

impl FileUpdate {
    #[must_use]
    pub fn from_remote(remote: &RemoteConfigFile, old_version: u32) -> Self {
        Self {
            name: remote.name.clone(),
            url: remote.url.clone(),
            size: remote.size,
            old_version,
            new_version: remote.version,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadBegin {
    pub job_id: u32,
    pub status_code: u16,
    pub content_length: u64,
    pub filename: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    pub job_id: u32,
    pub content_length: u64,
    pub bytes_written: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadResult {
    pub job_id: u32,
    pub status_code: u16,
    pub bytes_written: u64,
}

impl DownloadResult {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status_code == HTTP_OK
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadComplete {
    pub job_id: u32,
    pub status_code: u16,
    pub bytes_written: u64,
    pub filename: String,
}

fn str_field<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    fields.get(key).and_then(Value::as_str)
}

/// University section of the app config, kept exactly as published.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct University(Map<String, Value>);

impl University {
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        str_field(&self.0, "name")
    }

    #[must_use]
    pub fn short_name(&self) -> Option<&str> {
        str_field(&self.0, "short_name")
    }
}

/// City bus section of the app config, kept exactly as published.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusInfo(Map<String, Value>);

impl BusInfo {
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        str_field(&self.0, "name")
    }

    #[must_use]
    pub fn link(&self) -> Option<&str> {
        str_field(&self.0, "link")
    }
}

/// One semester entry. No key is required; entries are kept as published.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Semester(Map<String, Value>);

impl Semester {
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        str_field(&self.0, "code")
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        str_field(&self.0, "name")
    }

    #[must_use]
    pub fn is_current(&self) -> bool {
        self.0.get("current").and_then(Value::as_bool).unwrap_or(false)
    }
}

/// Contents of the primary app config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub university: Option<University>,
    #[serde(default)]
    pub bus: Option<BusInfo>,
    #[serde(default)]
    pub semesters: Vec<Semester>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_leading_separators_only() {
        assert_eq!(normalize_config_name("/app_config.json"), "app_config.json");
        assert_eq!(normalize_config_name("maps/hot_spots.json"), "maps/hot_spots.json");
    }

    #[test]
    fn app_config_detection_accepts_both_spellings() {
        assert!(is_app_config("/app_config.json"));
        assert!(is_app_config("app_config.json"));
        assert!(!is_app_config("/bus.json"));
    }

    #[test]
    fn app_config_keeps_unknown_keys_and_semester_order() {
        let raw = r#"{
            "university": {"name": "University of Ottawa", "short_name": "uOttawa", "lat": 45.4231},
            "bus": {"name": "OC Transpo", "link": "http://www.octranspo.com/"},
            "semesters": [
                {"code": "201709", "name": "Fall 2017", "current": true},
                {"code": "201801", "name": "Winter 2018"},
                {"code": "201805", "name": "Summer 2018", "weeks": 12}
            ]
        }"#;

        let config: AppConfig = serde_json::from_str(raw).expect("app config should parse");

        let university = config.university.expect("university should be present");
        assert_eq!(university.short_name(), Some("uOttawa"));
        let codes: Vec<Option<&str>> = config.semesters.iter().map(Semester::code).collect();
        assert_eq!(codes, [Some("201709"), Some("201801"), Some("201805")]);
        assert!(config.semesters[0].is_current());
        assert!(!config.semesters[1].is_current());
        let third = serde_json::to_value(&config.semesters[2]).expect("semester should serialize");
        assert_eq!(third["weeks"], 12);
    }

    #[test]
    fn semesters_without_code_or_name_are_accepted_and_kept_verbatim() {
        let raw = r#"{
            "university": {"short_name": "U"},
            "bus": {"name": "B"},
            "semesters": [{"name": "Fall 2017", "year": 2017}, {"code": 201801}]
        }"#;

        let config: AppConfig = serde_json::from_str(raw).expect("app config should parse");

        assert_eq!(config.semesters.len(), 2);
        assert_eq!(config.semesters[0].code(), None);
        assert_eq!(config.semesters[0].name(), Some("Fall 2017"));
        assert_eq!(config.semesters[1].code(), None);
        assert_eq!(config.university.as_ref().and_then(University::name), None);

        let written = serde_json::to_value(&config).expect("app config should serialize");
        let original: Value = serde_json::from_str(raw).expect("raw JSON should parse");
        assert_eq!(written, original);
    }

    #[test]
    fn app_config_tolerates_missing_sections() {
        let config: AppConfig = serde_json::from_str("{}").expect("empty object should parse");
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn download_result_only_accepts_ok_status() {
        let ok = DownloadResult {
            job_id: 1,
            status_code: 200,
            bytes_written: 10,
        };
        let partial = DownloadResult {
            status_code: 206,
            ..ok
        };
        assert!(ok.is_ok());
        assert!(!partial.is_ok());
    }
}
