mod error;
mod traits;
mod types;

pub use error::{ConfigError, NetworkStage};
pub use traits::{
    ConfigStore, ConfigStoreHandle, DownloadListener, DownloadRequest, FileTransport,
    RemoteVersionService, SemesterPreferences,
};
pub use types::{
    APP_CONFIG, AppConfig, BusInfo, ConfigVersionRecord, DownloadBegin, DownloadComplete,
    DownloadProgress, DownloadResult, FileStat, FileUpdate, HTTP_OK, RemoteConfigFile, Semester,
    University, is_app_config, normalize_config_name,
};
