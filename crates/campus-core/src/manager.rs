use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use campus_backend::{
    APP_CONFIG, AppConfig, BusInfo, ConfigError, ConfigStore, ConfigVersionRecord,
    DownloadComplete, DownloadRequest, FileTransport, FileUpdate, RemoteVersionService, Semester,
    SemesterPreferences, University, is_app_config, normalize_config_name,
};
use campus_platform::AppPaths;
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use tokio::sync::watch;

use crate::update::{UpdateCallbacks, plan_updates};

/// Link handed out in place of a missing one.
pub const DEFAULT_LINK: &str = "http://www.uottawa.ca/";

/// External services the manager delegates to.
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn ConfigStore>,
    pub transport: Arc<dyn FileTransport>,
    pub remote: Arc<dyn RemoteVersionService>,
    pub preferences: Arc<dyn SemesterPreferences>,
}

#[derive(Debug, Clone)]
pub struct ManagerOptions {
    /// Permanent home of the config files.
    pub config_dir: PathBuf,
    /// Download scratch space, removed after every applied update.
    pub temp_dir: PathBuf,
    /// Version of this client, sent to the server when checking for updates.
    pub app_version: String,
    /// Wipe config files and version records before the first load.
    /// Only honored in debug builds.
    pub clear_config_on_start: bool,
}

impl ManagerOptions {
    pub fn from_paths(paths: &AppPaths, app_version: impl Into<String>) -> Self {
        Self {
            config_dir: paths.config_files_dir(),
            temp_dir: paths.temp_config_dir(),
            app_version: app_version.into(),
            clear_config_on_start: false,
        }
    }
}

#[derive(Debug, Default)]
struct ParsedConfiguration {
    university: Option<University>,
    city_buses: Option<BusInfo>,
    available_semesters: Vec<Semester>,
}

enum InitState {
    Idle,
    Initializing(watch::Receiver<Option<bool>>),
}

struct Inner {
    collaborators: Collaborators,
    options: ManagerOptions,
    parsed: Mutex<ParsedConfiguration>,
    init_state: Mutex<InitState>,
    pending: Mutex<Vec<FileUpdate>>,
    checked_for_update: AtomicBool,
    clear_on_start: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Ends an initialization attempt when dropped, including when the load
/// unwinds, so the next `init()` starts a fresh attempt.
struct SettleInit {
    inner: Arc<Inner>,
    sender: watch::Sender<Option<bool>>,
    result: bool,
}

impl Drop for SettleInit {
    fn drop(&mut self) {
        *lock(&self.inner.init_state) = InitState::Idle;
        let _ = self.sender.send(Some(self.result));
    }
}

/// Owns the in-memory configuration and keeps the on-disk config files in
/// sync with the server.
///
/// Cloning is cheap; clones share the same state.
#[derive(Clone)]
pub struct ConfigurationManager {
    inner: Arc<Inner>,
}

impl ConfigurationManager {
    #[must_use]
    pub fn new(collaborators: Collaborators, options: ManagerOptions) -> Self {
        let clear_on_start = options.clear_config_on_start;
        Self {
            inner: Arc::new(Inner {
                collaborators,
                options,
                parsed: Mutex::new(ParsedConfiguration::default()),
                init_state: Mutex::new(InitState::Idle),
                pending: Mutex::new(Vec::new()),
                checked_for_update: AtomicBool::new(false),
                clear_on_start: AtomicBool::new(clear_on_start),
            }),
        }
    }

    /// Load the configuration from disk if it is not loaded yet.
    ///
    /// Returns `true` when a complete configuration is available. Concurrent
    /// callers share a single load and all receive its result. Failures are
    /// logged and reported as `false`.
    pub async fn init(&self) -> bool {
        let mut receiver = {
            let mut state = lock(&self.inner.init_state);
            if lock(&self.inner.parsed).university.is_some() {
                return true;
            }

            match &*state {
                InitState::Initializing(receiver) => receiver.clone(),
                InitState::Idle => {
                    let (sender, receiver) = watch::channel(None);
                    *state = InitState::Initializing(receiver.clone());

                    let inner = Arc::clone(&self.inner);
                    tokio::spawn(async move {
                        let mut settle = SettleInit {
                            inner: Arc::clone(&inner),
                            sender,
                            result: false,
                        };
                        settle.result = match inner.request_config().await {
                            Ok(true) => {
                                info!("Configuration successfully loaded.");
                                true
                            }
                            Ok(false) => {
                                info!("Configuration could not be found.");
                                false
                            }
                            Err(error) => {
                                warn!("Error while getting configuration: {error}");
                                false
                            }
                        };
                    });

                    receiver
                }
            }
        };

        receiver
            .wait_for(Option::is_some)
            .await
            .map(|result| (*result).unwrap_or(false))
            .unwrap_or(false)
    }

    /// Ask the server whether any config file has a newer revision.
    ///
    /// Records that a check happened and replaces the pending update list.
    ///
    /// # Errors
    /// Returns an error when the store cannot be read or the server cannot
    /// be reached or parsed.
    pub async fn is_config_update_available(&self) -> Result<bool, ConfigError> {
        self.inner.checked_for_update.store(true, Ordering::SeqCst);

        let store = self.inner.collaborators.store.open().await?;
        let local = store.config_versions().await?;
        let remote = self
            .inner
            .collaborators
            .remote
            .latest_versions(&self.inner.options.app_version)
            .await?;

        let updates = plan_updates(&local, &remote);
        for update in &updates {
            debug!(
                "Update available for {}: {} -> {}",
                update.name, update.old_version, update.new_version
            );
        }
        let available = !updates.is_empty();
        *lock(&self.inner.pending) = updates;
        Ok(available)
    }

    /// Download and install every pending update, then reload.
    ///
    /// Does nothing when no update is pending. Downloads run one at a time
    /// into the temp directory; nothing is installed or recorded unless all of
    /// them succeed.
    ///
    /// # Errors
    /// Returns an error when a download, filesystem, or store operation fails.
    /// Files already installed before the failure are not rolled back.
    pub async fn update_config(&self, callbacks: &UpdateCallbacks) -> Result<(), ConfigError> {
        let updates = lock(&self.inner.pending).clone();
        if updates.is_empty() {
            return Ok(());
        }

        let transport = &self.inner.collaborators.transport;
        let options = &self.inner.options;
        transport.create_dir_all(&options.config_dir).await?;
        transport.create_dir_all(&options.temp_dir).await?;

        let total_size: u64 = updates.iter().map(|update| update.size).sum();
        info!(
            "Updating {} config file(s), {total_size} bytes",
            updates.len()
        );
        callbacks.update_start(total_size, updates.len());

        for update in &updates {
            let temp_path = resolve_config_path(&options.temp_dir, &update.name)?;

            let result = transport
                .download_file(DownloadRequest {
                    from_url: &update.url,
                    to_file: &temp_path,
                    filename: &update.name,
                    listener: callbacks,
                })
                .await?;
            if !result.is_ok() {
                return Err(ConfigError::download_failed(
                    &update.name,
                    result.status_code,
                ));
            }

            let stat = transport.stat(&temp_path).await?;
            callbacks.download_complete(&DownloadComplete {
                job_id: result.job_id,
                status_code: result.status_code,
                bytes_written: stat.size,
                filename: update.name.clone(),
            });

            if is_app_config(&update.name) {
                // A new semester list invalidates the stored selection.
                if let Err(error) = self
                    .inner
                    .collaborators
                    .preferences
                    .set_current_semester(0)
                    .await
                {
                    warn!("Failed to reset current semester: {error}");
                }
            }
        }

        let mut records = Vec::with_capacity(updates.len());
        for update in &updates {
            let temp_path = resolve_config_path(&options.temp_dir, &update.name)?;
            let config_path = resolve_config_path(&options.config_dir, &update.name)?;

            transport.remove_file_if_exists(&config_path).await?;
            transport.move_file(&temp_path, &config_path).await?;

            records.push(ConfigVersionRecord::new(&update.name, update.new_version));
        }

        transport.remove_dir_all(&options.temp_dir).await?;

        let store = self.inner.collaborators.store.open().await?;
        store.update_config_versions(&records).await?;
        lock(&self.inner.pending).clear();
        info!("Installed {} config file(s)", records.len());

        *lock(&self.inner.parsed) = ParsedConfiguration::default();
        self.init().await;
        Ok(())
    }

    /// Read and parse a config file from disk. Not cached.
    ///
    /// # Errors
    /// Returns [`ConfigError::ConfigFileNotFound`] when the file does not
    /// exist, or a parse/IO error when it cannot be read.
    pub async fn get_config(&self, name: &str) -> Result<serde_json::Value, ConfigError> {
        self.inner.read_json(name).await
    }

    /// Remove every known config file and reset all version records to 0.
    ///
    /// # Errors
    /// Returns an error when the store cannot be opened or updated. Missing
    /// files are ignored.
    pub async fn delete_configuration(&self) -> Result<(), ConfigError> {
        self.inner.delete_configuration().await?;
        *lock(&self.inner.parsed) = ParsedConfiguration::default();
        Ok(())
    }

    /// Wait for any in-flight load, then drop all in-memory state.
    pub async fn shutdown(&self) {
        let in_flight = match &*lock(&self.inner.init_state) {
            InitState::Initializing(receiver) => Some(receiver.clone()),
            InitState::Idle => None,
        };
        if let Some(mut receiver) = in_flight {
            let _ = receiver.wait_for(Option::is_some).await;
        }

        *lock(&self.inner.parsed) = ParsedConfiguration::default();
        lock(&self.inner.pending).clear();
        self.inner.checked_for_update.store(false, Ordering::SeqCst);
        debug!("Configuration manager shut down");
    }

    #[must_use]
    pub fn university(&self) -> Option<University> {
        lock(&self.inner.parsed).university.clone()
    }

    #[must_use]
    pub fn city_bus_info(&self) -> Option<BusInfo> {
        lock(&self.inner.parsed).city_buses.clone()
    }

    #[must_use]
    pub fn available_semesters(&self) -> Vec<Semester> {
        lock(&self.inner.parsed).available_semesters.clone()
    }

    #[must_use]
    pub fn semester(&self, index: usize) -> Option<Semester> {
        lock(&self.inner.parsed)
            .available_semesters
            .get(index)
            .cloned()
    }

    #[must_use]
    pub fn default_link(&self) -> &'static str {
        DEFAULT_LINK
    }

    #[must_use]
    pub fn did_check_for_update(&self) -> bool {
        self.inner.checked_for_update.load(Ordering::SeqCst)
    }

    pub fn set_checked_for_update(&self, checked: bool) {
        self.inner
            .checked_for_update
            .store(checked, Ordering::SeqCst);
    }

    /// Updates found by the last successful check and not yet applied.
    #[must_use]
    pub fn pending_updates(&self) -> Vec<FileUpdate> {
        lock(&self.inner.pending).clone()
    }
}

impl Inner {
    async fn request_config(&self) -> Result<bool, ConfigError> {
        if cfg!(debug_assertions) && self.clear_on_start.swap(false, Ordering::SeqCst) {
            warn!("Clearing configuration on start");
            if let Err(error) = self.delete_configuration().await {
                warn!("Error accessing store while clearing versions: {error}");
            }
        }

        let store = self.collaborators.store.open().await?;
        let versions = store.config_versions().await?;
        if versions.is_empty() {
            return Ok(false);
        }

        // A partial configuration is never accepted.
        let mut config_available = true;
        for record in &versions {
            let path = resolve_config_path(&self.options.config_dir, &record.name)?;
            if !self.collaborators.transport.exists(&path).await? {
                debug!("Config file {} is missing", record.name);
                config_available = false;
            }
        }
        if !config_available {
            return Ok(false);
        }

        let app_config: AppConfig = self.read_json(APP_CONFIG).await?;
        *lock(&self.parsed) = ParsedConfiguration {
            university: app_config.university,
            city_buses: app_config.bus,
            available_semesters: app_config.semesters,
        };
        Ok(true)
    }

    async fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<T, ConfigError> {
        let path = resolve_config_path(&self.options.config_dir, name)?;
        let transport = &self.collaborators.transport;
        if !transport.exists(&path).await? {
            return Err(ConfigError::file_not_found(name));
        }

        let raw = transport.read_to_string(&path).await?;
        serde_json::from_str(&raw).map_err(|error| ConfigError::parse(name, error))
    }

    async fn delete_configuration(&self) -> Result<(), ConfigError> {
        let store = self.collaborators.store.open().await?;
        let versions = store.config_versions().await?;

        let mut cleared = Vec::with_capacity(versions.len());
        for record in versions {
            match resolve_config_path(&self.options.config_dir, &record.name) {
                Ok(path) => {
                    if let Err(error) = self.collaborators.transport.remove_file(&path).await {
                        debug!("Could not remove {}: {error}", path.display());
                    }
                }
                Err(error) => debug!("Skipping {}: {error}", record.name),
            }
            cleared.push(ConfigVersionRecord::new(record.name, 0));
        }

        store.update_config_versions(&cleared).await
    }
}

/// Join a config file name onto `dir`, refusing names that would escape it.
pub(crate) fn resolve_config_path(dir: &Path, name: &str) -> Result<PathBuf, ConfigError> {
    let relative = Path::new(normalize_config_name(name));
    let is_plain = relative.components().next().is_some()
        && relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
    if !is_plain {
        return Err(ConfigError::InvalidFileName {
            name: name.to_string(),
        });
    }
    Ok(dir.join(relative))
}
