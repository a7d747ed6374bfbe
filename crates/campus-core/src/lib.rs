//! Configuration sync for the campus app.
//!
//! This crate keeps the app's downloadable configuration files current:
//! - Loading the primary app config into memory with coalesced initialization.
//! - Detecting newer config revisions on the server.
//! - Downloading and installing updated files with progress callbacks.
//! - Local implementations of the store, transport, remote index and
//!   preference collaborators.

mod manager;
mod preferences;
mod remote;
mod store;
mod transport;
mod update;

use std::sync::Arc;

use campus_platform::AppPaths;

/// Configuration manager, its collaborators and construction options.
pub use manager::{Collaborators, ConfigurationManager, DEFAULT_LINK, ManagerOptions};
/// JSON-file user preferences.
pub use preferences::JsonPreferences;
/// HTTP client for the server's config version index.
pub use remote::HttpVersionService;
/// JSON-file store of config version records.
pub use store::JsonConfigStore;
/// Local filesystem and `reqwest` download transport.
pub use transport::LocalTransport;
/// Update callbacks and pending-update planning.
pub use update::{UpdateCallbacks, plan_updates};

impl Collaborators {
    /// Collaborators backed by the local filesystem under `paths` and the
    /// config server at `server_url`.
    pub fn local(paths: &AppPaths, client: &reqwest::Client, server_url: impl Into<String>) -> Self {
        Self {
            store: Arc::new(JsonConfigStore::new(paths.version_records_file())),
            transport: Arc::new(LocalTransport::new(client.clone())),
            remote: Arc::new(HttpVersionService::new(client.clone(), server_url)),
            preferences: Arc::new(JsonPreferences::new(paths.preferences_file())),
        }
    }
}
