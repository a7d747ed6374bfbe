use campus_backend::{
    ConfigVersionRecord, DownloadBegin, DownloadComplete, DownloadListener, DownloadProgress,
    FileUpdate, RemoteConfigFile,
};

type UpdateStartFn = dyn Fn(u64, usize) + Send + Sync;
type DownloadStartFn = dyn Fn(&DownloadBegin) + Send + Sync;
type DownloadProgressFn = dyn Fn(&DownloadProgress) + Send + Sync;
type DownloadCompleteFn = dyn Fn(&DownloadComplete) + Send + Sync;

/// Optional hooks invoked while an update is applied. Unset hooks are skipped.
#[derive(Default)]
pub struct UpdateCallbacks {
    update_start: Option<Box<UpdateStartFn>>,
    download_start: Option<Box<DownloadStartFn>>,
    download_progress: Option<Box<DownloadProgressFn>>,
    download_complete: Option<Box<DownloadCompleteFn>>,
}

impl UpdateCallbacks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Called once with the total byte size and file count of the update.
    #[must_use]
    pub fn on_update_start(mut self, f: impl Fn(u64, usize) + Send + Sync + 'static) -> Self {
        self.update_start = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_download_start(
        mut self,
        f: impl Fn(&DownloadBegin) + Send + Sync + 'static,
    ) -> Self {
        self.download_start = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_download_progress(
        mut self,
        f: impl Fn(&DownloadProgress) + Send + Sync + 'static,
    ) -> Self {
        self.download_progress = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_download_complete(
        mut self,
        f: impl Fn(&DownloadComplete) + Send + Sync + 'static,
    ) -> Self {
        self.download_complete = Some(Box::new(f));
        self
    }

    pub(crate) fn update_start(&self, total_size: u64, total_files: usize) {
        if let Some(f) = &self.update_start {
            f(total_size, total_files);
        }
    }

    pub(crate) fn download_complete(&self, complete: &DownloadComplete) {
        if let Some(f) = &self.download_complete {
            f(complete);
        }
    }
}

impl std::fmt::Debug for UpdateCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateCallbacks")
            .field("update_start", &self.update_start.is_some())
            .field("download_start", &self.download_start.is_some())
            .field("download_progress", &self.download_progress.is_some())
            .field("download_complete", &self.download_complete.is_some())
            .finish()
    }
}

impl DownloadListener for UpdateCallbacks {
    fn on_begin(&self, begin: &DownloadBegin) {
        if let Some(f) = &self.download_start {
            f(begin);
        }
    }

    fn on_progress(&self, progress: &DownloadProgress) {
        if let Some(f) = &self.download_progress {
            f(progress);
        }
    }
}

/// Compare the server's index against local records. A file is pending when
/// it has no local record or its local version is strictly older.
#[must_use]
pub fn plan_updates(local: &[ConfigVersionRecord], remote: &[RemoteConfigFile]) -> Vec<FileUpdate> {
    remote
        .iter()
        .filter_map(|file| {
            match local.iter().find(|record| record.name == file.name) {
                None => Some(FileUpdate::from_remote(file, 0)),
                Some(record) if record.version < file.version => {
                    Some(FileUpdate::from_remote(file, record.version))
                }
                Some(_) => None,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    use campus_backend::{
        ConfigVersionRecord, DownloadBegin, DownloadListener, FileUpdate, RemoteConfigFile,
    };

    use super::{UpdateCallbacks, plan_updates};

    fn remote(name: &str, version: u32) -> RemoteConfigFile {
        RemoteConfigFile {
            name: name.to_string(),
            version,
            size: 100,
            url: format!("https://cdn.example{name}"),
        }
    }

    #[test]
    fn unknown_files_are_pending_from_version_zero() {
        let updates = plan_updates(&[], &[remote("/app_config.json", 3)]);

        assert_eq!(
            updates,
            vec![FileUpdate {
                name: "/app_config.json".to_string(),
                url: "https://cdn.example/app_config.json".to_string(),
                size: 100,
                old_version: 0,
                new_version: 3,
            }]
        );
    }

    #[test]
    fn only_strictly_newer_versions_are_pending() {
        let local = vec![
            ConfigVersionRecord::new("/app_config.json", 3),
            ConfigVersionRecord::new("/bus.json", 5),
            ConfigVersionRecord::new("/hot_spots.json", 1),
        ];
        let remote_files = vec![
            remote("/app_config.json", 3),
            remote("/bus.json", 4),
            remote("/hot_spots.json", 2),
        ];

        let updates = plan_updates(&local, &remote_files);

        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].name, "/hot_spots.json");
        assert_eq!(updates[0].old_version, 1);
        assert_eq!(updates[0].new_version, 2);
    }

    #[test]
    fn matching_versions_leave_nothing_pending() {
        let local = vec![ConfigVersionRecord::new("/app_config.json", 3)];

        assert!(plan_updates(&local, &[remote("/app_config.json", 3)]).is_empty());
    }

    #[test]
    fn unset_callbacks_are_skipped() {
        let callbacks = UpdateCallbacks::new();

        callbacks.update_start(10, 1);
        callbacks.on_begin(&DownloadBegin {
            job_id: 1,
            status_code: 200,
            content_length: 10,
            filename: "/bus.json".to_string(),
        });
    }

    #[test]
    fn set_callbacks_receive_values() {
        let total = Arc::new(AtomicU64::new(0));
        let seen = Arc::clone(&total);
        let callbacks = UpdateCallbacks::new()
            .on_update_start(move |size, files| seen.store(size * files as u64, Ordering::SeqCst));

        callbacks.update_start(512, 2);

        assert_eq!(total.load(Ordering::SeqCst), 1024);
        assert!(format!("{callbacks:?}").contains("update_start: true"));
    }
}
