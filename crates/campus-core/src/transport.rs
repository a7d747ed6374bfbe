use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use campus_backend::{
    ConfigError, DownloadBegin, DownloadProgress, DownloadRequest, DownloadResult, FileStat,
    FileTransport,
};
use log::{debug, info, warn};
use tokio::io::AsyncWriteExt;

/// Local filesystem plus HTTP downloads through a shared `reqwest` client.
#[derive(Debug)]
pub struct LocalTransport {
    client: reqwest::Client,
    next_job_id: AtomicU32,
}

impl LocalTransport {
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            next_job_id: AtomicU32::new(1),
        }
    }
}

async fn ensure_parent(path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    Ok(())
}

fn io_with_path(path: &Path, error: &std::io::Error) -> ConfigError {
    ConfigError::Io {
        kind: error.kind(),
        message: format!("{}: {error}", path.display()),
    }
}

#[async_trait]
impl FileTransport for LocalTransport {
    async fn exists(&self, path: &Path) -> Result<bool, ConfigError> {
        tokio::fs::try_exists(path)
            .await
            .map_err(|error| io_with_path(path, &error))
    }

    async fn read_to_string(&self, path: &Path) -> Result<String, ConfigError> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|error| io_with_path(path, &error))
    }

    async fn create_dir_all(&self, path: &Path) -> Result<(), ConfigError> {
        tokio::fs::create_dir_all(path)
            .await
            .map_err(|error| io_with_path(path, &error))
    }

    async fn remove_file(&self, path: &Path) -> Result<(), ConfigError> {
        tokio::fs::remove_file(path)
            .await
            .map_err(|error| io_with_path(path, &error))
    }

    async fn remove_dir_all(&self, path: &Path) -> Result<(), ConfigError> {
        match tokio::fs::remove_dir_all(path).await {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(io_with_path(path, &error)),
        }
    }

    async fn move_file(&self, from: &Path, to: &Path) -> Result<(), ConfigError> {
        ensure_parent(to).await?;
        if tokio::fs::rename(from, to).await.is_ok() {
            return Ok(());
        }

        // Scratch and permanent directories may sit on different devices.
        debug!(
            "Rename {} -> {} failed, falling back to copy",
            from.display(),
            to.display()
        );
        tokio::fs::copy(from, to)
            .await
            .map_err(|error| io_with_path(from, &error))?;
        tokio::fs::remove_file(from)
            .await
            .map_err(|error| io_with_path(from, &error))
    }

    async fn stat(&self, path: &Path) -> Result<FileStat, ConfigError> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|error| io_with_path(path, &error))?;
        Ok(FileStat {
            size: metadata.len(),
        })
    }

    async fn download_file(
        &self,
        request: DownloadRequest<'_>,
    ) -> Result<DownloadResult, ConfigError> {
        use futures_util::StreamExt;

        let job_id = self.next_job_id.fetch_add(1, Ordering::Relaxed);
        let response = self
            .client
            .get(request.from_url)
            .send()
            .await
            .map_err(|error| ConfigError::network_request_from("download config file", error))?;

        let status_code = response.status().as_u16();
        let content_length = response.content_length().unwrap_or(0);
        request.listener.on_begin(&DownloadBegin {
            job_id,
            status_code,
            content_length,
            filename: request.filename.to_string(),
        });

        if !response.status().is_success() {
            warn!(
                "Download of {} returned status {status_code}",
                request.from_url
            );
            return Ok(DownloadResult {
                job_id,
                status_code,
                bytes_written: 0,
            });
        }

        ensure_parent(request.to_file).await?;
        let mut file = tokio::fs::File::create(request.to_file)
            .await
            .map_err(|error| io_with_path(request.to_file, &error))?;

        let mut bytes_written: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk
                .map_err(|error| ConfigError::network_request_from("download stream", error))?;
            file.write_all(&chunk)
                .await
                .map_err(|error| io_with_path(request.to_file, &error))?;
            bytes_written += chunk.len() as u64;
            request.listener.on_progress(&DownloadProgress {
                job_id,
                content_length,
                bytes_written,
            });
        }

        file.flush()
            .await
            .map_err(|error| io_with_path(request.to_file, &error))?;

        info!(
            "Downloaded {} ({bytes_written} bytes)",
            request.to_file.display()
        );
        Ok(DownloadResult {
            job_id,
            status_code,
            bytes_written,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use campus_backend::{
        DownloadBegin, DownloadListener, DownloadProgress, DownloadRequest, FileTransport,
    };
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::LocalTransport;

    #[derive(Default)]
    struct RecordingListener {
        begins: Mutex<Vec<DownloadBegin>>,
        progress: Mutex<Vec<DownloadProgress>>,
    }

    impl DownloadListener for RecordingListener {
        fn on_begin(&self, begin: &DownloadBegin) {
            self.begins.lock().expect("lock").push(begin.clone());
        }

        fn on_progress(&self, progress: &DownloadProgress) {
            self.progress.lock().expect("lock").push(*progress);
        }
    }

    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener should bind");
        let address = listener.local_addr().expect("listener should have address");
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("client should connect");
            let mut buffer = [0_u8; 4096];
            let _ = socket.read(&mut buffer).await;
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        });
        format!("http://{address}/config/bus.json")
    }

    #[tokio::test]
    async fn download_writes_body_and_reports_progress() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let url = serve_once("200 OK", r#"{"name":"OC Transpo"}"#).await;
        let target = temp_dir.path().join("temp/config/bus.json");
        let listener = RecordingListener::default();
        let transport = LocalTransport::new(reqwest::Client::new());

        let result = transport
            .download_file(DownloadRequest {
                from_url: &url,
                to_file: &target,
                filename: "/bus.json",
                listener: &listener,
            })
            .await
            .expect("download should succeed");

        assert_eq!(result.status_code, 200);
        assert_eq!(result.bytes_written, 21);
        let written = std::fs::read_to_string(&target).expect("downloaded file should exist");
        assert_eq!(written, r#"{"name":"OC Transpo"}"#);

        let begins = listener.begins.lock().expect("lock");
        assert_eq!(begins.len(), 1);
        assert_eq!(begins[0].filename, "/bus.json");
        let progress = listener.progress.lock().expect("lock");
        assert_eq!(progress.last().map(|p| p.bytes_written), Some(21));
    }

    #[tokio::test]
    async fn download_reports_error_status_without_writing() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let url = serve_once("404 Not Found", "missing").await;
        let target = temp_dir.path().join("bus.json");
        let listener = RecordingListener::default();
        let transport = LocalTransport::new(reqwest::Client::new());

        let result = transport
            .download_file(DownloadRequest {
                from_url: &url,
                to_file: &target,
                filename: "/bus.json",
                listener: &listener,
            })
            .await
            .expect("error status should not be a transport error");

        assert_eq!(result.status_code, 404);
        assert!(!result.is_ok());
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn move_file_creates_destination_directories() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let source = temp_dir.path().join("temp/app_config.json");
        let destination = temp_dir.path().join("config/nested/app_config.json");
        std::fs::create_dir_all(source.parent().expect("parent")).expect("create source dir");
        std::fs::write(&source, "{}").expect("source should be written");
        let transport = LocalTransport::new(reqwest::Client::new());

        transport
            .move_file(&source, &destination)
            .await
            .expect("move should succeed");

        assert!(!source.exists());
        assert_eq!(
            std::fs::read_to_string(&destination).expect("destination should be readable"),
            "{}"
        );
    }

    #[tokio::test]
    async fn remove_dir_all_ignores_missing_directory() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let transport = LocalTransport::new(reqwest::Client::new());

        transport
            .remove_dir_all(&temp_dir.path().join("never-created"))
            .await
            .expect("missing directory should not fail");
    }

    #[tokio::test]
    async fn stat_reports_file_size() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let path = temp_dir.path().join("hot_spots.json");
        std::fs::write(&path, "[1,2,3]").expect("file should be written");
        let transport = LocalTransport::new(reqwest::Client::new());

        let stat = transport.stat(&path).await.expect("stat should succeed");

        assert_eq!(stat.size, 7);
        assert!(transport.exists(&path).await.expect("exists should succeed"));
    }
}
