use async_trait::async_trait;
use campus_backend::{ConfigError, RemoteConfigFile, RemoteVersionService};
use log::{debug, info};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct RemoteLocation {
    url: String,
}

#[derive(Debug, Deserialize)]
struct RemoteEntry {
    version: u32,
    #[serde(default)]
    size: u64,
    location: RemoteLocation,
}

/// Queries `<base_url>/config/<app_version>` for the latest config revisions.
#[derive(Debug, Clone)]
pub struct HttpVersionService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpVersionService {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    #[must_use]
    pub fn versions_url(&self, app_version: &str) -> String {
        format!(
            "{}/config/{app_version}",
            self.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl RemoteVersionService for HttpVersionService {
    async fn latest_versions(
        &self,
        app_version: &str,
    ) -> Result<Vec<RemoteConfigFile>, ConfigError> {
        let url = self.versions_url(app_version);
        info!("Retrieving config versions: {url}");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|error| ConfigError::network_request_from("fetch config versions", error))?;

        if !response.status().is_success() {
            let status = response.status();
            let body_snippet = response
                .text()
                .await
                .ok()
                .map(|body| response_snippet(&body, 160))
                .unwrap_or_default();
            return Err(ConfigError::network_request(
                "fetch config versions",
                format!("HTTP {status}{body_snippet}"),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|error| ConfigError::network_request_from("fetch config versions", error))?;
        let files = parse_version_index(&body)?;
        debug!("Server lists {} config file(s)", files.len());
        Ok(files)
    }
}

/// Parse the server's `{name: {version, size, location: {url}}}` index,
/// keeping the order in which the server lists the files.
pub(crate) fn parse_version_index(body: &str) -> Result<Vec<RemoteConfigFile>, ConfigError> {
    let index: serde_json::Map<String, serde_json::Value> = serde_json::from_str(body)
        .map_err(|error| ConfigError::network_parse_from("fetch config versions", error))?;

    index
        .into_iter()
        .map(|(name, entry)| {
            let entry: RemoteEntry = serde_json::from_value(entry).map_err(|error| {
                ConfigError::network_parse_from("fetch config versions", format!("{name}: {error}"))
            })?;
            Ok(RemoteConfigFile {
                name,
                version: entry.version,
                size: entry.size,
                url: entry.location.url,
            })
        })
        .collect()
}

fn response_snippet(body: &str, max_chars: usize) -> String {
    let snippet: String = body.chars().take(max_chars).collect();
    if snippet.is_empty() {
        String::new()
    } else {
        format!(": {snippet}")
    }
}

#[cfg(test)]
mod tests {
    use campus_backend::{ConfigError, NetworkStage};

    use super::{HttpVersionService, parse_version_index, response_snippet};

    #[test]
    fn parse_version_index_keeps_server_order() {
        let body = r#"{
            "/bus.json": {"version": 2, "size": 512, "location": {"url": "https://cdn.example/bus.json"}},
            "/app_config.json": {"version": 7, "size": 2048, "location": {"url": "https://cdn.example/app.json"}}
        }"#;

        let files = parse_version_index(body).expect("index should parse");

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].name, "/bus.json");
        assert_eq!(files[0].url, "https://cdn.example/bus.json");
        assert_eq!(files[1].name, "/app_config.json");
        assert_eq!(files[1].version, 7);
        assert_eq!(files[1].size, 2048);
    }

    #[test]
    fn parse_version_index_rejects_missing_location() {
        let result = parse_version_index(r#"{"/bus.json": {"version": 2, "size": 1}}"#);

        assert!(matches!(
            result,
            Err(ConfigError::Network {
                stage: NetworkStage::ResponseParse,
                ..
            })
        ));
    }

    #[test]
    fn versions_url_joins_base_and_app_version() {
        let client = reqwest::Client::new();
        let service = HttpVersionService::new(client.clone(), "https://config.example/");
        assert_eq!(
            service.versions_url("1.2.0"),
            "https://config.example/config/1.2.0"
        );

        let service = HttpVersionService::new(client, "https://config.example");
        assert_eq!(
            service.versions_url("1.2.0"),
            "https://config.example/config/1.2.0"
        );
    }

    #[test]
    fn response_snippet_truncates_and_prefixes() {
        assert_eq!(response_snippet("", 10), "");
        assert_eq!(response_snippet("not found here", 9), ": not found");
    }
}
