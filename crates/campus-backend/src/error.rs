use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Config store unavailable: {details}")]
    StoreUnavailable { details: String },

    #[error("Configuration file '{name}' does not exist")]
    ConfigFileNotFound { name: String },

    #[error("Download of file {name} failed. Status code: {status_code}")]
    DownloadFailed { name: String, status_code: u16 },

    #[error("Failed to parse {file}: {details}")]
    ParseError { file: String, details: String },

    #[error("IO error ({kind}): {message}")]
    Io {
        kind: std::io::ErrorKind,
        message: String,
    },

    #[error("Network error during {operation} ({stage}): {details}")]
    Network {
        operation: &'static str,
        stage: NetworkStage,
        details: String,
    },

    #[error("Invalid configuration file name: {name}")]
    InvalidFileName { name: String },
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStage {
    #[error("request")]
    Request,
    #[error("response parse")]
    ResponseParse,
}

impl ConfigError {
    pub fn store_unavailable(details: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            details: details.into(),
        }
    }

    pub fn file_not_found(name: impl Into<String>) -> Self {
        Self::ConfigFileNotFound { name: name.into() }
    }

    pub fn download_failed(name: impl Into<String>, status_code: u16) -> Self {
        Self::DownloadFailed {
            name: name.into(),
            status_code,
        }
    }

    pub fn parse<E>(file: impl Into<String>, error: E) -> Self
    where
        E: std::fmt::Display,
    {
        Self::ParseError {
            file: file.into(),
            details: error.to_string(),
        }
    }

    pub fn network_request(operation: &'static str, details: impl Into<String>) -> Self {
        Self::Network {
            operation,
            stage: NetworkStage::Request,
            details: details.into(),
        }
    }

    pub fn network_request_from<E>(operation: &'static str, error: E) -> Self
    where
        E: std::fmt::Display,
    {
        Self::network_request(operation, error.to_string())
    }

    pub fn network_parse_from<E>(operation: &'static str, error: E) -> Self
    where
        E: std::fmt::Display,
    {
        Self::Network {
            operation,
            stage: NetworkStage::ResponseParse,
            details: error.to_string(),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}
