#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppErrorDetail {
    Message(String),
    Io {
        kind: std::io::ErrorKind,
        message: String,
    },
    Config(campus_backend::ConfigError),
}

impl std::fmt::Display for AppErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Message(message) => write!(f, "{message}"),
            Self::Io { kind, message } => write!(f, "{kind}: {message}"),
            Self::Config(error) => write!(f, "{error}"),
        }
    }
}

impl From<std::io::Error> for AppErrorDetail {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

impl From<campus_backend::ConfigError> for AppErrorDetail {
    fn from(value: campus_backend::ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<campus_platform::AppPathsError> for AppErrorDetail {
    fn from(value: campus_platform::AppPathsError) -> Self {
        Self::Message(value.to_string())
    }
}

impl From<serde_json::Error> for AppErrorDetail {
    fn from(value: serde_json::Error) -> Self {
        Self::Message(value.to_string())
    }
}

impl From<crate::lock::LockError> for AppErrorDetail {
    fn from(value: crate::lock::LockError) -> Self {
        Self::Message(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    EnvironmentUnavailable {
        reason: AppErrorDetail,
    },
    ConfigurationUnavailable,
    UpdateCheckFailed {
        details: AppErrorDetail,
    },
    UpdateFailed {
        phase: &'static str,
        details: AppErrorDetail,
    },
    OperationFailed {
        operation: &'static str,
        details: AppErrorDetail,
    },
}

impl AppError {
    pub fn environment_unavailable(reason: impl Into<AppErrorDetail>) -> Self {
        Self::EnvironmentUnavailable {
            reason: reason.into(),
        }
    }

    pub fn update_check_failed(details: impl Into<AppErrorDetail>) -> Self {
        Self::UpdateCheckFailed {
            details: details.into(),
        }
    }

    pub fn update_failed(phase: &'static str, details: impl Into<AppErrorDetail>) -> Self {
        Self::UpdateFailed {
            phase,
            details: details.into(),
        }
    }

    pub fn operation_failed(operation: &'static str, details: impl Into<AppErrorDetail>) -> Self {
        Self::OperationFailed {
            operation,
            details: details.into(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EnvironmentUnavailable { reason } => {
                write!(f, "Environment unavailable: {reason}")
            }
            Self::ConfigurationUnavailable => {
                write!(f, "No configuration is available. Run `campus update` first.")
            }
            Self::UpdateCheckFailed { details } => {
                write!(f, "Failed to check for configuration updates: {details}")
            }
            Self::UpdateFailed { phase, details } => {
                write!(f, "Configuration update failed during {phase}: {details}")
            }
            Self::OperationFailed { operation, details } => {
                write!(f, "{operation} failed: {details}")
            }
        }
    }
}

impl std::error::Error for AppError {}
