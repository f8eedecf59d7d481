use thiserror::Error;

/// Terminal failures of a launcher run. None of these are retried, every
/// variant ends the current run and is rendered as a status message.
#[derive(Debug, Error)]
pub enum LauncherError {
    #[error("install permission denied")]
    Permission,

    #[error("network error: {detail}")]
    Network { status: Option<u16>, detail: String },

    #[error("version info unparseable")]
    Parse,

    #[error("storage error: {0}")]
    Storage(String),

    #[error("launch error: {0}")]
    Launch(String),
}

impl LauncherError {
    pub fn http_status(status: u16) -> LauncherError {
        LauncherError::Network {
            status: Some(status),
            detail: format!("HTTP status {status}"),
        }
    }

    pub fn transport(detail: impl std::fmt::Display) -> LauncherError {
        LauncherError::Network {
            status: None,
            detail: detail.to_string(),
        }
    }
}
