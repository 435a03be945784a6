use thiserror::Error;

pub use anyhow::Context;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
    #[error(transparent)]
    Url(#[from] url::ParseError),
    #[error("an export is already in progress")]
    JobActive,
    #[error("not signed in; run `login` first")]
    NotAuthenticated,
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn message<T: Into<String>>(msg: T) -> Self {
        AppError::Message(msg.into())
    }
}

/// Failure classes surfaced to the user while signing in or running an export.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportFailure {
    #[error("auth status query failed: {0}")]
    AuthQuery(String),
    #[error("Login failed: {0}")]
    LoginRequest(String),
    #[error("Logout failed: {0}")]
    LogoutRequest(String),
    #[error("Error: {0}")]
    StreamProtocol(String),
    #[error("Connection error")]
    StreamTransport(String),
}
