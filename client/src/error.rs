//! Error types for the classroom client
//!
//! All errors use thiserror for structured error handling.
//! Every failure is meant to end up as a screen-local message, so the
//! display strings are written for the person holding the phone.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// Transport or timeout failure; the message is shown verbatim.
    #[error("{0}")]
    Network(String),

    /// The service answered with a non-success status code.
    #[error("Error {0}")]
    Server(u16),

    /// The service answered 2xx but the body reports a failure.
    #[error("{0}")]
    Rejected(String),

    /// A client-side precondition failed before any call was made.
    #[error("{0}")]
    Validation(String),

    /// The viewer is not allowed to perform the action.
    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Map a reqwest failure onto the network/server split.
    pub fn from_transport(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => AppError::Server(status.as_u16()),
            None => AppError::Network(err.to_string()),
        }
    }

    /// Whether the error was raised before reaching the remote service.
    pub fn is_client_side(&self) -> bool {
        matches!(self, AppError::Validation(_) | AppError::NotAuthorized(_))
    }
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
