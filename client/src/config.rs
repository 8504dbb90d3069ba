//! Client configuration
//!
//! Central location for configuration constants, limits and the
//! environment-driven `ClientConfig` used to wire the application.

use std::path::PathBuf;
use std::time::Duration;

// ===== Remote service =====

/// Base URL of the PHP service when nothing else is configured
pub const DEFAULT_API_BASE_URL: &str = "http://10.0.2.2/ClaseOffLine/api/";

/// Connect/read/write budget for every request, in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// User agent sent with every request
pub const USER_AGENT: &str = concat!("classroom-client/", env!("CARGO_PKG_VERSION"));

// ===== Content limits =====

/// Comments longer than this are truncated before being sent
pub const MAX_COMMENT_CHARS: usize = 800;

/// A question carries at most this many options
pub const MAX_QUIZ_OPTIONS: usize = 4;

/// Placeholder shown when a recorded grade is blank
pub const BLANK_GRADE: &str = "-";

/// Timestamp layout used by the service ("YYYY-MM-DD HH:mm:ss")
pub const SERVER_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ===== Local storage =====

/// SQLite file holding the session and attachment locks
pub const DATABASE_FILE_NAME: &str = "classroom.db";

/// Default tracing filter when RUST_LOG is unset
pub const DEFAULT_LOG_FILTER: &str = "classroom_client=debug,info";

/// Runtime configuration for the client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub data_dir: PathBuf,
    pub timeout: Duration,
}

impl ClientConfig {
    /// Build the configuration from the environment (and an optional `.env`)
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let api_base_url = std::env::var("CLASSROOM_API_URL")
            .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());

        let data_dir = std::env::var("CLASSROOM_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_data_dir());

        let timeout_secs = std::env::var("CLASSROOM_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Self {
            api_base_url: normalize_base_url(&api_base_url),
            data_dir,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// Path of the SQLite database inside the data directory
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE_NAME)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            data_dir: default_data_dir(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

fn default_data_dir() -> PathBuf {
    std::env::var("HOME")
        .map(|home| PathBuf::from(home).join(".classroom"))
        .unwrap_or_else(|_| PathBuf::from(".classroom"))
}

/// Endpoint names are joined onto the base URL, so it must end with '/'
pub fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    }
}
