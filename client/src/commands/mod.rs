//! Commands exposed to the CLI
//!
//! This module organizes commands into logical submodules:
//! - `session`: login, logout and the stored identity
//! - `classes`: taught and enrolled classes
//! - `content`: topics, tasks, materials, quizzes and announcements of a class
//! - `grades`: the viewer's grade report for a class
//!
//! All commands follow the pattern:
//! - Take AppState as first parameter
//! - Return Result<T, AppError>
//! - Are async when performing I/O

pub mod classes;
pub mod content;
pub mod grades;
pub mod session;

pub use classes::*;
pub use content::*;
pub use grades::*;
pub use session::*;

use crate::app::AppState;
use serde::Serialize;

/// Application information structure
#[derive(Debug, Serialize)]
pub struct AppInfo {
    pub version: String,
    pub api_base_url: String,
    pub data_dir: String,
}

/// Get application information
pub fn app_info(state: &AppState) -> AppInfo {
    AppInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        api_base_url: state.config.api_base_url.clone(),
        data_dir: state.config.data_dir.to_string_lossy().to_string(),
    }
}
