//! Database models
//!
//! Rows as stored locally. Conversion to the domain types lives here too.

use crate::models::Session;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The single persisted session row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StoredSession {
    pub user_id: String,
    pub role: String,
    pub display_name: String,
    pub email: Option<String>,
    pub logged_in_at: DateTime<Utc>,
}

impl From<StoredSession> for Session {
    fn from(row: StoredSession) -> Self {
        Session {
            user_id: row.user_id,
            role: row.role,
            display_name: row.display_name,
            email: row.email,
        }
    }
}

/// One attachment lock acquired by a user within a class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct LockRecord {
    pub user_id: String,
    pub class_id: String,
    /// Stable key of the `LockKind`, e.g. "task_file"
    pub lock_kind: String,
    pub entity_id: String,
}
