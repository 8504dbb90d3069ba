//! Repository layer for database operations
//!
//! Session and attachment-lock persistence.

use super::models::*;
use crate::error::Result;
use crate::models::Session;
use chrono::Utc;
use sqlx::SqlitePool;

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ===== Session =====

    /// Replace the stored session
    pub async fn save_session(&self, session: &Session) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO session (slot, user_id, role, display_name, email, logged_in_at)
            VALUES (1, ?, ?, ?, ?, ?)
            ON CONFLICT(slot) DO UPDATE SET
                user_id = excluded.user_id,
                role = excluded.role,
                display_name = excluded.display_name,
                email = excluded.email,
                logged_in_at = excluded.logged_in_at
            "#,
        )
        .bind(&session.user_id)
        .bind(&session.role)
        .bind(&session.display_name)
        .bind(&session.email)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        tracing::debug!("Saved session for user {}", session.user_id);
        Ok(())
    }

    pub async fn load_session(&self) -> Result<Option<StoredSession>> {
        let row = sqlx::query_as::<_, StoredSession>(
            r#"
            SELECT user_id, role, display_name, email, logged_in_at
            FROM session WHERE slot = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn clear_session(&self) -> Result<()> {
        sqlx::query("DELETE FROM session").execute(&self.pool).await?;
        Ok(())
    }

    // ===== Attachment locks =====

    /// Insert a lock; locking twice is a no-op
    pub async fn insert_lock(&self, lock: &LockRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO attachment_locks (user_id, class_id, lock_kind, entity_id, locked_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&lock.user_id)
        .bind(&lock.class_id)
        .bind(&lock.lock_kind)
        .bind(&lock.entity_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Returns whether a lock was actually removed
    pub async fn delete_lock(&self, lock: &LockRecord) -> Result<bool> {
        let rows = sqlx::query(
            r#"
            DELETE FROM attachment_locks
            WHERE user_id = ? AND class_id = ? AND lock_kind = ? AND entity_id = ?
            "#,
        )
        .bind(&lock.user_id)
        .bind(&lock.class_id)
        .bind(&lock.lock_kind)
        .bind(&lock.entity_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows > 0)
    }

    pub async fn list_locks(&self) -> Result<Vec<LockRecord>> {
        let locks = sqlx::query_as::<_, LockRecord>(
            r#"
            SELECT user_id, class_id, lock_kind, entity_id
            FROM attachment_locks
            ORDER BY locked_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(locks)
    }

    /// Drop every lock held by `user_id`; returns how many were removed
    pub async fn clear_locks_for_user(&self, user_id: &str) -> Result<u64> {
        let rows = sqlx::query("DELETE FROM attachment_locks WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::debug!("Cleared {} attachment locks for user {}", rows, user_id);
        Ok(rows)
    }
}
