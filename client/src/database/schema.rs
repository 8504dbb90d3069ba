//! Database schema and migrations
//!
//! Local state is small: the logged-in session and the attachment locks
//! the user has acquired. Both survive restarts.

use crate::error::Result;
use sqlx::{sqlite::SqlitePool, Row};

const INITIAL_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS session (
    slot INTEGER PRIMARY KEY CHECK (slot = 1),
    user_id TEXT NOT NULL,
    role TEXT NOT NULL,
    display_name TEXT NOT NULL,
    email TEXT,
    logged_in_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS attachment_locks (
    user_id TEXT NOT NULL,
    class_id TEXT NOT NULL,
    lock_kind TEXT NOT NULL,
    entity_id TEXT NOT NULL,
    locked_at TEXT NOT NULL,
    PRIMARY KEY (user_id, class_id, lock_kind, entity_id)
);

CREATE INDEX IF NOT EXISTS idx_attachment_locks_user ON attachment_locks(user_id)
"#;

/// Initialize database with schema
pub async fn initialize_database(pool: &SqlitePool) -> Result<()> {
    tracing::info!("Initializing database schema");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    let current_version: i32 = sqlx::query("SELECT COALESCE(MAX(version), 0) FROM migrations")
        .fetch_one(pool)
        .await?
        .get(0);

    tracing::info!("Current database version: {}", current_version);

    apply_migrations(pool, current_version).await?;

    tracing::info!("Database initialization complete");
    Ok(())
}

async fn apply_migrations(pool: &SqlitePool, current_version: i32) -> Result<()> {
    for (version, sql) in get_migrations() {
        if version > current_version {
            tracing::info!("Applying migration version {}", version);

            let mut tx = pool.begin().await?;

            for statement in sql.split(';').filter(|s| !s.trim().is_empty()) {
                sqlx::query(statement).execute(&mut *tx).await?;
            }

            sqlx::query("INSERT INTO migrations (version) VALUES (?)")
                .bind(version)
                .execute(&mut *tx)
                .await?;

            tx.commit().await?;

            tracing::info!("Migration version {} applied successfully", version);
        }
    }

    Ok(())
}

fn get_migrations() -> Vec<(i32, &'static str)> {
    vec![(1, INITIAL_SCHEMA)]
}
