//! Storage layer: SQLite schema and helpers for the code corpus.
//!
//! Holds DB pool setup, the migration runner and the `codes` table queries.

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use thiserror::Error;

pub mod codes;
pub mod models;

pub use codes::{
    count_codes, fetch_codes, pending_codes, store_vector, upsert_code, NewCode, UpsertOutcome,
};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("corrupt vector for {classifier_type}/{code}: {reason}")]
    CorruptVector {
        classifier_type: String,
        code: String,
        reason: String,
    },
    #[error("unsupported vector format {format} for {classifier_type}/{code}")]
    UnsupportedVectorFormat {
        classifier_type: String,
        code: String,
        format: i64,
    },
}

pub async fn connect(database_url: &str) -> Result<SqlitePool, StorageError> {
    let mut url = database_url.to_string();
    if !database_url.starts_with("sqlite:") {
        let path = std::path::PathBuf::from(database_url);
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let norm = path.to_string_lossy().replace('\\', "/");
        if path.is_absolute() {
            url = format!("sqlite:///{}?mode=rwc", norm.trim_start_matches('/'));
        } else {
            url = format!("sqlite://{}?mode=rwc", norm);
        }
    }
    let mut opts = SqlitePoolOptions::new();
    if url.contains("memory") {
        opts = opts.max_connections(1);
    } else {
        opts = opts.max_connections(5);
    }
    let pool = opts.connect(&url).await?;
    Ok(pool)
}

pub async fn migrate(pool: &SqlitePool) -> Result<(), StorageError> {
    // Applies SQLx migrations located in crates/storage/migrations.
    // Safe to run multiple times (idempotent).
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
