//! Queries over the `codes` table.

use crate::models::{encode_vector, CodeRow, VECTOR_FORMAT_F32_LE};
use crate::StorageError;
use sqlx::{Row, SqlitePool};
use tracing::debug;

const SELECT_CODES: &str = "SELECT id, classifier_type, code, description, category, \
     description_hash, vector, vector_dim, vector_format, model_id, embedded_at FROM codes";

#[derive(Debug, Clone)]
pub struct NewCode<'a> {
    pub classifier_type: &'a str,
    pub code: &'a str,
    pub description: &'a str,
    pub category: &'a str,
    pub description_hash: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    /// Category or description changed. A changed description also drops the
    /// stored vector so it gets recomputed.
    Updated,
    Unchanged,
}

pub async fn upsert_code(
    pool: &SqlitePool,
    new: &NewCode<'_>,
) -> Result<UpsertOutcome, StorageError> {
    let existing = sqlx::query(
        "SELECT id, description_hash, category FROM codes WHERE classifier_type = ?1 AND code = ?2",
    )
    .bind(new.classifier_type)
    .bind(new.code)
    .fetch_optional(pool)
    .await?;

    let Some(row) = existing else {
        sqlx::query(
            "INSERT INTO codes (classifier_type, code, description, category, description_hash, vector_format)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(new.classifier_type)
        .bind(new.code)
        .bind(new.description)
        .bind(new.category)
        .bind(new.description_hash)
        .bind(VECTOR_FORMAT_F32_LE)
        .execute(pool)
        .await?;
        return Ok(UpsertOutcome::Inserted);
    };

    let id: i64 = row.try_get("id")?;
    let hash: String = row.try_get("description_hash")?;
    let category: String = row.try_get("category")?;

    if hash != new.description_hash {
        debug!(code = new.code, "description changed, clearing vector");
        sqlx::query(
            "UPDATE codes SET description = ?1, category = ?2, description_hash = ?3,
                 vector = NULL, vector_dim = NULL, model_id = NULL, embedded_at = NULL
             WHERE id = ?4",
        )
        .bind(new.description)
        .bind(new.category)
        .bind(new.description_hash)
        .bind(id)
        .execute(pool)
        .await?;
        return Ok(UpsertOutcome::Updated);
    }
    if category != new.category {
        sqlx::query("UPDATE codes SET category = ?1 WHERE id = ?2")
            .bind(new.category)
            .bind(id)
            .execute(pool)
            .await?;
        return Ok(UpsertOutcome::Updated);
    }
    Ok(UpsertOutcome::Unchanged)
}

/// All codes in insertion order, optionally restricted to one classifier.
pub async fn fetch_codes(
    pool: &SqlitePool,
    classifier_type: Option<&str>,
) -> Result<Vec<CodeRow>, StorageError> {
    let rows = match classifier_type {
        Some(classifier) => {
            sqlx::query_as::<_, CodeRow>(&format!(
                "{SELECT_CODES} WHERE classifier_type = ?1 ORDER BY id"
            ))
            .bind(classifier)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, CodeRow>(&format!("{SELECT_CODES} ORDER BY id"))
                .fetch_all(pool)
                .await?
        }
    };
    Ok(rows)
}

/// Codes without a vector, or embedded by a model other than `model_id`.
pub async fn pending_codes(
    pool: &SqlitePool,
    model_id: &str,
) -> Result<Vec<CodeRow>, StorageError> {
    let rows = sqlx::query_as::<_, CodeRow>(&format!(
        "{SELECT_CODES} WHERE vector IS NULL OR model_id IS NULL OR model_id != ?1 ORDER BY id"
    ))
    .bind(model_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn store_vector(
    pool: &SqlitePool,
    id: i64,
    vector: &[f32],
    model_id: &str,
) -> Result<(), StorageError> {
    sqlx::query(
        "UPDATE codes SET vector = ?1, vector_dim = ?2, vector_format = ?3, model_id = ?4, embedded_at = ?5
         WHERE id = ?6",
    )
    .bind(encode_vector(vector))
    .bind(vector.len() as i64)
    .bind(VECTOR_FORMAT_F32_LE)
    .bind(model_id)
    .bind(chrono::Utc::now().timestamp())
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn count_codes(pool: &SqlitePool) -> Result<i64, StorageError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM codes")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
