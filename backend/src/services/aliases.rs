use std::collections::BTreeMap;

use chrono::Utc;
use sqlx::SqlitePool;
use thiserror::Error;

use crate::models::AliasRow;
use crate::services::validation::{self, ValidationError};

#[derive(Debug, Error)]
pub enum AliasError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// All aliases as `identifier -> label`.
pub async fn get_all(pool: &SqlitePool) -> Result<BTreeMap<String, String>, AliasError> {
    let rows: Vec<AliasRow> = sqlx::query_as("SELECT identifier, label FROM collection_aliases")
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| (row.identifier, row.label))
        .collect())
}

/// Create or overwrite the alias for `identifier`.
///
/// The identifier must be a calendar date or belong to the copy namespace; it
/// does not have to name an existing collection. Returns the stored label.
pub async fn set(pool: &SqlitePool, identifier: &str, label: &str) -> Result<String, AliasError> {
    validation::validate_alias_target(identifier)?;
    let label = validation::validate_alias(label)?;

    sqlx::query(
        r#"
        INSERT INTO collection_aliases (identifier, label, created_at)
        VALUES (?, ?, ?)
        ON CONFLICT(identifier) DO UPDATE SET label = excluded.label
        "#,
    )
    .bind(identifier)
    .bind(&label)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(label)
}

/// Returns `true` when an alias existed and was removed.
pub async fn delete(pool: &SqlitePool, identifier: &str) -> Result<bool, AliasError> {
    let result = sqlx::query("DELETE FROM collection_aliases WHERE identifier = ?")
        .bind(identifier)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
