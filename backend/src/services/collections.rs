//! Per-collection task storage.
//!
//! Every collection lives in its own table (see [`storage_name`]). Mutating
//! operations run inside a single transaction that is rolled back when dropped
//! on an error path.

use std::collections::BTreeMap;

use chrono::{DateTime, Local, Utc};
use shared::{CollectionId, Todo};
use sqlx::{SqliteConnection, SqlitePool};
use thiserror::Error;

use crate::models::TodoRow;
use crate::services::storage_name;

#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("No order left after the last task")]
    OrderOverflow,
}

/// Fields to change on an existing task. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct TodoChanges {
    pub content: Option<String>,
    pub completed: Option<bool>,
    pub order: Option<i64>,
}

impl TodoChanges {
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.completed.is_none() && self.order.is_none()
    }
}

const TODO_COLUMNS: &str = "id, content, completed, order_num, created_at, completed_at";

async fn table_exists(conn: &mut SqliteConnection, table: &str) -> Result<bool, sqlx::Error> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(table)
            .fetch_one(&mut *conn)
            .await?;

    Ok(count > 0)
}

async fn create_table(
    conn: &mut SqliteConnection,
    table: &str,
    if_not_exists: bool,
) -> Result<(), sqlx::Error> {
    let sql = format!(
        r#"
        CREATE TABLE {}"{}" (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            content TEXT NOT NULL,
            completed BOOLEAN NOT NULL DEFAULT 0,
            order_num INTEGER NOT NULL DEFAULT 0,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            completed_at DATETIME NULL
        )
        "#,
        if if_not_exists { "IF NOT EXISTS " } else { "" },
        table
    );

    sqlx::query(&sql).execute(&mut *conn).await?;
    Ok(())
}

/// Create the table for `id` when missing and return its name.
async fn ensure_table(conn: &mut SqliteConnection, id: &CollectionId) -> Result<String, sqlx::Error> {
    let table = storage_name::encode(id);
    if !table_exists(conn, &table).await? {
        create_table(conn, &table, true).await?;
        log::debug!("Created collection {} as {}", id, table);
    }
    Ok(table)
}

async fn next_order(conn: &mut SqliteConnection, table: &str) -> Result<i64, CollectionError> {
    let sql = format!(r#"SELECT MAX(order_num) FROM "{}""#, table);
    let max: Option<i64> = sqlx::query_scalar(&sql).fetch_one(&mut *conn).await?;

    max.unwrap_or(0)
        .checked_add(1)
        .ok_or(CollectionError::OrderOverflow)
}

async fn insert_todo(
    conn: &mut SqliteConnection,
    table: &str,
    content: &str,
    order: i64,
) -> Result<i64, sqlx::Error> {
    let sql = format!(
        r#"INSERT INTO "{}" (content, completed, order_num, created_at) VALUES (?, ?, ?, ?)"#,
        table
    );

    let result = sqlx::query(&sql)
        .bind(content)
        .bind(false)
        .bind(order)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

    Ok(result.last_insert_rowid())
}

async fn fetch_todo(
    conn: &mut SqliteConnection,
    table: &str,
    task_id: i64,
) -> Result<Option<TodoRow>, sqlx::Error> {
    let sql = format!(r#"SELECT {} FROM "{}" WHERE id = ?"#, TODO_COLUMNS, table);

    let row = sqlx::query_as(&sql)
        .bind(task_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(row)
}

async fn collection_ids(conn: &mut SqliteConnection) -> Result<Vec<CollectionId>, sqlx::Error> {
    let names: Vec<String> = sqlx::query_scalar(
        r"SELECT name FROM sqlite_master WHERE type = 'table' AND name LIKE ? ESCAPE '\' ORDER BY name DESC",
    )
    .bind(storage_name::TABLE_PATTERN)
    .fetch_all(&mut *conn)
    .await?;

    Ok(names
        .into_iter()
        .filter_map(|name| {
            let id = storage_name::decode(&name);
            if id.is_none() {
                log::warn!("Ignoring table {} that does not name a collection", name);
            }
            id
        })
        .collect())
}

/// Pick a copy identifier whose table does not exist yet.
async fn allocate_copy_id(
    conn: &mut SqliteConnection,
    now: DateTime<Local>,
) -> Result<CollectionId, sqlx::Error> {
    let day = now.date_naive();
    let mut millis = u64::try_from(now.timestamp_millis()).unwrap_or(0);

    loop {
        let candidate = CollectionId::copy(day, millis);
        if !table_exists(conn, &storage_name::encode(&candidate)).await? {
            return Ok(candidate);
        }
        millis += 1;
    }
}

/// Create the storage for `id` if absent. Returns the physical table name.
pub async fn ensure_collection(pool: &SqlitePool, id: &CollectionId) -> Result<String, CollectionError> {
    let mut tx = pool.begin().await?;
    let table = ensure_table(&mut tx, id).await?;
    tx.commit().await?;

    Ok(table)
}

pub async fn exists(pool: &SqlitePool, id: &CollectionId) -> Result<bool, CollectionError> {
    let mut conn = pool.acquire().await?;
    Ok(table_exists(&mut conn, &storage_name::encode(id)).await?)
}

/// Tasks of a collection ordered by `order`, then `id`. Empty when the
/// collection does not exist.
pub async fn list_tasks(pool: &SqlitePool, id: &CollectionId) -> Result<Vec<Todo>, CollectionError> {
    let table = storage_name::encode(id);
    let mut conn = pool.acquire().await?;

    if !table_exists(&mut conn, &table).await? {
        return Ok(Vec::new());
    }

    let sql = format!(
        r#"SELECT {} FROM "{}" ORDER BY order_num, id"#,
        TODO_COLUMNS, table
    );
    let rows: Vec<TodoRow> = sqlx::query_as(&sql).fetch_all(&mut *conn).await?;

    Ok(rows.into_iter().map(|row| row.into_shared(id)).collect())
}

pub async fn get_task(
    pool: &SqlitePool,
    id: &CollectionId,
    task_id: i64,
) -> Result<Option<Todo>, CollectionError> {
    let table = storage_name::encode(id);
    let mut conn = pool.acquire().await?;

    if !table_exists(&mut conn, &table).await? {
        return Ok(None);
    }

    let row = fetch_todo(&mut conn, &table, task_id).await?;
    Ok(row.map(|row| row.into_shared(id)))
}

/// Add a pending task, creating the collection on first use.
/// Without an explicit `order` the task goes after the current last one.
pub async fn add_task(
    pool: &SqlitePool,
    id: &CollectionId,
    content: &str,
    order: Option<i64>,
) -> Result<i64, CollectionError> {
    let mut tx = pool.begin().await?;
    let table = ensure_table(&mut tx, id).await?;

    let order = match order {
        Some(order) => order,
        None => next_order(&mut tx, &table).await?,
    };
    let task_id = insert_todo(&mut tx, &table, content, order).await?;

    tx.commit().await?;
    Ok(task_id)
}

/// Apply `changes` to a task. Returns `false` when the collection or task is
/// missing or when there is nothing to change.
pub async fn update_task(
    pool: &SqlitePool,
    id: &CollectionId,
    task_id: i64,
    changes: &TodoChanges,
) -> Result<bool, CollectionError> {
    if changes.is_empty() {
        return Ok(false);
    }

    let table = storage_name::encode(id);
    let mut tx = pool.begin().await?;

    if !table_exists(&mut tx, &table).await? {
        return Ok(false);
    }
    let Some(mut row) = fetch_todo(&mut tx, &table, task_id).await? else {
        return Ok(false);
    };

    if let Some(ref content) = changes.content {
        row.content = content.clone();
    }
    if let Some(completed) = changes.completed {
        // Completing an already completed task keeps its original stamp.
        row.completed_at = if completed {
            row.completed_at.or_else(|| Some(Utc::now()))
        } else {
            None
        };
        row.completed = completed;
    }
    if let Some(order) = changes.order {
        row.order_num = order;
    }

    let sql = format!(
        r#"UPDATE "{}" SET content = ?, completed = ?, order_num = ?, completed_at = ? WHERE id = ?"#,
        table
    );
    sqlx::query(&sql)
        .bind(&row.content)
        .bind(row.completed)
        .bind(row.order_num)
        .bind(row.completed_at)
        .bind(task_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(true)
}

pub async fn delete_task(
    pool: &SqlitePool,
    id: &CollectionId,
    task_id: i64,
) -> Result<bool, CollectionError> {
    let table = storage_name::encode(id);
    let mut tx = pool.begin().await?;

    if !table_exists(&mut tx, &table).await? {
        return Ok(false);
    }

    let sql = format!(r#"DELETE FROM "{}" WHERE id = ?"#, table);
    let result = sqlx::query(&sql).bind(task_id).execute(&mut *tx).await?;

    tx.commit().await?;
    Ok(result.rows_affected() > 0)
}

/// Append a pending copy of one task to the same collection.
pub async fn duplicate_task(
    pool: &SqlitePool,
    id: &CollectionId,
    task_id: i64,
) -> Result<Option<i64>, CollectionError> {
    let table = storage_name::encode(id);
    let mut tx = pool.begin().await?;

    if !table_exists(&mut tx, &table).await? {
        return Ok(None);
    }
    let Some(row) = fetch_todo(&mut tx, &table, task_id).await? else {
        return Ok(None);
    };

    let order = next_order(&mut tx, &table).await?;
    let new_id = insert_todo(&mut tx, &table, &row.content, order).await?;

    tx.commit().await?;
    Ok(Some(new_id))
}

/// Drop the whole collection table and return how many tasks it held.
/// A later `add_task` on the same identifier starts a fresh id sequence.
pub async fn delete_collection(pool: &SqlitePool, id: &CollectionId) -> Result<u64, CollectionError> {
    let table = storage_name::encode(id);
    let mut tx = pool.begin().await?;

    if !table_exists(&mut tx, &table).await? {
        return Ok(0);
    }

    let sql = format!(r#"SELECT COUNT(*) FROM "{}""#, table);
    let count: i64 = sqlx::query_scalar(&sql).fetch_one(&mut *tx).await?;

    let sql = format!(r#"DROP TABLE "{}""#, table);
    sqlx::query(&sql).execute(&mut *tx).await?;

    tx.commit().await?;
    log::debug!("Dropped collection {} with {} tasks", id, count);

    Ok(u64::try_from(count).unwrap_or(0))
}

/// All existing collections, newest first.
pub async fn list_collections(pool: &SqlitePool) -> Result<Vec<CollectionId>, CollectionError> {
    let mut conn = pool.acquire().await?;
    Ok(collection_ids(&mut conn).await?)
}

/// Task count per collection.
pub async fn counts(pool: &SqlitePool) -> Result<BTreeMap<String, i64>, CollectionError> {
    let mut tx = pool.begin().await?;
    let mut counts = BTreeMap::new();

    for id in collection_ids(&mut tx).await? {
        let sql = format!(r#"SELECT COUNT(*) FROM "{}""#, storage_name::encode(&id));
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&mut *tx).await?;
        counts.insert(String::from(id), count);
    }

    tx.commit().await?;
    Ok(counts)
}

/// Copy the tasks of `source` into a newly generated copy collection.
///
/// Copies keep content and relative order only: they get fresh ids, default
/// orders and start pending. The destination is created even when the source
/// is empty or missing. Returns the new identifier and the number of copied
/// tasks.
pub async fn copy_collection(
    pool: &SqlitePool,
    source: &CollectionId,
) -> Result<(CollectionId, usize), CollectionError> {
    copy_collection_at(pool, source, Local::now()).await
}

async fn copy_collection_at(
    pool: &SqlitePool,
    source: &CollectionId,
    now: DateTime<Local>,
) -> Result<(CollectionId, usize), CollectionError> {
    let source_table = storage_name::encode(source);
    let mut tx = pool.begin().await?;

    let contents: Vec<String> = if table_exists(&mut tx, &source_table).await? {
        let sql = format!(
            r#"SELECT content FROM "{}" ORDER BY order_num, id"#,
            source_table
        );
        sqlx::query_scalar(&sql).fetch_all(&mut *tx).await?
    } else {
        Vec::new()
    };

    let target = allocate_copy_id(&mut tx, now).await?;
    let target_table = storage_name::encode(&target);
    // No IF NOT EXISTS: a racing copy that picked the same name must fail, not merge.
    create_table(&mut tx, &target_table, false).await?;

    for (order, content) in (1i64..).zip(&contents) {
        insert_todo(&mut tx, &target_table, content, order).await?;
    }

    tx.commit().await?;
    log::info!(
        "Copied {} tasks from {} to {}",
        contents.len(),
        source,
        target
    );

    Ok((target, contents.len()))
}
