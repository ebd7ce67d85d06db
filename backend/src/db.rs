use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

/// Open the application pool and bring the schema up to date.
pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// In-memory database with migrations applied.
///
/// Every connection to `sqlite::memory:` gets its own database, so the pool is
/// pinned to a single connection that never expires.
#[cfg(test)]
pub async fn test_pool() -> SqlitePool {
    let pool = memory_pool().await;
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();

    pool
}

#[cfg(test)]
async fn memory_pool() -> SqlitePool {
    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap()
}
