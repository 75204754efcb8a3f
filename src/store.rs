use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};

use crate::AppResult;

// name uniqueness among active participants is the primary key
const CREATE_PARTICIPANTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS participants (
    name TEXT PRIMARY KEY,
    last_seen INTEGER NOT NULL
)
"#;

// append-only; rowid order is insertion order
const CREATE_MESSAGES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS messages (
    id TEXT PRIMARY KEY,
    from_name TEXT NOT NULL,
    to_name TEXT NOT NULL,
    text TEXT NOT NULL,
    kind TEXT NOT NULL,
    time TEXT NOT NULL
)
"#;

/// Open the pool and make sure the schema exists. The handle is passed
/// around explicitly; it lives in `AppState` and nothing else owns one.
pub async fn connect(database_url: &str) -> AppResult<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(16)
        .connect(database_url)
        .await?;
    migrate(&pool).await?;
    Ok(pool)
}

pub async fn migrate(pool: &SqlitePool) -> AppResult<()> {
    sqlx::query(CREATE_PARTICIPANTS_TABLE).execute(pool).await?;
    sqlx::query(CREATE_MESSAGES_TABLE).execute(pool).await?;
    Ok(())
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    // a single connection so every query sees the same in-memory database
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    migrate(&pool).await.unwrap();
    pool
}
