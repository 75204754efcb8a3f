use serde::Serialize;
use sqlx::{Sqlite, SqlitePool};

use crate::{AppError, AppResult};

/// An active chatter: a unique name and the last time we heard from them.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub name: String,
    pub last_seen: i64,
}

/// Insert a new participant with `last_seen = now_ms`. The primary key makes
/// this atomic under concurrent registration: the first writer wins, every
/// other attempt at the same name gets `DuplicateName`.
pub async fn register(pool: &SqlitePool, name: &str, now_ms: i64) -> AppResult<Participant> {
    if name.trim().is_empty() {
        return Err(AppError::InvalidInput("name must not be blank".to_owned()));
    }

    let res = sqlx::query("INSERT INTO participants (name, last_seen) VALUES (?, ?)")
        .bind(name)
        .bind(now_ms)
        .execute(pool)
        .await;

    match res {
        Ok(_) => Ok(Participant {
            name: name.to_owned(),
            last_seen: now_ms,
        }),
        Err(err) if is_unique_violation(&err) => Err(AppError::DuplicateName(name.to_owned())),
        Err(err) => Err(err.into()),
    }
}

pub async fn heartbeat(pool: &SqlitePool, name: &str, now_ms: i64) -> AppResult<()> {
    let res = sqlx::query("UPDATE participants SET last_seen = ? WHERE name = ?")
        .bind(now_ms)
        .bind(name)
        .execute(pool)
        .await?;

    if res.rows_affected() == 0 {
        return Err(AppError::NotFound(name.to_owned()));
    }
    Ok(())
}

/// Snapshot of everyone currently in the room, in insertion order.
pub async fn list(pool: &SqlitePool) -> AppResult<Vec<Participant>> {
    let rows: Vec<(String, i64)> =
        sqlx::query_as("SELECT name, last_seen FROM participants ORDER BY rowid")
            .fetch_all(pool)
            .await?;

    Ok(rows
        .into_iter()
        .map(|(name, last_seen)| Participant { name, last_seen })
        .collect())
}

pub async fn exists(pool: &SqlitePool, name: &str) -> AppResult<bool> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM participants WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}

/// Everyone whose `last_seen` is strictly older than `cutoff`. A scan only;
/// removal happens per entry in [`evict_if_stale`].
pub async fn stale_snapshot(pool: &SqlitePool, cutoff: i64) -> AppResult<Vec<Participant>> {
    let rows: Vec<(String, i64)> =
        sqlx::query_as("SELECT name, last_seen FROM participants WHERE last_seen < ?")
            .bind(cutoff)
            .fetch_all(pool)
            .await?;

    Ok(rows
        .into_iter()
        .map(|(name, last_seen)| Participant { name, last_seen })
        .collect())
}

/// Remove `name` only if it is still stale at the moment of removal. The
/// WHERE clause re-checks freshness, so a heartbeat that landed after the
/// scan keeps the row and this returns false.
pub async fn evict_if_stale<'e, E>(executor: E, name: &str, cutoff: i64) -> AppResult<bool>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let res = sqlx::query("DELETE FROM participants WHERE name = ? AND last_seen < ?")
        .bind(name)
        .bind(cutoff)
        .execute(executor)
        .await?;
    Ok(res.rows_affected() == 1)
}

/// Remove every participant idle for longer than `threshold_ms` and return
/// the removed set, for the caller to turn into departure messages.
pub async fn evict_stale(
    pool: &SqlitePool,
    threshold_ms: i64,
    now_ms: i64,
) -> AppResult<Vec<Participant>> {
    let cutoff = now_ms - threshold_ms;
    let mut evicted = Vec::new();
    for participant in stale_snapshot(pool, cutoff).await? {
        if evict_if_stale(pool, &participant.name, cutoff).await? {
            evicted.push(participant);
        }
    }
    Ok(evicted)
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
