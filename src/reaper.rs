use std::time::Duration;

use sqlx::SqlitePool;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::{
    AppResult, clock,
    messages::log::{self, Message},
    participants::directory::{self, Participant},
};

/// Start the perpetual eviction loop. Runs until the process exits; there is
/// no graceful drain.
pub fn spawn(pool: SqlitePool, period: Duration, threshold_ms: i64) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match sweep(&pool, threshold_ms, clock::now_ms()).await {
                Ok(evicted) if !evicted.is_empty() => {
                    tracing::info!(count = evicted.len(), "reaped idle participants");
                }
                Ok(_) => {}
                Err(err) => tracing::warn!(error = %err, "reaper sweep failed"),
            }
        }
    })
}

/// One reaper tick: evict everyone idle past the threshold and record a
/// departure message per eviction. Each eviction and its departure message
/// commit in one transaction, with freshness re-checked inside it, so a
/// heartbeat racing the sweep either keeps the participant or loses cleanly.
pub async fn sweep(
    pool: &SqlitePool,
    threshold_ms: i64,
    now_ms: i64,
) -> AppResult<Vec<Participant>> {
    let cutoff = now_ms - threshold_ms;
    let mut evicted = Vec::new();

    for participant in directory::stale_snapshot(pool, cutoff).await? {
        let mut tx = pool.begin().await?;
        if directory::evict_if_stale(&mut *tx, &participant.name, cutoff).await? {
            log::append(&mut *tx, &Message::departed(&participant.name)).await?;
            tx.commit().await?;
            tracing::info!(name = %participant.name, "evicted idle participant");
            evicted.push(participant);
        }
        // an uncommitted tx rolls back on drop
    }

    Ok(evicted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::log::{BROADCAST, MessageKind, list_all};
    use crate::store::test_pool;

    #[tokio::test]
    async fn sweep_evicts_and_records_departure() {
        let pool = test_pool().await;
        directory::register(&pool, "idle", 0).await.unwrap();
        directory::register(&pool, "fresh", 5_000).await.unwrap();

        let evicted = sweep(&pool, 10_000, 11_000).await.unwrap();
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].name, "idle");

        let remaining = directory::list(&pool).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "fresh");

        let messages = list_all(&pool).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].from, "idle");
        assert_eq!(messages[0].to, BROADCAST);
        assert_eq!(messages[0].kind, MessageKind::Status);
        assert_eq!(messages[0].text, "leaves the room");
    }

    #[tokio::test]
    async fn sweep_with_nobody_stale_is_a_no_op() {
        let pool = test_pool().await;
        directory::register(&pool, "fresh", 10_000).await.unwrap();

        let evicted = sweep(&pool, 10_000, 11_000).await.unwrap();
        assert!(evicted.is_empty());
        assert!(list_all(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sweep_is_idempotent_once_evicted() {
        let pool = test_pool().await;
        directory::register(&pool, "idle", 0).await.unwrap();

        sweep(&pool, 10_000, 11_000).await.unwrap();
        let second = sweep(&pool, 10_000, 12_000).await.unwrap();
        assert!(second.is_empty());
        // still exactly one departure message
        assert_eq!(list_all(&pool).await.unwrap().len(), 1);
    }
}
