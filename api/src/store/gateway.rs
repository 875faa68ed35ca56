use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use rand::Rng;
use sqlx::{PgPool, Postgres, Transaction};

use super::StoreError;

type SessionFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Owns the connection pool and exposes the *scoped transactional session*
/// primitive everything in `store` runs through: begin a serializable
/// transaction, run the caller's body once per attempt, commit on success,
/// and transparently retry on a serialization failure or deadlock.
#[derive(Clone)]
pub struct PersistenceGateway {
    pool: PgPool,
    max_attempts: u32,
}

impl PersistenceGateway {
    pub fn new(pool: PgPool, max_attempts: u32) -> Self {
        Self { pool, max_attempts }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs `body` inside a freshly opened `SERIALIZABLE` transaction.
    /// `body` must be safe to run more than once: on SQLSTATE `40001`
    /// (serialization_failure) or `40P01` (deadlock_detected) the whole
    /// transaction is rolled back and retried with exponential backoff,
    /// up to `max_attempts` times.
    pub async fn with_session<T, F>(&self, mut body: F) -> Result<T, StoreError>
    where
        T: Send,
        F: for<'c> FnMut(&'c mut Transaction<'_, Postgres>) -> SessionFuture<'c, T>
            + Send,
    {
        let mut attempt: u32 = 0;
        loop {
            let mut tx = self.pool.begin().await.map_err(StoreError::from)?;
            sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
                .execute(&mut *tx)
                .await
                .map_err(StoreError::from)?;

            let result = body(&mut tx).await;

            match result {
                Ok(value) => {
                    tx.commit().await.map_err(StoreError::from)?;
                    return Ok(value);
                }
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    // tx is dropped here without commit, which rolls it
                    // back on the server.
                    drop(tx);
                    attempt += 1;
                    tokio::time::sleep(backoff(attempt)).await;
                    tracing::warn!(attempt, "retrying transaction after conflict");
                    continue;
                }
                Err(e) if e.is_retryable() => {
                    drop(tx);
                    return Err(StoreError::Unavailable(format!(
                        "transaction did not serialize after {} attempts: {e}",
                        attempt + 1
                    )));
                }
                Err(e) => {
                    drop(tx);
                    return Err(e);
                }
            }
        }
    }
}

/// `min(50 * 2^attempt + jitter, 2000)` ms.
fn backoff(attempt: u32) -> Duration {
    let base = 50u64.saturating_mul(1u64 << attempt.min(16));
    let jitter = rand::thread_rng().gen_range(0..50);
    Duration::from_millis((base + jitter).min(2000))
}
