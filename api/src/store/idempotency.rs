use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTs;
use payloads::Reference;
use serde::{Serialize, de::DeserializeOwned};
use sqlx::{Postgres, Transaction};

use super::StoreError;

/// A record of one previously completed mutating request, keyed by its
/// caller-supplied reference, consulted at the start of every flow before
/// any account lock is taken.
#[derive(sqlx::FromRow)]
struct RawRecord {
    status: i16,
    body: serde_json::Value,
}

/// Returns the captured `(status, body)` for `reference` if a non-expired
/// record exists. Queried before acquiring any account lock, so a replay
/// never contends for hot accounts.
pub async fn lookup<T: DeserializeOwned>(
    tx: &mut Transaction<'_, Postgres>,
    reference: &Reference,
    now: Timestamp,
) -> Result<Option<(u16, T)>, StoreError> {
    let row: Option<RawRecord> = sqlx::query_as(
        "SELECT status, body FROM idempotency_records \
         WHERE reference = $1 AND expires_at > $2",
    )
    .bind(reference)
    .bind(SqlxTs::from(now))
    .fetch_optional(&mut **tx)
    .await?;

    let Some(row) = row else { return Ok(None) };
    let body: T = serde_json::from_value(row.body)
        .map_err(|e| StoreError::UnexpectedError(e.into()))?;
    Ok(Some((row.status as u16, body)))
}

/// Records the response for `reference`. First writer wins: on a primary
/// key collision, the insert is a no-op, since serializable isolation
/// already guarantees at most one writer could have gotten this far for a
/// given reference.
pub async fn store<T: Serialize>(
    tx: &mut Transaction<'_, Postgres>,
    reference: &Reference,
    status: u16,
    body: &T,
    now: Timestamp,
    retention: jiff::Span,
) -> Result<(), StoreError> {
    let body = serde_json::to_value(body)
        .map_err(|e| StoreError::UnexpectedError(e.into()))?;
    let expires_at = now
        .checked_add(retention)
        .map_err(|e| StoreError::UnexpectedError(e.into()))?;

    sqlx::query(
        "INSERT INTO idempotency_records \
            (reference, status, body, created_at, expires_at) \
         VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (reference) DO NOTHING",
    )
    .bind(reference)
    .bind(status as i16)
    .bind(body)
    .bind(SqlxTs::from(now))
    .bind(SqlxTs::from(expires_at))
    .execute(&mut **tx)
    .await?;

    Ok(())
}
