use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTs;
use payloads::{AccountId, TransactionCategory};
use payloads::responses::{AuditReport, BalanceResponse, HistoryEntry, HistoryPage};
use rust_decimal::Decimal;
use sqlx::PgPool;

use super::StoreError;

const AUDIT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 8);

pub const HISTORY_DEFAULT_LIMIT: i64 = 20;
pub const HISTORY_MAX_LIMIT: i64 = 100;

/// Read-only queries never take an account lock and never run inside the
/// persistence gateway's serializable session; a plain pooled connection
/// observing any consistent committed snapshot is sufficient.
#[derive(sqlx::FromRow)]
struct BalanceRow {
    account_id: AccountId,
    asset_type_code: String,
    balance: Decimal,
    #[sqlx(try_from = "SqlxTs")]
    updated_at: Timestamp,
}

pub async fn balance(
    pool: &PgPool,
    account_id: AccountId,
) -> Result<BalanceResponse, StoreError> {
    let row: Option<BalanceRow> = sqlx::query_as(
        r#"
        SELECT b.account_id, t.code AS asset_type_code, b.balance, b.updated_at
        FROM balances b
        JOIN accounts a ON a.id = b.account_id
        JOIN asset_types t ON t.id = b.asset_type_id
        WHERE b.account_id = $1 AND a.is_active
        "#,
    )
    .bind(account_id)
    .fetch_optional(pool)
    .await?;

    let row = row.ok_or(StoreError::AccountNotFound)?;
    Ok(BalanceResponse {
        account_id: row.account_id,
        asset_type_code: row.asset_type_code,
        balance: row.balance,
        updated_at: row.updated_at,
    })
}

#[derive(sqlx::FromRow)]
struct HistoryRow {
    transaction_id: payloads::TransactionId,
    journal_entry_id: payloads::JournalEntryId,
    category: TransactionCategory,
    amount: Decimal,
    balance_after: Decimal,
    description: Option<String>,
    #[sqlx(try_from = "SqlxTs")]
    created_at: Timestamp,
}

/// Returns the most recent journal entries for `account_id`, most recent
/// transaction first, with `amount` negated so incoming value reads
/// positive and outgoing reads negative.
pub async fn history(
    pool: &PgPool,
    account_id: AccountId,
    limit: i64,
    offset: i64,
    category: Option<TransactionCategory>,
) -> Result<HistoryPage, StoreError> {
    if limit < 1 || limit > HISTORY_MAX_LIMIT {
        return Err(StoreError::Validation(format!(
            "limit must be between 1 and {HISTORY_MAX_LIMIT}"
        )));
    }
    if offset < 0 {
        return Err(StoreError::Validation("offset must be >= 0".into()));
    }
    ensure_account_exists(pool, account_id).await?;

    let rows: Vec<HistoryRow> = sqlx::query_as(
        r#"
        SELECT j.transaction_id, j.id AS journal_entry_id, t.category,
               j.amount, j.balance_after, t.description, t.created_at
        FROM journal_entries j
        JOIN transactions t ON t.id = j.transaction_id
        WHERE j.account_id = $1
          AND ($2::transaction_category IS NULL OR t.category = $2)
        ORDER BY t.created_at DESC, j.id DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(account_id)
    .bind(category)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let (total,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*)
        FROM journal_entries j
        JOIN transactions t ON t.id = j.transaction_id
        WHERE j.account_id = $1
          AND ($2::transaction_category IS NULL OR t.category = $2)
        "#,
    )
    .bind(account_id)
    .bind(category)
    .fetch_one(pool)
    .await?;

    let entries = rows
        .into_iter()
        .map(|r| HistoryEntry {
            transaction_id: r.transaction_id,
            journal_entry_id: r.journal_entry_id,
            category: r.category,
            amount: -r.amount,
            balance_after: r.balance_after,
            description: r.description,
            created_at: r.created_at,
        })
        .collect();

    Ok(HistoryPage { entries, total, limit, offset })
}

async fn ensure_account_exists(
    pool: &PgPool,
    account_id: AccountId,
) -> Result<(), StoreError> {
    let exists: Option<(bool,)> = sqlx::query_as(
        "SELECT is_active FROM accounts WHERE id = $1",
    )
    .bind(account_id)
    .fetch_optional(pool)
    .await?;
    match exists {
        Some((true,)) => Ok(()),
        _ => Err(StoreError::AccountNotFound),
    }
}

/// Recomputes `-Σ amount` over the full journal for `account_id` and
/// compares it against the cached balance, flagging any drift beyond the
/// defense-in-depth tolerance.
pub async fn audit(
    pool: &PgPool,
    account_id: AccountId,
) -> Result<AuditReport, StoreError> {
    let cached: Option<(Decimal,)> =
        sqlx::query_as("SELECT balance FROM balances WHERE account_id = $1")
            .bind(account_id)
            .fetch_optional(pool)
            .await?;
    let cached_balance = cached.ok_or(StoreError::AccountNotFound)?.0;

    let (sum,): (Option<Decimal>,) = sqlx::query_as(
        "SELECT SUM(amount) FROM journal_entries WHERE account_id = $1",
    )
    .bind(account_id)
    .fetch_one(pool)
    .await?;
    let computed_balance = -sum.unwrap_or(Decimal::ZERO);

    let discrepancy = cached_balance - computed_balance;
    Ok(AuditReport {
        account_id,
        cached_balance,
        computed_balance,
        discrepancy,
        is_consistent: discrepancy.abs() <= AUDIT_TOLERANCE,
    })
}
