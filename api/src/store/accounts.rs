use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTs;
use payloads::{AccountId, AccountKind, AssetTypeId};
use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use super::{AccountRow, BalanceRow, LockedAccount, StoreError};

#[derive(sqlx::FromRow)]
struct LockedRow {
    id: AccountId,
    external_id: Option<String>,
    kind: AccountKind,
    asset_type_id: AssetTypeId,
    display_name: String,
    is_active: bool,
    balance: Decimal,
    version: i64,
    #[sqlx(try_from = "SqlxTs")]
    updated_at: Timestamp,
}

impl From<LockedRow> for LockedAccount {
    fn from(r: LockedRow) -> Self {
        LockedAccount {
            account: AccountRow {
                id: r.id,
                external_id: r.external_id,
                kind: r.kind,
                asset_type_id: r.asset_type_id,
                display_name: r.display_name,
                is_active: r.is_active,
            },
            balance: BalanceRow {
                account_id: r.id,
                asset_type_id: r.asset_type_id,
                balance: r.balance,
                version: r.version,
                updated_at: r.updated_at,
            },
        }
    }
}

/// Locks the given accounts (and their balance rows) for the lifetime of
/// the transaction, always in the same order regardless of caller-supplied
/// order, so two sessions that touch overlapping account sets can never
/// deadlock against each other — they simply queue behind whichever one
/// locks the lowest id first.
///
/// Duplicate ids are collapsed before locking: a transfer from an account
/// to itself must not try to lock the same row twice in one statement.
pub async fn lock_accounts(
    tx: &mut Transaction<'_, Postgres>,
    ids: &[AccountId],
) -> Result<Vec<LockedAccount>, StoreError> {
    let mut sorted: Vec<Uuid> = ids.iter().map(|id| id.0).collect();
    sorted.sort();
    sorted.dedup();

    let rows: Vec<LockedRow> = sqlx::query_as(
        r#"
        SELECT a.id, a.external_id, a.kind, a.asset_type_id,
               a.display_name, a.is_active,
               b.balance, b.version, b.updated_at
        FROM accounts a
        JOIN balances b ON b.account_id = a.id
        WHERE a.id = ANY($1) AND a.is_active
        ORDER BY a.id
        FOR UPDATE
        "#,
    )
    .bind(&sorted)
    .fetch_all(&mut **tx)
    .await?;

    if rows.len() != sorted.len() {
        return Err(StoreError::AccountNotFound);
    }

    Ok(rows.into_iter().map(LockedAccount::from).collect())
}

/// Looks up a single account (without locking it) by its caller-facing
/// natural key, used by the flow handlers to resolve well-known system
/// counterparties such as the bonus pool for a given asset type.
pub async fn resolve_by_external_id(
    tx: &mut Transaction<'_, Postgres>,
    external_id: &str,
) -> Result<AccountId, StoreError> {
    let row: Option<(Uuid,)> = sqlx::query_as(
        "SELECT id FROM accounts WHERE external_id = $1 AND is_active",
    )
    .bind(external_id)
    .fetch_optional(&mut **tx)
    .await?;

    row.map(|(id,)| AccountId(id)).ok_or(StoreError::AccountNotFound)
}
