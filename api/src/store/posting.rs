use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTs;
use payloads::{AssetTypeId, JournalEntryId, TransactionId, max_amount, min_amount};
use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use super::{LockedAccount, StoreError};

/// Appends the two offsetting journal entries for one posting and updates
/// both accounts' cached balances, enforcing the non-negative-user-balance
/// precondition before writing anything.
///
/// Returns `(debit_balance_after, credit_balance_after)`.
#[tracing::instrument(skip(tx, debit_account, credit_account), fields(transaction_id = %transaction_id))]
pub async fn post(
    tx: &mut Transaction<'_, Postgres>,
    transaction_id: TransactionId,
    debit_account: &LockedAccount,
    credit_account: &LockedAccount,
    magnitude: Decimal,
    asset_type_id: AssetTypeId,
    now: Timestamp,
) -> Result<(Decimal, Decimal), StoreError> {
    if magnitude < min_amount() || magnitude > max_amount() {
        return Err(StoreError::Validation(format!(
            "amount {magnitude} is outside the accepted range"
        )));
    }

    if debit_account.account.asset_type_id != asset_type_id
        || credit_account.account.asset_type_id != asset_type_id
    {
        return Err(StoreError::AssetMismatch(debit_account.account.id));
    }

    let debit_balance_after = debit_account.balance.balance - magnitude;
    if debit_account.account.kind == payloads::AccountKind::User
        && debit_balance_after < Decimal::ZERO
    {
        return Err(StoreError::InsufficientBalance(debit_balance_after));
    }
    let credit_balance_after = credit_account.balance.balance + magnitude;

    insert_journal_entry(
        tx,
        transaction_id,
        debit_account,
        asset_type_id,
        magnitude,
        debit_balance_after,
        now,
    )
    .await?;
    insert_journal_entry(
        tx,
        transaction_id,
        credit_account,
        asset_type_id,
        -magnitude,
        credit_balance_after,
        now,
    )
    .await?;

    update_balance(tx, debit_account, debit_balance_after, now).await?;
    update_balance(tx, credit_account, credit_balance_after, now).await?;

    Ok((debit_balance_after, credit_balance_after))
}

async fn insert_journal_entry(
    tx: &mut Transaction<'_, Postgres>,
    transaction_id: TransactionId,
    account: &LockedAccount,
    asset_type_id: AssetTypeId,
    amount: Decimal,
    balance_after: Decimal,
    now: Timestamp,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO journal_entries
            (id, transaction_id, account_id, asset_type_id, amount,
             balance_after, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(JournalEntryId(Uuid::new_v4()))
    .bind(transaction_id)
    .bind(account.account.id)
    .bind(asset_type_id)
    .bind(amount)
    .bind(balance_after)
    .bind(SqlxTs::from(now))
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn update_balance(
    tx: &mut Transaction<'_, Postgres>,
    account: &LockedAccount,
    new_balance: Decimal,
    now: Timestamp,
) -> Result<(), StoreError> {
    sqlx::query(
        "UPDATE balances SET balance = $1, version = version + 1, \
         updated_at = $2 WHERE account_id = $3",
    )
    .bind(new_balance)
    .bind(SqlxTs::from(now))
    .bind(account.account.id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
