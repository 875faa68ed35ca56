use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTs;
use payloads::{
    AccountId, AssetTypeId, Reference, TransactionCategory, TransactionId,
    max_amount, min_amount,
};
use payloads::{DESCRIPTION_MAX_LEN, REFERENCE_MAX_LEN};
use payloads::responses::MutationResponse;
use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::time::TimeSource;

use super::gateway::PersistenceGateway;
use super::{accounts, idempotency, posting, Metadata, StoreError};

/// Which of the three money-movement flows is running. Each shares the
/// same idempotency-check / lock / post / record algorithm and differs
/// only in which side of the posting the user account sits on and which
/// well-known system account it faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    TopUp,
    Bonus,
    Spend,
}

impl FlowKind {
    fn category(self) -> TransactionCategory {
        match self {
            FlowKind::TopUp => TransactionCategory::TopUp,
            FlowKind::Bonus => TransactionCategory::Bonus,
            FlowKind::Spend => TransactionCategory::Spend,
        }
    }

    fn system_role(self) -> &'static str {
        match self {
            FlowKind::TopUp => TREASURY_ROLE,
            FlowKind::Bonus => BONUS_POOL_ROLE,
            FlowKind::Spend => REVENUE_ROLE,
        }
    }

    /// The stable external id of this flow's system counterparty for a
    /// given asset type. Whatever provisions a new asset type must create
    /// one account per role under this external id first.
    fn counterparty_external_id(self, asset_type_id: AssetTypeId) -> String {
        system_account_external_id(self.system_role(), asset_type_id)
    }
}

pub const TREASURY_ROLE: &str = "treasury";
pub const BONUS_POOL_ROLE: &str = "bonus_pool";
pub const REVENUE_ROLE: &str = "revenue";

/// The well-known external id a system account of a given role must carry
/// for a given asset type, so flow execution can find its counterparty.
/// Anything seeding asset types (migrations, fixtures) must use this same
/// convention.
pub fn system_account_external_id(
    role: &str,
    asset_type_id: AssetTypeId,
) -> String {
    format!("system:{role}:{asset_type_id}")
}

#[derive(Debug, Clone)]
pub struct FlowRequest {
    pub account_id: AccountId,
    pub amount: Decimal,
    pub reference: Reference,
    pub description: Option<String>,
    pub metadata: Option<Metadata>,
}

pub struct FlowOutcome {
    pub response: MutationResponse,
    /// `201` for a fresh posting, `200` for an idempotent replay.
    pub status: u16,
}

fn validate_request(request: &FlowRequest) -> Result<(), StoreError> {
    if request.amount < min_amount() || request.amount > max_amount() {
        return Err(StoreError::Validation(format!(
            "amount must be between {} and {}",
            min_amount(),
            max_amount()
        )));
    }
    if request.amount.scale() > 8 {
        return Err(StoreError::Validation(
            "amount must have at most 8 fractional digits".into(),
        ));
    }
    if request.reference.0.is_empty()
        || request.reference.0.len() > REFERENCE_MAX_LEN
    {
        return Err(StoreError::Validation(format!(
            "referenceId must be 1-{REFERENCE_MAX_LEN} characters"
        )));
    }
    if let Some(description) = &request.description
        && description.len() > DESCRIPTION_MAX_LEN
    {
        return Err(StoreError::Validation(format!(
            "description must be at most {DESCRIPTION_MAX_LEN} characters"
        )));
    }
    Ok(())
}

/// Runs one of the three money-movement flows to completion, retrying the
/// whole session transparently on a serialization conflict.
#[tracing::instrument(skip(gateway, time_source, request), fields(reference = %request.reference))]
pub async fn execute_flow(
    gateway: &PersistenceGateway,
    kind: FlowKind,
    request: FlowRequest,
    time_source: &TimeSource,
    idempotency_retention: jiff::Span,
) -> Result<FlowOutcome, StoreError> {
    validate_request(&request)?;

    let request = request.clone();
    let time_source = time_source.clone();
    gateway
        .with_session(move |tx| {
            let request = request.clone();
            let now = time_source.now();
            Box::pin(async move {
                if let Some((_, response)) =
                    idempotency::lookup::<MutationResponse>(
                        tx,
                        &request.reference,
                        now,
                    )
                    .await?
                {
                    return Ok(FlowOutcome {
                        response: MutationResponse {
                            idempotent: true,
                            ..response
                        },
                        status: 200,
                    });
                }

                let asset_type_id =
                    resolve_asset_type(tx, request.account_id).await?;
                let counterparty_external_id =
                    kind.counterparty_external_id(asset_type_id);
                let counterparty_id = accounts::resolve_by_external_id(
                    tx,
                    &counterparty_external_id,
                )
                .await
                .map_err(|_| {
                    StoreError::Configuration(format!(
                        "missing system account {counterparty_external_id}"
                    ))
                })?;

                let locked = accounts::lock_accounts(
                    tx,
                    &[request.account_id, counterparty_id],
                )
                .await?;
                let user_account = locked
                    .iter()
                    .find(|a| a.account.id == request.account_id)
                    .ok_or(StoreError::AccountNotFound)?;
                let counterparty_account = locked
                    .iter()
                    .find(|a| a.account.id == counterparty_id)
                    .ok_or(StoreError::AccountNotFound)?;

                if user_account.account.asset_type_id
                    != counterparty_account.account.asset_type_id
                {
                    return Err(StoreError::AssetMismatch(
                        user_account.account.id,
                    ));
                }

                if kind == FlowKind::Spend
                    && user_account.balance.balance < request.amount
                {
                    return Err(StoreError::InsufficientBalance(
                        user_account.balance.balance - request.amount,
                    ));
                }

                let transaction_id = TransactionId(Uuid::new_v4());
                insert_transaction(tx, transaction_id, kind, &request, now)
                    .await?;

                let (debit, credit) = match kind {
                    FlowKind::TopUp | FlowKind::Bonus => {
                        (counterparty_account, user_account)
                    }
                    FlowKind::Spend => (user_account, counterparty_account),
                };

                let (debit_after, credit_after) = posting::post(
                    tx,
                    transaction_id,
                    debit,
                    credit,
                    request.amount,
                    user_account.account.asset_type_id,
                    now,
                )
                .await?;

                let user_balance_after = if kind == FlowKind::Spend {
                    debit_after
                } else {
                    credit_after
                };

                let response = MutationResponse {
                    transaction_id,
                    reference_id: request.reference.clone(),
                    r#type: kind.category(),
                    account_id: request.account_id,
                    amount: request.amount,
                    balance_after: user_balance_after,
                    description: request.description.clone(),
                    created_at: now,
                    idempotent: false,
                };

                idempotency::store(
                    tx,
                    &request.reference,
                    201,
                    &response,
                    now,
                    idempotency_retention,
                )
                .await?;

                Ok(FlowOutcome { response, status: 201 })
            })
        })
        .await
}

pub async fn top_up(
    gateway: &PersistenceGateway,
    request: FlowRequest,
    time_source: &TimeSource,
    idempotency_retention: jiff::Span,
) -> Result<FlowOutcome, StoreError> {
    execute_flow(gateway, FlowKind::TopUp, request, time_source, idempotency_retention).await
}

pub async fn bonus_credit(
    gateway: &PersistenceGateway,
    request: FlowRequest,
    time_source: &TimeSource,
    idempotency_retention: jiff::Span,
) -> Result<FlowOutcome, StoreError> {
    execute_flow(gateway, FlowKind::Bonus, request, time_source, idempotency_retention).await
}

pub async fn spend(
    gateway: &PersistenceGateway,
    request: FlowRequest,
    time_source: &TimeSource,
    idempotency_retention: jiff::Span,
) -> Result<FlowOutcome, StoreError> {
    execute_flow(gateway, FlowKind::Spend, request, time_source, idempotency_retention).await
}

async fn resolve_asset_type(
    tx: &mut Transaction<'_, Postgres>,
    account_id: AccountId,
) -> Result<AssetTypeId, StoreError> {
    let row: Option<(Uuid,)> = sqlx::query_as(
        "SELECT asset_type_id FROM accounts WHERE id = $1 AND is_active",
    )
    .bind(account_id)
    .fetch_optional(&mut **tx)
    .await?;
    row.map(|(id,)| AssetTypeId(id)).ok_or(StoreError::AccountNotFound)
}

async fn insert_transaction(
    tx: &mut Transaction<'_, Postgres>,
    transaction_id: TransactionId,
    kind: FlowKind,
    request: &FlowRequest,
    now: Timestamp,
) -> Result<(), StoreError> {
    let result = sqlx::query(
        r#"
        INSERT INTO transactions
            (id, category, reference, description, metadata, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(transaction_id)
    .bind(kind.category())
    .bind(&request.reference)
    .bind(&request.description)
    .bind(&request.metadata)
    .bind(SqlxTs::from(now))
    .execute(&mut **tx)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            Err(StoreError::DuplicateReference(request.reference.clone()))
        }
        Err(e) => Err(e.into()),
    }
}
