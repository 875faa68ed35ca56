use crate::{AccountId, JournalEntryId, Reference, TransactionCategory, TransactionId};
use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Returned by all three mutating flows on success (`201 Created`, or `200
/// OK` with `idempotent: true` when the request replays a prior one).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationResponse {
    pub transaction_id: TransactionId,
    pub reference_id: Reference,
    pub r#type: TransactionCategory,
    pub account_id: AccountId,
    pub amount: Decimal,
    pub balance_after: Decimal,
    pub description: Option<String>,
    pub created_at: Timestamp,
    /// True when this response was served from a prior request with the
    /// same reference rather than freshly posted.
    pub idempotent: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub account_id: AccountId,
    pub asset_type_code: String,
    pub balance: Decimal,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub transaction_id: TransactionId,
    pub journal_entry_id: JournalEntryId,
    pub category: TransactionCategory,
    /// Signed from the requested account's perspective.
    pub amount: Decimal,
    pub balance_after: Decimal,
    pub description: Option<String>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPage {
    pub entries: Vec<HistoryEntry>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub account_id: AccountId,
    pub cached_balance: Decimal,
    pub computed_balance: Decimal,
    pub discrepancy: Decimal,
    pub is_consistent: bool,
}
