use crate::{AccountId, Reference, TransactionCategory};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Body shared by the three mutating flows (`top_up`, `bonus`, `spend`).
/// Which flow runs is determined by the endpoint path, not by a field on
/// this struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationRequest {
    pub account_id: AccountId,
    pub amount: Decimal,
    pub reference_id: Reference,
    pub description: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// Query-string parameters for the transaction history endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub category: Option<TransactionCategory>,
}
