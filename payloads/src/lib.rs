pub mod requests;
pub mod responses;

pub mod api_client;
pub use api_client::APIClient;

use derive_more::Display;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Id type wrappers help ensure we don't mix up ids for different tables.
///
/// Display is derived so an id can be dropped straight into a log line or a
/// URL path segment.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize,
)]
#[cfg_attr(feature = "use-sqlx", derive(sqlx::Type), sqlx(transparent))]
pub struct AssetTypeId(pub Uuid);

#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize,
)]
#[cfg_attr(feature = "use-sqlx", derive(sqlx::Type), sqlx(transparent))]
pub struct AccountId(pub Uuid);

#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize,
)]
#[cfg_attr(feature = "use-sqlx", derive(sqlx::Type), sqlx(transparent))]
pub struct TransactionId(pub Uuid);

#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize,
)]
#[cfg_attr(feature = "use-sqlx", derive(sqlx::Type), sqlx(transparent))]
pub struct JournalEntryId(pub Uuid);

/// A caller-supplied string that uniquely identifies a business request,
/// making it safe to retry. Wrapped so it can't be confused with a
/// description or other free-form string at a call site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[cfg_attr(feature = "use-sqlx", derive(sqlx::Type), sqlx(transparent))]
pub struct Reference(pub String);

pub const REFERENCE_MAX_LEN: usize = 255;
pub const DESCRIPTION_MAX_LEN: usize = 500;

/// `10^7`, the maximum magnitude accepted for a single posting.
pub fn max_amount() -> Decimal {
    Decimal::new(10_000_000, 0)
}

/// `10^-8`, the smallest representable positive amount.
pub fn min_amount() -> Decimal {
    Decimal::new(1, 8)
}

#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Display, Serialize, Deserialize,
)]
#[cfg_attr(
    feature = "use-sqlx",
    derive(sqlx::Type),
    sqlx(type_name = "account_kind", rename_all = "snake_case")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountKind {
    System,
    User,
}

/// The three money-movement flows. Stored verbatim as the transaction
/// category and echoed back in responses as `type`.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Display, Serialize, Deserialize,
)]
#[cfg_attr(
    feature = "use-sqlx",
    derive(sqlx::Type),
    sqlx(
        type_name = "transaction_category",
        rename_all = "SCREAMING_SNAKE_CASE"
    )
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionCategory {
    TopUp,
    Bonus,
    Spend,
}

impl TransactionCategory {
    /// The wire representation used both in JSON bodies and as a query
    /// parameter value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TopUp => "TOP_UP",
            Self::Bonus => "BONUS",
            Self::Spend => "SPEND",
        }
    }
}

/// Error taxonomy shared between the ledger core and its HTTP facade.
/// Variant names match the wire-level error codes of the external contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "VALIDATION_ERROR")]
    ValidationError,
    #[serde(rename = "ACCOUNT_NOT_FOUND")]
    AccountNotFound,
    #[serde(rename = "ASSET_MISMATCH")]
    AssetMismatch,
    #[serde(rename = "INSUFFICIENT_BALANCE")]
    InsufficientBalance,
    #[serde(rename = "DUPLICATE_REFERENCE")]
    DuplicateReference,
    #[serde(rename = "CONFIGURATION_ERROR")]
    ConfigurationError,
    #[serde(rename = "SERVICE_UNAVAILABLE")]
    ServiceUnavailable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
    /// Set for `VALIDATION_ERROR` when a single request field is at fault.
    pub field: Option<String>,
}
