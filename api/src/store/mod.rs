//! Persistence layer for the ledger.
//!
//! ## Type Safety
//!
//! Every id that crosses a module boundary is one of `payloads`' newtype
//! wrappers, never a bare `Uuid`. This makes it impossible to pass an
//! `AssetTypeId` where an `AccountId` is expected.
//!
//! ## Time Source Dependency
//!
//! `created_at`/`updated_at` columns are stamped from the caller's
//! `TimeSource`, not `now()` in SQL, so a retried transaction attempt and a
//! test harness both see a single, controllable notion of "now".
//!
//! ## Database Triggers
//!
//! There are none. Every invariant enforced at write time (balance
//! non-negativity, zero-sum postings, one line per account per entry) is
//! enforced in Rust inside the transaction opened by
//! [`gateway::PersistenceGateway::with_session`], not in PL/pgSQL, so the
//! enforcement logic lives next to its tests.

pub mod accounts;
pub mod error;
pub mod flows;
pub mod gateway;
pub mod idempotency;
pub mod posting;
pub mod query;

pub use error::StoreError;

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTs;
use payloads::{AccountId, AccountKind, AssetTypeId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AssetTypeRow {
    pub id: AssetTypeId,
    pub code: String,
    pub display_name: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AccountRow {
    pub id: AccountId,
    pub external_id: Option<String>,
    pub kind: AccountKind,
    pub asset_type_id: AssetTypeId,
    pub display_name: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BalanceRow {
    pub account_id: AccountId,
    pub asset_type_id: AssetTypeId,
    pub balance: Decimal,
    pub version: i64,
    #[sqlx(try_from = "SqlxTs")]
    pub updated_at: Timestamp,
}

/// An account joined with its current balance row, the unit the posting
/// engine and account resolver actually operate on.
#[derive(Debug, Clone)]
pub struct LockedAccount {
    pub account: AccountRow,
    pub balance: BalanceRow,
}

/// Free-form structured context attached to a transaction by the caller.
/// Treated as opaque by the store: never inspected, only stored and
/// echoed back.
pub type Metadata = serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostingLine {
    pub account_id: AccountId,
    /// Positive debits (leaves the account), negative credits (arrives).
    pub amount: Decimal,
}
