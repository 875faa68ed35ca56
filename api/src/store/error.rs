use rust_decimal::Decimal;

/// Error taxonomy for the ledger's persistence layer. `routes::ApiError`
/// maps each variant onto the HTTP contract's status codes.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("account not found")]
    AccountNotFound,

    #[error(
        "account {0} belongs to a different asset type than the transaction"
    )]
    AssetMismatch(payloads::AccountId),

    #[error("insufficient balance: would leave {0} below zero")]
    InsufficientBalance(Decimal),

    #[error("reference {0} was already used with a different request body")]
    DuplicateReference(payloads::Reference),

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("service temporarily unavailable: {0}")]
    Unavailable(String),

    #[error("database error")]
    Database(#[source] sqlx::Error),

    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                StoreError::Unavailable(e.to_string())
            }
            sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
                StoreError::Unavailable(e.to_string())
            }
            e => StoreError::Database(e),
        }
    }
}

/// SQLSTATE codes the gateway retries a session body for: serialization
/// failure and deadlock detected. Classification lives here, next to the
/// variant it inspects, so [`gateway`](crate::store::gateway) doesn't reach
/// into `sqlx` internals directly.
impl StoreError {
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreError::Database(sqlx::Error::Database(db_err)) => {
                matches!(db_err.code().as_deref(), Some("40001" | "40P01"))
            }
            _ => false,
        }
    }
}
