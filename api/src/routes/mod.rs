pub mod ledger;

use actix_web::{
    HttpResponse, Responder, ResponseError, body::BoxBody,
    dev::HttpServiceFactory, get, web,
};
use payloads::{ErrorBody, ErrorCode};

use crate::store::StoreError;

pub fn api_services() -> impl HttpServiceFactory {
    web::scope("/api")
        .service(health_check)
        .service(ledger::top_up)
        .service(ledger::bonus)
        .service(ledger::spend)
        .service(ledger::balance)
        .service(ledger::history)
        .service(ledger::audit)
}

#[get("/health_check")]
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().body("healthy")
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String, Option<String>),
    #[error("account not found")]
    AccountNotFound,
    #[error("asset mismatch")]
    AssetMismatch,
    #[error("insufficient balance")]
    InsufficientBalance,
    #[error("duplicate reference")]
    DuplicateReference,
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("service unavailable: {0}")]
    Unavailable(String),
    #[error("internal error")]
    Internal(#[source] anyhow::Error),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;
        match self {
            Self::Validation(..) => StatusCode::BAD_REQUEST,
            Self::AccountNotFound => StatusCode::NOT_FOUND,
            Self::AssetMismatch => StatusCode::BAD_REQUEST,
            Self::InsufficientBalance => StatusCode::UNPROCESSABLE_ENTITY,
            Self::DuplicateReference => StatusCode::CONFLICT,
            Self::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse<BoxBody> {
        let (code, field) = match self {
            Self::Validation(_, field) => {
                (ErrorCode::ValidationError, field.clone())
            }
            Self::AccountNotFound => (ErrorCode::AccountNotFound, None),
            Self::AssetMismatch => (ErrorCode::AssetMismatch, None),
            Self::InsufficientBalance => {
                (ErrorCode::InsufficientBalance, None)
            }
            Self::DuplicateReference => (ErrorCode::DuplicateReference, None),
            Self::Configuration(_) => (ErrorCode::ConfigurationError, None),
            Self::Unavailable(_) => (ErrorCode::ServiceUnavailable, None),
            Self::Internal(_) => (ErrorCode::ConfigurationError, None),
        };
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "success": false,
            "error": ErrorBody { code, message: self.to_string(), field },
        }))
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Validation(msg) => ApiError::Validation(msg, None),
            StoreError::AccountNotFound => ApiError::AccountNotFound,
            StoreError::AssetMismatch(_) => ApiError::AssetMismatch,
            StoreError::InsufficientBalance(_) => {
                ApiError::InsufficientBalance
            }
            StoreError::DuplicateReference(_) => ApiError::DuplicateReference,
            StoreError::Configuration(msg) => ApiError::Configuration(msg),
            StoreError::Unavailable(msg) => ApiError::Unavailable(msg),
            StoreError::Database(e) => ApiError::Internal(e.into()),
            StoreError::UnexpectedError(e) => ApiError::Internal(e),
        }
    }
}
