use actix_web::http::StatusCode;
use actix_web::{HttpResponse, get, post, web};
use payloads::requests::{HistoryQuery, MutationRequest};
use payloads::AccountId;
use uuid::Uuid;

use crate::IdempotencyConfig;
use crate::store::flows::{self, FlowOutcome, FlowRequest};
use crate::store::gateway::PersistenceGateway;
use crate::store::query;
use crate::time::TimeSource;

use super::ApiError;

fn mutation_response(outcome: FlowOutcome) -> HttpResponse {
    let status = StatusCode::from_u16(outcome.status)
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    HttpResponse::build(status).json(serde_json::json!({
        "success": true,
        "data": outcome.response,
    }))
}

fn into_flow_request(body: MutationRequest) -> FlowRequest {
    FlowRequest {
        account_id: body.account_id,
        amount: body.amount,
        reference: body.reference_id,
        description: body.description,
        metadata: body.metadata,
    }
}

#[tracing::instrument(skip(gateway, time_source, idempotency_config, body))]
#[post("/top_up")]
pub async fn top_up(
    gateway: web::Data<PersistenceGateway>,
    time_source: web::Data<TimeSource>,
    idempotency_config: web::Data<IdempotencyConfig>,
    body: web::Json<MutationRequest>,
) -> Result<HttpResponse, ApiError> {
    let outcome = flows::top_up(
        &gateway,
        into_flow_request(body.into_inner()),
        &time_source,
        idempotency_config.retention,
    )
    .await?;
    Ok(mutation_response(outcome))
}

#[tracing::instrument(skip(gateway, time_source, idempotency_config, body))]
#[post("/bonus")]
pub async fn bonus(
    gateway: web::Data<PersistenceGateway>,
    time_source: web::Data<TimeSource>,
    idempotency_config: web::Data<IdempotencyConfig>,
    body: web::Json<MutationRequest>,
) -> Result<HttpResponse, ApiError> {
    let outcome = flows::bonus_credit(
        &gateway,
        into_flow_request(body.into_inner()),
        &time_source,
        idempotency_config.retention,
    )
    .await?;
    Ok(mutation_response(outcome))
}

#[tracing::instrument(skip(gateway, time_source, idempotency_config, body))]
#[post("/spend")]
pub async fn spend(
    gateway: web::Data<PersistenceGateway>,
    time_source: web::Data<TimeSource>,
    idempotency_config: web::Data<IdempotencyConfig>,
    body: web::Json<MutationRequest>,
) -> Result<HttpResponse, ApiError> {
    let outcome = flows::spend(
        &gateway,
        into_flow_request(body.into_inner()),
        &time_source,
        idempotency_config.retention,
    )
    .await?;
    Ok(mutation_response(outcome))
}

#[tracing::instrument(skip(gateway))]
#[get("/accounts/{account_id}/balance")]
pub async fn balance(
    gateway: web::Data<PersistenceGateway>,
    account_id: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let response =
        query::balance(gateway.pool(), AccountId(account_id.into_inner()))
            .await?;
    Ok(HttpResponse::Ok()
        .json(serde_json::json!({ "success": true, "data": response })))
}

#[tracing::instrument(skip(gateway))]
#[get("/accounts/{account_id}/history")]
pub async fn history(
    gateway: web::Data<PersistenceGateway>,
    account_id: web::Path<Uuid>,
    params: web::Query<HistoryQuery>,
) -> Result<HttpResponse, ApiError> {
    let limit = params.limit.unwrap_or(query::HISTORY_DEFAULT_LIMIT);
    let offset = params.offset.unwrap_or(0);
    let response = query::history(
        gateway.pool(),
        AccountId(account_id.into_inner()),
        limit,
        offset,
        params.category,
    )
    .await?;
    Ok(HttpResponse::Ok()
        .json(serde_json::json!({ "success": true, "data": response })))
}

#[tracing::instrument(skip(gateway))]
#[get("/accounts/{account_id}/audit")]
pub async fn audit(
    gateway: web::Data<PersistenceGateway>,
    account_id: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let response =
        query::audit(gateway.pool(), AccountId(account_id.into_inner()))
            .await?;
    Ok(HttpResponse::Ok()
        .json(serde_json::json!({ "success": true, "data": response })))
}
