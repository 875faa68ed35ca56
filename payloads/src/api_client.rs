use crate::{AccountId, requests, responses};
use reqwest::StatusCode;
use serde::Serialize;

type ReqwestResult = Result<reqwest::Response, reqwest::Error>;

/// An API client for interfacing with the ledger service.
pub struct APIClient {
    pub address: String,
    pub inner_client: reqwest::Client,
}

/// Helper methods for http actions
impl APIClient {
    fn format_url(&self, path: &str) -> String {
        format!("{}/api/{path}", &self.address)
    }

    async fn post(&self, path: &str, body: &impl Serialize) -> ReqwestResult {
        self.inner_client.post(self.format_url(path)).json(body).send().await
    }

    async fn empty_get(&self, path: &str) -> ReqwestResult {
        self.inner_client.get(self.format_url(path)).send().await
    }
}

/// Methods on the ledger API
impl APIClient {
    pub async fn health_check(&self) -> Result<(), ClientError> {
        let response = self.empty_get("health_check").await?;
        ok_empty(response).await
    }

    pub async fn top_up(
        &self,
        details: &requests::MutationRequest,
    ) -> Result<responses::MutationResponse, ClientError> {
        let response = self.post("top_up", details).await?;
        ok_body(response).await
    }

    pub async fn bonus(
        &self,
        details: &requests::MutationRequest,
    ) -> Result<responses::MutationResponse, ClientError> {
        let response = self.post("bonus", details).await?;
        ok_body(response).await
    }

    pub async fn spend(
        &self,
        details: &requests::MutationRequest,
    ) -> Result<responses::MutationResponse, ClientError> {
        let response = self.post("spend", details).await?;
        ok_body(response).await
    }

    pub async fn balance(
        &self,
        account_id: &AccountId,
    ) -> Result<responses::BalanceResponse, ClientError> {
        let response =
            self.empty_get(&format!("accounts/{account_id}/balance")).await?;
        ok_body(response).await
    }

    pub async fn history(
        &self,
        account_id: &AccountId,
        query: &requests::HistoryQuery,
    ) -> Result<responses::HistoryPage, ClientError> {
        let mut params = Vec::new();
        if let Some(limit) = query.limit {
            params.push(format!("limit={limit}"));
        }
        if let Some(offset) = query.offset {
            params.push(format!("offset={offset}"));
        }
        if let Some(category) = query.category {
            params.push(format!("category={}", category.as_str()));
        }
        let path = format!("accounts/{account_id}/history?{}", params.join("&"));
        let response = self.empty_get(&path).await?;
        ok_body(response).await
    }

    pub async fn audit(
        &self,
        account_id: &AccountId,
    ) -> Result<responses::AuditReport, ClientError> {
        let response =
            self.empty_get(&format!("accounts/{account_id}/audit")).await?;
        ok_body(response).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// An unhandled API error to display, containing response text.
    #[error("{1}")]
    APIError(StatusCode, String),
    #[error("Network error. Please check your connection.")]
    Network(#[from] reqwest::Error),
}

/// The `{"success": true, "data": ...}` envelope every success body is
/// wrapped in.
#[derive(serde::Deserialize)]
struct SuccessEnvelope<T> {
    data: T,
}

/// Deserialize a successful request into the desired type, or return an
/// appropriate error.
pub async fn ok_body<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ClientError> {
    if !response.status().is_success() {
        return Err(ClientError::APIError(
            response.status(),
            response.text().await?,
        ));
    }
    Ok(response.json::<SuccessEnvelope<T>>().await?.data)
}

/// Check that an empty response is OK, returning a ClientError if not.
pub async fn ok_empty(response: reqwest::Response) -> Result<(), ClientError> {
    if !response.status().is_success() {
        return Err(ClientError::APIError(
            response.status(),
            response.text().await?,
        ));
    }
    Ok(())
}
