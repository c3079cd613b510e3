//! API key endpoints.

use reqwest::Method;

use super::ApiClient;
use crate::error::ApiError;
use crate::models::api_key::{ApiKey, CreateApiKeyRequest, UpdateApiKeyRequest};
use crate::models::RawList;

impl ApiClient {
    /// `GET /api-keys`
    pub async fn list_api_keys(&self) -> Result<Vec<ApiKey>, ApiError> {
        let keys: RawList<ApiKey> = self.get("/api-keys", &[]).await?;
        Ok(keys.into_vec())
    }

    /// `POST /api-keys`; the response is the only time `raw_key` is set.
    pub async fn create_api_key(&self, request: &CreateApiKeyRequest) -> Result<ApiKey, ApiError> {
        self.send_validated(Method::POST, "/api-keys", request).await
    }

    /// `PUT /api-keys/{id}`
    pub async fn update_api_key(
        &self,
        id: &str,
        request: &UpdateApiKeyRequest,
    ) -> Result<ApiKey, ApiError> {
        self.send_validated(Method::PUT, &format!("/api-keys/{}", id.trim()), request)
            .await
    }

    /// `DELETE /api-keys/{id}`
    pub async fn delete_api_key(&self, id: &str) -> Result<(), ApiError> {
        self.send::<(), serde_json::Value>(
            Method::DELETE,
            &format!("/api-keys/{}", id.trim()),
            None,
        )
        .await
        .map(|_| ())
    }
}
