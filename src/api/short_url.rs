//! Short URL endpoints.

use reqwest::Method;

use super::{short_code_segment, ApiClient};
use crate::error::ApiError;
use crate::models::short_url::{
    CreateShortUrlRequest, ShortUrl, ShortUrlSearch, UpdatePasswordRequest, UpdateShortUrlRequest,
};
use crate::models::Page;

impl ApiClient {
    /// `POST /url`
    pub async fn create_short_url(
        &self,
        request: &CreateShortUrlRequest,
    ) -> Result<ShortUrl, ApiError> {
        self.send_validated(Method::POST, "/url", request).await
    }

    /// `GET /url`, paged.
    pub async fn list_short_urls(&self, search: &ShortUrlSearch) -> Result<Page<ShortUrl>, ApiError> {
        self.get("/url", &search.to_params()).await
    }

    /// `GET /url/search`, paged; used when a query or status filter is set.
    pub async fn search_short_urls(
        &self,
        search: &ShortUrlSearch,
    ) -> Result<Page<ShortUrl>, ApiError> {
        self.get("/url/search", &search.to_params()).await
    }

    /// `GET /url/{code}`
    pub async fn get_short_url(&self, short_code: &str) -> Result<ShortUrl, ApiError> {
        self.get(&short_url_path(short_code)?, &[]).await
    }

    /// `PUT /url/{code}`
    pub async fn update_short_url(
        &self,
        short_code: &str,
        request: &UpdateShortUrlRequest,
    ) -> Result<ShortUrl, ApiError> {
        self.send_validated(Method::PUT, &short_url_path(short_code)?, request)
            .await
    }

    /// `DELETE /url/{code}`
    pub async fn delete_short_url(&self, short_code: &str) -> Result<(), ApiError> {
        self.send::<(), serde_json::Value>(Method::DELETE, &short_url_path(short_code)?, None)
            .await
            .map(|_| ())
    }

    /// `PUT /url/{code}/enable`
    pub async fn enable_short_url(&self, short_code: &str) -> Result<(), ApiError> {
        let path = format!("{}/enable", short_url_path(short_code)?);
        self.send::<(), serde_json::Value>(Method::PUT, &path, None)
            .await
            .map(|_| ())
    }

    /// `PUT /url/{code}/disable`
    pub async fn disable_short_url(&self, short_code: &str) -> Result<(), ApiError> {
        let path = format!("{}/disable", short_url_path(short_code)?);
        self.send::<(), serde_json::Value>(Method::PUT, &path, None)
            .await
            .map(|_| ())
    }

    /// `PUT /url/{code}/password`
    pub async fn update_short_url_password(
        &self,
        short_code: &str,
        request: &UpdatePasswordRequest,
    ) -> Result<(), ApiError> {
        let path = format!("{}/password", short_url_path(short_code)?);
        self.send_validated::<_, serde_json::Value>(Method::PUT, &path, request)
            .await
            .map(|_| ())
    }
}

fn short_url_path(short_code: &str) -> Result<String, ApiError> {
    Ok(format!("/url/{}", short_code_segment(short_code)?))
}
