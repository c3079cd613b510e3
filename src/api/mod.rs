/// HTTP client for the Intelink REST backend.
///
/// One method per backend endpoint, grouped by resource in the submodules:
/// - **auth**: login, register, profile, refresh, logout
/// - **short_url**: create/list/search/update/enable/disable/delete short URLs
/// - **statistics**: per-dimension breakdowns, time series, peak times
/// - **billing**: plans, subscriptions, VNPay payments
/// - **api_key**: API key management
///
/// Requests carry the session's bearer token when one is present. A 401 on an
/// authenticated request clears the session (forced logout).
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use url::Url;
use validator::Validate;

use crate::config::Config;
use crate::error::ApiError;
use crate::session::Session;

mod api_key;
mod auth;
mod billing;
mod short_url;
mod statistics;

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    session: Arc<Session>,
}

impl ApiClient {
    pub fn new(config: &Config, session: Arc<Session>) -> Result<Self, ApiError> {
        let base_url = Url::parse(config.api_url.trim_end_matches('/')).map_err(|e| {
            ApiError::Client(format!("Invalid API URL '{}': {}", config.api_url, e))
        })?;

        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("intelink/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ApiError::Client(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url,
            session,
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute URL for a path relative to the API base.
    pub fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|e| ApiError::Client(format!("Invalid path '{}': {}", path, e)))
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let request = self.request(Method::GET, path)?.query(query);
        self.execute(request, true).await
    }

    pub(crate) async fn send<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError> {
        let mut request = self.request(method, path)?;
        if let Some(body) = body {
            request = request.json(body);
        }
        self.execute(request, true).await
    }

    /// Like `send`, but runs the body's client-side checks first and never
    /// contacts the backend when they fail.
    pub(crate) async fn send_validated<B: Serialize + Validate, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        body.validate()?;
        self.send(method, path, Some(body)).await
    }

    /// Request without bearer token and without forced logout on 401.
    pub(crate) async fn send_anonymous<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let request = self.http.request(method, self.endpoint(path)?).json(body);
        self.execute(request, false).await
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let mut request = self.http.request(method, self.endpoint(path)?);
        if let Some(token) = self.session.access_token() {
            request = request.bearer_auth(token);
        }
        Ok(request)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        authenticated: bool,
    ) -> Result<T, ApiError> {
        let request = request
            .build()
            .map_err(|e| ApiError::Client(format!("Failed to build request: {}", e)))?;
        let method = request.method().clone();
        let url = request.url().clone();
        tracing::debug!("{} {}", method, url);

        let response = self.http.execute(request).await.map_err(|e| {
            tracing::warn!("{} {} failed: {}", method, url, e);
            ApiError::from(e)
        })?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let err = ApiError::from_status(status.as_u16(), &body);
            tracing::info!("{} {} -> {}: {}", method, url, status.as_u16(), err);
            if authenticated && err.is_unauthorized() && self.session.has_persisted_tokens() {
                tracing::warn!("Session rejected by server, logging out");
                if let Err(e) = self.session.clear() {
                    tracing::error!("Failed to clear session: {:#}", e);
                }
            }
            return Err(err);
        }

        tracing::debug!("{} {} -> {}", method, url, status.as_u16());
        decode_body(&body)
    }
}

/// Validate a short code before it goes into a path.
pub(crate) fn short_code_segment(short_code: &str) -> Result<&str, ApiError> {
    let code = short_code.trim();
    if code.is_empty() || code.contains(['/', '?', '#']) {
        return Err(ApiError::Validation {
            message: format!("Invalid short code '{}'", short_code),
            fields: Vec::new(),
        });
    }
    Ok(code)
}

/// Decode a success body; an empty body decodes as JSON `null`, so `()` and
/// `Option<T>` responses work for endpoints that return nothing.
fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::from_slice(b"null")?);
    }
    Ok(serde_json::from_slice(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::TokenStore;

    fn client(api_url: &str) -> ApiClient {
        let dir = tempfile::tempdir().unwrap();
        let session = Arc::new(Session::new(TokenStore::open(dir.path())));
        let config = Config {
            api_url: api_url.to_string(),
            ..Config::default()
        };
        ApiClient::new(&config, session).unwrap()
    }

    #[test]
    fn test_endpoint_joins_paths() {
        let api = client("http://localhost:8080/api/v1/");
        assert_eq!(
            api.endpoint("/statistics/abc/device").unwrap().as_str(),
            "http://localhost:8080/api/v1/statistics/abc/device"
        );
        assert_eq!(
            api.endpoint("url").unwrap().as_str(),
            "http://localhost:8080/api/v1/url"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let dir = tempfile::tempdir().unwrap();
        let session = Arc::new(Session::new(TokenStore::open(dir.path())));
        let config = Config {
            api_url: "not a url".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            ApiClient::new(&config, session),
            Err(ApiError::Client(_))
        ));
    }

    #[test]
    fn test_short_code_segment() {
        assert_eq!(short_code_segment(" abc123 ").unwrap(), "abc123");
        assert!(short_code_segment("").is_err());
        assert!(short_code_segment("a/b").is_err());
    }

    #[test]
    fn test_decode_empty_body() {
        decode_body::<()>(b"").unwrap();
        let none: Option<u32> = decode_body(b"  ").unwrap();
        assert!(none.is_none());
        let n: u32 = decode_body(b"42").unwrap();
        assert_eq!(n, 42);
        assert!(matches!(
            decode_body::<u32>(b"{"),
            Err(ApiError::Decode(_))
        ));
    }
}
