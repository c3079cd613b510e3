//! Authentication endpoints and the session lifecycle built on them.

use reqwest::Method;
use validator::Validate;

use super::ApiClient;
use crate::error::ApiError;
use crate::models::auth::{AuthResponse, LoginRequest, RefreshRequest, RegisterRequest, User};

impl ApiClient {
    /// `POST /auth/login`, then load the profile and establish the session.
    ///
    /// A 401 here means wrong credentials, not an expired session.
    pub async fn login(&self, request: &LoginRequest) -> Result<User, ApiError> {
        request.validate()?;
        self.session().begin_loading();

        let auth: AuthResponse = self
            .send_anonymous(Method::POST, "/auth/login", request)
            .await
            .map_err(|e| match e {
                ApiError::Unauthorized { .. } => ApiError::Unauthorized {
                    message: "Invalid credentials".to_string(),
                },
                other => other,
            })
            .inspect_err(|_| self.reset_loading())?;

        self.adopt(auth).await
    }

    /// `POST /auth/register`; a 409 means the username or email is taken.
    pub async fn register(&self, request: &RegisterRequest) -> Result<User, ApiError> {
        request.validate()?;

        let auth: AuthResponse = self
            .send_anonymous(Method::POST, "/auth/register", request)
            .await
            .map_err(|e| match e {
                ApiError::Conflict { message } => ApiError::Conflict {
                    message: if message.to_lowercase().contains("exist") {
                        message
                    } else {
                        "An account with this username or email already exists".to_string()
                    },
                },
                other => other,
            })?;

        self.adopt(auth).await
    }

    /// `GET /auth/profile`
    pub async fn profile(&self) -> Result<User, ApiError> {
        self.get("/auth/profile", &[]).await
    }

    /// Restore the session from persisted tokens.
    ///
    /// Returns `Ok(None)` when no tokens are stored. When the profile cannot
    /// be loaded with the stored tokens, the session is cleared.
    pub async fn initialize_session(&self) -> Result<Option<User>, ApiError> {
        let session = self.session();
        if !session.has_persisted_tokens() {
            return Ok(None);
        }

        session.begin_loading();
        match self.profile().await {
            Ok(user) => {
                tracing::info!("Session restored for {}", user.username);
                session.set_user(user.clone());
                Ok(Some(user))
            }
            Err(e) if e.is_transport() => {
                // Keep the tokens; the server may just be unreachable right now
                self.reset_loading();
                Err(e)
            }
            Err(e) => {
                tracing::warn!("Stored session is no longer valid: {}", e);
                self.clear_session();
                Ok(None)
            }
        }
    }

    /// `POST /auth/refresh` with the stored refresh token.
    pub async fn refresh_session(&self) -> Result<(), ApiError> {
        let refresh_token = self
            .session()
            .refresh_token()
            .ok_or_else(|| ApiError::Client("No refresh token stored".to_string()))?;

        let auth: AuthResponse = self
            .send_anonymous(
                Method::POST,
                "/auth/refresh",
                &RefreshRequest {
                    refresh_token: refresh_token.clone(),
                },
            )
            .await
            .inspect_err(|e| {
                if e.is_unauthorized() {
                    self.clear_session();
                }
            })?;

        self.session()
            .establish(
                auth.token,
                auth.refresh_token.or(Some(refresh_token)),
                auth.user,
            )
            .map_err(|e| ApiError::Client(format!("{:#}", e)))
    }

    /// `POST /auth/logout`, then clear the local session.
    ///
    /// The local session is cleared even when the backend call fails.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let remote = if self.session().has_persisted_tokens() {
            self.send::<(), serde_json::Value>(Method::POST, "/auth/logout", None)
                .await
                .map(|_| ())
        } else {
            Ok(())
        };

        self.session()
            .clear()
            .map_err(|e| ApiError::Client(format!("{:#}", e)))?;

        if let Err(ref e) = remote {
            tracing::warn!("Backend logout failed: {}", e);
        }
        remote
    }

    async fn adopt(&self, auth: AuthResponse) -> Result<User, ApiError> {
        let session = self.session();
        session
            .establish(auth.token, auth.refresh_token, auth.user.clone())
            .map_err(|e| ApiError::Client(format!("{:#}", e)))?;

        match auth.user {
            Some(user) => Ok(user),
            None => {
                let user = self.profile().await?;
                session.set_user(user.clone());
                Ok(user)
            }
        }
    }

    fn reset_loading(&self) {
        self.session().end_loading();
    }

    fn clear_session(&self) {
        if let Err(e) = self.session().clear() {
            tracing::error!("Failed to clear session: {:#}", e);
        }
    }
}
