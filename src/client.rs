//! HTTP client for the portal API.
//!
//! [`ApiClient`] owns its [`Session`]. Before each request an expired access
//! token is refreshed; a 401 answer triggers one refresh and one resubmission.
//! When the refresh is rejected, or the resubmission is still unauthorized,
//! the session is cleared and the call fails with
//! [`ClientError::SessionExpired`].

use std::time::Duration;

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

use crate::authz::UserType;

/// Seconds before `exp` at which a token is already treated as expired.
const EXPIRY_LEEWAY_SECS: i64 = 10;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{status}: {message}")]
    Api {
        status: StatusCode,
        error: String,
        message: String,
    },

    /// No session is held, so nothing can be sent on the caller's behalf.
    #[error("not logged in")]
    NotLoggedIn,

    /// The refresh was rejected or did not help; the session has been cleared.
    #[error("session expired, please log in again")]
    SessionExpired,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ExpiryClaims {
    exp: i64,
}

/// Reads `exp` without verifying the signature. Tokens that cannot be read are
/// left for the server to judge.
pub fn is_expired(token: &str) -> bool {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    match decode::<ExpiryClaims>(token, &DecodingKey::from_secret(&[]), &validation) {
        Ok(data) => data.claims.exp - EXPIRY_LEEWAY_SECS <= chrono::Utc::now().timestamp(),
        Err(_) => false,
    }
}

#[derive(Debug)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    session: RwLock<Option<Session>>,
    // serialises refreshes so concurrent callers share one rotation
    refresh_lock: Mutex<()>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let http = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        })
    }

    pub fn with_session(self, session: Session) -> Self {
        Self {
            session: RwLock::new(Some(session)),
            ..self
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    pub async fn set_session(&self, session: Option<Session>) {
        *self.session.write().await = session;
    }

    pub async fn login(&self, email: &str, password: &str, user_type: UserType) -> ClientResult<Session> {
        let body = serde_json::json!({
            "email": email,
            "password": password,
            "userType": user_type,
        });

        let response = self.http.post(self.url("/auth/login")).json(&body).send().await?;
        let session: Session = Self::parse(response).await?;

        self.set_session(Some(session.clone())).await;
        tracing::debug!(base_url = %self.base_url, "logged in");

        Ok(session)
    }

    /// Revokes the refresh token server-side when possible and always drops
    /// the local session.
    pub async fn logout(&self) -> ClientResult<()> {
        let result = self
            .send::<serde_json::Value, ()>(Method::POST, "/auth/logout", None)
            .await
            .map(|_| ());
        self.set_session(None).await;

        match result {
            Err(ClientError::SessionExpired) | Err(ClientError::NotLoggedIn) => Ok(()),
            other => other,
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send::<T, ()>(Method::GET, path, None).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> ClientResult<T> {
        self.send(Method::POST, path, Some(body)).await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> ClientResult<T> {
        self.send(Method::PATCH, path, Some(body)).await
    }

    async fn send<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> ClientResult<T> {
        let mut access_token = self.access_token().await?;
        if is_expired(&access_token) {
            tracing::debug!("access token expired, refreshing before request");
            access_token = self.refresh(&access_token).await?;
        }

        let response = self.dispatch(method.clone(), path, body, &access_token).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Self::parse(response).await;
        }

        tracing::debug!(%path, "request unauthorized, refreshing and retrying once");
        let access_token = self.refresh(&access_token).await?;
        let response = self.dispatch(method, path, body, &access_token).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::warn!(%path, "still unauthorized after refresh, clearing session");
            self.set_session(None).await;
            return Err(ClientError::SessionExpired);
        }

        Self::parse(response).await
    }

    async fn dispatch<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        access_token: &str,
    ) -> ClientResult<reqwest::Response> {
        let mut request = self.http.request(method, self.url(path)).bearer_auth(access_token);
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }

    async fn access_token(&self) -> ClientResult<String> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|s| s.access_token.clone())
            .ok_or(ClientError::NotLoggedIn)
    }

    /// Exchanges the refresh token for a new pair. `stale` is the access token
    /// the caller saw; if another task already replaced it, that result is
    /// reused instead of rotating again.
    async fn refresh(&self, stale: &str) -> ClientResult<String> {
        let _guard = self.refresh_lock.lock().await;

        let refresh_token = {
            let session = self.session.read().await;
            let session = session.as_ref().ok_or(ClientError::SessionExpired)?;
            if session.access_token != stale {
                return Ok(session.access_token.clone());
            }
            session.refresh_token.clone()
        };

        let response = self
            .http
            .post(self.url("/auth/refresh"))
            .json(&serde_json::json!({ "refreshToken": refresh_token }))
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "token refresh rejected, clearing session");
            self.set_session(None).await;
            return Err(ClientError::SessionExpired);
        }

        let session: Session = response.json().await?;
        let access_token = session.access_token.clone();
        self.set_session(Some(session)).await;

        Ok(access_token)
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let (error, message) = match serde_json::from_str::<ErrorBody>(&text) {
                Ok(body) => (body.error, body.message),
                Err(_) => (status.as_str().to_string(), text),
            };
            return Err(ClientError::Api { status, error, message });
        }

        Ok(serde_json::from_str(&text)?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}
