use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::strategy;
use crate::authz::{Identity, UserType};
use crate::errors::AppError;

/// Cookie set by the front-ends and checked by the edge middleware.
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub access_secret: Arc<Vec<u8>>,
    pub refresh_secret: Arc<Vec<u8>>,
    pub access_exp_hours: i64,
    pub refresh_exp_hours: i64,
}

impl JwtConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let access_secret =
            std::env::var("JWT_SECRET").map_err(|_| AppError::configuration("JWT_SECRET not set"))?;
        let refresh_secret = std::env::var("JWT_REFRESH_SECRET")
            .map_err(|_| AppError::configuration("JWT_REFRESH_SECRET not set"))?;
        let access_exp_hours = hours_from_env("JWT_EXP_HOURS", 1)?;
        let refresh_exp_hours = hours_from_env("JWT_REFRESH_EXP_HOURS", 168)?;

        if access_secret == refresh_secret {
            tracing::warn!("JWT_SECRET and JWT_REFRESH_SECRET are identical");
        }

        Ok(Self {
            access_secret: Arc::new(access_secret.into_bytes()),
            refresh_secret: Arc::new(refresh_secret.into_bytes()),
            access_exp_hours,
            refresh_exp_hours,
        })
    }

    pub fn with_secrets(access_secret: &str, refresh_secret: &str) -> Self {
        Self {
            access_secret: Arc::new(access_secret.as_bytes().to_vec()),
            refresh_secret: Arc::new(refresh_secret.as_bytes().to_vec()),
            access_exp_hours: 1,
            refresh_exp_hours: 168,
        }
    }

    pub fn encode_access(&self, id: Uuid, user_type: UserType) -> Result<String, AppError> {
        encode(&self.access_secret, id, user_type, self.access_exp_hours)
    }

    pub fn encode_refresh(&self, id: Uuid, user_type: UserType) -> Result<String, AppError> {
        encode(&self.refresh_secret, id, user_type, self.refresh_exp_hours)
    }

    pub fn decode_access(&self, token: &str) -> Result<Claims, AppError> {
        decode(&self.access_secret, token)
    }

    pub fn decode_refresh(&self, token: &str) -> Result<Claims, AppError> {
        decode(&self.refresh_secret, token)
    }
}

fn hours_from_env(key: &str, default: i64) -> Result<i64, AppError> {
    std::env::var(key)
        .map(|val| val.parse::<i64>())
        .unwrap_or(Ok(default))
        .map_err(|_| AppError::configuration(format!("{key} must be a valid integer")))
}

fn encode(secret: &[u8], id: Uuid, user_type: UserType, exp_hours: i64) -> Result<String, AppError> {
    use chrono::{Duration, Utc};

    let now = Utc::now();
    let exp = now + Duration::hours(exp_hours);

    let claims = Claims {
        id,
        user_type,
        jti: Uuid::new_v4(),
        exp: exp.timestamp().max(0) as usize,
        iat: now.timestamp() as usize,
    };

    jsonwebtoken::encode(&Header::default(), &claims, &EncodingKey::from_secret(secret))
        .map_err(|err| AppError::token(err.to_string()))
}

fn decode(secret: &[u8], token: &str) -> Result<Claims, AppError> {
    let mut validation = Validation::default();
    validation.validate_exp = true;

    jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)
        .map(|data| data.claims)
        .map_err(|err| AppError::token(err.to_string()))
}

/// Token payload. `id` and `userType` are mandatory; a token without them
/// fails to decode.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub id: Uuid,
    pub user_type: UserType,
    pub jti: Uuid,
    pub exp: usize,
    pub iat: usize,
}

/// Bearer token from `Authorization`, falling back to the `accessToken` cookie.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == ACCESS_TOKEN_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

#[async_trait]
impl FromRequestParts<AppState> for Identity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = token_from_headers(&parts.headers)
            .ok_or_else(|| AppError::unauthorized("Authorization header missing"))?;

        let claims = state.jwt.decode_access(&token)?;

        strategy::validate_access(&state.pool, &claims).await
    }
}
