//! Session identity.
//!
//! Every dashboard request carries an HS256 session token, either as
//! `Authorization: Bearer <token>` or in the `tally_session` cookie. The
//! [`SessionProvider`] turns request headers into an [`Identity`]; an
//! invalid, expired or missing token simply yields no identity.

use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::HeaderMap;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use tally_core::UserId;
use tracing::debug;
use uuid::Uuid;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "tally_session";

/// The authenticated user behind a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: UserId,
    pub email: String,
}

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    /// User email
    pub email: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

/// Session errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Failed to issue session token: {0}")]
    Issue(String),

    #[error("Invalid session token: {0}")]
    Invalid(String),
}

/// Resolves the identity of a request.
pub trait SessionProvider: Send + Sync {
    fn identify(&self, headers: &HeaderMap) -> Option<Identity>;
}

/// HS256 session tokens.
pub struct JwtSessionProvider {
    secret: String,
    lifetime_secs: i64,
}

impl JwtSessionProvider {
    pub fn new(secret: impl Into<String>, lifetime_secs: i64) -> Self {
        JwtSessionProvider {
            secret: secret.into(),
            lifetime_secs,
        }
    }

    /// Issues a session token for a user.
    pub fn issue_token(&self, user_id: UserId, email: &str) -> Result<String, SessionError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.lifetime_secs);

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| SessionError::Issue(e.to_string()))
    }

    /// Validate and decode a token.
    pub fn validate_token(&self, token: &str) -> Result<Claims, SessionError> {
        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| SessionError::Invalid(e.to_string()))?;

        Ok(token_data.claims)
    }

    fn identity_from_token(&self, token: &str) -> Result<Identity, SessionError> {
        let claims = self.validate_token(token)?;
        let user_id = claims
            .sub
            .parse::<UserId>()
            .map_err(|_| SessionError::Invalid(format!("subject '{}' is not a user id", claims.sub)))?;

        Ok(Identity {
            user_id,
            email: claims.email,
        })
    }
}

impl SessionProvider for JwtSessionProvider {
    fn identify(&self, headers: &HeaderMap) -> Option<Identity> {
        let token = session_token(headers)?;
        match self.identity_from_token(token) {
            Ok(identity) => Some(identity),
            Err(e) => {
                debug!(error = %e, "Rejected session token");
                None
            }
        }
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Finds the session token in the Authorization header or the session cookie.
fn session_token(headers: &HeaderMap) -> Option<&str> {
    if let Some(token) = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(extract_bearer_token)
    {
        return Some(token);
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
        .filter(|v| !v.is_empty())
}
