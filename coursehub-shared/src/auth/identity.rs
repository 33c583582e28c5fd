/// Bearer identity verification
///
/// The HTTP layer only needs to know who is calling. It hands the bearer
/// token to an [`IdentityVerifier`] and receives an [`Identity`]; how the token
/// is checked is up to the implementation. [`JwtIdentityVerifier`] validates
/// the access tokens minted by [`super::jwt`].
///
/// # Example
///
/// ```
/// use coursehub_shared::auth::identity::{IdentityVerifier, JwtIdentityVerifier};
/// use coursehub_shared::auth::jwt::{create_token, Claims, TokenType};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "a-secret-that-is-at-least-32-bytes!";
/// let user_id = Uuid::new_v4();
/// let token = create_token(&Claims::new(user_id, "x@example.com", TokenType::Access), secret)?;
///
/// let verifier = JwtIdentityVerifier::new(secret);
/// let identity = verifier.verify(&token).await?;
/// assert_eq!(identity.user_id, user_id);
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{validate_access_token, JwtError};

/// A verified caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
}

/// Request extension inserted by the bearer middleware
///
/// Handlers read it with `Extension<AuthContext>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub email: String,
}

impl From<Identity> for AuthContext {
    fn from(identity: Identity) -> Self {
        Self {
            user_id: identity.user_id,
            email: identity.email,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing credentials")]
    MissingCredentials,

    #[error("Invalid authorization header: {0}")]
    InvalidFormat(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    Expired,
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::Expired,
            other => AuthError::InvalidToken(other.to_string()),
        }
    }
}

/// Port for turning an opaque bearer token into an [`Identity`]
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Identity, AuthError>;
}

/// Verifies HS256 access tokens signed with the configured secret
pub struct JwtIdentityVerifier {
    secret: String,
}

impl JwtIdentityVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

#[async_trait]
impl IdentityVerifier for JwtIdentityVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let claims = validate_access_token(token, &self.secret)?;
        Ok(Identity {
            user_id: claims.sub,
            email: claims.email,
        })
    }
}

/// Extracts the token from `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?
        .to_str()
        .map_err(|_| AuthError::InvalidFormat("header is not valid ASCII".to_string()))?;

    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(AuthError::InvalidFormat("expected Bearer token".to_string())),
    }
}
