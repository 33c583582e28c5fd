/// Authentication endpoints
///
/// - `POST /v1/auth/signup` - Create an account and get tokens
/// - `POST /v1/auth/login` - Exchange credentials for tokens
/// - `POST /v1/auth/refresh` - Exchange a refresh token for an access token

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ApiJson,
};
use axum::{extract::State, http::StatusCode, Json};
use coursehub_shared::{
    auth::{jwt, password},
    error::FieldError,
    models::user::{CreateUser, User},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// Where the client should go after authenticating
pub const POST_AUTH_REDIRECT: &str = "/courses";

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Checked for strength separately
    pub password: String,

    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Tokens issued at signup and login
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user_id: Uuid,

    /// Access token (1h)
    pub token: String,

    /// Refresh token (30d)
    pub refresh_token: String,

    pub redirect_url: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// New access token (1h)
    pub token: String,
}

fn issue_tokens(user: &User, secret: &str) -> ApiResult<AuthResponse> {
    let access = jwt::Claims::new(user.id, user.email.clone(), jwt::TokenType::Access);
    let refresh = jwt::Claims::new(user.id, user.email.clone(), jwt::TokenType::Refresh);

    Ok(AuthResponse {
        user_id: user.id,
        token: jwt::create_token(&access, secret)?,
        refresh_token: jwt::create_token(&refresh, secret)?,
        redirect_url: POST_AUTH_REDIRECT.to_string(),
    })
}

/// Register a new learner
///
/// # Errors
///
/// - `400 Bad Request`: invalid email, weak password or bad name
/// - `409 Conflict`: email already registered
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SignupRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    req.validate()?;

    password::validate_password_strength(&req.password).map_err(|message| {
        ApiError::ValidationError(vec![FieldError::new("password", message)])
    })?;

    let password_hash = password::hash_password(&req.password)?;

    let user = state
        .store
        .create_user(CreateUser {
            email: req.email.trim().to_string(),
            password_hash,
            name: req.name.trim().to_string(),
        })
        .await?;

    info!(user_id = %user.id, "User signed up");

    Ok((
        StatusCode::CREATED,
        Json(issue_tokens(&user, state.jwt_secret())?),
    ))
}

/// Authenticate with email and password
///
/// Unknown emails and wrong passwords get the same 401.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate()?;

    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let user = state
        .store
        .find_user_by_email(req.email.trim())
        .await?
        .ok_or_else(invalid)?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        return Err(invalid());
    }

    info!(user_id = %user.id, "User logged in");

    Ok(Json(issue_tokens(&user, state.jwt_secret())?))
}

/// Exchange a refresh token for a new access token
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let token = jwt::refresh_access_token(&req.refresh_token, state.jwt_secret())?;

    Ok(Json(RefreshResponse { token }))
}
