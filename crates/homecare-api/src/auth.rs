use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use homecare_db::models::NewUser;
use homecare_types::Role;
use homecare_types::api::{
    ChangePasswordRequest, Claims, ForgotPasswordRequest, LoginRequest, LoginResponse,
    MessageResponse, RegisterRequest, ResetPasswordRequest,
};

use crate::error::ApiError;
use crate::extract::{ApiJson, ValidJson};
use crate::middleware::MaybeClaims;
use crate::password::{hash_password, verify_password};
use crate::state::{AppState, run_db};
use crate::token::issue_token;

/// Reset tokens expire after one hour.
const RESET_TOKEN_LIFETIME_MINUTES: i64 = 60;

/// Create an account holding exactly `role`. Returns the new user id.
pub async fn create_account(
    state: &AppState,
    req: &RegisterRequest,
    role: Role,
) -> Result<String, ApiError> {
    let email = req.email.trim().to_string();
    let taken = || {
        ApiError::BadRequest(format!("Email '{}' is already taken.", req.email.trim()))
    };

    let lookup = email.clone();
    if run_db(state, move |db| db.email_exists(&lookup)).await? {
        return Err(taken());
    }

    let password_hash = hash_password(&req.password).await?;
    let user_id = Uuid::new_v4().to_string();

    let id = user_id.clone();
    let name = req.name.trim().to_string();
    let phone_number = req.phone_number.clone();
    // A concurrent registration can claim the email while we hash.
    let created = run_db(state, move |db| {
        db.create_user(
            &NewUser {
                id: &id,
                email: &email,
                name: &name,
                phone_number: phone_number.as_deref(),
                password_hash: &password_hash,
            },
            role,
        )
    })
    .await?;

    if !created {
        return Err(taken());
    }
    Ok(user_id)
}

/// POST /api/AuthAPI/register. Anonymous callers may only create client
/// accounts; other roles need an admin token. Failures report the first
/// problem only.
pub async fn register(
    State(state): State<AppState>,
    MaybeClaims(caller): MaybeClaims,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Err(errors) = req.validate() {
        let err = ApiError::from(errors);
        let message = err.first_message().unwrap_or("Registration failed.").to_string();
        return Err(ApiError::BadRequest(message));
    }

    let role = req.role.unwrap_or(Role::Client);
    let caller_is_admin = caller.as_ref().is_some_and(|c| c.has_role(Role::Admin));
    if role != Role::Client && !caller_is_admin {
        warn!(%role, "Refused registration of privileged account without admin token");
        return Err(ApiError::Forbidden);
    }

    let user_id = create_account(&state, &req, role).await?;
    info!(user = %user_id, %role, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User registered successfully")),
    ))
}

/// POST /api/AuthAPI/login
pub async fn login(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let email = req.email.clone();
    let user = run_db(&state, move |db| db.get_user_by_email(&email))
        .await?
        .ok_or_else(|| {
            info!("Login failed: unknown email");
            ApiError::Unauthorized
        })?;

    if !verify_password(&req.password, &user.password_hash).await? {
        info!(user = %user.id, "Login failed: wrong password");
        return Err(ApiError::Unauthorized);
    }

    let user_id = user.id.clone();
    let roles = run_db(&state, move |db| db.get_roles_for_user(&user_id)).await?;

    let (token, expiration) = issue_token(&state.jwt, &user.id, &user.email, &roles)?;
    info!(user = %user.id, "User logged in");

    Ok(Json(LoginResponse { token, expiration }))
}

/// POST /api/AuthAPI/logout. Tokens are stateless: an issued token stays
/// valid until it expires, the client is expected to discard it.
pub async fn logout() -> Json<MessageResponse> {
    Json(MessageResponse::new("Logged out successfully"))
}

/// POST /api/AuthAPI/ForgotPassword. Answers the same way whether or not the
/// email is registered.
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if let Some(token) = issue_reset_token(&state, &req.email).await? {
        // No mail transport: the token is delivered through the server log.
        info!(email = %req.email, %token, "Password reset token issued");
    }

    Ok(Json(MessageResponse::new(
        "If the email is registered, a password reset token has been sent.",
    )))
}

/// Create and store a one-time reset token. `None` for unknown emails.
pub async fn issue_reset_token(state: &AppState, email: &str) -> Result<Option<String>, ApiError> {
    let lookup = email.to_string();
    let Some(user) = run_db(state, move |db| db.get_user_by_email(&lookup)).await? else {
        return Ok(None);
    };

    let bytes: [u8; 32] = rand::random();
    let token = B64.encode(bytes);
    let token_hash = hash_reset_token(&token);
    let expires_at = Utc::now() + Duration::minutes(RESET_TOKEN_LIFETIME_MINUTES);

    run_db(state, move |db| db.insert_reset_token(&user.id, &token_hash, expires_at)).await?;
    Ok(Some(token))
}

fn hash_reset_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// POST /api/AuthAPI/ResetPassword
pub async fn reset_password(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let invalid = || ApiError::BadRequest("Invalid token.".to_string());

    let email = req.email.clone();
    let user = run_db(&state, move |db| db.get_user_by_email(&email))
        .await?
        .ok_or_else(invalid)?;

    let token_hash = hash_reset_token(&req.token);
    let token = run_db(&state, move |db| db.find_reset_token(&token_hash))
        .await?
        .ok_or_else(invalid)?;

    if token.user_id != user.id || token.used || token.expires_at < Utc::now() {
        info!(user = %user.id, "Rejected password reset token");
        return Err(invalid());
    }

    let password_hash = hash_password(&req.new_password).await?;
    let user_id = user.id.clone();
    let reset = run_db(&state, move |db| {
        if !db.consume_reset_token(token.id)? {
            return Ok(false);
        }
        db.update_password(&user_id, &password_hash)
    })
    .await?;

    if !reset {
        return Err(invalid());
    }

    info!(user = %user.id, "Password reset");
    Ok(Json(MessageResponse::new("Password has been reset.")))
}

/// POST /api/AuthAPI/ChangePassword
pub async fn change_password(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ValidJson(req): ValidJson<ChangePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    let user_id = claims.sub.clone();
    let user = run_db(&state, move |db| db.get_user_by_id(&user_id))
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if !verify_password(&req.current_password, &user.password_hash).await? {
        return Err(ApiError::field("currentPassword", "Incorrect password."));
    }

    let password_hash = hash_password(&req.new_password).await?;
    let user_id = user.id.clone();
    run_db(&state, move |db| db.update_password(&user_id, &password_hash)).await?;

    info!(user = %user.id, "Password changed");
    Ok(StatusCode::NO_CONTENT)
}
