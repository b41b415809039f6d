use axum::{Extension, Json, extract::State};
use serde::Deserialize;
use tracing::info;

use homecare_types::Role;
use homecare_types::api::{Claims, UpdateProfileRequest};
use homecare_types::models::User;

use crate::error::ApiError;
use crate::extract::{ApiQuery, ValidJson};
use crate::middleware::{STAFF, require_role};
use crate::state::{AppState, run_db};

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub role: Option<Role>,
}

/// GET /api/UserAPI/userlist: every user with their primary role, or only
/// those holding `?role=`.
pub async fn user_list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<UserListQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<User>>, ApiError> {
    require_role(&claims, STAFF)?;

    let rows = run_db(&state, move |db| match query.role {
        Some(role) => db.get_users_in_role(role),
        None => db.get_all_users(),
    })
    .await?;

    Ok(Json(rows.into_iter().map(User::from).collect()))
}

/// GET /api/UserAPI/me
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<User>, ApiError> {
    let id = claims.sub.clone();
    let row = run_db(&state, move |db| db.get_user_summary(&id))
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    Ok(Json(row.into()))
}

/// PUT /api/UserAPI/me
pub async fn update_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ValidJson(req): ValidJson<UpdateProfileRequest>,
) -> Result<Json<User>, ApiError> {
    let id = claims.sub.clone();
    let row = run_db(&state, move |db| {
        let name = req.name.trim();
        if !db.update_profile(&id, name, req.phone_number.as_deref())? {
            return Ok(None);
        }
        db.get_user_summary(&id)
    })
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    info!(user = %claims.sub, "Profile updated");
    Ok(Json(row.into()))
}
