use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{HeaderMap, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use tracing::debug;

use homecare_types::Role;
use homecare_types::api::Claims;

use crate::error::ApiError;
use crate::state::AppState;
use crate::token::decode_token;

pub const ANY_ROLE: &[Role] = &Role::ALL;
pub const STAFF: &[Role] = &[Role::HealthcarePersonnel, Role::Admin];

/// `Ok(None)` without a bearer header; `Err` when the token is invalid.
fn claims_from_headers(headers: &HeaderMap, state: &AppState) -> Result<Option<Claims>, ApiError> {
    match headers.typed_get::<Authorization<Bearer>>() {
        Some(Authorization(bearer)) => decode_token(&state.jwt, bearer.token()).map(Some),
        None => Ok(None),
    }
}

/// Extract and validate the JWT from the Authorization header, then hand the
/// claims to the handler as an extension.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = claims_from_headers(req.headers(), &state)?.ok_or(ApiError::Unauthorized)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Caller claims on routes that also serve anonymous requests. A stale or
/// malformed token reads as anonymous rather than failing the request.
#[derive(Debug, Clone)]
pub struct MaybeClaims(pub Option<Claims>);

impl<S> FromRequestParts<S> for MaybeClaims
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let claims = claims_from_headers(&parts.headers, &state).unwrap_or_else(|_| {
            debug!("Ignoring undecodable bearer token on anonymous route");
            None
        });
        Ok(MaybeClaims(claims))
    }
}

/// 403 unless the caller holds one of `roles`.
pub fn require_role(claims: &Claims, roles: &[Role]) -> Result<(), ApiError> {
    if claims.has_any_role(roles) {
        Ok(())
    } else {
        debug!(user = %claims.sub, roles = ?claims.role, "Role check failed");
        Err(ApiError::Forbidden)
    }
}

/// True for callers whose only standing is as a client.
pub fn is_client_only(claims: &Claims) -> bool {
    claims.has_role(Role::Client) && !claims.has_any_role(STAFF)
}
