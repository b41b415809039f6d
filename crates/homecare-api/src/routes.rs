use axum::{
    Json, Router, middleware,
    routing::{get, post},
};
use serde_json::{Value, json};

use crate::middleware::require_auth;
use crate::state::AppState;
use crate::{appointments, auth, available_days, users};

/// The full API. Everything except the auth entry points and `/health`
/// requires a bearer token.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/AuthAPI/register", post(auth::register))
        .route("/api/AuthAPI/login", post(auth::login))
        .route("/api/AuthAPI/logout", post(auth::logout))
        .route("/api/AuthAPI/ForgotPassword", post(auth::forgot_password))
        .route("/api/AuthAPI/ResetPassword", post(auth::reset_password))
        .route("/health", get(health));

    let protected_routes = Router::new()
        .route("/api/AuthAPI/ChangePassword", post(auth::change_password))
        .route(
            "/api/AppointmentAPI",
            get(appointments::list_appointments).post(appointments::create_appointment),
        )
        .route(
            "/api/AppointmentAPI/{id}",
            get(appointments::get_appointment)
                .put(appointments::update_appointment)
                .delete(appointments::delete_appointment),
        )
        .route(
            "/api/AvailableDayAPI",
            get(available_days::list_available_days).post(available_days::create_available_day),
        )
        .route(
            "/api/AvailableDayAPI/grouped",
            get(available_days::grouped_available_days),
        )
        .route(
            "/api/AvailableDayAPI/personnel",
            get(available_days::list_personnel),
        )
        .route(
            "/api/AvailableDayAPI/{id}",
            get(available_days::get_available_day)
                .put(available_days::update_available_day)
                .delete(available_days::delete_available_day),
        )
        .route("/api/UserAPI/userlist", get(users::user_list))
        .route("/api/UserAPI/me", get(users::me).put(users::update_me))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
