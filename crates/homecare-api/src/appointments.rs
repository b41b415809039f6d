use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{debug, info};

use homecare_db::models::NewAppointment;
use homecare_types::api::{AppointmentRequest, Claims};
use homecare_types::models::Appointment;

use crate::available_days::ensure_end_after_start;
use crate::error::ApiError;
use crate::extract::{ApiPath, ValidJson};
use crate::middleware::{ANY_ROLE, is_client_only, require_role};
use crate::state::{AppState, run_db};

fn not_found(id: i64) -> ApiError {
    ApiError::NotFound(format!("Appointment {} not found", id))
}

/// Clients always book for themselves; staff must name the client.
async fn resolve_client(
    state: &AppState,
    claims: &Claims,
    requested: Option<String>,
) -> Result<String, ApiError> {
    let client_id = if is_client_only(claims) {
        claims.sub.clone()
    } else {
        requested
            .ok_or_else(|| ApiError::field("clientId", "The ClientId field is required."))?
    };

    let id = client_id.clone();
    if run_db(state, move |db| db.get_user_by_id(&id)).await?.is_none() {
        return Err(ApiError::field("clientId", "Selected client does not exist."));
    }

    Ok(client_id)
}

fn ensure_can_manage(claims: &Claims, appointment: &Appointment) -> Result<(), ApiError> {
    if is_client_only(claims) && claims.sub != appointment.client_id {
        return Err(ApiError::Forbidden);
    }
    Ok(())
}

async fn load(state: &AppState, id: i64) -> Result<Appointment, ApiError> {
    run_db(state, move |db| db.get_appointment(id))
        .await?
        .map(Appointment::from)
        .ok_or_else(|| not_found(id))
}

/// GET /api/AppointmentAPI: ordered by day date, then start time. Clients
/// only see their own bookings.
pub async fn list_appointments(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Appointment>>, ApiError> {
    require_role(&claims, ANY_ROLE)?;

    let rows = if is_client_only(&claims) {
        let client_id = claims.sub.clone();
        run_db(&state, move |db| db.get_appointments_for_client(&client_id)).await?
    } else {
        run_db(&state, |db| db.get_all_appointments()).await?
    };
    Ok(Json(rows.into_iter().map(Appointment::from).collect()))
}

/// GET /api/AppointmentAPI/{id}
pub async fn get_appointment(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Appointment>, ApiError> {
    require_role(&claims, ANY_ROLE)?;

    let appointment = load(&state, id).await?;
    ensure_can_manage(&claims, &appointment)?;
    Ok(Json(appointment))
}

/// POST /api/AppointmentAPI. The booked times are always the available
/// day's times; submitted times are ignored.
pub async fn create_appointment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ValidJson(req): ValidJson<AppointmentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&claims, ANY_ROLE)?;

    let client_id = resolve_client(&state, &claims, req.client_id).await?;

    let day_id = req.available_day_id;
    let day = run_db(&state, move |db| db.get_available_day(day_id))
        .await?
        .ok_or_else(|| {
            ApiError::field("availableDayId", "Selected available day does not exist.")
        })?;

    if req.start_time.is_some_and(|t| t != day.start_time)
        || req.end_time.is_some_and(|t| t != day.end_time)
    {
        debug!(day = day.id, "Submitted times replaced by the available day's times");
    }

    let appointment = NewAppointment {
        client_id,
        available_day_id: day.id,
        start_time: day.start_time,
        end_time: day.end_time,
        task_description: req.task_description,
    };

    let row = run_db(&state, move |db| {
        let id = db.create_appointment(&appointment)?;
        db.get_appointment(id)?
            .ok_or_else(|| anyhow::anyhow!("appointment {} vanished after insert", id))
    })
    .await?;

    info!(id = row.id, client = %row.client_id, day = row.available_day_id, "Appointment created");
    Ok((StatusCode::CREATED, Json(Appointment::from(row))))
}

/// PUT /api/AppointmentAPI/{id}. Times are stored as submitted (or kept
/// when omitted); they are not checked against the day's window.
pub async fn update_appointment(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    Extension(claims): Extension<Claims>,
    ValidJson(req): ValidJson<AppointmentRequest>,
) -> Result<Json<Appointment>, ApiError> {
    require_role(&claims, ANY_ROLE)?;

    let existing = load(&state, id).await?;
    ensure_can_manage(&claims, &existing)?;

    let requested_client = req.client_id.or_else(|| Some(existing.client_id.clone()));
    let client_id = resolve_client(&state, &claims, requested_client).await?;

    let day_id = req.available_day_id;
    if run_db(&state, move |db| db.get_available_day(day_id)).await?.is_none() {
        return Err(ApiError::field(
            "availableDayId",
            "Selected available day does not exist.",
        ));
    }

    let start_time = req.start_time.unwrap_or(existing.start_time);
    let end_time = req.end_time.unwrap_or(existing.end_time);
    ensure_end_after_start(start_time, end_time)?;

    let appointment = NewAppointment {
        client_id,
        available_day_id: day_id,
        start_time,
        end_time,
        task_description: req.task_description,
    };

    let row = run_db(&state, move |db| {
        if !db.update_appointment(id, &appointment)? {
            return Ok(None);
        }
        db.get_appointment(id)
    })
    .await?
    .ok_or_else(|| not_found(id))?;

    info!(id, "Appointment updated");
    Ok(Json(row.into()))
}

/// DELETE /api/AppointmentAPI/{id}
pub async fn delete_appointment(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<StatusCode, ApiError> {
    require_role(&claims, ANY_ROLE)?;

    let existing = load(&state, id).await?;
    ensure_can_manage(&claims, &existing)?;

    if !run_db(&state, move |db| db.delete_appointment(id)).await? {
        return Err(not_found(id));
    }

    info!(id, "Appointment deleted");
    Ok(StatusCode::NO_CONTENT)
}
