use std::collections::BTreeMap;

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use chrono::NaiveTime;
use tracing::info;

use homecare_db::models::NewAvailableDay;
use homecare_types::Role;
use homecare_types::api::{AvailableDayRequest, Claims};
use homecare_types::models::{AvailableDay, PersonnelSchedule, User};

use crate::error::ApiError;
use crate::extract::{ApiPath, ValidJson};
use crate::middleware::{ANY_ROLE, STAFF, require_role};
use crate::state::{AppState, run_db};

/// Shared by slots and appointments.
pub(crate) fn ensure_end_after_start(start: NaiveTime, end: NaiveTime) -> Result<(), ApiError> {
    if end <= start {
        return Err(ApiError::field("endTime", "End time must be after start time."));
    }
    Ok(())
}

fn not_found(id: i64) -> ApiError {
    ApiError::NotFound(format!("Available day {} not found", id))
}

/// Admins publish for the personnel they name (themselves by default);
/// everyone else publishes for themselves. The owner must be personnel.
async fn resolve_owner(
    state: &AppState,
    claims: &Claims,
    requested: Option<String>,
) -> Result<String, ApiError> {
    let owner = match requested {
        Some(id) if claims.has_role(Role::Admin) => id,
        _ => claims.sub.clone(),
    };

    let id = owner.clone();
    let is_personnel =
        run_db(state, move |db| db.user_has_role(&id, Role::HealthcarePersonnel)).await?;
    if !is_personnel {
        return Err(ApiError::field(
            "healthcarePersonnelId",
            "Selected user is not healthcare personnel.",
        ));
    }

    Ok(owner)
}

/// Personnel may only touch their own slots; admins may touch any.
fn ensure_can_manage(claims: &Claims, owner_id: &str) -> Result<(), ApiError> {
    if claims.has_role(Role::Admin) || claims.sub == owner_id {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

/// GET /api/AvailableDayAPI
pub async fn list_available_days(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<AvailableDay>>, ApiError> {
    require_role(&claims, ANY_ROLE)?;

    let rows = run_db(&state, |db| db.get_all_available_days()).await?;
    Ok(Json(rows.into_iter().map(AvailableDay::from).collect()))
}

/// GET /api/AvailableDayAPI/grouped: one entry per personnel, ordered by
/// name, slots in listing order.
pub async fn grouped_available_days(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<PersonnelSchedule>>, ApiError> {
    require_role(&claims, ANY_ROLE)?;

    let rows = run_db(&state, |db| db.get_all_available_days()).await?;
    Ok(Json(group_by_personnel(rows.into_iter().map(AvailableDay::from))))
}

fn group_by_personnel(days: impl IntoIterator<Item = AvailableDay>) -> Vec<PersonnelSchedule> {
    let mut groups: BTreeMap<(String, String), Vec<AvailableDay>> = BTreeMap::new();
    for day in days {
        let key = (
            day.healthcare_personnel_name.clone(),
            day.healthcare_personnel_id.clone(),
        );
        groups.entry(key).or_default().push(day);
    }

    groups
        .into_iter()
        .map(|((name, id), available_days)| PersonnelSchedule {
            healthcare_personnel_id: id,
            healthcare_personnel_name: name,
            available_days,
        })
        .collect()
}

/// GET /api/AvailableDayAPI/personnel: choices for the slot owner field.
pub async fn list_personnel(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<User>>, ApiError> {
    require_role(&claims, STAFF)?;

    let rows = run_db(&state, |db| db.get_users_in_role(Role::HealthcarePersonnel)).await?;
    Ok(Json(rows.into_iter().map(User::from).collect()))
}

/// GET /api/AvailableDayAPI/{id}
pub async fn get_available_day(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<AvailableDay>, ApiError> {
    require_role(&claims, ANY_ROLE)?;

    let row = run_db(&state, move |db| db.get_available_day(id))
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(row.into()))
}

/// POST /api/AvailableDayAPI
pub async fn create_available_day(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ValidJson(req): ValidJson<AvailableDayRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&claims, STAFF)?;
    ensure_end_after_start(req.start_time, req.end_time)?;

    let owner = resolve_owner(&state, &claims, req.healthcare_personnel_id).await?;
    let day = NewAvailableDay {
        healthcare_personnel_id: owner,
        date: req.date,
        start_time: req.start_time,
        end_time: req.end_time,
    };

    let row = run_db(&state, move |db| {
        let id = db.create_available_day(&day)?;
        db.get_available_day(id)?
            .ok_or_else(|| anyhow::anyhow!("available day {} vanished after insert", id))
    })
    .await?;

    info!(id = row.id, personnel = %row.healthcare_personnel_id, date = %row.date, "Available day created");
    Ok((StatusCode::CREATED, Json(AvailableDay::from(row))))
}

/// PUT /api/AvailableDayAPI/{id}
pub async fn update_available_day(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    Extension(claims): Extension<Claims>,
    ValidJson(req): ValidJson<AvailableDayRequest>,
) -> Result<Json<AvailableDay>, ApiError> {
    require_role(&claims, STAFF)?;

    let existing = run_db(&state, move |db| db.get_available_day(id))
        .await?
        .ok_or_else(|| not_found(id))?;
    ensure_can_manage(&claims, &existing.healthcare_personnel_id)?;
    ensure_end_after_start(req.start_time, req.end_time)?;

    let requested = req
        .healthcare_personnel_id
        .or(Some(existing.healthcare_personnel_id));
    let owner = resolve_owner(&state, &claims, requested).await?;
    let day = NewAvailableDay {
        healthcare_personnel_id: owner,
        date: req.date,
        start_time: req.start_time,
        end_time: req.end_time,
    };

    let row = run_db(&state, move |db| {
        if !db.update_available_day(id, &day)? {
            return Ok(None);
        }
        db.get_available_day(id)
    })
    .await?
    .ok_or_else(|| not_found(id))?;

    info!(id, "Available day updated");
    Ok(Json(row.into()))
}

/// DELETE /api/AvailableDayAPI/{id}. Appointments on the day go with it.
pub async fn delete_available_day(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<StatusCode, ApiError> {
    require_role(&claims, STAFF)?;

    let existing = run_db(&state, move |db| db.get_available_day(id))
        .await?
        .ok_or_else(|| not_found(id))?;
    ensure_can_manage(&claims, &existing.healthcare_personnel_id)?;

    if !run_db(&state, move |db| db.delete_available_day(id)).await? {
        return Err(not_found(id));
    }

    info!(id, "Available day deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(id: i64, personnel: &str, name: &str) -> AvailableDay {
        AvailableDay {
            id,
            healthcare_personnel_id: personnel.into(),
            healthcare_personnel_name: name.into(),
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn grouping_keeps_listing_order_within_each_personnel() {
        let groups = group_by_personnel(vec![
            day(1, "p-ola", "Ola"),
            day(2, "p-anne", "Anne"),
            day(3, "p-ola", "Ola"),
        ]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].healthcare_personnel_name, "Anne");
        let ola: Vec<_> = groups[1].available_days.iter().map(|d| d.id).collect();
        assert_eq!(ola, [1, 3]);
    }

    #[test]
    fn end_must_follow_start() {
        let eight = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        assert!(ensure_end_after_start(eight, nine).is_ok());
        assert!(ensure_end_after_start(nine, eight).is_err());
        assert!(ensure_end_after_start(eight, eight).is_err());
    }
}
