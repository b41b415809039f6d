use chrono::{Days, NaiveTime, Utc};
use tracing::{info, warn};

use homecare_db::models::{NewAppointment, NewAvailableDay};
use homecare_types::Role;
use homecare_types::api::{RegisterRequest, validate_password};

use crate::auth::create_account;
use crate::error::ApiError;
use crate::state::{AppState, run_db};

const CLIENTS: [(&str, &str); 2] = [
    ("ingrid.hansen@example.com", "Ingrid Hansen"),
    ("per.olsen@example.com", "Per Olsen"),
];

const PERSONNEL: [(&str, &str); 2] = [
    ("nina.berg@example.com", "Nina Berg"),
    ("jonas.lie@example.com", "Jonas Lie"),
];

const ADMIN: (&str, &str) = ("admin@example.com", "Administrator");

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub available_days: usize,
    pub appointments: usize,
}

/// Populate an empty database with demo accounts and bookings. Each
/// collection is only filled when it is empty, so running twice is harmless.
pub async fn seed(state: &AppState, password: &str) -> Result<SeedSummary, ApiError> {
    // Seeded accounts obey the same password rules as registration.
    validate_password(password).map_err(|e| {
        let reason = e.message.map(|m| m.to_string()).unwrap_or_default();
        ApiError::BadRequest(format!("Seed password rejected: {}", reason))
    })?;

    let mut summary = SeedSummary::default();

    if run_db(state, |db| db.count_users()).await? == 0 {
        let accounts = CLIENTS
            .iter()
            .map(|(email, name)| (*email, *name, Role::Client))
            .chain(
                PERSONNEL
                    .iter()
                    .map(|(email, name)| (*email, *name, Role::HealthcarePersonnel)),
            )
            .chain(std::iter::once((ADMIN.0, ADMIN.1, Role::Admin)));

        for (email, name, role) in accounts {
            let req = RegisterRequest {
                email: email.to_string(),
                password: password.to_string(),
                name: name.to_string(),
                phone_number: None,
                role: Some(role),
            };
            create_account(state, &req, role).await?;
            summary.users += 1;
        }
    }

    if run_db(state, |db| db.count_available_days()).await? == 0 {
        summary.available_days = seed_available_days(state).await?;
    }

    if run_db(state, |db| db.count_appointments()).await? == 0 {
        summary.appointments = seed_appointment(state).await?;
    }

    info!(
        users = summary.users,
        available_days = summary.available_days,
        appointments = summary.appointments,
        "Seed complete"
    );
    Ok(summary)
}

async fn seed_available_days(state: &AppState) -> Result<usize, ApiError> {
    let today = Utc::now().date_naive();
    let slots = [
        (PERSONNEL[0].0, 1, (8, 0), (12, 0)),
        (PERSONNEL[1].0, 2, (12, 0), (16, 0)),
    ];

    let mut created = 0;
    for (email, days_ahead, (start_h, start_m), (end_h, end_m)) in slots {
        let Some(personnel) = run_db(state, move |db| db.get_user_by_email(email)).await? else {
            warn!(email, "Seed personnel missing; skipping available day");
            continue;
        };

        let day = NewAvailableDay {
            healthcare_personnel_id: personnel.id,
            date: today + Days::new(days_ahead),
            start_time: hm(start_h, start_m)?,
            end_time: hm(end_h, end_m)?,
        };
        run_db(state, move |db| db.create_available_day(&day)).await?;
        created += 1;
    }
    Ok(created)
}

async fn seed_appointment(state: &AppState) -> Result<usize, ApiError> {
    let client_email = CLIENTS[0].0;
    let Some(client) = run_db(state, move |db| db.get_user_by_email(client_email)).await? else {
        warn!(email = client_email, "Seed client missing; skipping appointment");
        return Ok(0);
    };
    let Some(day) = run_db(state, |db| db.get_all_available_days())
        .await?
        .into_iter()
        .next()
    else {
        warn!("No available day to book; skipping appointment");
        return Ok(0);
    };

    let appointment = NewAppointment {
        client_id: client.id,
        available_day_id: day.id,
        start_time: day.start_time,
        end_time: day.end_time,
        task_description: "Morning visit: medication and breakfast".to_string(),
    };
    run_db(state, move |db| db.create_appointment(&appointment)).await?;
    Ok(1)
}

fn hm(hour: u32, minute: u32) -> Result<NaiveTime, ApiError> {
    NaiveTime::from_hms_opt(hour, minute, 0)
        .ok_or_else(|| ApiError::Internal(format!("invalid seed time {}:{}", hour, minute)))
}
