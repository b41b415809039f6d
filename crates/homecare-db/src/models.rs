//! Database row types: these map directly to SQLite rows.
//! Distinct from homecare-types API models to keep the DB layer independent.
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use homecare_types::Role;

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub name: String,
    pub phone_number: Option<String>,
    pub password_hash: String,
}

/// A user joined with the first role assigned to them.
pub struct UserSummaryRow {
    pub id: String,
    pub email: String,
    pub name: String,
    pub phone_number: Option<String>,
    pub primary_role: Option<Role>,
}

pub struct NewUser<'a> {
    pub id: &'a str,
    pub email: &'a str,
    pub name: &'a str,
    pub phone_number: Option<&'a str>,
    pub password_hash: &'a str,
}

/// Available day joined with its owner's name.
pub struct AvailableDayRow {
    pub id: i64,
    pub healthcare_personnel_id: String,
    pub healthcare_personnel_name: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

pub struct NewAvailableDay {
    pub healthcare_personnel_id: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// Appointment joined with its client, available day and the day's owner.
pub struct AppointmentRow {
    pub id: i64,
    pub client_id: String,
    pub client_name: String,
    pub available_day_id: i64,
    pub date: NaiveDate,
    pub healthcare_personnel_id: String,
    pub healthcare_personnel_name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub task_description: String,
}

pub struct NewAppointment {
    pub client_id: String,
    pub available_day_id: i64,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub task_description: String,
}

pub struct ResetTokenRow {
    pub id: i64,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
}

/// User names are the lower-cased email, which makes email unique.
pub fn normalize_user_name(email: &str) -> String {
    email.trim().to_lowercase()
}

impl From<AvailableDayRow> for homecare_types::models::AvailableDay {
    fn from(row: AvailableDayRow) -> Self {
        Self {
            id: row.id,
            healthcare_personnel_id: row.healthcare_personnel_id,
            healthcare_personnel_name: row.healthcare_personnel_name,
            date: row.date,
            start_time: row.start_time,
            end_time: row.end_time,
        }
    }
}

impl From<AppointmentRow> for homecare_types::models::Appointment {
    fn from(row: AppointmentRow) -> Self {
        Self {
            id: row.id,
            client_id: row.client_id,
            client_name: row.client_name,
            available_day_id: row.available_day_id,
            date: row.date,
            healthcare_personnel_id: row.healthcare_personnel_id,
            healthcare_personnel_name: row.healthcare_personnel_name,
            start_time: row.start_time,
            end_time: row.end_time,
            task_description: row.task_description,
        }
    }
}

impl From<UserSummaryRow> for homecare_types::models::User {
    fn from(row: UserSummaryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            phone_number: row.phone_number,
            role: row.primary_role,
        }
    }
}
