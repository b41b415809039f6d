use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Access role. Every account holds at least one; registration assigns
/// exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    Client,
    HealthcarePersonnel,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Client, Role::HealthcarePersonnel, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "Client",
            Role::HealthcarePersonnel => "HealthcarePersonnel",
            Role::Admin => "Admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role '{}'", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>,
    /// Primary role: the first one assigned.
    pub role: Option<Role>,
}

/// A bookable window published by one healthcare worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableDay {
    pub id: i64,
    pub healthcare_personnel_id: String,
    pub healthcare_personnel_name: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// Slots of one healthcare worker, as shown in the schedule table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonnelSchedule {
    pub healthcare_personnel_id: String,
    pub healthcare_personnel_name: String,
    pub available_days: Vec<AvailableDay>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
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
