use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::Role;

// -- JWT Claims --

/// Claims carried by every bearer token. `role` holds one entry per role
/// assigned to the account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub jti: String,
    pub nameid: String,
    pub role: Vec<Role>,
    pub iss: String,
    pub aud: String,
    pub exp: usize,
}

impl Claims {
    pub fn has_role(&self, role: Role) -> bool {
        self.role.contains(&role)
    }

    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.iter().any(|r| self.has_role(*r))
    }
}

// -- Auth --

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(email(message = "The Email field is not a valid e-mail address."))]
    pub email: String,
    #[validate(custom(function = "validate_password"))]
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "The Name field is required."))]
    pub name: String,
    #[validate(length(max = 20, message = "The PhoneNumber field is too long."))]
    pub phone_number: Option<String>,
    /// Defaults to `Client` when omitted.
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(email(message = "The Email field is not a valid e-mail address."))]
    pub email: String,
    #[validate(length(min = 1, message = "The Password field is required."))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub expiration: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "The Email field is not a valid e-mail address."))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[validate(email(message = "The Email field is not a valid e-mail address."))]
    pub email: String,
    #[validate(length(min = 1, message = "The Token field is required."))]
    pub token: String,
    #[validate(custom(function = "validate_password"))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "The CurrentPassword field is required."))]
    pub current_password: String,
    #[validate(custom(function = "validate_password"))]
    pub new_password: String,
}

// -- Users --

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "The Name field is required."))]
    pub name: String,
    #[validate(length(max = 20, message = "The PhoneNumber field is too long."))]
    pub phone_number: Option<String>,
}

// -- Available days --

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AvailableDayRequest {
    /// Owner of the slot. Personnel always publish for themselves; admins
    /// must name the owner.
    pub healthcare_personnel_id: Option<String>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

// -- Appointments --

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRequest {
    /// Booking client. Ignored for callers that are only clients.
    pub client_id: Option<String>,
    pub available_day_id: i64,
    /// Replaced by the available day's times on create.
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    #[validate(length(
        min = 1,
        max = 500,
        message = "The TaskDescription field must be between 1 and 500 characters."
    ))]
    pub task_description: String,
}

/// Password rules of the account store. Reports the first rule broken.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let rule = if password.chars().count() < 6 {
        Some(("password_too_short", "Passwords must be at least 6 characters."))
    } else if !password.chars().any(|c| !c.is_alphanumeric()) {
        Some((
            "password_requires_non_alphanumeric",
            "Passwords must have at least one non alphanumeric character.",
        ))
    } else if !password.chars().any(|c| c.is_ascii_digit()) {
        Some((
            "password_requires_digit",
            "Passwords must have at least one digit ('0'-'9').",
        ))
    } else if !password.chars().any(|c| c.is_lowercase()) {
        Some((
            "password_requires_lower",
            "Passwords must have at least one lowercase ('a'-'z').",
        ))
    } else if !password.chars().any(|c| c.is_uppercase()) {
        Some((
            "password_requires_upper",
            "Passwords must have at least one uppercase ('A'-'Z').",
        ))
    } else {
        None
    };

    match rule {
        Some((code, message)) => {
            let mut error = ValidationError::new(code);
            error.message = Some(message.into());
            Err(error)
        }
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_rules_report_first_failure() {
        let err = validate_password("abc").unwrap_err();
        assert_eq!(err.code, "password_too_short");

        let err = validate_password("abcdef1A").unwrap_err();
        assert_eq!(err.code, "password_requires_non_alphanumeric");

        let err = validate_password("abcdef!A").unwrap_err();
        assert_eq!(err.code, "password_requires_digit");

        let err = validate_password("ABCDEF!1").unwrap_err();
        assert_eq!(err.code, "password_requires_lower");

        let err = validate_password("abcdef!1").unwrap_err();
        assert_eq!(err.code, "password_requires_upper");

        assert!(validate_password("Homecare#2024").is_ok());
    }

    #[test]
    fn register_request_rejects_bad_email() {
        let req: RegisterRequest = serde_json::from_value(serde_json::json!({
            "email": "not-an-email",
            "password": "Secret#123",
            "name": "Kari Nordmann",
        }))
        .unwrap();
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
        assert!(req.role.is_none());
    }

    #[test]
    fn appointment_request_accepts_missing_times() {
        let req: AppointmentRequest = serde_json::from_value(serde_json::json!({
            "availableDayId": 3,
            "taskDescription": "Help with groceries",
        }))
        .unwrap();
        assert!(req.validate().is_ok());
        assert!(req.start_time.is_none());
        assert_eq!(req.available_day_id, 3);
    }

    #[test]
    fn claims_role_checks() {
        let claims = Claims {
            sub: "id".into(),
            email: "a@b.no".into(),
            jti: "j".into(),
            nameid: "id".into(),
            role: vec![Role::HealthcarePersonnel],
            iss: "homecare".into(),
            aud: "homecare-spa".into(),
            exp: 0,
        };
        assert!(claims.has_role(Role::HealthcarePersonnel));
        assert!(!claims.has_role(Role::Admin));
        assert!(claims.has_any_role(&[Role::Admin, Role::HealthcarePersonnel]));
    }
}
