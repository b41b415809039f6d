use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;
use uuid::Uuid;

use homecare_types::Role;
use homecare_types::api::Claims;

use crate::error::ApiError;

/// Fixed token lifetime.
pub const TOKEN_LIFETIME_MINUTES: i64 = 50;

#[derive(Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
}

impl JwtSettings {
    pub fn new(
        secret: impl Into<String>,
        issuer: impl Into<String>,
        audience: impl Into<String>,
    ) -> Self {
        Self {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
        }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation
    }
}

/// Sign a token for `user_id` carrying every role as a claim.
/// Each call gets a fresh `jti`.
pub fn issue_token(
    settings: &JwtSettings,
    user_id: &str,
    email: &str,
    roles: &[Role],
) -> anyhow::Result<(String, DateTime<Utc>)> {
    let expiration = Utc::now() + Duration::minutes(TOKEN_LIFETIME_MINUTES);
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        jti: Uuid::new_v4().to_string(),
        nameid: user_id.to_string(),
        role: roles.to_vec(),
        iss: settings.issuer.clone(),
        aud: settings.audience.clone(),
        exp: expiration.timestamp() as usize,
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(settings.secret.as_bytes()),
    )?;

    Ok((token, expiration))
}

/// Verify signature, expiry, issuer and audience.
pub fn decode_token(settings: &JwtSettings, token: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.secret.as_bytes()),
        &settings.validation(),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        debug!("JWT failed to verify: {}", e);
        ApiError::Unauthorized
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> JwtSettings {
        JwtSettings::new("test-secret-that-is-long-enough-123456", "homecare", "homecare-spa")
    }

    #[test]
    fn issued_token_round_trips_claims() {
        let (token, expiration) =
            issue_token(&settings(), "user-1", "kari@homecare.test", &[Role::Client]).unwrap();

        let claims = decode_token(&settings(), &token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.nameid, "user-1");
        assert_eq!(claims.email, "kari@homecare.test");
        assert_eq!(claims.role, vec![Role::Client]);
        assert_eq!(claims.exp, expiration.timestamp() as usize);

        let lifetime = expiration - Utc::now();
        assert!(lifetime <= Duration::minutes(50));
        assert!(lifetime > Duration::minutes(49));
    }

    #[test]
    fn every_token_gets_a_fresh_jti() {
        let (a, _) = issue_token(&settings(), "u", "u@x.no", &[Role::Admin]).unwrap();
        let (b, _) = issue_token(&settings(), "u", "u@x.no", &[Role::Admin]).unwrap();
        let a = decode_token(&settings(), &a).unwrap();
        let b = decode_token(&settings(), &b).unwrap();
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let (token, _) = issue_token(&settings(), "u", "u@x.no", &[Role::Client]).unwrap();
        let other = JwtSettings::new("another-secret-that-is-long-enough-99", "homecare", "homecare-spa");
        assert!(matches!(decode_token(&other, &token), Err(ApiError::Unauthorized)));
    }

    #[test]
    fn wrong_audience_is_rejected() {
        let (token, _) = issue_token(&settings(), "u", "u@x.no", &[Role::Client]).unwrap();
        let mut other = settings();
        other.audience = "someone-else".into();
        assert!(decode_token(&other, &token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let settings = settings();
        let claims = Claims {
            sub: "u".into(),
            email: "u@x.no".into(),
            jti: "j".into(),
            nameid: "u".into(),
            role: vec![Role::Client],
            iss: settings.issuer.clone(),
            aud: settings.audience.clone(),
            exp: (Utc::now() - Duration::hours(1)).timestamp() as usize,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(settings.secret.as_bytes()),
        )
        .unwrap();
        assert!(decode_token(&settings, &token).is_err());
    }

    #[test]
    fn multiple_roles_are_separate_claims() {
        let roles = [Role::HealthcarePersonnel, Role::Admin];
        let (token, _) = issue_token(&settings(), "u", "u@x.no", &roles).unwrap();
        let claims = decode_token(&settings(), &token).unwrap();
        assert_eq!(claims.role, roles.to_vec());
    }
}
