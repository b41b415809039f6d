use std::path::PathBuf;

use anyhow::{Context, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "your-secret-key",
];

/// HS256 keys shorter than the hash output are rejected.
const MIN_SECRET_LEN: usize = 32;

pub struct Config {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub reset_db: bool,
    pub seed: bool,
    pub seed_password: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = get("HOMECARE_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("HOMECARE_JWT_SECRET is unset or still a placeholder");
        }
        if jwt_secret.len() < MIN_SECRET_LEN {
            bail!("HOMECARE_JWT_SECRET must be at least {} bytes", MIN_SECRET_LEN);
        }

        let port = get("HOMECARE_PORT")
            .unwrap_or_else(|| "5000".into())
            .parse()
            .context("HOMECARE_PORT is not a valid port")?;

        Ok(Self {
            jwt_secret,
            jwt_issuer: get("HOMECARE_JWT_ISSUER").unwrap_or_else(|| "homecare".into()),
            jwt_audience: get("HOMECARE_JWT_AUDIENCE").unwrap_or_else(|| "homecare-spa".into()),
            db_path: get("HOMECARE_DB_PATH")
                .unwrap_or_else(|| "homecare.db".into())
                .into(),
            host: get("HOMECARE_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            reset_db: flag(get("HOMECARE_DB_RESET")),
            seed: flag(get("HOMECARE_SEED")),
            seed_password: get("HOMECARE_SEED_PASSWORD").unwrap_or_else(|| "Homecare#2024".into()),
        })
    }
}

fn flag(value: Option<String>) -> bool {
    value
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn missing_secret_fails() {
        assert!(load(&[]).is_err());
    }

    #[test]
    fn placeholder_and_short_secrets_fail() {
        assert!(load(&[("HOMECARE_JWT_SECRET", "dev-secret-change-me")]).is_err());
        assert!(load(&[("HOMECARE_JWT_SECRET", "short")]).is_err());
    }

    #[test]
    fn defaults_apply() {
        let config = load(&[("HOMECARE_JWT_SECRET", SECRET)]).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.jwt_issuer, "homecare");
        assert_eq!(config.db_path, PathBuf::from("homecare.db"));
        assert!(!config.seed);
        assert!(!config.reset_db);
    }

    #[test]
    fn flags_and_overrides() {
        let config = load(&[
            ("HOMECARE_JWT_SECRET", SECRET),
            ("HOMECARE_PORT", "8080"),
            ("HOMECARE_SEED", "true"),
            ("HOMECARE_DB_RESET", "1"),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert!(config.seed);
        assert!(config.reset_db);

        assert!(load(&[("HOMECARE_JWT_SECRET", SECRET), ("HOMECARE_PORT", "http")]).is_err());
    }
}
