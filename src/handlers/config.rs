use chrono::Duration;
use shuttle_runtime::SecretStore;
use thiserror::Error;

pub const DEFAULT_VALIDITY_HOURS: i64 = 24;
// Ten years. Keeps `iat + validity` far inside chrono's range.
pub const MAX_VALIDITY_HOURS: i64 = 10 * 365 * 24;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} not found in secrets or empty")]
    Missing(&'static str),
    #[error("JWT_VALIDITY_HOURS must be between 1 and 87600 hours, got {0:?}")]
    InvalidValidity(String),
}

/// Token settings shared by the issuer and the validator. Loaded once at
/// startup and never changed afterwards.
#[derive(Clone)]
pub struct JwtOptions {
    secret: String,
    pub issuer: String,
    pub audience: String,
    pub validity: Duration,
}

impl JwtOptions {
    pub fn new(
        secret: impl Into<String>,
        issuer: impl Into<String>,
        audience: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let secret = non_empty("JWT_SECRET", secret.into())?;
        let issuer = non_empty("JWT_ISSUER", issuer.into())?;
        let audience = non_empty("JWT_AUDIENCE", audience.into())?;

        Ok(JwtOptions {
            secret,
            issuer,
            audience,
            validity: Duration::hours(DEFAULT_VALIDITY_HOURS),
        })
    }

    pub fn with_validity(mut self, hours: i64) -> Result<Self, ConfigError> {
        if !(1..=MAX_VALIDITY_HOURS).contains(&hours) {
            return Err(ConfigError::InvalidValidity(hours.to_string()));
        }
        self.validity = Duration::try_hours(hours)
            .ok_or_else(|| ConfigError::InvalidValidity(hours.to_string()))?;
        Ok(self)
    }

    pub fn from_secrets(secrets: &SecretStore) -> Result<Self, ConfigError> {
        let secret = secrets
            .get("JWT_SECRET")
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let issuer = secrets
            .get("JWT_ISSUER")
            .ok_or(ConfigError::Missing("JWT_ISSUER"))?;

        let audience = secrets
            .get("JWT_AUDIENCE")
            .ok_or(ConfigError::Missing("JWT_AUDIENCE"))?;

        let options = Self::new(secret, issuer, audience)?;

        match secrets.get("JWT_VALIDITY_HOURS") {
            Some(raw) => {
                let hours = raw
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| ConfigError::InvalidValidity(raw.clone()))?;
                options.with_validity(hours)
            }
            None => Ok(options),
        }
    }

    pub fn secret(&self) -> &[u8] {
        self.secret.as_bytes()
    }
}

// Keeps the secret out of debug output.
impl std::fmt::Debug for JwtOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtOptions")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("validity", &self.validity)
            .finish_non_exhaustive()
    }
}

fn non_empty(key: &'static str, value: String) -> Result<String, ConfigError> {
    if value.trim().is_empty() {
        Err(ConfigError::Missing(key))
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shuttle_service::Secret;
    use std::collections::BTreeMap;

    #[test]
    fn accepts_complete_settings_with_default_window() {
        let options = JwtOptions::new("s3cr3t", "rolegate", "rolegate-clients").unwrap();
        assert_eq!(options.issuer, "rolegate");
        assert_eq!(options.audience, "rolegate-clients");
        assert_eq!(options.validity, Duration::hours(24));
        assert_eq!(options.secret(), b"s3cr3t");
    }

    #[test]
    fn empty_values_are_fatal() {
        assert_eq!(
            JwtOptions::new("", "iss", "aud").unwrap_err(),
            ConfigError::Missing("JWT_SECRET")
        );
        assert_eq!(
            JwtOptions::new("key", "  ", "aud").unwrap_err(),
            ConfigError::Missing("JWT_ISSUER")
        );
        assert_eq!(
            JwtOptions::new("key", "iss", "").unwrap_err(),
            ConfigError::Missing("JWT_AUDIENCE")
        );
    }

    #[test]
    fn validity_must_be_positive() {
        let options = JwtOptions::new("key", "iss", "aud").unwrap();
        assert!(options.clone().with_validity(0).is_err());
        assert_eq!(
            options.with_validity(2).unwrap().validity,
            Duration::hours(2)
        );
    }

    #[test]
    fn oversized_validity_is_rejected_at_startup() {
        let options = JwtOptions::new("key", "iss", "aud").unwrap();

        assert_eq!(
            options.clone().with_validity(i64::MAX).unwrap_err(),
            ConfigError::InvalidValidity(i64::MAX.to_string())
        );
        assert!(options.clone().with_validity(1_000_000_000_000).is_err());
        assert!(options.clone().with_validity(MAX_VALIDITY_HOURS + 1).is_err());

        let longest = options.with_validity(MAX_VALIDITY_HOURS).unwrap();
        assert!(chrono::Utc::now()
            .checked_add_signed(longest.validity)
            .is_some());
    }

    fn store(pairs: &[(&str, &str)]) -> SecretStore {
        let secrets: BTreeMap<String, Secret<String>> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Secret::new(v.to_string())))
            .collect();
        SecretStore::new(secrets)
    }

    const COMPLETE: [(&str, &str); 3] = [
        ("JWT_SECRET", "s3cr3t"),
        ("JWT_ISSUER", "rolegate"),
        ("JWT_AUDIENCE", "rolegate-clients"),
    ];

    #[test]
    fn secrets_without_validity_use_default_window() {
        let options = JwtOptions::from_secrets(&store(&COMPLETE)).unwrap();

        assert_eq!(options.issuer, "rolegate");
        assert_eq!(options.audience, "rolegate-clients");
        assert_eq!(options.secret(), b"s3cr3t");
        assert_eq!(options.validity, Duration::hours(DEFAULT_VALIDITY_HOURS));
    }

    #[test]
    fn each_absent_secret_is_reported() {
        for missing in ["JWT_SECRET", "JWT_ISSUER", "JWT_AUDIENCE"] {
            let pairs: Vec<(&str, &str)> = COMPLETE
                .iter()
                .copied()
                .filter(|(k, _)| *k != missing)
                .collect();
            assert_eq!(
                JwtOptions::from_secrets(&store(&pairs)).unwrap_err(),
                ConfigError::Missing(missing)
            );
        }
    }

    #[test]
    fn validity_secret_is_parsed_and_checked() {
        let mut pairs = COMPLETE.to_vec();
        pairs.push(("JWT_VALIDITY_HOURS", " 8 "));
        let options = JwtOptions::from_secrets(&store(&pairs)).unwrap();
        assert_eq!(options.validity, Duration::hours(8));

        for bad in ["abc", "0", "-3", "9223372036854775807"] {
            let mut pairs = COMPLETE.to_vec();
            pairs.push(("JWT_VALIDITY_HOURS", bad));
            assert!(matches!(
                JwtOptions::from_secrets(&store(&pairs)),
                Err(ConfigError::InvalidValidity(_))
            ));
        }
    }

    #[test]
    fn debug_output_hides_secret() {
        let options = JwtOptions::new("very-private", "iss", "aud").unwrap();
        assert!(!format!("{:?}", options).contains("very-private"));
    }
}
