use crate::handlers::config::JwtOptions;
use crate::handlers::directory::UserDirectory;
use crate::models::all_models::{Role, User};
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Structure representing JWT claims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    #[serde(rename = "unique_name")]
    pub username: String,
    #[serde(rename = "nameid")]
    pub id: Uuid,
    #[serde(
        rename = "role",
        default,
        skip_serializing_if = "Vec::is_empty",
        with = "role_claim"
    )]
    pub roles: Vec<Role>,
    pub iat: i64, // Issued at
    pub nbf: i64, // Not before, same instant as iat
    pub exp: i64, // Expiration timestamp
    pub iss: String,
    pub aud: String,
}

impl Claims {
    /// Builds the claim set for `user` as of `now`.
    pub fn for_user(user: &User, options: &JwtOptions, now: DateTime<Utc>) -> Self {
        let issued_at = now.timestamp();
        Claims {
            username: user.username.clone(),
            id: user.id,
            roles: user.roles.clone(),
            iat: issued_at,
            nbf: issued_at,
            exp: (now + options.validity).timestamp(),
            iss: options.issuer.clone(),
            aud: options.audience.clone(),
        }
    }
}

// One role is written as a bare string, several as an array.
mod role_claim {
    use crate::models::all_models::Role;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(Role),
        Many(Vec<Role>),
    }

    pub fn serialize<S: Serializer>(roles: &[Role], serializer: S) -> Result<S::Ok, S::Error> {
        match roles {
            [single] => single.serialize(serializer),
            many => many.serialize(serializer),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Role>, D::Error> {
        Ok(match OneOrMany::deserialize(deserializer)? {
            OneOrMany::One(role) => vec![role],
            OneOrMany::Many(roles) => roles,
        })
    }
}

/// Why a presented token was refused. Only for logs: callers outside the
/// core see a plain 401.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    #[error("signature does not verify")]
    SignatureInvalid,
    #[error("issuer does not match")]
    IssuerMismatch,
    #[error("audience does not match")]
    AudienceMismatch,
    #[error("token has expired")]
    Expired,
    #[error("token is not valid yet")]
    NotYetValid,
    #[error("token is malformed")]
    Malformed,
}

impl From<jsonwebtoken::errors::Error> for RejectReason {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                RejectReason::SignatureInvalid
            }
            ErrorKind::InvalidIssuer => RejectReason::IssuerMismatch,
            ErrorKind::InvalidAudience => RejectReason::AudienceMismatch,
            ErrorKind::ExpiredSignature => RejectReason::Expired,
            ErrorKind::ImmatureSignature => RejectReason::NotYetValid,
            _ => RejectReason::Malformed,
        }
    }
}

/// Signs fresh tokens for users found in the directory.
pub struct TokenIssuer {
    directory: Arc<UserDirectory>,
    options: Arc<JwtOptions>,
    encoding_key: EncodingKey,
}

impl TokenIssuer {
    pub fn new(directory: Arc<UserDirectory>, options: Arc<JwtOptions>) -> Self {
        let encoding_key = EncodingKey::from_secret(options.secret());
        TokenIssuer {
            directory,
            options,
            encoding_key,
        }
    }

    /// Generates a JWT token for the user registered under `username`.
    /// `Ok(None)` means there is no such user.
    pub fn issue(&self, username: &str) -> Result<Option<String>, jsonwebtoken::errors::Error> {
        let Some(user) = self.directory.lookup(username) else {
            info!("Token refused for unknown username '{}'", username);
            return Ok(None);
        };

        let token = self.issue_for(&user, Utc::now())?;
        info!("Issued token for '{}' ({})", user.username, user.id);
        Ok(Some(token))
    }

    pub fn issue_for(
        &self,
        user: &User,
        now: DateTime<Utc>,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = Claims::for_user(user, &self.options, now);
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding_key,
        )
    }
}

/// Checks presented tokens against the configured key, issuer and audience.
pub struct TokenValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenValidator {
    pub fn new(options: Arc<JwtOptions>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[options.issuer.as_str()]);
        validation.set_audience(&[options.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "aud"]);
        // The lifetime window is checked in `validate_at` with no leeway.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;

        TokenValidator {
            decoding_key: DecodingKey::from_secret(options.secret()),
            validation,
        }
    }

    pub fn validate(&self, token: &str) -> Result<Claims, RejectReason> {
        self.validate_at(token, Utc::now())
    }

    /// Accepts the token only if `nbf <= now < exp`.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, RejectReason> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        let claims = token_data.claims;
        let now = now.timestamp();

        if now < claims.nbf {
            debug!("Token for '{}' used {}s early", claims.username, claims.nbf - now);
            return Err(RejectReason::NotYetValid);
        }
        if now >= claims.exp {
            return Err(RejectReason::Expired);
        }

        Ok(claims)
    }
}
