use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Purpose claim for registration forms
pub const REGISTER_PURPOSE: &str = "register";

const FORM_TOKEN_MINUTES: i64 = 15;

/// Anti-forgery token claims. The token is bound to the subject that was
/// signed in when the form was rendered.
#[derive(Debug, Serialize, Deserialize)]
pub struct FormClaims {
    pub sub: String,
    pub purpose: String,
    pub exp: i64,
    pub iat: i64,
}

impl FormClaims {
    pub fn new(subject: &str, purpose: &str) -> Self {
        let now = Utc::now();
        Self {
            sub: subject.to_string(),
            purpose: purpose.to_string(),
            exp: (now + Duration::minutes(FORM_TOKEN_MINUTES)).timestamp(),
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FormTokenError {
    #[error("Form token signing failed: {0}")]
    Signing(String),
    #[error("Invalid form token: {0}")]
    Invalid(String),
    #[error("Form token issued for a different purpose")]
    WrongPurpose,
    #[error("Form token issued for a different identity")]
    SubjectMismatch,
}

pub fn issue(secret: &str, subject: &str, purpose: &str) -> Result<String, FormTokenError> {
    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), &FormClaims::new(subject, purpose), &key)
        .map_err(|e| FormTokenError::Signing(e.to_string()))
}

/// Check signature, expiry, purpose and that the token belongs to `subject`
pub fn verify(secret: &str, token: &str, subject: &str, purpose: &str) -> Result<FormClaims, FormTokenError> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let claims = decode::<FormClaims>(token, &key, &Validation::default())
        .map_err(|e| FormTokenError::Invalid(e.to_string()))?
        .claims;

    if claims.purpose != purpose {
        return Err(FormTokenError::WrongPurpose);
    }
    if claims.sub != subject {
        return Err(FormTokenError::SubjectMismatch);
    }
    Ok(claims)
}
