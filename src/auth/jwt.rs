use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};

#[derive(serde::Deserialize)]
struct ExpiryClaim {
    exp: f64,
}

/// Reads the `exp` claim of a JWT without verifying its signature.
///
/// The client never holds the signing key; this is only used to decide
/// whether a stored token is still worth sending.
pub fn decode_expiry(token: &str) -> Result<DateTime<Utc>, jsonwebtoken::errors::Error> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;

    let token_data = decode::<ExpiryClaim>(token, &DecodingKey::from_secret(&[]), &validation)?;

    DateTime::from_timestamp(token_data.claims.exp.floor() as i64, 0)
        .ok_or_else(|| ErrorKind::InvalidToken.into())
}
