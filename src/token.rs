//! Signed, time-limited identity tokens (HMAC JWTs).
//!
//! Tokens carry the subject as a numeric `user_id` claim and an absolute
//! `exp`. Nothing is stored server side: a token is valid while its
//! signature checks out under the instance secret and `now < exp`.

use crate::models::UserId;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{
    decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

const HMAC_FAMILY: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

#[derive(Debug, Error, Eq, PartialEq)]
pub enum TokenError {
    #[error("token is malformed")]
    MalformedToken,
    #[error("unsupported signing algorithm {0}")]
    UnsupportedAlgorithm(String),
    #[error("signature does not match")]
    BadSignature,
    #[error("token expired")]
    Expired,
    #[error("subject claim missing or not numeric")]
    MissingSubjectClaim,
    #[error("failed to sign token: {0}")]
    Signing(String),
}

#[derive(Debug, Serialize)]
struct Claims {
    user_id: i64,
    exp: i64,
}

/// Claims as found in an untrusted token; every field is checked by hand.
#[derive(Debug, Deserialize)]
struct RawClaims {
    user_id: Option<serde_json::Value>,
    exp: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl: Duration::hours(24),
        }
    }

    pub fn issue(&self, subject: UserId) -> Result<IssuedToken, TokenError> {
        self.issue_at(subject, Utc::now())
    }

    pub fn issue_at(&self, subject: UserId, now: DateTime<Utc>) -> Result<IssuedToken, TokenError> {
        let expires_at = now + self.ttl;
        let claims = Claims {
            user_id: subject.0,
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| TokenError::Signing(err.to_string()))?;

        debug!("issued token for user {} valid until {}", subject, expires_at);
        Ok(IssuedToken {
            token,
            expires_at: Utc
                .timestamp_opt(claims.exp, 0)
                .single()
                .unwrap_or(expires_at),
        })
    }

    pub fn verify(&self, token: &str) -> Result<UserId, TokenError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<UserId, TokenError> {
        let header = decode_header(token).map_err(|_| match advertised_alg(token) {
            Some(alg) if !is_hmac_name(&alg) => TokenError::UnsupportedAlgorithm(alg),
            _ => TokenError::MalformedToken,
        })?;
        if !HMAC_FAMILY.contains(&header.alg) {
            return Err(TokenError::UnsupportedAlgorithm(format!("{:?}", header.alg)));
        }

        let mut validation = Validation::new(header.alg);
        validation.algorithms = HMAC_FAMILY.to_vec();
        validation.required_spec_claims = HashSet::new();
        validation.validate_exp = false;
        validation.validate_aud = false;

        let data = decode::<RawClaims>(token, &self.decoding, &validation).map_err(|err| {
            match err.kind() {
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                ErrorKind::InvalidAlgorithm => {
                    TokenError::UnsupportedAlgorithm(format!("{:?}", header.alg))
                }
                _ => TokenError::MalformedToken,
            }
        })?;

        let exp = data.claims.exp.ok_or(TokenError::MalformedToken)?;
        if now.timestamp() >= exp {
            return Err(TokenError::Expired);
        }

        data.claims
            .user_id
            .as_ref()
            .and_then(serde_json::Value::as_i64)
            .map(UserId)
            .ok_or(TokenError::MissingSubjectClaim)
    }
}

/// Reads `alg` straight from the first segment, for headers that
/// `jsonwebtoken` refuses to parse (e.g. `"none"`).
fn advertised_alg(token: &str) -> Option<String> {
    let segment = token.split('.').next()?;
    let bytes = URL_SAFE_NO_PAD.decode(segment).ok()?;
    let header: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    header.get("alg")?.as_str().map(str::to_string)
}

fn is_hmac_name(alg: &str) -> bool {
    matches!(alg, "HS256" | "HS384" | "HS512")
}
