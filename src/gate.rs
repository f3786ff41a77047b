//! Bearer-token gate for protected routes.
//!
//! Handlers opt in by taking an [`AuthUser`] argument; the verified user id
//! reaches them as a plain value rather than through request extensions.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use log::warn;
use std::sync::Arc;
use thiserror::Error;

use crate::err::Error;
use crate::models::UserId;
use crate::token::TokenService;

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Error, Eq, PartialEq)]
pub enum GateError {
    #[error("missing token")]
    MissingToken,
    #[error("invalid token format")]
    MalformedAuthHeader,
    #[error("invalid token")]
    Unauthorized,
}

/// Resolves the caller's identity from the `Authorization` header.
pub fn authorize(headers: &HeaderMap, tokens: &TokenService) -> Result<UserId, GateError> {
    let value = match headers.get(AUTHORIZATION) {
        Some(value) if !value.is_empty() => value,
        _ => return Err(GateError::MissingToken),
    };
    let value = value.to_str().map_err(|_| GateError::MalformedAuthHeader)?;
    let token = value
        .strip_prefix(BEARER_PREFIX)
        .ok_or(GateError::MalformedAuthHeader)?;

    tokens.verify(token).map_err(|err| {
        warn!("rejecting bearer token: {}", err);
        GateError::Unauthorized
    })
}

/// Identity of an authenticated caller.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct AuthUser(pub UserId);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let tokens = parts
            .extensions
            .get::<Arc<TokenService>>()
            .cloned()
            .ok_or_else(|| Error::internal("ConfigurationError", "token service not installed"))?;

        let user = authorize(&parts.headers, &tokens)?;
        Ok(AuthUser(user))
    }
}
