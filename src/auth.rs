use axum::extract::rejection::JsonRejection;
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use crate::models::{Credentials, Identity};
use crate::password::{self, PasswordError};
use crate::store::{CredentialStore, SharedStore, StoreError};
use crate::token::{IssuedToken, TokenError, TokenService};
use crate::{created, proceeds, Payload};

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 50;
pub const PASSWORD_MIN: usize = 8;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("username must be 3-50 characters")]
    InvalidUsername,
    #[error("password must be at least 8 characters")]
    WeakPassword,
    #[error("username already taken")]
    UsernameTaken,
    #[error("username and password required")]
    MissingCredentials,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation => AuthError::UsernameTaken,
            other => AuthError::Store(other),
        }
    }
}

/// Creates a new account. The username check against the store is only a
/// shortcut; a concurrent insert of the same name is caught by the store's
/// unique constraint and reported the same way.
pub async fn register<S>(store: &S, username: &str, password: &str) -> Result<Identity, AuthError>
where
    S: CredentialStore + ?Sized,
{
    let username = username.trim();
    let password = password.trim();

    let name_len = username.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&name_len) {
        return Err(AuthError::InvalidUsername);
    }
    if password.chars().count() < PASSWORD_MIN {
        return Err(AuthError::WeakPassword);
    }

    if store.find_user(username).await?.is_some() {
        return Err(AuthError::UsernameTaken);
    }

    let hash = password::hash_blocking(password.to_string()).await?;
    let user = store.insert_user(username, &hash).await?;
    Ok(user.identity())
}

/// Checks credentials and mints a token. Unknown users and wrong passwords
/// produce the same [`AuthError::InvalidCredentials`].
pub async fn login<S>(
    store: &S,
    tokens: &TokenService,
    username: &str,
    password: &str,
) -> Result<(IssuedToken, Identity), AuthError>
where
    S: CredentialStore + ?Sized,
{
    let username = username.trim();
    let password = password.trim();
    if username.is_empty() || password.is_empty() {
        return Err(AuthError::MissingCredentials);
    }

    let user = match store.find_user(username).await? {
        Some(user) => user,
        None => {
            warn!("login for unknown user `{}`", username);
            password::verify_dummy(password.to_string()).await?;
            return Err(AuthError::InvalidCredentials);
        }
    };

    let matches =
        password::verify_blocking(user.password_hash.clone(), password.to_string()).await?;
    if !matches {
        warn!("password mismatch for user `{}`", username);
        return Err(AuthError::InvalidCredentials);
    }

    let token = tokens.issue(user.id)?;
    Ok((token, user.identity()))
}

#[derive(Debug, Clone, Serialize)]
pub struct Registered {
    pub user: Identity,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoggedIn {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: Identity,
}

pub async fn register_user(
    Extension(store): Extension<SharedStore>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Payload<Registered> {
    let Json(creds) = payload?;
    let user = register(&*store, &creds.username, &creds.password).await?;
    info!("registered user `{}` with id {}", user.username, user.id);
    created(Registered { user })
}

pub async fn login_user(
    Extension(store): Extension<SharedStore>,
    Extension(tokens): Extension<Arc<TokenService>>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Payload<LoggedIn> {
    let Json(creds) = payload?;
    let (issued, user) = login(&*store, &tokens, &creds.username, &creds.password).await?;
    info!("user `{}` logged in", user.username);
    proceeds(LoggedIn {
        token: issued.token,
        expires_at: issued.expires_at,
        user,
    })
}
