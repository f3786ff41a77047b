use axum::extract::rejection::JsonRejection;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::error;
use serde::Serialize;

use crate::auth::AuthError;
use crate::gate::GateError;
use crate::grades::GradeError;
use crate::store::StoreError;

pub async fn handler404(path: Uri) -> Error {
    Error::NotFound {
        message: format!("Invalid path: {}", path),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Success<V> {
    success: bool,
    #[serde(flatten)]
    value: V,
}

impl<V: Serialize> Success<V> {
    pub fn of(value: V) -> Self {
        Self {
            success: true,
            value,
        }
    }
}

/// Everything a client can be told about a failed request.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "error")]
pub enum Error {
    NotFound { message: String },
    InvalidPayload { message: String },
    MissingCredentials { message: String },
    InvalidUsername { message: String },
    WeakPassword { message: String },
    UsernameTaken { message: String },
    InvalidCredentials { message: String },
    Unauthorized { message: String },
    InvalidGrade { message: String },
    InconsistentCounts { message: String },
    InternalError { kind: &'static str, message: String },
}

impl Error {
    pub fn internal<S: Into<String>>(kind: &'static str, msg: S) -> Error {
        Error::InternalError {
            kind,
            message: msg.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::InvalidPayload { .. }
            | Error::MissingCredentials { .. }
            | Error::InvalidUsername { .. }
            | Error::WeakPassword { .. }
            | Error::InvalidGrade { .. }
            | Error::InconsistentCounts { .. } => StatusCode::BAD_REQUEST,
            Error::UsernameTaken { .. } => StatusCode::CONFLICT,
            Error::InvalidCredentials { .. } | Error::Unauthorized { .. } => {
                StatusCode::UNAUTHORIZED
            }
            Error::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidPayload {
            message: rejection.body_text(),
        }
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        error!("store failure: {}", err);
        Self::internal("DatabaseError", "Database error")
    }
}

impl From<AuthError> for Error {
    fn from(err: AuthError) -> Self {
        let message = err.to_string();
        match err {
            AuthError::InvalidUsername => Self::InvalidUsername { message },
            AuthError::WeakPassword => Self::WeakPassword { message },
            AuthError::UsernameTaken => Self::UsernameTaken { message },
            AuthError::MissingCredentials => Self::MissingCredentials { message },
            AuthError::InvalidCredentials => Self::InvalidCredentials { message },
            AuthError::Password(err) => {
                error!("password hashing failure: {}", err);
                Self::internal("HashingError", "Failed to process password")
            }
            AuthError::Token(err) => {
                error!("token issuance failure: {}", err);
                Self::internal("TokenError", "Failed to generate token")
            }
            AuthError::Store(err) => Self::from(err),
        }
    }
}

impl From<GateError> for Error {
    fn from(err: GateError) -> Self {
        Self::Unauthorized {
            message: err.to_string(),
        }
    }
}

impl From<GradeError> for Error {
    fn from(err: GradeError) -> Self {
        let message = err.to_string();
        match err {
            GradeError::Invalid(_) => Self::InvalidGrade { message },
            GradeError::InconsistentCounts { .. } => Self::InconsistentCounts { message },
            GradeError::StoreUnavailable(err) => Self::from(err),
        }
    }
}
