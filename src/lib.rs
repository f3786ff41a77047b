pub mod auth;
pub mod config;
pub mod err;
pub mod gate;
pub mod grades;
pub mod models;
pub mod password;
pub mod routes;
pub mod store;
pub mod token;

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::err::{Error, Success};

pub type Payload<T> = Result<(StatusCode, Json<Success<T>>), Error>;

pub fn proceeds<V>(value: V) -> Payload<V>
where
    V: Serialize,
{
    Ok((StatusCode::OK, Json(Success::of(value))))
}

pub fn created<V>(value: V) -> Payload<V>
where
    V: Serialize,
{
    Ok((StatusCode::CREATED, Json(Success::of(value))))
}
