use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::{Extension, Router};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;

use crate::store::SharedStore;
use crate::token::TokenService;
use crate::{auth, err, grades};

pub fn router(store: SharedStore, tokens: Arc<TokenService>) -> Router {
    Router::new()
        .route("/api/register", post(auth::register_user))
        .route("/api/login", post(auth::login_user))
        .route("/api/grades", get(grades::list_grades).post(grades::create_grade))
        .fallback(err::handler404)
        .layer(Extension(store))
        .layer(Extension(tokens))
}

/// Browser access is limited to one origin; preflights are cached for a day.
pub fn cors(origin: HeaderValue) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(24 * 60 * 60))
}
