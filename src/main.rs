use anyhow::Context;
use axum::http::HeaderValue;
use clap::Parser;
use env_logger::Env;
use std::sync::Arc;
use tokio::net::TcpListener;

use gradebook_server::config::Config;
use gradebook_server::routes;
use gradebook_server::store::{PgStore, SharedStore};
use gradebook_server::token::TokenService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let config = Config::parse();

    let store = PgStore::connect(&config.database_url, config.max_connections)
        .await
        .context("Failed to connect to database")?;
    store
        .ensure_schema()
        .await
        .context("Failed to create tables")?;
    log::info!("Connected to database");

    let origin = HeaderValue::from_str(&config.allowed_origin)
        .context("ALLOWED_ORIGIN is not a valid header value")?;
    let tokens = Arc::new(TokenService::new(config.jwt_secret.as_bytes()));
    let store: SharedStore = Arc::new(store);
    let app = routes::router(store, tokens).layer(routes::cors(origin));

    let listener = TcpListener::bind(config.listen).await?;
    log::info!("Starting gradebook HTTP server on http://{}", config.listen);
    axum::serve(listener, app).await?;
    Ok(())
}
