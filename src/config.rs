use clap::Parser;
use std::net::SocketAddr;

const MIN_SECRET_LEN: usize = 16;

#[derive(Debug, Clone, Parser)]
#[command(name = "gradebook-server", about = "Grade report record keeping service")]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "LISTEN_ADDR", default_value = "127.0.0.1:8080")]
    pub listen: SocketAddr,

    /// Postgres connection string
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value_t = 5)]
    pub max_connections: u32,

    /// HMAC secret used to sign access tokens
    #[arg(long, env = "JWT_SECRET", hide_env_values = true, value_parser = parse_secret)]
    pub jwt_secret: String,

    /// The single origin allowed to call the API from a browser
    #[arg(long, env = "ALLOWED_ORIGIN", default_value = "http://localhost:3000")]
    pub allowed_origin: String,
}

fn parse_secret(value: &str) -> Result<String, String> {
    if value.len() < MIN_SECRET_LEN {
        return Err(format!("secret must be at least {} bytes", MIN_SECRET_LEN));
    }
    Ok(value.to_string())
}
