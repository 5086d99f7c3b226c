use std::env;

use chrono::{Duration, Utc};

const DEFAULT_JWT_EXPIRES_HOURS: i64 = 720;
const DEFAULT_CORS_ORIGINS: &str =
    "http://localhost:5173,http://127.0.0.1:5173,http://localhost:3000,http://localhost:8080";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_ttl: Duration,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(5000);
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET is not set"))?;
        let jwt_ttl = token_ttl(env::var("JWT_EXPIRES_HOURS").ok().as_deref())?;
        let cors_origins = parse_origins(
            &env::var("CORS_ORIGINS").unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.to_string()),
        );
        Ok(Self {
            port,
            database_url,
            host,
            jwt_secret,
            jwt_ttl,
            cors_origins,
        })
    }
}

/// Token lifetime from `JWT_EXPIRES_HOURS`. Unset, unparsable or
/// non-positive values fall back to the default; values that chrono cannot
/// represent, or that put expiry past the representable date range, are an
/// error.
fn token_ttl(raw: Option<&str>) -> anyhow::Result<Duration> {
    let hours = raw
        .and_then(|h| h.trim().parse::<i64>().ok())
        .filter(|h| *h > 0)
        .unwrap_or(DEFAULT_JWT_EXPIRES_HOURS);
    let ttl = Duration::try_hours(hours)
        .ok_or_else(|| anyhow::anyhow!("JWT_EXPIRES_HOURS is out of range: {hours}"))?;
    Utc::now()
        .checked_add_signed(ttl)
        .ok_or_else(|| anyhow::anyhow!("JWT_EXPIRES_HOURS is out of range: {hours}"))?;
    Ok(ttl)
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect()
}
