use std::sync::Arc;

use chrono::Duration;

use crate::{config::AppConfig, db::OrmConn, token::TokenKeys};

#[derive(Clone)]
pub struct AppState {
    pub orm: OrmConn,
    pub tokens: Arc<TokenKeys>,
}

impl AppState {
    pub fn new(orm: OrmConn, config: &AppConfig) -> Self {
        Self::with_secret(orm, &config.jwt_secret, config.jwt_ttl)
    }

    pub fn with_secret(orm: OrmConn, secret: &str, ttl: Duration) -> Self {
        Self {
            orm,
            tokens: Arc::new(TokenKeys::new(secret, ttl)),
        }
    }
}
