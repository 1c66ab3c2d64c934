use std::sync::Arc;

use diesel::{
    pg::PgConnection,
    r2d2::{ConnectionManager, PooledConnection},
};

use crate::{
    auth::jwt::JwtService,
    config::AppConfig,
    db::PgPool,
    error::{AppError, AppResult},
    external::{SpeechToText, TextEnhancer},
};

type PgPooledConnection = PooledConnection<ConnectionManager<PgConnection>>;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    pub jwt: JwtService,
    pub transcriber: Arc<dyn SpeechToText>,
    pub enhancer: Arc<dyn TextEnhancer>,
}

impl AppState {
    pub fn new(
        pool: PgPool,
        config: AppConfig,
        jwt: JwtService,
        transcriber: Arc<dyn SpeechToText>,
        enhancer: Arc<dyn TextEnhancer>,
    ) -> Self {
        Self {
            pool,
            config: Arc::new(config),
            jwt,
            transcriber,
            enhancer,
        }
    }

    pub fn db(&self) -> AppResult<PgPooledConnection> {
        self.pool
            .get()
            .map_err(|err| AppError::persistence(format!("database pool error: {err}")))
    }
}
