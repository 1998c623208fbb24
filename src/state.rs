use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::auth::tokens::TokenService;
use crate::config::Config;
use crate::store::Store;

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Store,
    pub tokens: Arc<TokenService>,
}

impl AppState {
    pub fn new(db: DbPool, config: Config) -> anyhow::Result<Self> {
        let tokens = Arc::new(config.auth.token_service()?);
        Ok(Self {
            store: Store::sqlite(db),
            config,
            tokens,
        })
    }
}
