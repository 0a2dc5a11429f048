use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::accessors::Accessors;
use crate::config::Config;
use crate::engagement::{EngagementCounter, EngagementLedger};

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub accessors: Arc<Accessors>,
    pub ledger: Arc<EngagementLedger>,
    pub counter: Arc<EngagementCounter>,
}

impl AppState {
    pub fn new(db: DbPool, config: Config) -> Self {
        Self {
            accessors: Arc::new(Accessors::new(db.clone())),
            ledger: Arc::new(EngagementLedger::new(db.clone())),
            counter: Arc::new(EngagementCounter::new(db.clone())),
            db,
            config,
        }
    }
}
