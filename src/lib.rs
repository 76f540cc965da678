pub mod api;
pub mod config;
pub mod db;
pub mod notifications;
pub mod planner;
pub mod utils;

pub use db::DbPool;

use config::Config;

use crate::notifications::MailService;

pub struct AppState {
    pub config: Config,
    pub db: DbPool,
    pub mail: MailService,
}

impl AppState {
    pub fn new(config: Config, db: DbPool) -> Self {
        let mail = MailService::new(config.email.clone());
        Self { config, db, mail }
    }
}
