//! Shared application state.

use std::sync::Arc;

use pokernight_db::Database;

use crate::auth::JwtManager;
use crate::config::ApiConfig;
use crate::services::notification_service::{LogPushSender, PushSender};

/// State cloned into every handler. Everything behind it is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ApiConfig>,
    pub jwt: Arc<JwtManager>,
    pub push: Arc<dyn PushSender>,
}

impl AppState {
    /// State with the logging push sender.
    pub fn new(db: Database, config: ApiConfig) -> Self {
        Self::with_push_sender(db, config, Arc::new(LogPushSender))
    }

    pub fn with_push_sender(db: Database, config: ApiConfig, push: Arc<dyn PushSender>) -> Self {
        let jwt = JwtManager::new(config.jwt_secret.clone(), config.jwt_lifetime_secs);
        AppState {
            db,
            config: Arc::new(config),
            jwt: Arc::new(jwt),
            push,
        }
    }
}
