use std::sync::Arc;

use mongodb::Database;

use crate::config::AppConfig;
use crate::middleware::auth::JwtAuth;
use crate::services::cache::KeyValueCache;
use crate::services::email_service::Notifier;
use crate::services::otp_service::PasswordResetService;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<AppConfig>,
    pub auth: Arc<JwtAuth>,
    pub cache: Arc<dyn KeyValueCache>,
    pub notifier: Arc<dyn Notifier>,
    pub password_reset: Arc<PasswordResetService>,
}
