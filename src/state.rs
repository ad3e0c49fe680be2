use crate::config::AppConfig;
use crate::services::provider::PaymentProviderClient;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub db_pool: PgPool,
  pub config: Arc<AppConfig>, // Share loaded config
  pub payments: PaymentProviderClient,
}
