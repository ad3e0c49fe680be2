use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,
  pub default_currency: String,

  // Payment provider integration
  pub payment_provider_url: String,
  pub payment_provider_secret_key: String,
  pub payment_webhook_secret: String,
  pub webhook_tolerance_secs: i64,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|_| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let database_url = get_env("DATABASE_URL")?;
    let default_currency = get_env("DEFAULT_CURRENCY").unwrap_or_else(|_| "USD".to_string());

    let payment_provider_url = get_env("PAYMENT_PROVIDER_URL")?;
    let payment_provider_secret_key = get_env("PAYMENT_PROVIDER_SECRET_KEY")?;
    let payment_webhook_secret = get_env("PAYMENT_WEBHOOK_SECRET")?;
    let webhook_tolerance_secs = get_env("PAYMENT_WEBHOOK_TOLERANCE_SECS")
      .unwrap_or_else(|_| "300".to_string())
      .parse::<i64>()
      .map_err(|e| AppError::Config(format!("Invalid PAYMENT_WEBHOOK_TOLERANCE_SECS: {}", e)))?;

    tracing::info!("Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      database_url,
      default_currency,
      payment_provider_url,
      payment_provider_secret_key,
      payment_webhook_secret,
      webhook_tolerance_secs,
    })
  }
}
