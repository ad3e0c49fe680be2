use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation error: {0}")]
  Validation(String),

  #[error("Authentication failed: {0}")]
  Auth(String),

  #[error("Forbidden: {0}")]
  Forbidden(String),

  #[error("Resource not found: {0}")]
  NotFound(String),

  #[error("Invalid state: {0}")]
  InvalidState(String),

  #[error("Insufficient stock for {sku}")]
  InsufficientStock { sku: String },

  #[error("Promo code '{0}' not found")]
  PromoNotFound(String),

  #[error("Promo code invalid: {0}")]
  PromoInvalid(String),

  #[error("Courier unavailable: {0}")]
  CourierUnavailable(String),

  #[error("Payment provider error: {0}")]
  PaymentProvider(String),

  #[error("Invalid webhook signature: {0}")]
  SignatureInvalid(String),

  #[error("Database error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Configuration error: {0}")]
  Config(String),

  #[error("Internal server error: {0}")]
  Internal(String),
}

// Allow anyhow::Error to be converted into AppError for handlers using `?`
// on functions returning anyhow::Result.
impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<sqlx::Error>() {
      Ok(db_err) => AppError::Sqlx(db_err),
      Err(other) => AppError::Internal(other.to_string()),
    }
  }
}

impl ResponseError for AppError {
  fn error_response(&self) -> HttpResponse {
    tracing::error!(application_error = %self, "Responding with error");
    match self {
      AppError::Validation(m) => {
        HttpResponse::BadRequest().json(json!({"error": "validation_error", "detail": m}))
      }
      AppError::Auth(m) => HttpResponse::Unauthorized().json(json!({"error": "unauthorized", "detail": m})),
      AppError::Forbidden(m) => HttpResponse::Forbidden().json(json!({"error": "forbidden", "detail": m})),
      AppError::NotFound(m) => HttpResponse::NotFound().json(json!({"error": "not_found", "detail": m})),
      AppError::InvalidState(m) => {
        HttpResponse::Conflict().json(json!({"error": "invalid_state", "detail": m}))
      }
      AppError::InsufficientStock { sku } => HttpResponse::BadRequest().json(json!({
        "error": "insufficient_stock",
        "detail": format!("Not enough stock for {}", sku),
        "sku": sku,
      })),
      AppError::PromoNotFound(code) => HttpResponse::NotFound().json(json!({
        "error": "promo_not_found",
        "detail": format!("Promo code '{}' not found", code),
        "code": code,
      })),
      AppError::PromoInvalid(m) => {
        HttpResponse::BadRequest().json(json!({"error": "promo_invalid", "detail": m}))
      }
      AppError::CourierUnavailable(m) => {
        HttpResponse::BadRequest().json(json!({"error": "courier_unavailable", "detail": m}))
      }
      AppError::PaymentProvider(m) => {
        HttpResponse::BadGateway().json(json!({"error": "payment_provider_error", "detail": m}))
      }
      AppError::SignatureInvalid(m) => {
        HttpResponse::BadRequest().json(json!({"error": "signature_invalid", "detail": m}))
      }
      AppError::Sqlx(_) => HttpResponse::InternalServerError()
        .json(json!({"error": "database_error", "detail": "Database operation failed"})),
      AppError::Config(m) => {
        HttpResponse::InternalServerError().json(json!({"error": "config_error", "detail": m}))
      }
      AppError::Internal(m) => {
        HttpResponse::InternalServerError().json(json!({"error": "internal_error", "detail": m}))
      }
    }
  }
}

// Define a Result type alias for the application
pub type Result<T, E = AppError> = std::result::Result<T, E>;
