use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Local record of a payment attempt against the external provider. Multiple
/// rows per order only exist in retry scenarios; the latest succeeded one is
/// authoritative.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Payment {
  pub id: i64,
  pub order_id: i64,
  pub provider_intent_id: Option<String>,
  pub amount_cents: i64,
  pub currency: String,
  pub status: String,
  pub succeeded: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}
