use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Discount rule. Read-only from the checkout's perspective; percent takes
/// precedence over the fixed amount when both are set.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PromoCode {
  pub id: i64,
  pub code: String,
  pub discount_percent: i32,
  pub discount_amount_cents: Option<i64>,
  pub is_active: bool,
  pub valid_from: Option<DateTime<Utc>>,
  pub valid_to: Option<DateTime<Utc>>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}
