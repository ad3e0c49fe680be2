use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Order line with the unit price captured at checkout time. Immutable after
/// creation; cancellation restores stock from these quantities, not from the
/// live cart or variant state.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrderItem {
  pub id: i64,
  pub order_id: i64,
  pub variant_id: i64,
  pub quantity: i32,
  pub price_cents: i64,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}
