use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Sellable SKU-level unit. Stock is only ever mutated by the inventory
/// service inside the owning order transaction.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProductVariant {
  pub id: i64,
  pub sku: String,
  pub price_cents: i64,
  pub stock: i32,
  pub is_active: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}
