use chrono::Utc;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{info, instrument};

use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use crate::models::order::{Order, OrderStatus};
use crate::models::order_item::OrderItem;
use crate::services::orders::OrderDetail;
use crate::services::{dispatch, inventory, pricing};

#[derive(Debug, Deserialize)]
pub struct CheckoutItem {
  pub variant_id: i64,
  pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
  pub user_id: i64,
  pub address_id: i64,
  // Accepted for wire compatibility with older clients; the delivery record
  // is always created from address_id.
  pub delivery_id: Option<i64>,
  pub items: Vec<CheckoutItem>,
  pub promo_code: Option<String>,
  pub currency: Option<String>,
}

/// Convert a cart into a pending-payment order: reserve stock for every line,
/// price the cart, and create the order, its lines, and the delivery record
/// as one atomic unit. Any line failure rolls the whole checkout back, so no
/// partial order or dangling reservation is ever observable.
#[instrument(
  name = "checkout::checkout",
  skip(pool, config, request),
  fields(user_id = request.user_id, line_count = request.items.len())
)]
pub async fn checkout(pool: &PgPool, config: &AppConfig, request: CheckoutRequest) -> Result<OrderDetail> {
  if request.items.is_empty() {
    return Err(AppError::Validation("Cart is empty".to_string()));
  }
  for item in &request.items {
    if item.quantity <= 0 {
      return Err(AppError::Validation(format!(
        "Quantity for variant {} must be positive",
        item.variant_id
      )));
    }
  }
  let currency = request
    .currency
    .unwrap_or_else(|| config.default_currency.clone());

  let mut tx = pool.begin().await?;

  // Reserve every line before pricing; the current variant price is the
  // checkout-time snapshot stored on the order line.
  let mut subtotal_cents: i64 = 0;
  let mut reserved = Vec::with_capacity(request.items.len());
  for item in &request.items {
    let variant = inventory::reserve(&mut tx, item.variant_id, item.quantity).await?;
    subtotal_cents += variant.price_cents * item.quantity as i64;
    reserved.push((variant, item.quantity));
  }

  let promo = match &request.promo_code {
    Some(code) => Some(pricing::load_promo(&mut tx, code).await?),
    None => None,
  };
  let quote = pricing::quote(subtotal_cents, promo.as_ref(), Utc::now())?;

  let order: Order = sqlx::query_as(
    "INSERT INTO orders (user_id, total_amount_cents, currency, status) \
     VALUES ($1, $2, $3, $4) \
     RETURNING id, user_id, total_amount_cents, currency, status, created_at, updated_at",
  )
  .bind(request.user_id)
  .bind(quote.total_cents)
  .bind(&currency)
  .bind(OrderStatus::PendingPayment)
  .fetch_one(&mut *tx)
  .await?;

  let mut items = Vec::with_capacity(reserved.len());
  for (variant, quantity) in &reserved {
    let item: OrderItem = sqlx::query_as(
      "INSERT INTO order_items (order_id, variant_id, quantity, price_cents) \
       VALUES ($1, $2, $3, $4) \
       RETURNING id, order_id, variant_id, quantity, price_cents, created_at, updated_at",
    )
    .bind(order.id)
    .bind(variant.id)
    .bind(quantity)
    .bind(variant.price_cents)
    .fetch_one(&mut *tx)
    .await?;
    items.push(item);
  }

  let delivery = dispatch::create_for_order(&mut tx, order.id, request.address_id).await?;

  tx.commit().await?;

  info!(
    order_id = order.id,
    subtotal_cents = quote.subtotal_cents,
    discount_cents = quote.discount_cents,
    total_cents = quote.total_cents,
    "Checkout committed"
  );

  Ok(OrderDetail {
    order,
    items,
    delivery: Some(delivery),
  })
}
