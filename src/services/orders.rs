use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{info, instrument, warn};

use crate::errors::{AppError, Result};
use crate::models::delivery::{Delivery, DeliveryStatus};
use crate::models::order::{Order, OrderStatus};
use crate::models::order_item::OrderItem;
use crate::services::{dispatch, inventory};

/// Full order representation returned by checkout and the order endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
  #[serde(flatten)]
  pub order: Order,
  pub items: Vec<OrderItem>,
  pub delivery: Option<Delivery>,
}

/// Outcome of applying a payment-success event to an order. AlreadyPaid lets
/// the webhook path treat duplicate events as a no-op while the manual pay
/// endpoint reports a conflict.
#[derive(Debug)]
pub enum PaidTransition {
  Applied(Order),
  AlreadyPaid(Order),
}

pub async fn load(pool: &PgPool, order_id: i64) -> Result<Order> {
  let order: Option<Order> = sqlx::query_as(
    "SELECT id, user_id, total_amount_cents, currency, status, created_at, updated_at \
     FROM orders WHERE id = $1",
  )
  .bind(order_id)
  .fetch_optional(pool)
  .await?;

  order.ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))
}

pub async fn load_detail(pool: &PgPool, order_id: i64) -> Result<OrderDetail> {
  let order = load(pool, order_id).await?;
  let items: Vec<OrderItem> = sqlx::query_as(
    "SELECT id, order_id, variant_id, quantity, price_cents, created_at, updated_at \
     FROM order_items WHERE order_id = $1 ORDER BY id ASC",
  )
  .bind(order_id)
  .fetch_all(pool)
  .await?;
  let delivery: Option<Delivery> = sqlx::query_as(
    "SELECT id, order_id, courier_id, address_id, status, assigned_at, delivered_at, \
            created_at, updated_at \
     FROM deliveries WHERE order_id = $1",
  )
  .bind(order_id)
  .fetch_optional(pool)
  .await?;

  Ok(OrderDetail { order, items, delivery })
}

/// Lock the order row for the rest of the transaction. Concurrent pay/cancel
/// requests for the same order serialize here before consulting the
/// transition table.
pub(crate) async fn lock(tx: &mut Transaction<'_, Postgres>, order_id: i64) -> Result<Order> {
  let order: Option<Order> = sqlx::query_as(
    "SELECT id, user_id, total_amount_cents, currency, status, created_at, updated_at \
     FROM orders WHERE id = $1 FOR UPDATE",
  )
  .bind(order_id)
  .fetch_optional(&mut **tx)
  .await?;

  order.ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))
}

pub(crate) async fn set_status(
  tx: &mut Transaction<'_, Postgres>,
  order: &Order,
  next: OrderStatus,
) -> Result<Order> {
  if !order.status.can_transition_to(next) {
    return Err(AppError::InvalidState(format!(
      "Order {} cannot move from {} to {}",
      order.id,
      order.status.as_str(),
      next.as_str()
    )));
  }
  let updated: Order = sqlx::query_as(
    "UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1 \
     RETURNING id, user_id, total_amount_cents, currency, status, created_at, updated_at",
  )
  .bind(order.id)
  .bind(next)
  .fetch_one(&mut **tx)
  .await?;
  info!(order_id = order.id, from = order.status.as_str(), to = next.as_str(), "Order status changed");
  Ok(updated)
}

/// Transition an order to paid under a row lock. Duplicate success events
/// resolve to AlreadyPaid without touching stock or the delivery.
#[instrument(name = "orders::apply_paid", skip(pool))]
pub async fn apply_paid(pool: &PgPool, order_id: i64) -> Result<PaidTransition> {
  let mut tx = pool.begin().await?;
  let order = lock(&mut tx, order_id).await?;

  if order.status == OrderStatus::Paid {
    tx.commit().await?;
    return Ok(PaidTransition::AlreadyPaid(order));
  }

  let updated = set_status(&mut tx, &order, OrderStatus::Paid).await?;
  tx.commit().await?;
  Ok(PaidTransition::Applied(updated))
}

/// Cancel an order that has not been paid yet: restore every reserved line
/// quantity, cancel the delivery, and free an assigned courier, all in one
/// transaction.
#[instrument(name = "orders::cancel", skip(pool))]
pub async fn cancel(pool: &PgPool, order_id: i64) -> Result<OrderDetail> {
  let mut tx = pool.begin().await?;
  let order = lock(&mut tx, order_id).await?;

  if !order.status.can_transition_to(OrderStatus::Cancelled) {
    return Err(AppError::InvalidState(format!(
      "Order {} cannot be cancelled in state {}",
      order.id,
      order.status.as_str()
    )));
  }

  let items: Vec<OrderItem> = sqlx::query_as(
    "SELECT id, order_id, variant_id, quantity, price_cents, created_at, updated_at \
     FROM order_items WHERE order_id = $1 ORDER BY id ASC",
  )
  .bind(order_id)
  .fetch_all(&mut *tx)
  .await?;

  // Restoration uses the order-line quantities captured at checkout, not the
  // live variant state.
  for item in &items {
    inventory::release(&mut tx, item.variant_id, item.quantity).await?;
  }

  let delivery: Option<Delivery> = sqlx::query_as(
    "SELECT id, order_id, courier_id, address_id, status, assigned_at, delivered_at, \
            created_at, updated_at \
     FROM deliveries WHERE order_id = $1 FOR UPDATE",
  )
  .bind(order_id)
  .fetch_optional(&mut *tx)
  .await?;

  let delivery = match delivery {
    Some(d) if !d.status.is_terminal() => {
      if let Some(courier_id) = d.courier_id {
        dispatch::release_courier(&mut tx, courier_id, false).await?;
      }
      let cancelled: Delivery = sqlx::query_as(
        "UPDATE deliveries SET status = $2, updated_at = NOW() WHERE id = $1 \
         RETURNING id, order_id, courier_id, address_id, status, assigned_at, delivered_at, \
                   created_at, updated_at",
      )
      .bind(d.id)
      .bind(DeliveryStatus::Canceled)
      .fetch_one(&mut *tx)
      .await?;
      Some(cancelled)
    }
    other => {
      if other.is_none() {
        warn!(order_id, "Cancelling an order without a delivery record");
      }
      other
    }
  };

  let cancelled = set_status(&mut tx, &order, OrderStatus::Cancelled).await?;
  tx.commit().await?;

  info!(order_id, "Order cancelled and stock restored");
  Ok(OrderDetail { order: cancelled, items, delivery })
}
