use sqlx::{PgPool, Postgres, Transaction};
use tracing::{info, instrument};

use crate::errors::{AppError, Result};
use crate::models::courier::{Courier, CourierStatus, COURIER_COLUMNS};
use crate::models::delivery::{Delivery, DeliveryStatus};

/// Create the delivery record bound 1:1 to an order. Called exactly once,
/// inside the checkout transaction, with the courier unset.
pub async fn create_for_order(
  tx: &mut Transaction<'_, Postgres>,
  order_id: i64,
  address_id: i64,
) -> Result<Delivery> {
  let delivery: Delivery = sqlx::query_as(
    "INSERT INTO deliveries (order_id, address_id, status) VALUES ($1, $2, $3) \
     RETURNING id, order_id, courier_id, address_id, status, assigned_at, delivered_at, \
               created_at, updated_at",
  )
  .bind(order_id)
  .bind(address_id)
  .bind(DeliveryStatus::Pending)
  .fetch_one(&mut **tx)
  .await?;
  Ok(delivery)
}

pub async fn get_for_order(pool: &PgPool, order_id: i64) -> Result<Delivery> {
  let delivery: Option<Delivery> = sqlx::query_as(
    "SELECT id, order_id, courier_id, address_id, status, assigned_at, delivered_at, \
            created_at, updated_at \
     FROM deliveries WHERE order_id = $1",
  )
  .bind(order_id)
  .fetch_optional(pool)
  .await?;

  delivery.ok_or_else(|| AppError::NotFound(format!("Delivery for order {} not found", order_id)))
}

async fn lock_for_order(tx: &mut Transaction<'_, Postgres>, order_id: i64) -> Result<Delivery> {
  let delivery: Option<Delivery> = sqlx::query_as(
    "SELECT id, order_id, courier_id, address_id, status, assigned_at, delivered_at, \
            created_at, updated_at \
     FROM deliveries WHERE order_id = $1 FOR UPDATE",
  )
  .bind(order_id)
  .fetch_optional(&mut **tx)
  .await?;

  delivery.ok_or_else(|| AppError::NotFound(format!("Delivery for order {} not found", order_id)))
}

/// Assign a courier to an order's delivery. An explicit courier must be
/// available and verified; without one, the first available verified courier
/// is selected (no ranking, a deliberate simplification). The availability
/// check and the busy flip are a single conditional UPDATE, so two concurrent
/// assignments can never both claim the same courier. Reassignment releases
/// the previously assigned courier.
#[instrument(name = "dispatch::assign", skip(pool))]
pub async fn assign(pool: &PgPool, order_id: i64, courier_id: Option<i64>) -> Result<(Delivery, Courier)> {
  let mut tx = pool.begin().await?;
  let delivery = lock_for_order(&mut tx, order_id).await?;

  if !matches!(delivery.status, DeliveryStatus::Pending | DeliveryStatus::Assigned) {
    return Err(AppError::InvalidState(format!(
      "Delivery for order {} cannot be assigned in state {}",
      order_id,
      delivery.status.as_str()
    )));
  }

  if let Some(previous) = delivery.courier_id {
    release_courier(&mut tx, previous, false).await?;
  }

  let courier = match courier_id {
    Some(id) => claim_courier(&mut tx, id).await?,
    None => claim_first_available(&mut tx).await?,
  };

  let delivery: Delivery = sqlx::query_as(
    "UPDATE deliveries \
     SET courier_id = $2, status = $3, assigned_at = NOW(), updated_at = NOW() \
     WHERE id = $1 \
     RETURNING id, order_id, courier_id, address_id, status, assigned_at, delivered_at, \
               created_at, updated_at",
  )
  .bind(delivery.id)
  .bind(courier.id)
  .bind(DeliveryStatus::Assigned)
  .fetch_one(&mut *tx)
  .await?;

  tx.commit().await?;
  info!(order_id, courier_id = courier.id, "Courier assigned to delivery");
  Ok((delivery, courier))
}

/// Move a delivery through its lifecycle. Progression is forward-only with
/// cancel allowed from any non-terminal state; reaching delivered stamps the
/// timestamp and credits the courier, cancelling releases the courier
/// without credit.
#[instrument(name = "dispatch::update_status", skip(pool))]
pub async fn update_status(pool: &PgPool, order_id: i64, next: DeliveryStatus) -> Result<Delivery> {
  let mut tx = pool.begin().await?;
  let delivery = lock_for_order(&mut tx, order_id).await?;

  if !delivery.status.can_transition_to(next) {
    return Err(AppError::InvalidState(format!(
      "Delivery for order {} cannot move from {} to {}",
      order_id,
      delivery.status.as_str(),
      next.as_str()
    )));
  }

  if let Some(courier_id) = delivery.courier_id {
    match next {
      DeliveryStatus::Delivered => release_courier(&mut tx, courier_id, true).await?,
      DeliveryStatus::Canceled => release_courier(&mut tx, courier_id, false).await?,
      _ => {}
    }
  }

  let updated: Delivery = sqlx::query_as(
    "UPDATE deliveries \
     SET status = $2, \
         delivered_at = CASE WHEN $3 THEN NOW() ELSE delivered_at END, \
         updated_at = NOW() \
     WHERE id = $1 \
     RETURNING id, order_id, courier_id, address_id, status, assigned_at, delivered_at, \
               created_at, updated_at",
  )
  .bind(delivery.id)
  .bind(next)
  .bind(next == DeliveryStatus::Delivered)
  .fetch_one(&mut *tx)
  .await?;

  tx.commit().await?;
  info!(order_id, status = next.as_str(), "Delivery status updated");
  Ok(updated)
}

/// Claim a specific courier if they are still available and verified. Zero
/// affected rows with an existing courier means someone else won the claim.
async fn claim_courier(tx: &mut Transaction<'_, Postgres>, courier_id: i64) -> Result<Courier> {
  let sql = format!(
    "UPDATE couriers SET is_available = FALSE, status = $2, updated_at = NOW() \
     WHERE id = $1 AND is_available AND is_verified \
     RETURNING {}",
    COURIER_COLUMNS
  );
  let claimed: Option<Courier> = sqlx::query_as(&sql)
    .bind(courier_id)
    .bind(CourierStatus::Busy)
    .fetch_optional(&mut **tx)
    .await?;

  if let Some(courier) = claimed {
    return Ok(courier);
  }

  let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM couriers WHERE id = $1")
    .bind(courier_id)
    .fetch_optional(&mut **tx)
    .await?;
  match exists {
    None => Err(AppError::NotFound(format!("Courier {} not found", courier_id))),
    Some(_) => Err(AppError::CourierUnavailable(format!(
      "Courier {} is not available or not verified",
      courier_id
    ))),
  }
}

/// First available & verified courier, ordered by id. SKIP LOCKED keeps
/// concurrent auto-assignments from queueing on the same row.
async fn claim_first_available(tx: &mut Transaction<'_, Postgres>) -> Result<Courier> {
  let sql = format!(
    "UPDATE couriers SET is_available = FALSE, status = $1, updated_at = NOW() \
     WHERE id = ( \
       SELECT id FROM couriers WHERE is_available AND is_verified \
       ORDER BY id ASC LIMIT 1 FOR UPDATE SKIP LOCKED \
     ) \
     RETURNING {}",
    COURIER_COLUMNS
  );
  let claimed: Option<Courier> = sqlx::query_as(&sql)
    .bind(CourierStatus::Busy)
    .fetch_optional(&mut **tx)
    .await?;

  claimed.ok_or_else(|| AppError::CourierUnavailable("No available verified courier".to_string()))
}

/// Put a courier back into rotation; a completed delivery also bumps the
/// completion counter.
pub(crate) async fn release_courier(
  tx: &mut Transaction<'_, Postgres>,
  courier_id: i64,
  completed: bool,
) -> Result<()> {
  sqlx::query(
    "UPDATE couriers \
     SET is_available = TRUE, status = $2, \
         completed_deliveries = completed_deliveries + $3, updated_at = NOW() \
     WHERE id = $1",
  )
  .bind(courier_id)
  .bind(CourierStatus::Active)
  .bind(if completed { 1i32 } else { 0i32 })
  .execute(&mut **tx)
  .await?;
  Ok(())
}
