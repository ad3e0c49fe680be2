use serde::Deserialize;
use sqlx::PgPool;
use tracing::{info, instrument};

use crate::errors::{AppError, Result};
use crate::models::courier::{Courier, CourierStatus, CourierUpdate, TransportType, COURIER_COLUMNS};

#[derive(Debug, Deserialize)]
pub struct CourierRegistration {
  pub user_id: i64,
  pub transport_type: TransportType,
}

pub async fn get(pool: &PgPool, courier_id: i64) -> Result<Courier> {
  let sql = format!("SELECT {} FROM couriers WHERE id = $1", COURIER_COLUMNS);
  let courier: Option<Courier> = sqlx::query_as(&sql)
    .bind(courier_id)
    .fetch_optional(pool)
    .await?;
  courier.ok_or_else(|| AppError::NotFound(format!("Courier {} not found", courier_id)))
}

/// Register a courier profile. New couriers start unverified and are not
/// eligible for assignment until an admin verifies them.
#[instrument(name = "couriers::register", skip(pool, registration), fields(user_id = registration.user_id))]
pub async fn register(pool: &PgPool, registration: CourierRegistration) -> Result<Courier> {
  let sql = format!(
    "INSERT INTO couriers (user_id, transport_type, is_available, is_verified, status) \
     VALUES ($1, $2, TRUE, FALSE, $3) \
     RETURNING {}",
    COURIER_COLUMNS
  );
  let courier: Courier = sqlx::query_as(&sql)
    .bind(registration.user_id)
    .bind(registration.transport_type)
    .bind(CourierStatus::Active)
    .fetch_one(pool)
    .await?;
  info!(courier_id = courier.id, "Courier registered");
  Ok(courier)
}

/// Apply an admin update. Only the fields enumerated on CourierUpdate are
/// mutable; absent fields keep their current value.
pub async fn update(pool: &PgPool, courier_id: i64, update: CourierUpdate) -> Result<Courier> {
  update.validate()?;
  let sql = format!(
    "UPDATE couriers \
     SET transport_type = COALESCE($2, transport_type), \
         is_verified = COALESCE($3, is_verified), \
         rating = COALESCE($4, rating), \
         updated_at = NOW() \
     WHERE id = $1 \
     RETURNING {}",
    COURIER_COLUMNS
  );
  let courier: Option<Courier> = sqlx::query_as(&sql)
    .bind(courier_id)
    .bind(update.transport_type)
    .bind(update.is_verified)
    .bind(update.rating)
    .fetch_optional(pool)
    .await?;
  courier.ok_or_else(|| AppError::NotFound(format!("Courier {} not found", courier_id)))
}

pub async fn update_location(pool: &PgPool, courier_id: i64, lat: f64, lon: f64) -> Result<Courier> {
  if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
    return Err(AppError::Validation(format!("Invalid coordinates ({}, {})", lat, lon)));
  }
  let sql = format!(
    "UPDATE couriers SET latitude = $2, longitude = $3, updated_at = NOW() \
     WHERE id = $1 RETURNING {}",
    COURIER_COLUMNS
  );
  let courier: Option<Courier> = sqlx::query_as(&sql)
    .bind(courier_id)
    .bind(lat)
    .bind(lon)
    .fetch_optional(pool)
    .await?;
  courier.ok_or_else(|| AppError::NotFound(format!("Courier {} not found", courier_id)))
}

/// Courier-initiated availability toggle. A busy courier cannot put
/// themselves back into rotation while they still hold a delivery; dispatch
/// releases them when the delivery completes.
#[instrument(name = "couriers::set_availability", skip(pool))]
pub async fn set_availability(pool: &PgPool, courier_id: i64, available: bool) -> Result<Courier> {
  let current = get(pool, courier_id).await?;
  if current.status == CourierStatus::Busy {
    return Err(AppError::InvalidState(format!(
      "Courier {} has an active delivery and cannot change availability",
      courier_id
    )));
  }

  let next_status = if available { CourierStatus::Active } else { CourierStatus::Offline };
  let sql = format!(
    "UPDATE couriers SET is_available = $2, status = $3, updated_at = NOW() \
     WHERE id = $1 AND status <> $4 RETURNING {}",
    COURIER_COLUMNS
  );
  let courier: Option<Courier> = sqlx::query_as(&sql)
    .bind(courier_id)
    .bind(available)
    .bind(next_status)
    .bind(CourierStatus::Busy)
    .fetch_optional(pool)
    .await?;
  courier.ok_or_else(|| {
    AppError::InvalidState(format!(
      "Courier {} has an active delivery and cannot change availability",
      courier_id
    ))
  })
}

pub async fn list_available(pool: &PgPool) -> Result<Vec<Courier>> {
  let sql = format!(
    "SELECT {} FROM couriers WHERE is_available AND is_verified ORDER BY id ASC",
    COURIER_COLUMNS
  );
  Ok(sqlx::query_as(&sql).fetch_all(pool).await?)
}

pub async fn list_all(pool: &PgPool) -> Result<Vec<Courier>> {
  let sql = format!("SELECT {} FROM couriers ORDER BY id ASC", COURIER_COLUMNS);
  Ok(sqlx::query_as(&sql).fetch_all(pool).await?)
}
