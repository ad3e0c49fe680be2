use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type as SqlxType};

use crate::errors::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "transport_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransportType {
  Foot,
  Bike,
  Moto,
  Car,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "courier_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CourierStatus {
  Active,
  Offline,
  Busy,
}

/// Courier availability is a shared resource: the is_available flag is only
/// flipped by dispatch (claim/release) and by the courier's own availability
/// endpoint, never read-then-written.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Courier {
  pub id: i64,
  pub user_id: i64,
  pub transport_type: TransportType,
  pub is_available: bool,
  pub is_verified: bool,
  pub status: CourierStatus,
  pub rating: f64,
  pub completed_deliveries: i32,
  pub latitude: Option<f64>,
  pub longitude: Option<f64>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Column list shared by the courier queries in the dispatch and courier
/// services.
pub const COURIER_COLUMNS: &str = "id, user_id, transport_type, is_available, is_verified, status, \
                                   rating, completed_deliveries, latitude, longitude, created_at, updated_at";

/// Explicit per-field update payload for the admin courier endpoint. Fields
/// absent from the payload are left untouched; anything not listed here is
/// not mutable through the API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourierUpdate {
  pub transport_type: Option<TransportType>,
  pub is_verified: Option<bool>,
  pub rating: Option<f64>,
}

impl CourierUpdate {
  pub fn validate(&self) -> Result<()> {
    if let Some(rating) = self.rating {
      if !(0.0..=5.0).contains(&rating) {
        return Err(AppError::Validation(format!(
          "Courier rating must be between 0 and 5, got {}",
          rating
        )));
      }
    }
    if self.transport_type.is_none() && self.is_verified.is_none() && self.rating.is_none() {
      return Err(AppError::Validation("No updatable fields provided".to_string()));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn update_with_valid_rating_passes() {
    let update = CourierUpdate {
      rating: Some(4.5),
      ..Default::default()
    };
    assert!(update.validate().is_ok());
  }

  #[test]
  fn update_with_out_of_range_rating_fails() {
    let update = CourierUpdate {
      rating: Some(5.5),
      ..Default::default()
    };
    assert!(matches!(update.validate(), Err(AppError::Validation(_))));
  }

  #[test]
  fn empty_update_fails() {
    let update = CourierUpdate::default();
    assert!(matches!(update.validate(), Err(AppError::Validation(_))));
  }
}
