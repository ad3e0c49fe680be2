use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type as SqlxType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "delivery_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
  Pending,
  Assigned,
  Picking,
  Delivering,
  Delivered,
  Canceled,
}

impl DeliveryStatus {
  /// Position in the fulfillment progression. Couriers and admins may move a
  /// delivery forward (skips allowed) but never backward.
  fn rank(self) -> u8 {
    match self {
      DeliveryStatus::Pending => 0,
      DeliveryStatus::Assigned => 1,
      DeliveryStatus::Picking => 2,
      DeliveryStatus::Delivering => 3,
      DeliveryStatus::Delivered => 4,
      DeliveryStatus::Canceled => 5,
    }
  }

  pub fn is_terminal(self) -> bool {
    matches!(self, DeliveryStatus::Delivered | DeliveryStatus::Canceled)
  }

  pub fn can_transition_to(self, next: DeliveryStatus) -> bool {
    if self.is_terminal() {
      return false;
    }
    if next == DeliveryStatus::Canceled {
      return true;
    }
    next.rank() > self.rank()
  }

  pub fn as_str(self) -> &'static str {
    match self {
      DeliveryStatus::Pending => "pending",
      DeliveryStatus::Assigned => "assigned",
      DeliveryStatus::Picking => "picking",
      DeliveryStatus::Delivering => "delivering",
      DeliveryStatus::Delivered => "delivered",
      DeliveryStatus::Canceled => "canceled",
    }
  }
}

/// Fulfillment record, 1:1 with its order. Courier stays unset until dispatch
/// assigns one.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Delivery {
  pub id: i64,
  pub order_id: i64,
  pub courier_id: Option<i64>,
  pub address_id: i64,
  pub status: DeliveryStatus,
  pub assigned_at: Option<DateTime<Utc>>,
  pub delivered_at: Option<DateTime<Utc>>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use super::DeliveryStatus::*;

  #[test]
  fn forward_progression_allowed() {
    assert!(Pending.can_transition_to(Assigned));
    assert!(Assigned.can_transition_to(Picking));
    assert!(Picking.can_transition_to(Delivering));
    assert!(Delivering.can_transition_to(Delivered));
  }

  #[test]
  fn forward_skips_allowed() {
    assert!(Pending.can_transition_to(Delivering));
    assert!(Assigned.can_transition_to(Delivered));
  }

  #[test]
  fn backward_moves_rejected() {
    assert!(!Assigned.can_transition_to(Pending));
    assert!(!Delivering.can_transition_to(Picking));
    assert!(!Delivering.can_transition_to(Assigned));
  }

  #[test]
  fn cancel_from_any_non_terminal_state() {
    for status in [Pending, Assigned, Picking, Delivering] {
      assert!(status.can_transition_to(Canceled));
    }
    assert!(!Delivered.can_transition_to(Canceled));
    assert!(!Canceled.can_transition_to(Canceled));
  }

  #[test]
  fn terminal_states_accept_nothing() {
    for next in [Pending, Assigned, Picking, Delivering, Delivered, Canceled] {
      assert!(!Delivered.can_transition_to(next));
      assert!(!Canceled.can_transition_to(next));
    }
  }
}
