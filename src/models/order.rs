use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type as SqlxType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "order_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
  Created,
  PendingPayment,
  Paid,
  Processing,
  Shipped,
  Delivered,
  Cancelled,
  Refunded,
}

impl OrderStatus {
  /// Single transition table consulted by every order mutator. Anything not
  /// listed here is rejected with an invalid_state error.
  pub fn can_transition_to(self, next: OrderStatus) -> bool {
    use OrderStatus::*;
    matches!(
      (self, next),
      (Created, PendingPayment)
        | (Created, Paid)
        | (Created, Cancelled)
        | (PendingPayment, Paid)
        | (PendingPayment, Cancelled)
        | (Paid, Processing)
        | (Paid, Refunded)
        | (Processing, Shipped)
        | (Processing, Refunded)
        | (Shipped, Delivered)
    )
  }

  pub fn is_terminal(self) -> bool {
    matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled | OrderStatus::Refunded)
  }

  pub fn as_str(self) -> &'static str {
    match self {
      OrderStatus::Created => "created",
      OrderStatus::PendingPayment => "pending_payment",
      OrderStatus::Paid => "paid",
      OrderStatus::Processing => "processing",
      OrderStatus::Shipped => "shipped",
      OrderStatus::Delivered => "delivered",
      OrderStatus::Cancelled => "cancelled",
      OrderStatus::Refunded => "refunded",
    }
  }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Order {
  pub id: i64,
  pub user_id: i64,
  pub total_amount_cents: i64,
  pub currency: String,
  pub status: OrderStatus,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use super::OrderStatus::*;

  #[test]
  fn checkout_and_payment_path() {
    assert!(Created.can_transition_to(PendingPayment));
    assert!(PendingPayment.can_transition_to(Paid));
    assert!(Created.can_transition_to(Paid));
    assert!(Paid.can_transition_to(Processing));
    assert!(Processing.can_transition_to(Shipped));
    assert!(Shipped.can_transition_to(Delivered));
  }

  #[test]
  fn cancellation_only_before_payment() {
    assert!(Created.can_transition_to(Cancelled));
    assert!(PendingPayment.can_transition_to(Cancelled));
    assert!(!Paid.can_transition_to(Cancelled));
    assert!(!Shipped.can_transition_to(Cancelled));
  }

  #[test]
  fn paid_is_not_reentrant() {
    assert!(!Paid.can_transition_to(Paid));
    assert!(!Paid.can_transition_to(PendingPayment));
  }

  #[test]
  fn refund_branches() {
    assert!(Paid.can_transition_to(Refunded));
    assert!(Processing.can_transition_to(Refunded));
    assert!(!Shipped.can_transition_to(Refunded));
    assert!(!PendingPayment.can_transition_to(Refunded));
  }

  #[test]
  fn terminal_states_accept_nothing() {
    for terminal in [Delivered, Cancelled, Refunded] {
      assert!(terminal.is_terminal());
      for next in [Created, PendingPayment, Paid, Processing, Shipped, Delivered, Cancelled, Refunded] {
        assert!(!terminal.can_transition_to(next));
      }
    }
  }
}
