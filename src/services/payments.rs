use serde::Serialize;
use sqlx::PgPool;
use tracing::{error, info, instrument, warn};

use crate::errors::{AppError, Result};
use crate::models::order::OrderStatus;
use crate::models::payment::Payment;
use crate::services::dispatch;
use crate::services::orders::{self, PaidTransition};
use crate::services::provider::ProviderEvent;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct IntentResponse {
  pub client_secret: Option<String>,
  pub payment_id: i64,
  pub intent_id: String,
}

/// What the webhook endpoint reports back to the provider. Unknown payments
/// and unhandled event types are acknowledged, not errored, so the provider
/// does not retry events that will never become processable here.
#[derive(Debug)]
pub enum WebhookOutcome {
  Processed,
  UnknownPayment,
  Ignored(String),
}

/// Create a local payment row and request an intent from the provider. The
/// local row is committed on its own before the outbound call; the call is
/// never part of any checkout transaction. If the provider is unreachable the
/// row is marked failed so no phantom "created" payment survives.
#[instrument(name = "payments::create_intent", skip(state))]
pub async fn create_intent(state: &AppState, order_id: i64) -> Result<IntentResponse> {
  let order = orders::load(&state.db_pool, order_id).await?;
  if !matches!(order.status, OrderStatus::Created | OrderStatus::PendingPayment) {
    return Err(AppError::InvalidState(format!(
      "Order {} cannot accept payment in state {}",
      order.id,
      order.status.as_str()
    )));
  }

  let payment: Payment = sqlx::query_as(
    "INSERT INTO payments (order_id, amount_cents, currency, status, succeeded) \
     VALUES ($1, $2, $3, 'created', FALSE) \
     RETURNING id, order_id, provider_intent_id, amount_cents, currency, status, succeeded, \
               created_at, updated_at",
  )
  .bind(order.id)
  .bind(order.total_amount_cents)
  .bind(&order.currency)
  .fetch_one(&state.db_pool)
  .await?;

  let intent = match state
    .payments
    .create_intent(order.total_amount_cents, &order.currency, order.id)
    .await
  {
    Ok(intent) => intent,
    Err(provider_err) => {
      sqlx::query("UPDATE payments SET status = 'failed', updated_at = NOW() WHERE id = $1")
        .bind(payment.id)
        .execute(&state.db_pool)
        .await?;
      warn!(payment_id = payment.id, order_id, "Marked payment failed after provider error");
      return Err(provider_err);
    }
  };

  let payment: Payment = sqlx::query_as(
    "UPDATE payments SET provider_intent_id = $2, status = $3, updated_at = NOW() WHERE id = $1 \
     RETURNING id, order_id, provider_intent_id, amount_cents, currency, status, succeeded, \
               created_at, updated_at",
  )
  .bind(payment.id)
  .bind(&intent.id)
  .bind(&intent.status)
  .fetch_one(&state.db_pool)
  .await?;

  info!(payment_id = payment.id, order_id, intent_id = %intent.id, "Payment intent recorded");
  Ok(IntentResponse {
    client_secret: intent.client_secret,
    payment_id: payment.id,
    intent_id: intent.id,
  })
}

/// Apply a verified provider event. Success events are idempotent: an order
/// that is already paid is acknowledged without a second stock or dispatch
/// side effect.
#[instrument(name = "payments::handle_event", skip(state, event), fields(event_type = %event.event_type))]
pub async fn handle_event(state: &AppState, event: ProviderEvent) -> Result<WebhookOutcome> {
  match event.event_type.as_str() {
    "payment_intent.succeeded" => {
      let intent_id = &event.data.object.id;
      let payment = match find_by_intent(&state.db_pool, intent_id).await? {
        Some(payment) => payment,
        None => {
          // The event may belong to another environment sharing the provider
          // account; acknowledged without processing.
          info!(intent_id = %intent_id, "Success event for unknown payment");
          return Ok(WebhookOutcome::UnknownPayment);
        }
      };

      sqlx::query(
        "UPDATE payments SET succeeded = TRUE, status = 'succeeded', updated_at = NOW() WHERE id = $1",
      )
      .bind(payment.id)
      .execute(&state.db_pool)
      .await?;

      match orders::apply_paid(&state.db_pool, payment.order_id).await {
        Ok(PaidTransition::Applied(order)) => {
          info!(order_id = order.id, "Order paid via provider event");
          auto_assign_courier(&state.db_pool, order.id).await;
        }
        Ok(PaidTransition::AlreadyPaid(order)) => {
          info!(order_id = order.id, "Duplicate success event for paid order; no-op");
        }
        Err(AppError::NotFound(detail)) | Err(AppError::InvalidState(detail)) => {
          // The money moved but the order cannot take the transition (for
          // example it was cancelled first). Acknowledge so the provider does
          // not retry; this needs manual review, not replays.
          warn!(order_id = payment.order_id, detail = %detail, "Payment succeeded for unprocessable order");
        }
        Err(other) => return Err(other),
      }

      Ok(WebhookOutcome::Processed)
    }
    "payment_intent.payment_failed" => {
      let intent_id = &event.data.object.id;
      match find_by_intent(&state.db_pool, intent_id).await? {
        None => Ok(WebhookOutcome::UnknownPayment),
        Some(payment) => {
          sqlx::query("UPDATE payments SET status = 'failed', updated_at = NOW() WHERE id = $1")
            .bind(payment.id)
            .execute(&state.db_pool)
            .await?;
          info!(payment_id = payment.id, order_id = payment.order_id, "Payment marked failed");
          Ok(WebhookOutcome::Processed)
        }
      }
    }
    other => Ok(WebhookOutcome::Ignored(other.to_string())),
  }
}

/// Best-effort courier auto-assignment after an order becomes paid. Failure
/// never rolls back the paid transition; an unassignable delivery stays
/// pending for manual dispatch.
pub async fn auto_assign_courier(pool: &PgPool, order_id: i64) {
  match dispatch::assign(pool, order_id, None).await {
    Ok((_, courier)) => {
      info!(order_id, courier_id = courier.id, "Courier auto-assigned after payment");
    }
    Err(AppError::CourierUnavailable(detail)) => {
      warn!(order_id, detail = %detail, "No courier available; delivery left unassigned");
    }
    Err(e) => {
      error!(order_id, error = %e, "Courier auto-assignment failed");
    }
  }
}

async fn find_by_intent(pool: &PgPool, intent_id: &str) -> Result<Option<Payment>> {
  let payment: Option<Payment> = sqlx::query_as(
    "SELECT id, order_id, provider_intent_id, amount_cents, currency, status, succeeded, \
            created_at, updated_at \
     FROM payments WHERE provider_intent_id = $1 ORDER BY id DESC LIMIT 1",
  )
  .bind(intent_id)
  .fetch_optional(pool)
  .await?;
  Ok(payment)
}
