use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use serde_json::json;
use tracing::{instrument, warn};

use crate::errors::AppError;
use crate::services::payments::{self, WebhookOutcome};
use crate::services::provider::{self, ProviderEvent};
use crate::state::AppState;

const SIGNATURE_HEADER: &str = "stripe-signature";

#[instrument(name = "handler::create_payment_intent", skip(app_state, path), fields(order_id = %path.as_ref()))]
pub async fn create_intent_handler(
  app_state: web::Data<AppState>,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();
  let response = payments::create_intent(&app_state, order_id).await?;
  Ok(HttpResponse::Ok().json(response))
}

/// Provider callback. The raw body is signature-verified before any parsing
/// or business logic; rejected requests are logged as security-relevant
/// events.
#[instrument(name = "handler::payment_webhook", skip(app_state, req, body))]
pub async fn webhook_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let signature = req
    .headers()
    .get(SIGNATURE_HEADER)
    .and_then(|h| h.to_str().ok());

  let Some(signature) = signature else {
    warn!(peer = ?req.peer_addr(), "Webhook rejected: missing signature header");
    return Err(AppError::SignatureInvalid("Missing signature header".to_string()));
  };

  if let Err(e) = provider::verify_webhook_signature(
    &app_state.config.payment_webhook_secret,
    signature,
    &body,
    Utc::now(),
    app_state.config.webhook_tolerance_secs,
  ) {
    warn!(peer = ?req.peer_addr(), error = %e, "Webhook rejected: signature verification failed");
    return Err(e);
  }

  let event: ProviderEvent = serde_json::from_slice(&body)
    .map_err(|e| AppError::Validation(format!("Malformed webhook payload: {}", e)))?;

  let outcome = payments::handle_event(&app_state, event).await?;
  let body = match outcome {
    WebhookOutcome::Processed => json!({"status": "ok"}),
    WebhookOutcome::UnknownPayment => json!({"status": "unknown_payment"}),
    WebhookOutcome::Ignored(event_type) => json!({"status": "ignored", "type": event_type}),
  };
  Ok(HttpResponse::Ok().json(body))
}
