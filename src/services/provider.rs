use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::json;
use sha2::Sha256;
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::errors::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Thin client for the external payment provider. The provider is untrusted:
/// nothing it returns drives order state directly; only signed webhook events
/// do.
#[derive(Clone)]
pub struct PaymentProviderClient {
  client: reqwest::Client,
  base_url: String,
  secret_key: String,
}

/// Provider-side payment intent, referenced locally by id.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderIntent {
  pub id: String,
  pub client_secret: Option<String>,
  pub status: String,
}

/// Verified webhook event envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderEvent {
  #[serde(rename = "type")]
  pub event_type: String,
  pub data: ProviderEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderEventData {
  pub object: ProviderEventObject,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderEventObject {
  pub id: String,
}

impl PaymentProviderClient {
  pub fn new(config: &AppConfig) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(REQUEST_TIMEOUT)
      .build()
      .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;
    Ok(Self {
      client,
      base_url: config.payment_provider_url.trim_end_matches('/').to_string(),
      secret_key: config.payment_provider_secret_key.clone(),
    })
  }

  /// Request a payment intent from the provider. Carries a fresh idempotency
  /// key so provider-side retries never create a second intent.
  #[instrument(name = "provider::create_intent", skip(self))]
  pub async fn create_intent(&self, amount_cents: i64, currency: &str, order_id: i64) -> Result<ProviderIntent> {
    let idempotency_key = Uuid::new_v4();
    let response = self
      .client
      .post(format!("{}/v1/payment_intents", self.base_url))
      .bearer_auth(&self.secret_key)
      .header("Idempotency-Key", idempotency_key.to_string())
      .json(&json!({
        "amount": amount_cents,
        "currency": currency.to_lowercase(),
        "metadata": { "order_id": order_id.to_string() },
      }))
      .send()
      .await
      .map_err(|e| AppError::PaymentProvider(format!("Provider request failed: {}", e)))?;

    if !response.status().is_success() {
      return Err(AppError::PaymentProvider(format!(
        "Provider returned status {}",
        response.status()
      )));
    }

    let intent: ProviderIntent = response
      .json()
      .await
      .map_err(|e| AppError::PaymentProvider(format!("Invalid provider response: {}", e)))?;
    info!(intent_id = %intent.id, "Payment intent created at provider");
    Ok(intent)
  }
}

/// Verify the webhook signature header over the raw body before any business
/// logic runs. The header carries `t=<unix ts>,v1=<hex hmac>` and the MAC is
/// computed over `"{t}.{raw body}"` with the shared webhook secret; the
/// timestamp must fall within the configured tolerance to blunt replays.
pub fn verify_webhook_signature(
  secret: &str,
  signature_header: &str,
  payload: &[u8],
  now: DateTime<Utc>,
  tolerance_secs: i64,
) -> Result<()> {
  let mut timestamp: Option<i64> = None;
  let mut signature: Option<&str> = None;
  for part in signature_header.split(',') {
    match part.trim().split_once('=') {
      Some(("t", value)) => {
        timestamp = Some(
          value
            .parse::<i64>()
            .map_err(|_| AppError::SignatureInvalid("Malformed timestamp".to_string()))?,
        );
      }
      Some(("v1", value)) => signature = Some(value),
      _ => {}
    }
  }

  let timestamp =
    timestamp.ok_or_else(|| AppError::SignatureInvalid("Missing timestamp".to_string()))?;
  let signature =
    signature.ok_or_else(|| AppError::SignatureInvalid("Missing v1 signature".to_string()))?;

  if (now.timestamp() - timestamp).abs() > tolerance_secs {
    return Err(AppError::SignatureInvalid("Timestamp outside tolerance".to_string()));
  }

  let signature_bytes = hex::decode(signature)
    .map_err(|_| AppError::SignatureInvalid("Signature is not valid hex".to_string()))?;

  let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
    .map_err(|e| AppError::Internal(format!("Invalid webhook secret: {}", e)))?;
  mac.update(timestamp.to_string().as_bytes());
  mac.update(b".");
  mac.update(payload);
  mac
    .verify_slice(&signature_bytes)
    .map_err(|_| AppError::SignatureInvalid("Signature mismatch".to_string()))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sign(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
  }

  #[test]
  fn valid_signature_verifies() {
    let now = Utc::now();
    let payload = br#"{"type":"payment_intent.succeeded"}"#;
    let header = sign("whsec_test", now.timestamp(), payload);
    assert!(verify_webhook_signature("whsec_test", &header, payload, now, 300).is_ok());
  }

  #[test]
  fn tampered_payload_rejected() {
    let now = Utc::now();
    let header = sign("whsec_test", now.timestamp(), b"original body");
    let result = verify_webhook_signature("whsec_test", &header, b"tampered body", now, 300);
    assert!(matches!(result, Err(AppError::SignatureInvalid(_))));
  }

  #[test]
  fn wrong_secret_rejected() {
    let now = Utc::now();
    let payload = b"body";
    let header = sign("whsec_other", now.timestamp(), payload);
    let result = verify_webhook_signature("whsec_test", &header, payload, now, 300);
    assert!(matches!(result, Err(AppError::SignatureInvalid(_))));
  }

  #[test]
  fn stale_timestamp_rejected() {
    let now = Utc::now();
    let payload = b"body";
    let header = sign("whsec_test", now.timestamp() - 600, payload);
    let result = verify_webhook_signature("whsec_test", &header, payload, now, 300);
    assert!(matches!(result, Err(AppError::SignatureInvalid(_))));
  }

  #[test]
  fn malformed_header_rejected() {
    let now = Utc::now();
    for header in ["", "t=abc,v1=00", "v1=00", "t=123", "t=123,v1=zz"] {
      let result = verify_webhook_signature("whsec_test", header, b"body", now, 300);
      assert!(matches!(result, Err(AppError::SignatureInvalid(_))), "header: {}", header);
    }
  }

  #[test]
  fn event_payload_parses() {
    let payload = r#"{
      "id": "evt_1",
      "type": "payment_intent.succeeded",
      "data": { "object": { "id": "pi_123", "amount": 2700 } }
    }"#;
    let event: ProviderEvent = serde_json::from_str(payload).unwrap();
    assert_eq!(event.event_type, "payment_intent.succeeded");
    assert_eq!(event.data.object.id, "pi_123");
  }
}
