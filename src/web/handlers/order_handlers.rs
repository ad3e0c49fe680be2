use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::services::checkout::{self, CheckoutRequest};
use crate::services::orders::{self, PaidTransition};
use crate::services::payments;
use crate::state::AppState;

#[instrument(
  name = "handler::checkout",
  skip(app_state, payload),
  fields(user_id = payload.user_id)
)]
pub async fn checkout_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<CheckoutRequest>,
) -> Result<HttpResponse, AppError> {
  let detail = checkout::checkout(&app_state.db_pool, &app_state.config, payload.into_inner()).await?;
  info!(order_id = detail.order.id, "Checkout succeeded");
  Ok(HttpResponse::Created().json(detail))
}

/// Manual/testing path of the paid transition; the production path is the
/// provider webhook. Paying an already-paid order is a conflict here, while
/// the webhook treats it as a duplicate delivery.
#[instrument(name = "handler::pay_order", skip(app_state, path), fields(order_id = %path.as_ref()))]
pub async fn pay_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();
  match orders::apply_paid(&app_state.db_pool, order_id).await? {
    PaidTransition::AlreadyPaid(order) => Err(AppError::InvalidState(format!(
      "Order {} is already paid",
      order.id
    ))),
    PaidTransition::Applied(order) => {
      payments::auto_assign_courier(&app_state.db_pool, order.id).await;
      Ok(HttpResponse::Ok().json(json!({
        "detail": "Payment confirmed",
        "order_id": order.id,
        "status": order.status,
      })))
    }
  }
}

#[instrument(name = "handler::cancel_order", skip(app_state, path), fields(order_id = %path.as_ref()))]
pub async fn cancel_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();
  let detail = orders::cancel(&app_state.db_pool, order_id).await?;
  Ok(HttpResponse::Ok().json(detail))
}

#[instrument(name = "handler::get_order", skip(app_state, path), fields(order_id = %path.as_ref()))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();
  let detail = orders::load_detail(&app_state.db_pool, order_id).await?;
  Ok(HttpResponse::Ok().json(detail))
}
