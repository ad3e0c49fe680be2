use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use crate::errors::AppError;
use crate::models::delivery::DeliveryStatus;
use crate::services::dispatch;
use crate::state::AppState;
use crate::web::extractors::{AdminUser, AuthenticatedUser};

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
  // Omitted courier_id selects the first available verified courier.
  pub courier_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
  pub status: DeliveryStatus,
}

#[instrument(name = "handler::get_delivery", skip(app_state, path), fields(order_id = %path.as_ref()))]
pub async fn get_delivery_handler(
  app_state: web::Data<AppState>,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();
  let delivery = dispatch::get_for_order(&app_state.db_pool, order_id).await?;
  Ok(HttpResponse::Ok().json(delivery))
}

#[instrument(
  name = "handler::assign_courier",
  skip(app_state, admin, path, payload),
  fields(order_id = %path.as_ref(), admin_id = admin.0.user_id)
)]
pub async fn assign_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  path: web::Path<i64>,
  payload: web::Json<AssignRequest>,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();
  let (delivery, courier) = dispatch::assign(&app_state.db_pool, order_id, payload.courier_id).await?;
  Ok(HttpResponse::Ok().json(json!({
    "status": "assigned",
    "courier_id": courier.id,
    "delivery": delivery,
  })))
}

#[instrument(
  name = "handler::update_delivery_status",
  skip(app_state, user, path, payload),
  fields(order_id = %path.as_ref(), user_id = user.user_id)
)]
pub async fn update_status_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  path: web::Path<i64>,
  payload: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();
  let delivery = dispatch::update_status(&app_state.db_pool, order_id, payload.status).await?;
  Ok(HttpResponse::Ok().json(delivery))
}
