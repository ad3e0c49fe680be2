use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::instrument;

use crate::errors::AppError;
use crate::models::courier::CourierUpdate;
use crate::services::couriers::{self, CourierRegistration};
use crate::state::AppState;
use crate::web::extractors::AdminUser;

#[derive(Debug, Deserialize)]
pub struct LocationUpdateRequest {
  pub lat: f64,
  pub lon: f64,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityRequest {
  pub available: bool,
}

#[instrument(name = "handler::register_courier", skip(app_state, payload))]
pub async fn register_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<CourierRegistration>,
) -> Result<HttpResponse, AppError> {
  let courier = couriers::register(&app_state.db_pool, payload.into_inner()).await?;
  Ok(HttpResponse::Created().json(courier))
}

#[instrument(
  name = "handler::update_courier",
  skip(app_state, admin, path, payload),
  fields(courier_id = %path.as_ref(), admin_id = admin.0.user_id)
)]
pub async fn update_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  path: web::Path<i64>,
  payload: web::Json<CourierUpdate>,
) -> Result<HttpResponse, AppError> {
  let courier_id = path.into_inner();
  let courier = couriers::update(&app_state.db_pool, courier_id, payload.into_inner()).await?;
  Ok(HttpResponse::Ok().json(courier))
}

#[instrument(name = "handler::update_courier_location", skip(app_state, path, payload), fields(courier_id = %path.as_ref()))]
pub async fn update_location_handler(
  app_state: web::Data<AppState>,
  path: web::Path<i64>,
  payload: web::Json<LocationUpdateRequest>,
) -> Result<HttpResponse, AppError> {
  let courier_id = path.into_inner();
  let courier = couriers::update_location(&app_state.db_pool, courier_id, payload.lat, payload.lon).await?;
  Ok(HttpResponse::Ok().json(courier))
}

#[instrument(name = "handler::set_courier_availability", skip(app_state, path, payload), fields(courier_id = %path.as_ref()))]
pub async fn set_availability_handler(
  app_state: web::Data<AppState>,
  path: web::Path<i64>,
  payload: web::Json<AvailabilityRequest>,
) -> Result<HttpResponse, AppError> {
  let courier_id = path.into_inner();
  let courier = couriers::set_availability(&app_state.db_pool, courier_id, payload.available).await?;
  Ok(HttpResponse::Ok().json(courier))
}

#[instrument(name = "handler::list_available_couriers", skip(app_state))]
pub async fn list_available_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let couriers = couriers::list_available(&app_state.db_pool).await?;
  Ok(HttpResponse::Ok().json(couriers))
}

#[instrument(name = "handler::list_couriers", skip(app_state, admin), fields(admin_id = admin.0.user_id))]
pub async fn list_all_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let couriers = couriers::list_all(&app_state.db_pool).await?;
  Ok(HttpResponse::Ok().json(couriers))
}
