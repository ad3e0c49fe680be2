use actix_web::{web, HttpResponse};
use tracing::{instrument, warn};

use crate::errors::AppError;
use crate::models::variant::ProductVariant;
use crate::state::AppState;

/// Read side of the catalog interface: the only variant data the core
/// depends on (price, stock, active flag).
#[instrument(name = "handler::get_variant", skip(app_state, path), fields(variant_id = %path.as_ref()))]
pub async fn get_variant_handler(
  app_state: web::Data<AppState>,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  let variant_id = path.into_inner();

  let variant: Option<ProductVariant> = sqlx::query_as(
    "SELECT id, sku, price_cents, stock, is_active, created_at, updated_at \
     FROM product_variants WHERE id = $1",
  )
  .bind(variant_id)
  .fetch_optional(&app_state.db_pool)
  .await?;

  match variant {
    Some(variant) => Ok(HttpResponse::Ok().json(variant)),
    None => {
      warn!("Product variant {} not found", variant_id);
      Err(AppError::NotFound(format!("Product variant {} not found", variant_id)))
    }
  }
}
