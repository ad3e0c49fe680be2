use sqlx::{Postgres, Transaction};
use tracing::info;

use crate::errors::{AppError, Result};
use crate::models::variant::ProductVariant;

/// Reserve stock for a single line. The decrement is a conditional UPDATE so
/// that concurrent checkouts against the same variant serialize on the row
/// and can never drive stock negative; zero affected rows means either an
/// unknown variant or insufficient stock, distinguished afterwards.
///
/// Must run inside the transaction that creates the order: a reservation
/// without a committed order must not persist.
pub async fn reserve(
  tx: &mut Transaction<'_, Postgres>,
  variant_id: i64,
  quantity: i32,
) -> Result<ProductVariant> {
  let reserved: Option<ProductVariant> = sqlx::query_as(
    "UPDATE product_variants \
     SET stock = stock - $2, updated_at = NOW() \
     WHERE id = $1 AND is_active AND stock >= $2 \
     RETURNING id, sku, price_cents, stock, is_active, created_at, updated_at",
  )
  .bind(variant_id)
  .bind(quantity)
  .fetch_optional(&mut **tx)
  .await?;

  if let Some(variant) = reserved {
    info!(variant_id, quantity, stock_left = variant.stock, "Reserved stock");
    return Ok(variant);
  }

  let existing: Option<ProductVariant> = sqlx::query_as(
    "SELECT id, sku, price_cents, stock, is_active, created_at, updated_at \
     FROM product_variants WHERE id = $1",
  )
  .bind(variant_id)
  .fetch_optional(&mut **tx)
  .await?;

  match existing {
    None => Err(AppError::NotFound(format!("Product variant {} not found", variant_id))),
    Some(variant) if !variant.is_active => Err(AppError::Validation(format!(
      "Product variant {} is not available for purchase",
      variant.sku
    ))),
    Some(variant) => Err(AppError::InsufficientStock { sku: variant.sku }),
  }
}

/// Return previously reserved stock. Unconditional: cancellation restores the
/// exact quantities captured on the order lines, regardless of what happened
/// to the variant since.
pub async fn release(
  tx: &mut Transaction<'_, Postgres>,
  variant_id: i64,
  quantity: i32,
) -> Result<ProductVariant> {
  let variant: Option<ProductVariant> = sqlx::query_as(
    "UPDATE product_variants \
     SET stock = stock + $2, updated_at = NOW() \
     WHERE id = $1 \
     RETURNING id, sku, price_cents, stock, is_active, created_at, updated_at",
  )
  .bind(variant_id)
  .bind(quantity)
  .fetch_optional(&mut **tx)
  .await?;

  let variant = variant
    .ok_or_else(|| AppError::NotFound(format!("Product variant {} not found", variant_id)))?;
  info!(variant_id, quantity, stock = variant.stock, "Released stock");
  Ok(variant)
}
