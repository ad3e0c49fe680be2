use chrono::{DateTime, Utc};
use sqlx::{Postgres, Transaction};

use crate::errors::{AppError, Result};
use crate::models::promo::PromoCode;

/// Priced cart: subtotal from current variant prices, discount from at most
/// one promo code, total clamped at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
  pub subtotal_cents: i64,
  pub discount_cents: i64,
  pub total_cents: i64,
}

/// Look up a promo code inside the checkout transaction. Unknown codes are a
/// NotFound-class failure; validity is checked separately in `quote` so the
/// computation stays pure.
pub async fn load_promo(tx: &mut Transaction<'_, Postgres>, code: &str) -> Result<PromoCode> {
  let promo: Option<PromoCode> = sqlx::query_as(
    "SELECT id, code, discount_percent, discount_amount_cents, is_active, valid_from, valid_to, \
            created_at, updated_at \
     FROM promo_codes WHERE code = $1",
  )
  .bind(code)
  .fetch_optional(&mut **tx)
  .await?;

  promo.ok_or_else(|| AppError::PromoNotFound(code.to_string()))
}

/// Compute the discounted total. Percent discount wins over the fixed amount
/// when both are set; no stacking; the result never goes below zero.
pub fn quote(subtotal_cents: i64, promo: Option<&PromoCode>, now: DateTime<Utc>) -> Result<Quote> {
  let discount_cents = match promo {
    None => 0,
    Some(promo) => {
      validate_promo(promo, now)?;
      if promo.discount_percent > 0 {
        subtotal_cents * promo.discount_percent as i64 / 100
      } else {
        promo.discount_amount_cents.unwrap_or(0)
      }
    }
  };

  Ok(Quote {
    subtotal_cents,
    discount_cents,
    total_cents: (subtotal_cents - discount_cents).max(0),
  })
}

fn validate_promo(promo: &PromoCode, now: DateTime<Utc>) -> Result<()> {
  if !promo.is_active {
    return Err(AppError::PromoInvalid(format!("Promo code '{}' is not active", promo.code)));
  }
  if let Some(valid_from) = promo.valid_from {
    if now < valid_from {
      return Err(AppError::PromoInvalid(format!(
        "Promo code '{}' is not valid before {}",
        promo.code, valid_from
      )));
    }
  }
  if let Some(valid_to) = promo.valid_to {
    if now > valid_to {
      return Err(AppError::PromoInvalid(format!("Promo code '{}' has expired", promo.code)));
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Duration;

  fn promo(percent: i32, amount: Option<i64>) -> PromoCode {
    let now = Utc::now();
    PromoCode {
      id: 1,
      code: "SAVE".to_string(),
      discount_percent: percent,
      discount_amount_cents: amount,
      is_active: true,
      valid_from: None,
      valid_to: None,
      created_at: now,
      updated_at: now,
    }
  }

  #[test]
  fn no_promo_means_no_discount() {
    let q = quote(3000, None, Utc::now()).unwrap();
    assert_eq!(q, Quote { subtotal_cents: 3000, discount_cents: 0, total_cents: 3000 });
  }

  #[test]
  fn ten_percent_off_thirty() {
    // 30.00 with a 10% promo comes out at 27.00
    let q = quote(3000, Some(&promo(10, None)), Utc::now()).unwrap();
    assert_eq!(q.discount_cents, 300);
    assert_eq!(q.total_cents, 2700);
  }

  #[test]
  fn fixed_amount_discount() {
    let q = quote(3000, Some(&promo(0, Some(500))), Utc::now()).unwrap();
    assert_eq!(q.discount_cents, 500);
    assert_eq!(q.total_cents, 2500);
  }

  #[test]
  fn percent_takes_precedence_over_amount() {
    let q = quote(3000, Some(&promo(10, Some(500))), Utc::now()).unwrap();
    assert_eq!(q.discount_cents, 300);
  }

  #[test]
  fn total_is_clamped_at_zero() {
    let q = quote(300, Some(&promo(0, Some(1000))), Utc::now()).unwrap();
    assert_eq!(q.total_cents, 0);
  }

  #[test]
  fn percent_discount_rounds_down_to_the_cent() {
    let q = quote(3333, Some(&promo(10, None)), Utc::now()).unwrap();
    assert_eq!(q.discount_cents, 333);
    assert_eq!(q.total_cents, 3000);
  }

  #[test]
  fn inactive_promo_rejected() {
    let mut p = promo(10, None);
    p.is_active = false;
    assert!(matches!(quote(3000, Some(&p), Utc::now()), Err(AppError::PromoInvalid(_))));
  }

  #[test]
  fn promo_outside_validity_window_rejected() {
    let now = Utc::now();

    let mut not_yet = promo(10, None);
    not_yet.valid_from = Some(now + Duration::hours(1));
    assert!(matches!(quote(3000, Some(&not_yet), now), Err(AppError::PromoInvalid(_))));

    let mut expired = promo(10, None);
    expired.valid_to = Some(now - Duration::hours(1));
    assert!(matches!(quote(3000, Some(&expired), now), Err(AppError::PromoInvalid(_))));
  }

  #[test]
  fn promo_inside_validity_window_accepted() {
    let now = Utc::now();
    let mut p = promo(10, None);
    p.valid_from = Some(now - Duration::hours(1));
    p.valid_to = Some(now + Duration::hours(1));
    assert_eq!(quote(3000, Some(&p), now).unwrap().total_cents, 2700);
  }
}
