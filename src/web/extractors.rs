use actix_web::{dev::Payload, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use tracing::warn;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserRole {
  Customer,
  Courier,
  Admin,
}

impl UserRole {
  fn parse(value: &str) -> Option<Self> {
    match value {
      "customer" => Some(UserRole::Customer),
      "courier" => Some(UserRole::Courier),
      "admin" => Some(UserRole::Admin),
      _ => None,
    }
  }
}

/// Authenticated principal. Authentication itself happens upstream; the
/// gateway forwards the verified identity in the X-User-Id / X-User-Role
/// headers, which is the only identity interface this service consumes.
#[derive(Debug)]
pub struct AuthenticatedUser {
  pub user_id: i64,
  pub role: UserRole,
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let user_id = req
      .headers()
      .get("X-User-Id")
      .and_then(|h| h.to_str().ok())
      .and_then(|s| s.parse::<i64>().ok());

    match user_id {
      Some(user_id) => {
        let role = req
          .headers()
          .get("X-User-Role")
          .and_then(|h| h.to_str().ok())
          .and_then(|s| UserRole::parse(&s.to_ascii_lowercase()))
          .unwrap_or(UserRole::Customer);
        ready(Ok(AuthenticatedUser { user_id, role }))
      }
      None => {
        warn!("AuthenticatedUser extractor: missing or invalid X-User-Id header");
        ready(Err(AppError::Auth("Missing or invalid X-User-Id header".to_string())))
      }
    }
  }
}

/// Admin-only guard for dispatch control endpoints.
#[derive(Debug)]
pub struct AdminUser(pub AuthenticatedUser);

impl FromRequest for AdminUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
    let result = AuthenticatedUser::from_request(req, payload)
      .into_inner()
      .and_then(|user| {
        if user.role == UserRole::Admin {
          Ok(AdminUser(user))
        } else {
          Err(AppError::Forbidden("Admin role required".to_string()))
        }
      });
    ready(result)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn role_parsing() {
    assert_eq!(UserRole::parse("admin"), Some(UserRole::Admin));
    assert_eq!(UserRole::parse("courier"), Some(UserRole::Courier));
    assert_eq!(UserRole::parse("customer"), Some(UserRole::Customer));
    assert_eq!(UserRole::parse("superuser"), None);
  }
}
