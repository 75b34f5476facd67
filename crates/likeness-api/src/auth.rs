//! Bearer-token extractor.
//!
//! Pulls the raw token out of the `Authorization` header; the actual
//! verification happens in the engine's [`likeness_engine::Authorizer`],
//! because it needs the claimed subject id from the request body.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, request::Parts},
};

use crate::error::ApiError;

/// The raw bearer token presented with a request.
pub struct Bearer(pub String);

/// Read `Authorization: Bearer <token>` — absence or any other scheme is
/// an authentication failure.
pub fn bearer_token(headers: &HeaderMap) -> Result<String, ApiError> {
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or_else(|| {
      ApiError::Unauthenticated("missing Authorization header".into())
    })?;

  let token = header_val.strip_prefix("Bearer ").ok_or_else(|| {
    ApiError::Unauthenticated("expected a Bearer token".into())
  })?;

  Ok(token.to_string())
}

impl<S: Send + Sync> FromRequestParts<S> for Bearer {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    Ok(Bearer(bearer_token(&parts.headers)?))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use axum::http::header;

  #[test]
  fn extracts_the_token() {
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, "Bearer abc.def.ghi".parse().unwrap());
    assert_eq!(bearer_token(&headers).unwrap(), "abc.def.ghi");
  }

  #[test]
  fn missing_header_is_unauthenticated() {
    let headers = HeaderMap::new();
    assert!(matches!(
      bearer_token(&headers),
      Err(ApiError::Unauthenticated(_))
    ));
  }

  #[test]
  fn non_bearer_scheme_is_unauthenticated() {
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, "Basic dXNlcjpwdw==".parse().unwrap());
    assert!(matches!(
      bearer_token(&headers),
      Err(ApiError::Unauthenticated(_))
    ));
  }
}
