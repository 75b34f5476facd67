//! Stateless identity tokens (JWT, HS256).
//!
//! A token binds one subject id to an expiry instant and nothing else.
//! There is no revocation list; expiry is the only lifetime bound.

use chrono::{Duration, Utc};
use jsonwebtoken::{
  Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Default token lifetime.
pub const TOKEN_TTL_DAYS: i64 = 30;

/// Claims embedded in every issued token.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
  /// Standard JWT subject — the user id the token authenticates.
  sub: Uuid,
  /// Expiry (Unix timestamp, seconds).
  exp: i64,
  /// Issued-at (Unix timestamp, seconds).
  iat: i64,
}

/// Issues and verifies signed, time-limited identity tokens.
pub struct TokenService {
  encoding:   EncodingKey,
  decoding:   DecodingKey,
  validation: Validation,
  ttl:        Duration,
}

impl TokenService {
  /// Build a service around the process-wide secret.
  ///
  /// An empty secret is a fatal configuration error: callers must refuse
  /// to start rather than issue forgeable tokens.
  pub fn new(secret: &str) -> Result<Self> {
    Self::with_ttl(secret, Duration::days(TOKEN_TTL_DAYS))
  }

  /// As [`TokenService::new`] with an explicit lifetime; tests use short
  /// (or negative) lifetimes to exercise expiry.
  pub fn with_ttl(secret: &str, ttl: Duration) -> Result<Self> {
    if secret.is_empty() {
      return Err(Error::EmptySecret);
    }
    let mut validation = Validation::new(Algorithm::HS256);
    // No grace window. The exact-expiry boundary is handled in `verify`,
    // since zero leeway alone still admits `exp == now`.
    validation.leeway = 0;
    Ok(Self {
      encoding: EncodingKey::from_secret(secret.as_bytes()),
      decoding: DecodingKey::from_secret(secret.as_bytes()),
      validation,
      ttl,
    })
  }

  /// Issue a token for `subject`, expiring `ttl` from now.
  pub fn issue(&self, subject: Uuid) -> Result<String> {
    let now = Utc::now();
    let claims = Claims {
      sub: subject,
      exp: (now + self.ttl).timestamp(),
      iat: now.timestamp(),
    };
    Ok(encode(&Header::default(), &claims, &self.encoding)?)
  }

  /// Decode and check signature and expiry.
  ///
  /// Any failure (malformed input, bad signature, expired) is a normal
  /// negative result, never an error.
  pub fn verify(&self, token: &str) -> Option<Uuid> {
    let claims = decode::<Claims>(token, &self.decoding, &self.validation)
      .ok()?
      .claims;
    // The library only rejects `exp < now`; a token at exactly its
    // expiry instant must also count as expired.
    if claims.exp <= Utc::now().timestamp() {
      return None;
    }
    Some(claims.sub)
  }

  /// Check that `token` verifies *and* authenticates `claimed`.
  ///
  /// A token that does not verify at all is [`Error::Unauthenticated`];
  /// a token that verifies for a different subject is [`Error::Forbidden`].
  /// The distinction maps to 401 vs 403 at the API layer.
  pub fn authenticate(&self, claimed: Uuid, token: &str) -> Result<()> {
    let subject = self.verify(token).ok_or(Error::Unauthenticated)?;
    if subject != claimed {
      return Err(Error::Forbidden(format!(
        "token does not belong to user {claimed}"
      )));
    }
    Ok(())
  }
}
