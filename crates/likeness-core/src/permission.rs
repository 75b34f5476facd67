//! Bitwise permission model.
//!
//! Each user carries an 8-bit permission set. Every bit position is a named
//! [`Capability`]; raw integers only appear at the API boundary, where they
//! are validated through [`Capability::from_bits`] or [`PermissionSet::check`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PermissionError {
  /// The operand does not fit in the 8-bit permission space.
  #[error("invalid capability {0}: must be between 0 and 255")]
  InvalidCapability(u16),

  /// Grant and revoke take exactly one capability per call.
  #[error("capability {0:#010b} names more than one permission bit")]
  MultipleCapabilities(u8),
}

// ─── Capability ──────────────────────────────────────────────────────────────

/// A single named permission bit.
///
/// Bits 4 and 5 are reserved but remain grantable, matching the stored
/// 8-bit layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
  Read,
  Write,
  Delete,
  Update,
  Reserved1,
  Reserved2,
  DeleteUsers,
  GrantPermission,
}

impl Capability {
  /// The single-bit mask for this capability.
  pub fn bit(self) -> u8 {
    match self {
      Self::Read => 1 << 0,
      Self::Write => 1 << 1,
      Self::Delete => 1 << 2,
      Self::Update => 1 << 3,
      Self::Reserved1 => 1 << 4,
      Self::Reserved2 => 1 << 5,
      Self::DeleteUsers => 1 << 6,
      Self::GrantPermission => 1 << 7,
    }
  }

  /// Validate a raw operand as exactly one capability.
  ///
  /// Rejects values outside `[0, 255]` and values that are not a power of
  /// two (zero included — "no capability" is not a grantable thing).
  pub fn from_bits(raw: u16) -> Result<Self, PermissionError> {
    if raw > u8::MAX as u16 {
      return Err(PermissionError::InvalidCapability(raw));
    }
    let raw = raw as u8;
    if raw == 0 || raw & (raw - 1) != 0 {
      return Err(PermissionError::MultipleCapabilities(raw));
    }
    Ok(match raw.trailing_zeros() {
      0 => Self::Read,
      1 => Self::Write,
      2 => Self::Delete,
      3 => Self::Update,
      4 => Self::Reserved1,
      5 => Self::Reserved2,
      6 => Self::DeleteUsers,
      _ => Self::GrantPermission,
    })
  }
}

// ─── PermissionSet ───────────────────────────────────────────────────────────

/// The 8-bit permission set stored on a user record.
///
/// Pure value type: [`grant`](Self::grant) and [`revoke`](Self::revoke)
/// return the new set; persisting it is the caller's job.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PermissionSet(u8);

impl Default for PermissionSet {
  /// Default for newly registered users: read, write, delete, update.
  fn default() -> Self {
    Self(
      Capability::Read.bit()
        | Capability::Write.bit()
        | Capability::Delete.bit()
        | Capability::Update.bit(),
    )
  }
}

impl PermissionSet {
  pub const fn empty() -> Self { Self(0) }

  pub const fn from_bits(bits: u8) -> Self { Self(bits) }

  pub const fn bits(self) -> u8 { self.0 }

  /// Typed membership test. A [`Capability`] is always a valid mask, so
  /// this is the infallible face of [`check`](Self::check).
  pub fn contains(self, capability: Capability) -> bool {
    matches!(self.check(capability.bit() as u16), Ok(true))
  }

  /// Raw membership test against an arbitrary mask.
  ///
  /// Multi-bit masks are allowed here (the test is "any of these bits"),
  /// but the operand must fit the 8-bit space.
  pub fn check(self, raw: u16) -> Result<bool, PermissionError> {
    if raw > u8::MAX as u16 {
      return Err(PermissionError::InvalidCapability(raw));
    }
    Ok(self.0 & raw as u8 != 0)
  }

  /// Return a set with one capability added. One capability per call.
  pub fn grant(self, raw: u16) -> Result<Self, PermissionError> {
    let capability = Capability::from_bits(raw)?;
    Ok(Self(self.0 | capability.bit()))
  }

  /// Return a set with one capability removed. One capability per call.
  pub fn revoke(self, raw: u16) -> Result<Self, PermissionError> {
    let capability = Capability::from_bits(raw)?;
    Ok(Self(self.0 & !capability.bit()))
  }

  pub fn with(self, capability: Capability) -> Self {
    Self(self.0 | capability.bit())
  }

  pub fn without(self, capability: Capability) -> Self {
    Self(self.0 & !capability.bit())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_set_is_read_write_delete_update() {
    let set = PermissionSet::default();
    assert!(set.contains(Capability::Read));
    assert!(set.contains(Capability::Write));
    assert!(set.contains(Capability::Delete));
    assert!(set.contains(Capability::Update));
    assert!(!set.contains(Capability::DeleteUsers));
    assert!(!set.contains(Capability::GrantPermission));
  }

  #[test]
  fn check_rejects_out_of_range() {
    let set = PermissionSet::default();
    assert_eq!(
      set.check(256).unwrap_err(),
      PermissionError::InvalidCapability(256)
    );
    assert_eq!(
      set.check(1024).unwrap_err(),
      PermissionError::InvalidCapability(1024)
    );
  }

  #[test]
  fn check_allows_multi_bit_masks() {
    let set = PermissionSet::from_bits(0b0000_0010);
    // "any of read|write" — write is present.
    assert!(set.check(0b11).unwrap());
    assert!(!set.check(0b1000_0000).unwrap());
  }

  #[test]
  fn grant_rejects_out_of_range_and_multi_bit() {
    let set = PermissionSet::empty();
    assert_eq!(
      set.grant(300).unwrap_err(),
      PermissionError::InvalidCapability(300)
    );
    assert_eq!(
      set.grant(0b11).unwrap_err(),
      PermissionError::MultipleCapabilities(0b11)
    );
    assert_eq!(
      set.grant(0).unwrap_err(),
      PermissionError::MultipleCapabilities(0)
    );
  }

  #[test]
  fn revoke_rejects_out_of_range_and_multi_bit() {
    let set = PermissionSet::default();
    assert!(matches!(
      set.revoke(999),
      Err(PermissionError::InvalidCapability(999))
    ));
    assert!(matches!(
      set.revoke(0b110),
      Err(PermissionError::MultipleCapabilities(0b110))
    ));
  }

  #[test]
  fn grant_then_revoke_round_trips() {
    let original = PermissionSet::default();
    for bit in [1u16, 2, 4, 8, 16, 32, 64, 128] {
      let roundtrip = original.grant(bit).unwrap().revoke(bit).unwrap();
      // Revoking what we granted restores the original, minus that bit.
      assert_eq!(roundtrip.bits(), original.bits() & !(bit as u8));
    }
    // A bit the original did not hold: grant/revoke is a clean round trip.
    let roundtrip = original.grant(128).unwrap().revoke(128).unwrap();
    assert_eq!(roundtrip, original);
  }

  #[test]
  fn every_single_bit_maps_to_a_capability() {
    for shift in 0..8u16 {
      let cap = Capability::from_bits(1 << shift).unwrap();
      assert_eq!(cap.bit(), 1u8 << shift);
    }
  }

  #[test]
  fn contains_and_check_agree_on_every_bit() {
    let set = PermissionSet::from_bits(0b0101_0011);
    for shift in 0..8u16 {
      let cap = Capability::from_bits(1 << shift).unwrap();
      assert_eq!(set.contains(cap), set.check(1 << shift).unwrap());
    }
  }
}
