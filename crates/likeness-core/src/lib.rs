//! Core types and trait definitions for the Likeness face store.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod face;
pub mod permission;
pub mod store;
pub mod user;

pub use permission::{Capability, PermissionError, PermissionSet};
