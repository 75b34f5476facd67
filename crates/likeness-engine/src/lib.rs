//! The Likeness identity engine.
//!
//! Token issuance and verification, the authorization guard that fronts
//! every sensitive operation, the time-bounded embedding cache, and the
//! nearest-neighbour match scoring. Backed by any
//! [`likeness_core::store::FaceStore`]; HTTP and persistence concerns are
//! the caller's responsibility.

pub mod cache;
pub mod error;
pub mod extract;
pub mod guard;
pub mod matcher;
pub mod token;

pub use cache::{CachedEntry, EmbeddingCache, Snapshot};
pub use error::Error;
pub use extract::{EmbeddingExtractor, ExtractError};
pub use guard::Authorizer;
pub use matcher::{FaceMatch, rank};
pub use token::TokenService;
