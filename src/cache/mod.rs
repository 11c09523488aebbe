//! Owner-aware caching of server-derived entities.
//!
//! This module provides the persisted half of the sync layer:
//! - Records are stored as JSON blobs under `{kind prefix}:{id}` keys
//! - Each record carries a fingerprint of the user who was signed in when it
//!   was written, and is only served back to that same user
//! - Records missing required fields are treated as absent
//! - Server-confirmed "does not exist" answers are cached as explicit markers

mod error;
mod layer;
mod record;
mod storage;
mod traits;

pub use error::CacheError;
pub use layer::EntityCache;
pub use storage::{MemoryStore, NoopStore, PersistentStore, SqliteStore};
pub use traits::{CacheSource, CachedEntity, EntityState, FetchPolicy};
