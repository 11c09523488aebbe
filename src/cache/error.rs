//! Error types for the cache layer.

use std::sync::Arc;
use thiserror::Error;

use crate::market::{EntityKind, GatewayError};

/// Failure inside a persistent store backend.
///
/// The entity cache logs these and carries on as if the record were missing;
/// they never reach a screen.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),
  #[error("store lock poisoned")]
  LockPoisoned,
}

/// Errors a caller of the entity cache has to handle.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
  /// No user is signed in; the caller should send the user to login.
  #[error("not signed in")]
  NotAuthenticated,
  /// The network fetch for a required entity failed. Retryable.
  #[error("failed to fetch {kind} '{key}': {source}")]
  FetchFailed {
    kind: EntityKind,
    key: String,
    source: Arc<GatewayError>,
  },
}

impl CacheError {
  pub(crate) fn fetch_failed(kind: EntityKind, key: &str, source: GatewayError) -> Self {
    CacheError::FetchFailed {
      kind,
      key: key.to_string(),
      source: Arc::new(source),
    }
  }
}
