//! Persisted record format and owner fingerprinting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::traits::{CachedEntity, EntityState};

/// Identifies which signed-in user a cache record belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
  /// Fingerprint for a user id.
  pub fn of(user_id: &str) -> Self {
    // SHA256 hash so raw user ids never sit in the cache file
    let mut hasher = Sha256::new();
    hasher.update(user_id.as_bytes());
    Self(hex::encode(hasher.finalize()))
  }
}

/// What gets written under a cache key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheRecord<T> {
  pub value: EntityState<T>,
  pub owner_fingerprint: Fingerprint,
  pub cached_at: DateTime<Utc>,
}

/// Why a stored record was not served.
#[derive(Debug, Error)]
pub enum Rejection {
  #[error("record could not be decoded: {0}")]
  Corrupt(#[from] serde_json::Error),
  #[error("record belongs to a different owner")]
  OwnerMismatch,
  #[error("record is missing required fields")]
  Incomplete,
}

impl<T: CachedEntity> CacheRecord<T> {
  pub fn new(value: EntityState<T>, owner: Fingerprint) -> Self {
    Self {
      value,
      owner_fingerprint: owner,
      cached_at: Utc::now(),
    }
  }

  pub fn encode(&self) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(self)
  }

  /// Decode stored bytes and accept the record only if it belongs to `owner`
  /// and passes the kind's completeness check.
  pub fn decode_valid(bytes: &[u8], owner: &Fingerprint) -> Result<Self, Rejection> {
    let record: Self = serde_json::from_slice(bytes)?;

    if &record.owner_fingerprint != owner {
      return Err(Rejection::OwnerMismatch);
    }
    if !record.value.is_complete() {
      return Err(Rejection::Incomplete);
    }

    Ok(record)
  }
}
