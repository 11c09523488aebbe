//! Core traits and types for the caching system.

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::market::{EntityKind, GatewayError, RemoteGateway};

/// Trait for entities that the entity cache can store.
///
/// Implementors name their kind (which selects the cache key prefix), say
/// whether a value has every field screens rely on, and know which gateway
/// call produces them.
pub trait CachedEntity: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
  /// Entity kind, used for key derivation and error reporting.
  fn kind() -> EntityKind;

  /// Whether all required fields are present and non-empty.
  ///
  /// A cached record failing this check is treated as absent even when its
  /// owner matches; it guards against half-written records.
  fn is_complete(&self) -> bool;

  /// Fetch the entity identified by `key` from the remote API.
  fn fetch<'a>(
    gateway: &'a dyn RemoteGateway,
    key: &'a str,
  ) -> BoxFuture<'a, Result<Self, GatewayError>>;
}

/// A server-derived value, or the server's confirmation that it does not exist.
///
/// `Absent` is cached like any other value so that "no store yet" does not
/// trigger a refetch on every screen visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum EntityState<T> {
  Found(T),
  Absent,
}

impl<T> EntityState<T> {
  pub fn found(&self) -> Option<&T> {
    match self {
      EntityState::Found(value) => Some(value),
      EntityState::Absent => None,
    }
  }

  pub fn into_found(self) -> Option<T> {
    match self {
      EntityState::Found(value) => Some(value),
      EntityState::Absent => None,
    }
  }

  pub fn is_absent(&self) -> bool {
    matches!(self, EntityState::Absent)
  }
}

impl<T: CachedEntity> EntityState<T> {
  /// The absent marker is always complete.
  pub fn is_complete(&self) -> bool {
    self.found().map_or(true, CachedEntity::is_complete)
  }
}

/// Result from a cache operation, including data and metadata about the source.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
  /// When the record was written (if served from cache)
  pub cached_at: Option<DateTime<Utc>>,
}

impl<T> CacheResult<T> {
  /// Create a new cache result from fresh network data.
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
      cached_at: None,
    }
  }

  /// Create a new cache result from a validated cache record.
  pub fn from_cache(data: T, cached_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: CacheSource::Cache,
      cached_at: Some(cached_at),
    }
  }
}

/// Indicates where returned data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fetched from the network during this call
  Network,
  /// Served from a record that passed owner and completeness checks
  Cache,
}

/// How `EntityCache::get` treats an existing record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FetchPolicy {
  /// Serve a valid cached record, otherwise fetch
  #[default]
  CacheFirst,
  /// Skip the cache and always consult the network
  ForceRefetch,
}

impl FetchPolicy {
  pub fn from_force(force_refetch: bool) -> Self {
    if force_refetch {
      FetchPolicy::ForceRefetch
    } else {
      FetchPolicy::CacheFirst
    }
  }
}
