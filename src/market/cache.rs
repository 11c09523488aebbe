//! Caching implementations for marketplace types.

use futures::future::BoxFuture;
use std::fmt;

use crate::cache::{CacheError, CachedEntity, EntityCache, EntityState, FetchPolicy};

use super::gateway::{GatewayError, RemoteGateway};
use super::types::{ProductCollection, ProductSummary, SessionUser, StoreProfile};

// ============================================================================
// Entity kinds
// ============================================================================

/// Category of cached server-derived data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
  SessionUser,
  StoreProfile,
  ProductCollection,
}

impl EntityKind {
  /// Prefix shared by every cache key of this kind.
  pub fn key_prefix(self) -> &'static str {
    match self {
      EntityKind::SessionUser => "session_user",
      EntityKind::StoreProfile => "store_data",
      EntityKind::ProductCollection => "products_data",
    }
  }

  /// Cache key for the entity identified by `key` (user id, owner id or store id).
  pub fn cache_key(self, key: &str) -> String {
    format!("{}:{}", self.key_prefix(), key)
  }
}

impl fmt::Display for EntityKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      EntityKind::SessionUser => "session user",
      EntityKind::StoreProfile => "store profile",
      EntityKind::ProductCollection => "product collection",
    };
    f.write_str(name)
  }
}

/// Names one cached entity: its kind plus the id it is looked up by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityRef {
  pub kind: EntityKind,
  pub key: String,
}

impl EntityRef {
  pub fn new(kind: EntityKind, key: impl Into<String>) -> Self {
    Self {
      kind,
      key: key.into(),
    }
  }

  pub fn session_user(user_id: impl Into<String>) -> Self {
    Self::new(EntityKind::SessionUser, user_id)
  }

  pub fn store(owner_id: impl Into<String>) -> Self {
    Self::new(EntityKind::StoreProfile, owner_id)
  }

  pub fn products(store_id: impl Into<String>) -> Self {
    Self::new(EntityKind::ProductCollection, store_id)
  }
}

/// A cached value of any kind, as returned by [`EntityCache::get_kind`].
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
  SessionUser(EntityState<SessionUser>),
  StoreProfile(EntityState<StoreProfile>),
  ProductCollection(EntityState<ProductCollection>),
}

impl Entity {
  /// Product list carried by this entity, if it is a found product collection.
  pub fn products(&self) -> Option<&[ProductSummary]> {
    match self {
      Entity::ProductCollection(EntityState::Found(collection)) => Some(&collection.products),
      _ => None,
    }
  }
}

/// The product list found among `entities`, or an empty list if none of
/// them is a found product collection.
pub fn listed_products(entities: &[Entity]) -> Vec<ProductSummary> {
  entities
    .iter()
    .find_map(Entity::products)
    .map(<[ProductSummary]>::to_vec)
    .unwrap_or_default()
}

impl EntityCache {
  /// Kind-dispatched form of [`EntityCache::get`], used where the set of
  /// entities to load is only known at runtime.
  pub async fn get_kind(
    &self,
    kind: EntityKind,
    key: &str,
    force_refetch: bool,
  ) -> Result<Entity, CacheError> {
    let policy = FetchPolicy::from_force(force_refetch);
    let entity = match kind {
      EntityKind::SessionUser => Entity::SessionUser(self.get(key, policy).await?.data),
      EntityKind::StoreProfile => Entity::StoreProfile(self.get(key, policy).await?.data),
      EntityKind::ProductCollection => {
        Entity::ProductCollection(self.get(key, policy).await?.data)
      }
    };
    Ok(entity)
  }
}

// ============================================================================
// Cacheable implementations
// ============================================================================

impl CachedEntity for SessionUser {
  fn kind() -> EntityKind {
    EntityKind::SessionUser
  }

  fn is_complete(&self) -> bool {
    !self.id.is_empty() && !self.name.is_empty() && !self.email.is_empty()
  }

  fn fetch<'a>(
    gateway: &'a dyn RemoteGateway,
    key: &'a str,
  ) -> BoxFuture<'a, Result<Self, GatewayError>> {
    Box::pin(async move { gateway.fetch_session_user(key).await })
  }
}

impl CachedEntity for StoreProfile {
  fn kind() -> EntityKind {
    EntityKind::StoreProfile
  }

  fn is_complete(&self) -> bool {
    !self.id.is_empty() && !self.owner_id.is_empty() && !self.name.is_empty()
  }

  fn fetch<'a>(
    gateway: &'a dyn RemoteGateway,
    key: &'a str,
  ) -> BoxFuture<'a, Result<Self, GatewayError>> {
    Box::pin(async move { gateway.fetch_store_by_owner(key).await })
  }
}

impl CachedEntity for ProductCollection {
  fn kind() -> EntityKind {
    EntityKind::ProductCollection
  }

  fn is_complete(&self) -> bool {
    !self.store_id.is_empty()
      && self
        .products
        .iter()
        .all(|p| !p.id.is_empty() && !p.name.is_empty())
  }

  fn fetch<'a>(
    gateway: &'a dyn RemoteGateway,
    key: &'a str,
  ) -> BoxFuture<'a, Result<Self, GatewayError>> {
    Box::pin(async move { gateway.fetch_products_by_store(key).await })
  }
}
