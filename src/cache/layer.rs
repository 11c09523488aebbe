//! Entity cache that orchestrates owner-checked caching with network fetching.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::error::CacheError;
use super::record::{CacheRecord, Fingerprint};
use super::storage::PersistentStore;
use super::traits::{CacheResult, CachedEntity, EntityState, FetchPolicy};
use crate::market::{EntityKind, RemoteGateway};
use crate::session::SessionProvider;

/// Cache of server-derived entities, scoped to the signed-in user.
///
/// Every record is stamped with the fingerprint of the user who was signed in
/// when it was written. A record is only served back while that same user is
/// signed in and the value passes its kind's completeness check; anything
/// else is a miss and goes to the network.
pub struct EntityCache {
  store: Arc<dyn PersistentStore>,
  gateway: Arc<dyn RemoteGateway>,
  session: Arc<dyn SessionProvider>,
}

impl EntityCache {
  pub fn new(
    store: Arc<dyn PersistentStore>,
    gateway: Arc<dyn RemoteGateway>,
    session: Arc<dyn SessionProvider>,
  ) -> Self {
    Self {
      store,
      gateway,
      session,
    }
  }

  /// Fingerprint of whoever is signed in right now.
  fn current_owner(&self) -> Result<Fingerprint, CacheError> {
    self
      .session
      .current_user_id()
      .map(|id| Fingerprint::of(&id))
      .ok_or(CacheError::NotAuthenticated)
  }

  /// Get an entity, serving a valid cached record or fetching it.
  ///
  /// 1. No session - fail with `NotAuthenticated` before touching anything
  /// 2. Cache-first and the record decodes, belongs to the current owner and
  ///    is complete - return it, no network call
  /// 3. Otherwise fetch; a 404 becomes a cached `Absent` marker
  /// 4. Write the fresh record and return it
  ///
  /// A failed fetch writes nothing and never falls back to a rejected record.
  pub async fn get<T: CachedEntity>(
    &self,
    key: &str,
    policy: FetchPolicy,
  ) -> Result<CacheResult<EntityState<T>>, CacheError> {
    let owner = self.current_owner()?;
    let cache_key = T::kind().cache_key(key);

    if policy == FetchPolicy::CacheFirst {
      if let Some(record) = self.read_valid::<T>(&cache_key, &owner).await {
        debug!(key = %cache_key, "cache hit");
        return Ok(CacheResult::from_cache(record.value, record.cached_at));
      }
    }

    info!(kind = %T::kind(), key, ?policy, "fetching from network");
    let value = match T::fetch(self.gateway.as_ref(), key).await {
      Ok(entity) => EntityState::Found(entity),
      Err(e) if e.is_not_found() => {
        debug!(key = %cache_key, "entity does not exist, caching absent marker");
        EntityState::Absent
      }
      Err(e) => {
        warn!(kind = %T::kind(), key, error = %e, "fetch failed");
        return Err(CacheError::fetch_failed(T::kind(), key, e));
      }
    };

    self
      .write_record(&cache_key, &CacheRecord::new(value.clone(), owner))
      .await;

    Ok(CacheResult::from_network(value))
  }

  /// Read and validate a record. Storage errors and rejections are misses.
  async fn read_valid<T: CachedEntity>(
    &self,
    cache_key: &str,
    owner: &Fingerprint,
  ) -> Option<CacheRecord<T>> {
    let bytes = match self.store.read(cache_key).await {
      Ok(Some(bytes)) => bytes,
      Ok(None) => return None,
      Err(e) => {
        warn!(key = cache_key, error = %e, "cache read failed, treating as miss");
        return None;
      }
    };

    match CacheRecord::decode_valid(&bytes, owner) {
      Ok(record) => Some(record),
      Err(rejection) => {
        debug!(key = cache_key, %rejection, "cached record rejected");
        None
      }
    }
  }

  async fn write_record<T: CachedEntity>(&self, cache_key: &str, record: &CacheRecord<T>) {
    let bytes = match record.encode() {
      Ok(bytes) => bytes,
      Err(e) => {
        warn!(key = cache_key, error = %e, "failed to encode cache record");
        return;
      }
    };

    if let Err(e) = self.store.write(cache_key, &bytes).await {
      warn!(key = cache_key, error = %e, "cache write failed");
    }
  }

  /// Drop the record for `key` so the next `get` goes to the network.
  pub async fn invalidate(&self, kind: EntityKind, key: &str) {
    let cache_key = kind.cache_key(key);
    debug!(key = %cache_key, "invalidating");
    if let Err(e) = self.store.remove(&cache_key).await {
      warn!(key = %cache_key, error = %e, "cache remove failed");
    }
  }

  /// Drop several records at once.
  pub async fn invalidate_all(&self, entries: &[(EntityKind, &str)]) {
    let keys: Vec<String> = entries
      .iter()
      .map(|(kind, key)| kind.cache_key(key))
      .collect();
    debug!(count = keys.len(), "invalidating records");
    if let Err(e) = self.store.remove_all(&keys).await {
      warn!(error = %e, "cache remove failed");
    }
  }
}

impl Clone for EntityCache {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
      gateway: Arc::clone(&self.gateway),
      session: Arc::clone(&self.session),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{CacheSource, MemoryStore};
  use crate::market::{ProductCollection, SessionUser, StoreProfile};
  use crate::session::SessionHandle;
  use crate::testing::FakeGateway;

  struct Harness {
    cache: EntityCache,
    store: Arc<MemoryStore>,
    gateway: Arc<FakeGateway>,
    session: SessionHandle,
  }

  fn harness(user: Option<&str>) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let gateway = Arc::new(FakeGateway::new());
    let session = SessionHandle::new(user.map(String::from));
    let cache = EntityCache::new(
      store.clone(),
      gateway.clone(),
      Arc::new(session.clone()),
    );
    Harness {
      cache,
      store,
      gateway,
      session,
    }
  }

  #[tokio::test]
  async fn test_miss_fetches_and_writes_owned_record() {
    let h = harness(Some("u1"));
    h.gateway.add_store("u1", "s1", "Acme");

    let result = h
      .cache
      .get::<StoreProfile>("u1", FetchPolicy::CacheFirst)
      .await
      .unwrap();

    assert_eq!(result.source, CacheSource::Network);
    assert_eq!(result.data.found().unwrap().name, "Acme");

    let bytes = h.store.read("store_data:u1").await.unwrap().unwrap();
    let record = CacheRecord::<StoreProfile>::decode_valid(&bytes, &Fingerprint::of("u1"));
    assert!(record.is_ok());
  }

  #[tokio::test]
  async fn test_hit_does_not_call_network() {
    let h = harness(Some("u1"));
    h.gateway.add_store("u1", "s1", "Acme");

    h.cache
      .get::<StoreProfile>("u1", FetchPolicy::CacheFirst)
      .await
      .unwrap();
    let second = h
      .cache
      .get::<StoreProfile>("u1", FetchPolicy::CacheFirst)
      .await
      .unwrap();

    assert_eq!(second.source, CacheSource::Cache);
    assert!(second.cached_at.is_some());
    assert_eq!(second.data.found().unwrap().name, "Acme");
    assert_eq!(h.gateway.calls(EntityKind::StoreProfile), 1);
  }

  /// Cache `key` as u1, then read it as u2: the record must be refetched
  /// exactly once and then be served to u2 from the cache.
  async fn check_owner_change<T: CachedEntity>(h: &Harness, key: &str) {
    let before = h.gateway.calls(T::kind());
    h.session.login("u1");
    h.cache.get::<T>(key, FetchPolicy::CacheFirst).await.unwrap();

    h.session.login("u2");
    let result = h.cache.get::<T>(key, FetchPolicy::CacheFirst).await.unwrap();
    assert_eq!(result.source, CacheSource::Network, "{} {}", T::kind(), key);

    let again = h.cache.get::<T>(key, FetchPolicy::CacheFirst).await.unwrap();
    assert_eq!(again.source, CacheSource::Cache, "{} {}", T::kind(), key);
    assert_eq!(h.gateway.calls(T::kind()), before + 2);
  }

  #[tokio::test]
  async fn test_owner_change_rejects_every_kind() {
    let h = harness(Some("u1"));
    h.gateway.add_user("u1", "Ann", "ann@example.com");
    h.gateway.add_store("u1", "s1", "Acme");
    h.gateway.add_products("s1", &["Mug", "Cap"]);

    check_owner_change::<SessionUser>(&h, "u1").await;
    check_owner_change::<StoreProfile>(&h, "u1").await;
    check_owner_change::<ProductCollection>(&h, "s1").await;

    // Absent markers are owned the same way
    check_owner_change::<StoreProfile>(&h, "u9").await;
    check_owner_change::<ProductCollection>(&h, "s9").await;
  }

  #[tokio::test]
  async fn test_not_authenticated_touches_nothing() {
    let h = harness(None);
    h.gateway.add_store("u1", "s1", "Acme");

    let result = h
      .cache
      .get::<StoreProfile>("u1", FetchPolicy::ForceRefetch)
      .await;

    assert!(matches!(result, Err(CacheError::NotAuthenticated)));
    assert_eq!(h.gateway.total_calls(), 0);
    assert_eq!(h.store.read("store_data:u1").await.unwrap(), None);
  }

  #[tokio::test]
  async fn test_force_refetch_skips_valid_record() {
    let h = harness(Some("u1"));
    h.gateway.add_store("u1", "s1", "Acme");

    h.cache
      .get::<StoreProfile>("u1", FetchPolicy::CacheFirst)
      .await
      .unwrap();
    h.gateway.add_store("u1", "s1", "Acme Renamed");

    let result = h
      .cache
      .get::<StoreProfile>("u1", FetchPolicy::ForceRefetch)
      .await
      .unwrap();

    assert_eq!(result.source, CacheSource::Network);
    assert_eq!(result.data.found().unwrap().name, "Acme Renamed");
    assert_eq!(h.gateway.calls(EntityKind::StoreProfile), 2);
  }

  #[tokio::test]
  async fn test_fetch_failure_writes_nothing() {
    let h = harness(Some("u1"));
    h.gateway.fail_with(503);

    let result = h
      .cache
      .get::<StoreProfile>("u1", FetchPolicy::CacheFirst)
      .await;

    match result {
      Err(CacheError::FetchFailed { kind, key, source }) => {
        assert_eq!(kind, EntityKind::StoreProfile);
        assert_eq!(key, "u1");
        assert_eq!(source.status(), Some(503));
      }
      other => panic!("expected FetchFailed, got {:?}", other),
    }
    assert_eq!(h.store.read("store_data:u1").await.unwrap(), None);
  }

  #[tokio::test]
  async fn test_failed_refetch_never_serves_rejected_record() {
    let h = harness(Some("u1"));
    h.gateway.add_store("u1", "s1", "Acme");
    h.cache
      .get::<StoreProfile>("u1", FetchPolicy::CacheFirst)
      .await
      .unwrap();

    h.session.login("u2");
    h.gateway.fail_with(500);

    let result = h
      .cache
      .get::<StoreProfile>("u1", FetchPolicy::CacheFirst)
      .await;
    assert!(matches!(result, Err(CacheError::FetchFailed { .. })));
  }

  #[tokio::test]
  async fn test_not_found_is_cached_as_absent() {
    let h = harness(Some("u1"));

    let first = h
      .cache
      .get::<StoreProfile>("u1", FetchPolicy::CacheFirst)
      .await
      .unwrap();
    assert!(first.data.is_absent());

    let second = h
      .cache
      .get::<StoreProfile>("u1", FetchPolicy::CacheFirst)
      .await
      .unwrap();
    assert!(second.data.is_absent());
    assert_eq!(second.source, CacheSource::Cache);
    assert_eq!(h.gateway.calls(EntityKind::StoreProfile), 1);
  }

  #[tokio::test]
  async fn test_corrupt_record_falls_through_to_network() {
    let h = harness(Some("u1"));
    h.gateway.add_store("u1", "s1", "Acme");
    h.store.write("store_data:u1", b"\x00garbage").await.unwrap();

    let result = h
      .cache
      .get::<StoreProfile>("u1", FetchPolicy::CacheFirst)
      .await
      .unwrap();

    assert_eq!(result.source, CacheSource::Network);
    assert_eq!(result.data.found().unwrap().name, "Acme");
  }

  #[tokio::test]
  async fn test_incomplete_record_is_refetched() {
    let h = harness(Some("u1"));
    h.gateway.add_user("u1", "Ann", "ann@example.com");

    let partial = SessionUser {
      id: "u1".to_string(),
      name: "Ann".to_string(),
      email: String::new(),
      phone: None,
      avatar_url: None,
    };
    let bytes = CacheRecord::new(EntityState::Found(partial), Fingerprint::of("u1"))
      .encode()
      .unwrap();
    h.store.write("session_user:u1", &bytes).await.unwrap();

    let result = h
      .cache
      .get::<SessionUser>("u1", FetchPolicy::CacheFirst)
      .await
      .unwrap();

    assert_eq!(result.source, CacheSource::Network);
    assert_eq!(result.data.found().unwrap().email, "ann@example.com");
  }

  #[tokio::test]
  async fn test_invalidate_forces_network() {
    let h = harness(Some("u1"));
    h.gateway.add_products("s1", &["Mug", "Cap"]);

    h.cache
      .get::<ProductCollection>("s1", FetchPolicy::CacheFirst)
      .await
      .unwrap();
    h.cache.invalidate(EntityKind::ProductCollection, "s1").await;
    assert_eq!(h.store.read("products_data:s1").await.unwrap(), None);

    let result = h
      .cache
      .get::<ProductCollection>("s1", FetchPolicy::CacheFirst)
      .await
      .unwrap();
    assert_eq!(result.source, CacheSource::Network);
    assert_eq!(h.gateway.calls(EntityKind::ProductCollection), 2);
  }

  #[tokio::test]
  async fn test_invalidate_all() {
    let h = harness(Some("u1"));
    h.gateway.add_store("u1", "s1", "Acme");
    h.gateway.add_products("s1", &["Mug"]);

    h.cache
      .get::<StoreProfile>("u1", FetchPolicy::CacheFirst)
      .await
      .unwrap();
    h.cache
      .get::<ProductCollection>("s1", FetchPolicy::CacheFirst)
      .await
      .unwrap();

    h.cache
      .invalidate_all(&[
        (EntityKind::StoreProfile, "u1"),
        (EntityKind::ProductCollection, "s1"),
      ])
      .await;

    assert_eq!(h.store.read("store_data:u1").await.unwrap(), None);
    assert_eq!(h.store.read("products_data:s1").await.unwrap(), None);
  }
}
