//! Marketplace client that pairs the remote gateway with the entity cache.

use chrono::{DateTime, Utc};
use color_eyre::Result;
use std::sync::Arc;
use tracing::info;

use crate::cache::{
  CacheError, CacheSource, EntityCache, EntityState, FetchPolicy, MemoryStore, NoopStore,
  PersistentStore, SqliteStore,
};
use crate::config::{CacheMode, Config};
use crate::session::{SessionHandle, SessionProvider};

use super::cache::{EntityKind, EntityRef};
use super::client::HttpGateway;
use super::gateway::{GatewayError, RemoteGateway};
use super::types::{ProductCollection, ProductSummary, SessionUser, StoreProfile};

/// Everything the store screen needs for one owner.
#[derive(Debug, Clone)]
pub struct Storefront {
  pub owner_id: String,
  pub user: EntityState<SessionUser>,
  pub store: EntityState<StoreProfile>,
  /// Empty when the owner has no store yet
  pub products: Vec<ProductSummary>,
  /// When the store record was written, if it was served from the cache
  pub cached_at: Option<DateTime<Utc>>,
}

impl Storefront {
  pub fn store_id(&self) -> Option<&str> {
    self.store.found().map(|store| store.id.as_str())
  }

  /// Entities a pull-to-refresh of this storefront has to reload.
  pub fn refresh_refs(&self) -> Vec<EntityRef> {
    let mut refs = vec![EntityRef::store(&self.owner_id)];
    if let Some(store_id) = self.store_id() {
      refs.push(EntityRef::products(store_id));
    }
    refs
  }
}

/// Marketplace client with owner-aware caching.
///
/// Reads go through the entity cache. Mutations go straight to the API and
/// then invalidate whatever they made obsolete, so the next read refetches.
#[derive(Clone)]
pub struct MarketClient {
  gateway: Arc<dyn RemoteGateway>,
  cache: EntityCache,
  session: SessionHandle,
}

impl MarketClient {
  /// Create a client talking to the configured API with the given cache backend.
  pub fn new(config: &Config, session: SessionHandle, mode: CacheMode) -> Result<Self> {
    let gateway = Arc::new(HttpGateway::new(config)?);
    let store: Arc<dyn PersistentStore> = match mode {
      CacheMode::Sqlite => {
        let path = match &config.cache.path {
          Some(path) => path.clone(),
          None => Config::data_dir()?.join("cache.db"),
        };
        Arc::new(SqliteStore::open(&path)?)
      }
      CacheMode::Memory => Arc::new(MemoryStore::new()),
      CacheMode::Off => Arc::new(NoopStore),
    };

    Ok(Self::from_parts(gateway, store, session))
  }

  pub fn from_parts(
    gateway: Arc<dyn RemoteGateway>,
    store: Arc<dyn PersistentStore>,
    session: SessionHandle,
  ) -> Self {
    let cache = EntityCache::new(store, gateway.clone(), Arc::new(session.clone()));
    Self {
      gateway,
      cache,
      session,
    }
  }

  pub fn cache(&self) -> &EntityCache {
    &self.cache
  }

  pub fn session(&self) -> &SessionHandle {
    &self.session
  }

  fn user_id(&self) -> Result<String, CacheError> {
    self
      .session
      .current_user_id()
      .ok_or(CacheError::NotAuthenticated)
  }

  /// Get the products listed by `store_id`. A store with no listing yields an empty list.
  pub async fn products_for_store(
    &self,
    store_id: &str,
    policy: FetchPolicy,
  ) -> Result<Vec<ProductSummary>, CacheError> {
    let collection = self.cache.get::<ProductCollection>(store_id, policy).await?;
    Ok(
      collection
        .data
        .into_found()
        .map(|c| c.products)
        .unwrap_or_default(),
    )
  }

  /// Load the signed-in user's own profile, store and product list.
  pub async fn load_storefront(&self, policy: FetchPolicy) -> Result<Storefront, CacheError> {
    let owner_id = self.user_id()?;

    // Different keys, so these may hit the network in parallel
    let (user, store) = futures::try_join!(
      self.cache.get::<SessionUser>(&owner_id, policy),
      self.cache.get::<StoreProfile>(&owner_id, policy),
    )?;

    let products = match store.data.found() {
      Some(profile) => self.products_for_store(&profile.id, policy).await?,
      None => Vec::new(),
    };

    let cached_at = match store.source {
      CacheSource::Cache => store.cached_at,
      CacheSource::Network => None,
    };

    Ok(Storefront {
      owner_id,
      user: user.data,
      store: store.data,
      products,
      cached_at,
    })
  }

  /// Delete a product and drop the cached listing of its store.
  pub async fn delete_product(&self, store_id: &str, product_id: &str) -> Result<(), GatewayError> {
    self.gateway.delete_product(product_id).await?;
    info!(store = store_id, product = product_id, "product deleted");
    self
      .cache
      .invalidate(EntityKind::ProductCollection, store_id)
      .await;
    Ok(())
  }

  /// Delete a store and drop both its profile and its listing.
  pub async fn delete_store(&self, owner_id: &str, store_id: &str) -> Result<(), GatewayError> {
    self.gateway.delete_store(store_id).await?;
    info!(store = store_id, "store deleted");
    self
      .cache
      .invalidate_all(&[
        (EntityKind::StoreProfile, owner_id),
        (EntityKind::ProductCollection, store_id),
      ])
      .await;
    Ok(())
  }

  /// End the session and remove the records it produced.
  pub async fn sign_out(&self, known: &[EntityRef]) {
    let entries: Vec<(EntityKind, &str)> = known
      .iter()
      .map(|entity| (entity.kind, entity.key.as_str()))
      .collect();
    self.cache.invalidate_all(&entries).await;
    self.session.logout();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::FakeGateway;

  fn client(user: Option<&str>) -> (MarketClient, Arc<FakeGateway>, Arc<MemoryStore>) {
    let gateway = Arc::new(FakeGateway::new());
    let store = Arc::new(MemoryStore::new());
    let client = MarketClient::from_parts(
      gateway.clone(),
      store.clone(),
      SessionHandle::new(user.map(String::from)),
    );
    (client, gateway, store)
  }

  #[tokio::test]
  async fn test_load_storefront() {
    let (client, gateway, _) = client(Some("u1"));
    gateway.add_user("u1", "Ann", "ann@example.com");
    gateway.add_store("u1", "s1", "Acme");
    gateway.add_products("s1", &["Mug", "Cap"]);

    let front = client.load_storefront(FetchPolicy::CacheFirst).await.unwrap();

    assert_eq!(front.owner_id, "u1");
    assert_eq!(front.user.found().unwrap().name, "Ann");
    assert_eq!(front.store_id(), Some("s1"));
    assert_eq!(front.products.len(), 2);
    assert!(front.cached_at.is_none());
    assert_eq!(
      front.refresh_refs(),
      vec![EntityRef::store("u1"), EntityRef::products("s1")]
    );

    let again = client.load_storefront(FetchPolicy::CacheFirst).await.unwrap();
    assert!(again.cached_at.is_some());
    assert_eq!(gateway.total_calls(), 3);
  }

  #[tokio::test]
  async fn test_storefront_without_store() {
    let (client, gateway, _) = client(Some("u1"));
    gateway.add_user("u1", "Ann", "ann@example.com");

    let front = client.load_storefront(FetchPolicy::CacheFirst).await.unwrap();

    assert!(front.store.is_absent());
    assert!(front.products.is_empty());
    assert_eq!(front.refresh_refs(), vec![EntityRef::store("u1")]);
    assert_eq!(gateway.calls(EntityKind::ProductCollection), 0);
  }

  #[tokio::test]
  async fn test_load_requires_session() {
    let (client, gateway, _) = client(None);

    let result = client.load_storefront(FetchPolicy::CacheFirst).await;
    assert!(matches!(result, Err(CacheError::NotAuthenticated)));
    assert_eq!(gateway.total_calls(), 0);
  }

  #[tokio::test]
  async fn test_delete_product_invalidates_listing() {
    let (client, gateway, _) = client(Some("u1"));
    gateway.add_products("s1", &["Mug", "Cap"]);

    let before = client
      .products_for_store("s1", FetchPolicy::CacheFirst)
      .await
      .unwrap();
    client.delete_product("s1", &before[0].id).await.unwrap();

    let after = client
      .products_for_store("s1", FetchPolicy::CacheFirst)
      .await
      .unwrap();
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].name, "Cap");
    assert_eq!(gateway.calls(EntityKind::ProductCollection), 2);
  }

  #[tokio::test]
  async fn test_failed_delete_keeps_cache() {
    let (client, gateway, store) = client(Some("u1"));
    gateway.add_products("s1", &["Mug"]);
    client
      .products_for_store("s1", FetchPolicy::CacheFirst)
      .await
      .unwrap();

    gateway.fail_with(500);
    assert!(client.delete_product("s1", "s1-p1").await.is_err());
    assert!(store.read("products_data:s1").await.unwrap().is_some());
  }

  #[tokio::test]
  async fn test_delete_store_invalidates_profile_and_listing() {
    let (client, gateway, store) = client(Some("u1"));
    gateway.add_user("u1", "Ann", "ann@example.com");
    gateway.add_store("u1", "s1", "Acme");
    gateway.add_products("s1", &["Mug"]);
    client.load_storefront(FetchPolicy::CacheFirst).await.unwrap();

    client.delete_store("u1", "s1").await.unwrap();
    assert_eq!(gateway.deleted(), vec!["s1".to_string()]);
    assert!(store.read("store_data:u1").await.unwrap().is_none());
    assert!(store.read("products_data:s1").await.unwrap().is_none());

    let front = client.load_storefront(FetchPolicy::CacheFirst).await.unwrap();
    assert!(front.store.is_absent());
  }

  #[tokio::test]
  async fn test_sign_out_clears_records_and_session() {
    let (client, gateway, store) = client(Some("u1"));
    gateway.add_user("u1", "Ann", "ann@example.com");
    gateway.add_store("u1", "s1", "Acme");
    gateway.add_products("s1", &["Mug"]);
    let front = client.load_storefront(FetchPolicy::CacheFirst).await.unwrap();

    let mut known = front.refresh_refs();
    known.push(EntityRef::session_user("u1"));
    client.sign_out(&known).await;

    assert!(store.read("session_user:u1").await.unwrap().is_none());
    assert!(store.read("store_data:u1").await.unwrap().is_none());
    assert!(matches!(
      client.load_storefront(FetchPolicy::CacheFirst).await,
      Err(CacheError::NotAuthenticated)
    ));
  }
}
