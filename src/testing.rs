//! In-crate fakes shared by unit tests.

use async_trait::async_trait;
use reqwest::Method;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::market::{
  EntityKind, GatewayError, ProductCollection, ProductSummary, RemoteGateway, SessionUser,
  StoreProfile,
};

#[derive(Default)]
struct State {
  users: HashMap<String, SessionUser>,
  stores: HashMap<String, StoreProfile>,
  products: HashMap<String, ProductCollection>,
  failure: Option<u16>,
  delay: Duration,
  calls: HashMap<EntityKind, usize>,
  deleted: Vec<String>,
}

/// Gateway serving canned entities, counting calls per kind.
///
/// Unknown ids answer 404. `fail_with` makes every call fail with the given
/// status until `heal` is called.
#[derive(Default)]
pub struct FakeGateway {
  state: Mutex<State>,
}

impl FakeGateway {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add_user(&self, id: &str, name: &str, email: &str) {
    self.state.lock().unwrap().users.insert(
      id.to_string(),
      SessionUser {
        id: id.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        phone: None,
        avatar_url: None,
      },
    );
  }

  pub fn add_store(&self, owner_id: &str, store_id: &str, name: &str) {
    self.state.lock().unwrap().stores.insert(
      owner_id.to_string(),
      StoreProfile {
        id: store_id.to_string(),
        owner_id: owner_id.to_string(),
        name: name.to_string(),
        description: None,
        address: None,
        logo_url: None,
      },
    );
  }

  pub fn add_products(&self, store_id: &str, names: &[&str]) {
    let products = names
      .iter()
      .enumerate()
      .map(|(i, name)| ProductSummary {
        id: format!("{}-p{}", store_id, i + 1),
        name: name.to_string(),
        price: 10.0 + i as f64,
        image_url: None,
        stock: Some(1),
      })
      .collect();
    self.state.lock().unwrap().products.insert(
      store_id.to_string(),
      ProductCollection {
        store_id: store_id.to_string(),
        products,
      },
    );
  }

  pub fn fail_with(&self, status: u16) {
    self.state.lock().unwrap().failure = Some(status);
  }

  pub fn heal(&self) {
    self.state.lock().unwrap().failure = None;
  }

  /// Delay every fetch, so concurrent callers overlap. The response is
  /// looked up before the delay, like a slow reply already on the wire.
  pub fn set_delay(&self, delay: Duration) {
    self.state.lock().unwrap().delay = delay;
  }

  pub fn calls(&self, kind: EntityKind) -> usize {
    self
      .state
      .lock()
      .unwrap()
      .calls
      .get(&kind)
      .copied()
      .unwrap_or(0)
  }

  pub fn total_calls(&self) -> usize {
    self.state.lock().unwrap().calls.values().sum()
  }

  pub fn deleted(&self) -> Vec<String> {
    self.state.lock().unwrap().deleted.clone()
  }

  /// Record the call and return the configured delay and failure.
  fn begin(&self, kind: Option<EntityKind>) -> (Duration, Option<u16>) {
    let mut state = self.state.lock().unwrap();
    if let Some(kind) = kind {
      *state.calls.entry(kind).or_default() += 1;
    }
    (state.delay, state.failure)
  }

  async fn respond<T: Clone>(
    &self,
    kind: EntityKind,
    path: String,
    lookup: impl FnOnce(&State) -> Option<T>,
  ) -> Result<T, GatewayError> {
    let (delay, failure) = self.begin(Some(kind));
    let found = lookup(&self.state.lock().unwrap());
    if !delay.is_zero() {
      tokio::time::sleep(delay).await;
    }
    if let Some(status) = failure {
      return Err(status_error(Method::GET, path, status));
    }
    found.ok_or_else(|| status_error(Method::GET, path, 404))
  }

  async fn delete(&self, path: String, id: &str) -> Result<(), GatewayError> {
    let (_, failure) = self.begin(None);
    if let Some(status) = failure {
      return Err(status_error(Method::DELETE, path, status));
    }
    self.state.lock().unwrap().deleted.push(id.to_string());
    Ok(())
  }
}

fn status_error(method: Method, path: String, status: u16) -> GatewayError {
  GatewayError::Status {
    method,
    url: format!("https://fake.test/{}", path),
    status,
  }
}

#[async_trait]
impl RemoteGateway for FakeGateway {
  async fn fetch_session_user(&self, user_id: &str) -> Result<SessionUser, GatewayError> {
    self
      .respond(EntityKind::SessionUser, format!("users/{}", user_id), |s| {
        s.users.get(user_id).cloned()
      })
      .await
  }

  async fn fetch_store_by_owner(&self, owner_id: &str) -> Result<StoreProfile, GatewayError> {
    self
      .respond(
        EntityKind::StoreProfile,
        format!("stores/owner/{}", owner_id),
        |s| s.stores.get(owner_id).cloned(),
      )
      .await
  }

  async fn fetch_products_by_store(
    &self,
    store_id: &str,
  ) -> Result<ProductCollection, GatewayError> {
    self
      .respond(
        EntityKind::ProductCollection,
        format!("products/store/{}", store_id),
        |s| s.products.get(store_id).cloned(),
      )
      .await
  }

  async fn delete_store(&self, store_id: &str) -> Result<(), GatewayError> {
    self.delete(format!("stores/{}", store_id), store_id).await?;
    let mut state = self.state.lock().unwrap();
    state.stores.retain(|_, store| store.id != store_id);
    state.products.remove(store_id);
    Ok(())
  }

  async fn delete_product(&self, product_id: &str) -> Result<(), GatewayError> {
    self.delete(format!("products/{}", product_id), product_id).await?;
    let mut state = self.state.lock().unwrap();
    for collection in state.products.values_mut() {
      collection.products.retain(|p| p.id != product_id);
    }
    Ok(())
  }
}
