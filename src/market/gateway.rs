//! The remote API as seen by the cache: one read per entity kind plus the
//! mutations that make cached data obsolete.

use async_trait::async_trait;
use thiserror::Error;

use super::types::{ProductCollection, SessionUser, StoreProfile};

/// Failure talking to the marketplace API.
#[derive(Debug, Error)]
pub enum GatewayError {
  /// The server answered with a non-success status.
  #[error("{method} {url} returned HTTP {status}")]
  Status {
    method: reqwest::Method,
    url: String,
    status: u16,
  },
  /// Connection, timeout or body decoding failure.
  #[error("request failed: {0}")]
  Transport(#[from] reqwest::Error),
}

impl GatewayError {
  /// HTTP status code, when the server got far enough to send one.
  pub fn status(&self) -> Option<u16> {
    match self {
      GatewayError::Status { status, .. } => Some(*status),
      GatewayError::Transport(e) => e.status().map(|s| s.as_u16()),
    }
  }

  /// The server confirmed the entity does not exist.
  pub fn is_not_found(&self) -> bool {
    self.status() == Some(404)
  }
}

/// Remote source of truth for every cached entity kind.
///
/// Reads are idempotent. A 404 is reported as a [`GatewayError`] whose
/// [`is_not_found`](GatewayError::is_not_found) is true; the cache turns it
/// into an explicit absent marker.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
  async fn fetch_session_user(&self, user_id: &str) -> Result<SessionUser, GatewayError>;

  async fn fetch_store_by_owner(&self, owner_id: &str) -> Result<StoreProfile, GatewayError>;

  async fn fetch_products_by_store(&self, store_id: &str)
    -> Result<ProductCollection, GatewayError>;

  async fn delete_store(&self, store_id: &str) -> Result<(), GatewayError>;

  async fn delete_product(&self, product_id: &str) -> Result<(), GatewayError>;
}
