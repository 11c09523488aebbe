use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::Config;
use crate::market::api_types::{ApiProductList, ApiStore, ApiUser};
use crate::market::gateway::{GatewayError, RemoteGateway};
use crate::market::types::{ProductCollection, SessionUser, StoreProfile};

/// Marketplace REST API client
#[derive(Clone)]
pub struct HttpGateway {
  client: Client,
  base_url: Url,
  token: Option<String>,
}

impl HttpGateway {
  pub fn new(config: &Config) -> Result<Self> {
    let base_url = Url::parse(&config.api.url)
      .map_err(|e| eyre!("Invalid API url {}: {}", config.api.url, e))?;
    if base_url.cannot_be_a_base() {
      return Err(eyre!("API url {} cannot be used as a base", config.api.url));
    }

    let token = match Config::get_api_token() {
      Ok(token) => Some(token),
      Err(e) => {
        tracing::warn!("{}; requests will be sent unauthenticated", e);
        None
      }
    };

    let client = Client::builder()
      .timeout(Duration::from_secs(config.api.timeout_secs))
      .user_agent(concat!("shopsync/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      client,
      base_url,
      token,
    })
  }

  /// Build an endpoint URL from path segments, escaping each one.
  fn endpoint(&self, segments: &[&str]) -> Url {
    let mut url = self.base_url.clone();
    if let Ok(mut path) = url.path_segments_mut() {
      path.pop_if_empty().extend(segments);
    }
    url
  }

  fn request(&self, method: Method, url: Url) -> RequestBuilder {
    let request = self.client.request(method, url);
    match &self.token {
      Some(token) => request.bearer_auth(token),
      None => request,
    }
  }

  async fn send(&self, method: Method, segments: &[&str]) -> Result<reqwest::Response, GatewayError> {
    let url = self.endpoint(segments);
    debug!(%method, %url, "api request");

    let response = self.request(method.clone(), url.clone()).send().await?;
    let status = response.status();
    if !status.is_success() {
      return Err(GatewayError::Status {
        method,
        url: url.to_string(),
        status: status.as_u16(),
      });
    }

    Ok(response)
  }

  async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, GatewayError> {
    let response = self.send(Method::GET, segments).await?;
    Ok(response.json::<T>().await?)
  }
}

#[async_trait]
impl RemoteGateway for HttpGateway {
  async fn fetch_session_user(&self, user_id: &str) -> Result<SessionUser, GatewayError> {
    let user: ApiUser = self.get_json(&["users", user_id]).await?;
    Ok(user.into())
  }

  async fn fetch_store_by_owner(&self, owner_id: &str) -> Result<StoreProfile, GatewayError> {
    let store: ApiStore = self.get_json(&["stores", "owner", owner_id]).await?;
    Ok(store.into())
  }

  async fn fetch_products_by_store(
    &self,
    store_id: &str,
  ) -> Result<ProductCollection, GatewayError> {
    let list: ApiProductList = self.get_json(&["products", "store", store_id]).await?;
    Ok(list.into_collection(store_id))
  }

  async fn delete_store(&self, store_id: &str) -> Result<(), GatewayError> {
    self.send(Method::DELETE, &["stores", store_id]).await?;
    Ok(())
  }

  async fn delete_product(&self, product_id: &str) -> Result<(), GatewayError> {
    self.send(Method::DELETE, &["products", product_id]).await?;
    Ok(())
  }
}
