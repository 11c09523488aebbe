//! Serde-deserializable types matching marketplace API responses.
//!
//! These types are separate from domain types so that missing or renamed
//! fields on the wire degrade to empty values instead of failing the whole
//! response. The cache's completeness checks decide later whether such a
//! value is usable.

use serde::Deserialize;

use super::types::{ProductCollection, ProductSummary, SessionUser, StoreProfile};

// ============================================================================
// Users
// ============================================================================

#[derive(Debug, Deserialize, Default)]
pub struct ApiUser {
  #[serde(rename = "_id", alias = "id", default)]
  pub id: String,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub email: String,
  pub phone: Option<String>,
  #[serde(alias = "avatarUrl")]
  pub avatar: Option<String>,
}

impl From<ApiUser> for SessionUser {
  fn from(user: ApiUser) -> Self {
    Self {
      id: user.id,
      name: user.name,
      email: user.email,
      phone: user.phone,
      avatar_url: user.avatar,
    }
  }
}

// ============================================================================
// Stores
// ============================================================================

/// The owner arrives either as a bare id or as an embedded user document.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ApiOwner {
  Id(String),
  Embedded(ApiUser),
}

impl ApiOwner {
  fn into_id(self) -> String {
    match self {
      ApiOwner::Id(id) => id,
      ApiOwner::Embedded(user) => user.id,
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct ApiStore {
  #[serde(rename = "_id", alias = "id", default)]
  pub id: String,
  #[serde(alias = "ownerId")]
  pub owner: Option<ApiOwner>,
  #[serde(default)]
  pub name: String,
  pub description: Option<String>,
  pub address: Option<String>,
  #[serde(alias = "logoUrl")]
  pub logo: Option<String>,
}

impl From<ApiStore> for StoreProfile {
  fn from(store: ApiStore) -> Self {
    Self {
      id: store.id,
      owner_id: store.owner.map(ApiOwner::into_id).unwrap_or_default(),
      name: store.name,
      description: store.description,
      address: store.address,
      logo_url: store.logo,
    }
  }
}

// ============================================================================
// Products
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiProduct {
  #[serde(rename = "_id", alias = "id", default)]
  pub id: String,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub price: f64,
  #[serde(default)]
  pub images: Vec<String>,
  pub stock: Option<u32>,
}

impl From<ApiProduct> for ProductSummary {
  fn from(product: ApiProduct) -> Self {
    Self {
      id: product.id,
      name: product.name,
      price: product.price,
      image_url: product.images.into_iter().next(),
      stock: product.stock,
    }
  }
}

/// Product listings come back bare or wrapped depending on the endpoint version.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ApiProductList {
  Bare(Vec<ApiProduct>),
  Wrapped { products: Vec<ApiProduct> },
}

impl ApiProductList {
  pub fn into_collection(self, store_id: &str) -> ProductCollection {
    let products = match self {
      ApiProductList::Bare(products) => products,
      ApiProductList::Wrapped { products } => products,
    };

    ProductCollection {
      store_id: store_id.to_string(),
      products: products.into_iter().map(ProductSummary::from).collect(),
    }
  }
}
