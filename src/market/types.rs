use serde::{Deserialize, Serialize};

/// The signed-in user's own profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
  pub id: String,
  pub name: String,
  pub email: String,
  pub phone: Option<String>,
  pub avatar_url: Option<String>,
}

/// A seller's storefront, one per owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreProfile {
  pub id: String,
  pub owner_id: String,
  pub name: String,
  pub description: Option<String>,
  pub address: Option<String>,
  pub logo_url: Option<String>,
}

/// Product entry as shown in feeds and store listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSummary {
  pub id: String,
  pub name: String,
  pub price: f64,
  pub image_url: Option<String>,
  pub stock: Option<u32>,
}

/// All products listed by one store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCollection {
  pub store_id: String,
  pub products: Vec<ProductSummary>,
}
