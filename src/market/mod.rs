//! Marketplace domain: entity types, the remote API and its cached client.

mod api_types;
mod cache;
mod cached_client;
mod client;
mod gateway;
mod types;

pub use cache::{listed_products, Entity, EntityKind, EntityRef};
pub use cached_client::{MarketClient, Storefront};
pub use gateway::{GatewayError, RemoteGateway};
pub use types::{ProductCollection, ProductSummary, SessionUser, StoreProfile};
