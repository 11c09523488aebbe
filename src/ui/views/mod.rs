mod signed_out;
mod store;

pub use signed_out::SignedOutView;
pub use store::StoreView;
