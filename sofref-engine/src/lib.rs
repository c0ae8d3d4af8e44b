pub mod store;
pub mod traits;
