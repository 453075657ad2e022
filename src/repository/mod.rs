//! Repository Layer
//!
//! Data access abstractions and implementations.

mod traits;
pub(crate) mod db;
mod coin;
mod rest_store;


pub use traits::{CollectionStore, Repository};
pub use db::{init_db, DbState, SharedConnection};
pub use coin::{CoinRankingOperations, CoinRepository};
pub use rest_store::RestCollectionStore;
