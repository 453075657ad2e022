//! Store boundaries: record CRUD for the local database, and the
//! ranked-collection service the reorder engine writes through.

use async_trait::async_trait;
use crate::domain::{BatchReply, CoinPage, Entity, DomainResult, RankUpdate};

/// Add, look up, edit and remove records by id.
///
/// The store decides ids (and, for coins, the initial rank); whatever the
/// caller puts there on `create` is ignored.
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// Returns the record as stored, with its assigned id
    async fn create(&self, entity: &T) -> DomainResult<T>;

    async fn find_by_id(&self, id: T::Id) -> DomainResult<Option<T>>;

    /// Every record, across owners
    async fn list(&self) -> DomainResult<Vec<T>>;

    /// `NotFound` when the id is unknown
    async fn update(&self, entity: &T) -> DomainResult<T>;

    /// `NotFound` when the id is unknown
    async fn delete(&self, id: T::Id) -> DomainResult<()>;
}

/// The persistence service behind a ranked coin collection.
///
/// This is the only boundary the reorder engine talks to.
#[async_trait]
pub trait CollectionStore: Send + Sync {
    /// Fetch an owner's coins sorted by rank ascending
    async fn fetch_ordered_items(&self, owner_key: &str) -> DomainResult<CoinPage>;

    /// Apply every `{id, rank}` pair as one all-or-nothing write.
    ///
    /// `Err` means the call itself failed (transport, storage);
    /// a reply the backend did send is returned as `Ok(BatchReply)`.
    async fn batch_update_ranks(&self, updates: &[RankUpdate]) -> DomainResult<BatchReply>;
}
