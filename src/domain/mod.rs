//! Domain Layer
//!
//! Contains the collection entities and core abstractions.
//! This layer has no storage or runtime dependencies.

mod entity;
mod coin;
mod batch_reply;

pub use entity::{Entity, DomainError, DomainResult};
pub use coin::{Coin, CoinDisplay, CoinPage, RankUpdate};
pub use batch_reply::BatchReply;
