//! Coin Repository Module
//!
//! This module provides coin repository functionality split into specialized sub-modules:
//! - coin_repo: Core CRUD operations
//! - coin_ranking: Rank management and the collection store boundary

mod coin_repo;
mod coin_ranking;

pub use coin_repo::CoinRepository;

// Re-export the operation trait so it can be used by importing CoinRepository
pub use coin_ranking::CoinRankingOperations;
