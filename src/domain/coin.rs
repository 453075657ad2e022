//! Coin Entity
//!
//! A challenge coin in one owner's collection, ordered by a dense rank.

use serde::{Deserialize, Serialize};
use super::entity::Entity;

/// Presentation data carried along with a coin.
///
/// The reorder engine never reads or mutates these fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinDisplay {
    /// Coin name shown in the gallery
    pub name: String,
    /// Front face image URI
    pub front_image: Option<String>,
    /// Back face image URI
    pub back_image: Option<String>,
    /// Visible on the owner's public profile
    pub is_public: bool,
    /// Minted as an NFT
    pub is_nft: bool,
}

impl CoinDisplay {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// A coin owned by a single collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    /// Unique identifier, assigned by the store
    pub id: u32,
    /// 1-based display position, lower sorts first
    pub rank: u32,
    /// Collection owner (email or account id)
    pub owner_key: String,
    pub display: CoinDisplay,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

impl Coin {
    /// Create a coin that has not been stored yet (id and rank are assigned on insert)
    pub fn new(owner_key: impl Into<String>, display: CoinDisplay) -> Self {
        Self {
            id: 0,
            rank: 0,
            owner_key: owner_key.into(),
            display,
            created_at: None,
            updated_at: None,
        }
    }

    /// The `{id, rank}` pair for this coin as it currently stands
    pub fn rank_update(&self) -> RankUpdate {
        RankUpdate { id: self.id, rank: self.rank }
    }
}

impl Entity for Coin {
    type Id = u32;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// One entry of a batch rank update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RankUpdate {
    pub id: u32,
    pub rank: u32,
}

/// An ordered fetch result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinPage {
    /// Coins sorted by rank ascending
    pub coins: Vec<Coin>,
    /// Total number of coins the owner has (may exceed `coins.len()` when paged)
    pub total: u32,
}

impl CoinPage {
    pub fn new(coins: Vec<Coin>) -> Self {
        let total = coins.len() as u32;
        Self { coins, total }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_coin_is_unassigned() {
        let coin = Coin::new("a@b.c", CoinDisplay::named("Unit coin"));
        assert_eq!(coin.id(), 0);
        assert_eq!(coin.rank, 0);
        assert_eq!(coin.display.name, "Unit coin");
        assert!(!coin.display.is_public);
    }

    #[test]
    fn test_rank_update_pair() {
        let mut coin = Coin::new("a@b.c", CoinDisplay::named("x"));
        coin.id = 7;
        coin.rank = 3;
        assert_eq!(coin.rank_update(), RankUpdate { id: 7, rank: 3 });
    }

    #[test]
    fn test_page_total_defaults_to_len() {
        let page = CoinPage::new(vec![Coin::new("o", CoinDisplay::default())]);
        assert_eq!(page.total, 1);
    }
}
