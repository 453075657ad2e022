//! Coin Ranking Operations
//!
//! Rank management for a collection, and the `CollectionStore` boundary
//! the reorder engine writes through.

use std::collections::HashSet;

use async_trait::async_trait;
use rusqlite::params;

use crate::domain::{BatchReply, CoinPage, DomainResult, RankUpdate};
use crate::repository::traits::CollectionStore;
use super::coin_repo::{count_owner_coins, open, select_owner_coins, CoinRepository};

/// Trait for coin ranking operations
#[async_trait]
pub trait CoinRankingOperations {
    /// Rank a newly added coin would get (one past the current maximum)
    async fn next_rank(&self, owner_key: &str) -> DomainResult<u32>;

    /// Rewrite an owner's ranks to be sequential (1, 2, 3, ...) keeping their order.
    /// Returns the rank pairs that were written.
    async fn reindex_ranks(&self, owner_key: &str) -> DomainResult<Vec<RankUpdate>>;
}

#[async_trait]
impl CoinRankingOperations for CoinRepository {
    async fn next_rank(&self, owner_key: &str) -> DomainResult<u32> {
        let guard = self.conn.lock().await;
        let conn = open(&guard)?;

        let rank: u32 = conn.query_row(
            "SELECT COALESCE(MAX(priority), 0) + 1 FROM coins WHERE owner_key = ?",
            params![owner_key],
            |row| row.get(0),
        )?;
        Ok(rank)
    }

    async fn reindex_ranks(&self, owner_key: &str) -> DomainResult<Vec<RankUpdate>> {
        let guard = self.conn.lock().await;
        let conn = open(&guard)?;

        let coins = select_owner_coins(conn, owner_key, None)?;
        let updates: Vec<RankUpdate> = coins
            .iter()
            .enumerate()
            .map(|(index, coin)| RankUpdate { id: coin.id, rank: index as u32 + 1 })
            .collect();

        let tx = conn.unchecked_transaction()?;
        let now = chrono::Utc::now().timestamp_millis();
        for update in &updates {
            tx.execute(
                "UPDATE coins SET priority = ?, updated_at = ? WHERE id = ?",
                params![update.rank, now, update.id],
            )?;
        }
        tx.commit()?;

        log::info!("reindexed {} coins for {}", updates.len(), owner_key);
        Ok(updates)
    }
}

#[async_trait]
impl CollectionStore for CoinRepository {
    async fn fetch_ordered_items(&self, owner_key: &str) -> DomainResult<CoinPage> {
        let guard = self.conn.lock().await;
        let conn = open(&guard)?;

        let coins = select_owner_coins(conn, owner_key, None)?;
        let total = count_owner_coins(conn, owner_key)?;
        Ok(CoinPage { coins, total })
    }

    /// All-or-nothing: any unknown id or invalid rank rolls the whole batch back
    /// and is reported as a rejected reply.
    async fn batch_update_ranks(&self, updates: &[RankUpdate]) -> DomainResult<BatchReply> {
        if let Some(reason) = validate_batch(updates) {
            log::warn!("batch rank update rejected: {}", reason);
            return Ok(BatchReply::Rejected(reason));
        }

        let guard = self.conn.lock().await;
        let conn = open(&guard)?;

        let tx = conn.unchecked_transaction()?;
        let now = chrono::Utc::now().timestamp_millis();
        for update in updates {
            let changed = tx.execute(
                "UPDATE coins SET priority = ?, updated_at = ? WHERE id = ?",
                params![update.rank, now, update.id],
            )?;
            if changed == 0 {
                // tx rolls back on drop
                let reason = format!("coin {} not found", update.id);
                log::warn!("batch rank update rejected: {}", reason);
                return Ok(BatchReply::Rejected(reason));
            }
        }
        tx.commit()?;

        log::debug!("batch rank update applied to {} coins", updates.len());
        Ok(BatchReply::Success)
    }
}

fn validate_batch(updates: &[RankUpdate]) -> Option<String> {
    let mut seen = HashSet::with_capacity(updates.len());
    for update in updates {
        if update.rank == 0 {
            return Some(format!("coin {} has rank 0", update.id));
        }
        if !seen.insert(update.id) {
            return Some(format!("coin {} appears twice", update.id));
        }
    }
    None
}
