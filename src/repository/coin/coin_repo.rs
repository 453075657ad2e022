//! Coin Repository - Core CRUD Operations
//!
//! SQLite-backed implementation for Coin CRUD operations.
//! Rank management lives in coin_ranking.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use crate::domain::{Coin, CoinDisplay, DomainError, DomainResult};
use crate::repository::db::SharedConnection;
use super::super::traits::Repository;

pub(super) const COIN_COLUMNS: &str =
    "id, owner_key, name, front_image, back_image, is_public, is_nft, priority, created_at, updated_at";

/// SQLite implementation of the Coin repository
pub struct CoinRepository {
    pub(super) conn: SharedConnection,
}

impl CoinRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    /// Coins of one owner ordered by rank, optionally limited to a page
    pub async fn list_by_owner(&self, owner_key: &str, limit: Option<u32>) -> DomainResult<Vec<Coin>> {
        let guard = self.conn.lock().await;
        let conn = open(&guard)?;
        select_owner_coins(conn, owner_key, limit)
    }

    /// Number of coins one owner has
    pub async fn count_by_owner(&self, owner_key: &str) -> DomainResult<u32> {
        let guard = self.conn.lock().await;
        let conn = open(&guard)?;
        count_owner_coins(conn, owner_key)
    }
}

#[async_trait]
impl Repository<Coin> for CoinRepository {
    /// Insert a coin at the end of its owner's collection.
    /// The incoming `id` and `rank` are ignored.
    async fn create(&self, entity: &Coin) -> DomainResult<Coin> {
        if entity.owner_key.trim().is_empty() {
            return Err(DomainError::InvalidInput("owner_key must not be empty".to_string()));
        }
        if entity.display.name.trim().is_empty() {
            return Err(DomainError::InvalidInput("coin name must not be empty".to_string()));
        }

        let guard = self.conn.lock().await;
        let conn = open(&guard)?;

        let rank: u32 = conn.query_row(
            "SELECT COALESCE(MAX(priority), 0) + 1 FROM coins WHERE owner_key = ?",
            params![entity.owner_key],
            |row| row.get(0),
        )?;
        let now = chrono::Utc::now().timestamp_millis();
        let d = &entity.display;

        let tx = conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO coins (owner_key, name, front_image, back_image, is_public, is_nft, priority, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                entity.owner_key,
                d.name,
                d.front_image,
                d.back_image,
                d.is_public as i32,
                d.is_nft as i32,
                rank,
                now,
                now
            ],
        )?;

        let rowid = tx.last_insert_rowid();
        // rolls back on drop
        let id = u32::try_from(rowid)
            .map_err(|_| DomainError::Internal(format!("coin id {} out of range", rowid)))?;
        tx.commit()?;
        log::debug!("created coin {} for {} at rank {}", id, entity.owner_key, rank);

        Ok(Coin {
            id,
            rank,
            owner_key: entity.owner_key.clone(),
            display: d.clone(),
            created_at: Some(now),
            updated_at: Some(now),
        })
    }

    async fn find_by_id(&self, id: u32) -> DomainResult<Option<Coin>> {
        let guard = self.conn.lock().await;
        let conn = open(&guard)?;

        let query = format!("SELECT {} FROM coins WHERE id = ?", COIN_COLUMNS);
        let coin = conn.query_row(&query, params![id], row_to_coin).optional()?;
        Ok(coin)
    }

    async fn list(&self) -> DomainResult<Vec<Coin>> {
        let guard = self.conn.lock().await;
        let conn = open(&guard)?;

        let query = format!("SELECT {} FROM coins ORDER BY owner_key, priority, id", COIN_COLUMNS);
        let mut stmt = conn.prepare(&query)?;
        let coins = stmt
            .query_map([], row_to_coin)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(coins)
    }

    /// Update display fields. Rank and owner are left untouched:
    /// rank changes go through batch rank updates only.
    async fn update(&self, entity: &Coin) -> DomainResult<Coin> {
        let guard = self.conn.lock().await;
        let conn = open(&guard)?;

        let now = chrono::Utc::now().timestamp_millis();
        let d = &entity.display;
        let changed = conn.execute(
            "UPDATE coins SET name = ?, front_image = ?, back_image = ?, is_public = ?, is_nft = ?, updated_at = ? WHERE id = ?",
            params![d.name, d.front_image, d.back_image, d.is_public as i32, d.is_nft as i32, now, entity.id],
        )?;
        if changed == 0 {
            return Err(DomainError::NotFound(format!("Coin {} not found", entity.id)));
        }

        let query = format!("SELECT {} FROM coins WHERE id = ?", COIN_COLUMNS);
        let stored = conn.query_row(&query, params![entity.id], row_to_coin)?;
        Ok(stored)
    }

    /// Delete a coin. Remaining ranks keep their gap until the next
    /// reorder or reindex.
    async fn delete(&self, id: u32) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = open(&guard)?;

        let changed = conn.execute("DELETE FROM coins WHERE id = ?", params![id])?;
        if changed == 0 {
            return Err(DomainError::NotFound(format!("Coin {} not found", id)));
        }
        Ok(())
    }
}

pub(super) fn open(guard: &Option<Connection>) -> DomainResult<&Connection> {
    guard
        .as_ref()
        .ok_or_else(|| DomainError::Internal("Database not initialized".to_string()))
}

pub(super) fn select_owner_coins(conn: &Connection, owner_key: &str, limit: Option<u32>) -> DomainResult<Vec<Coin>> {
    // LIMIT -1 means no limit in SQLite
    let limit = limit.map(i64::from).unwrap_or(-1);
    let query = format!(
        "SELECT {} FROM coins WHERE owner_key = ? ORDER BY priority ASC, id ASC LIMIT ?",
        COIN_COLUMNS
    );
    let mut stmt = conn.prepare(&query)?;
    let coins = stmt
        .query_map(params![owner_key, limit], row_to_coin)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(coins)
}

pub(super) fn count_owner_coins(conn: &Connection, owner_key: &str) -> DomainResult<u32> {
    let count: u32 = conn.query_row(
        "SELECT COUNT(*) FROM coins WHERE owner_key = ?",
        params![owner_key],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Convert a database row to Coin
pub(super) fn row_to_coin(row: &rusqlite::Row<'_>) -> rusqlite::Result<Coin> {
    Ok(Coin {
        id: row.get(0)?,
        owner_key: row.get(1)?,
        display: CoinDisplay {
            name: row.get(2)?,
            front_image: row.get(3)?,
            back_image: row.get(4)?,
            is_public: row.get::<_, i32>(5)? != 0,
            is_nft: row.get::<_, i32>(6)? != 0,
        },
        rank: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}
