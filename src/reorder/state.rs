//! Reorder state machine states and the observable collection view.

use serde::Serialize;

use crate::domain::Coin;

/// Per-view state of the reorder engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ReorderState {
    /// Showing the last fetched or last committed order
    #[default]
    Idle,
    /// A drag gesture is in progress; nothing has been sent yet
    Dragging { source: usize },
    /// The optimistic order is shown and a batch update is in flight
    Committing,
    /// The batch update failed; the authoritative order is being re-fetched
    Reverting,
}

impl ReorderState {
    /// Whether a commit or revert is in flight
    pub fn is_busy(&self) -> bool {
        matches!(self, ReorderState::Committing | ReorderState::Reverting)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ReorderState::Idle => "idle",
            ReorderState::Dragging { .. } => "dragging",
            ReorderState::Committing => "committing",
            ReorderState::Reverting => "reverting",
        }
    }
}

/// What a renderer needs: the ordered coins and where the engine stands
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectionView {
    pub state: ReorderState,
    /// Coins in display order
    pub coins: Vec<Coin>,
    /// Total reported by the last fetch
    pub total: u32,
    /// False after a failed revert: the shown order may not match the store
    pub in_sync: bool,
}

impl CollectionView {
    pub fn ids(&self) -> Vec<u32> {
        self.coins.iter().map(|c| c.id).collect()
    }
}
