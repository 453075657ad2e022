//! Collection Reorder Engine
//!
//! Holds one owner's ordered coins, applies drag results optimistically and
//! persists them with a single batch rank update. A failed update is rolled
//! back by re-fetching the stored order.
//!
//! Idle -> Dragging -> Committing -> Idle
//!                               \-> Reverting -> Idle

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use crate::config::ReorderConfig;
use crate::domain::{BatchReply, CoinPage, DomainError, RankUpdate};
use crate::repository::CollectionStore;
use super::notify::Notification;
use super::ranking::{assign_dense_ranks, move_index};
use super::state::{CollectionView, ReorderState};

const NOTIFICATION_BUFFER: usize = 16;

/// Why a store round trip did not succeed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReorderError {
    #[error("batch update rejected: {0}")]
    Rejected(String),
    #[error("unrecognised batch update reply: {0:?}")]
    Malformed(String),
    #[error("no reply within {0:?}")]
    TimedOut(Duration),
    #[error("another reorder is in progress")]
    Busy,
    #[error(transparent)]
    Store(#[from] DomainError),
}

/// Result of ending a drag. Failures are reported here, never as `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReorderOutcome {
    /// No drag was in progress
    Ignored,
    /// The drag ended without a usable destination; nothing changed
    Cancelled,
    /// The new order is stored
    Committed,
    /// The update failed and the stored order was re-fetched
    Restored { error: ReorderError },
    /// The update failed and so did the re-fetch; the optimistic order is still shown
    OutOfSync { error: ReorderError, fetch_error: ReorderError },
}

enum DropPlan {
    Ignored,
    Cancelled,
    Commit(Vec<RankUpdate>),
}

/// Optimistic drag-reorder state machine for one collection
pub struct ReorderEngine<S: CollectionStore + ?Sized> {
    owner_key: String,
    store: Arc<S>,
    config: ReorderConfig,
    view: watch::Sender<CollectionView>,
    notifications: broadcast::Sender<Notification>,
}

impl<S: CollectionStore + ?Sized> ReorderEngine<S> {
    pub fn new(owner_key: impl Into<String>, store: Arc<S>, config: ReorderConfig) -> Self {
        let (view, _) = watch::channel(CollectionView::default());
        let (notifications, _) = broadcast::channel(NOTIFICATION_BUFFER);
        Self {
            owner_key: owner_key.into(),
            store,
            config,
            view,
            notifications,
        }
    }

    pub fn owner_key(&self) -> &str {
        &self.owner_key
    }

    pub fn state(&self) -> ReorderState {
        self.view.borrow().state
    }

    /// Snapshot of the current view
    pub fn view(&self) -> CollectionView {
        self.view.borrow().clone()
    }

    /// Observe every view change (order, state, sync flag)
    pub fn subscribe(&self) -> watch::Receiver<CollectionView> {
        self.view.subscribe()
    }

    /// Receive failure notifications emitted after this call
    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    /// Fetch the stored order and show it. Only allowed while idle.
    pub async fn load(&self) -> Result<(), ReorderError> {
        if self.state() != ReorderState::Idle {
            return Err(ReorderError::Busy);
        }

        let page = self.fetch().await?;
        let count = page.coins.len();

        let applied = self.view.send_if_modified(|view| {
            if view.state != ReorderState::Idle {
                return false;
            }
            view.coins = page.coins;
            view.total = page.total;
            view.in_sync = true;
            true
        });
        if !applied {
            return Err(ReorderError::Busy);
        }

        info!(owner = %self.owner_key, coins = count, "collection loaded");
        Ok(())
    }

    /// Start dragging the coin at `source`.
    ///
    /// Ignored unless idle and `source` is a valid index. Returns whether the drag started.
    pub fn begin_drag(&self, source: usize) -> bool {
        let started = self.view.send_if_modified(|view| {
            if view.state != ReorderState::Idle || source >= view.coins.len() {
                return false;
            }
            view.state = ReorderState::Dragging { source };
            true
        });

        if started {
            debug!(owner = %self.owner_key, source, "drag started");
        } else {
            debug!(owner = %self.owner_key, source, state = self.state().name(), "drag start ignored");
        }
        started
    }

    /// Finish the current drag.
    ///
    /// `None`, an out-of-range destination, or a collection with fewer than
    /// two coins cancels without touching the store. Otherwise the coin is
    /// moved, every coin is re-ranked `1..=N`, the new order is published,
    /// and the full rank list is sent in one batch.
    pub async fn end_drag(&self, destination: Option<usize>) -> ReorderOutcome {
        let mut plan = DropPlan::Ignored;
        self.view.send_if_modified(|view| {
            let ReorderState::Dragging { source } = view.state else {
                return false;
            };
            let len = view.coins.len();
            if let Some(dest) = destination.filter(|&d| len > 1 && d < len) {
                if move_index(&mut view.coins, source, dest) {
                    plan = DropPlan::Commit(assign_dense_ranks(&mut view.coins));
                    view.state = ReorderState::Committing;
                    return true;
                }
            }
            plan = DropPlan::Cancelled;
            view.state = ReorderState::Idle;
            true
        });

        let updates = match plan {
            DropPlan::Ignored => return ReorderOutcome::Ignored,
            DropPlan::Cancelled => {
                debug!(owner = %self.owner_key, ?destination, "drag cancelled");
                return ReorderOutcome::Cancelled;
            }
            DropPlan::Commit(updates) => updates,
        };

        match self.commit(&updates).await {
            Ok(()) => {
                self.view.send_modify(|view| {
                    view.state = ReorderState::Idle;
                    view.in_sync = true;
                });
                info!(owner = %self.owner_key, coins = updates.len(), "reorder committed");
                ReorderOutcome::Committed
            }
            Err(error) => {
                warn!(owner = %self.owner_key, %error, "reorder failed, restoring stored order");
                self.view.send_modify(|view| view.state = ReorderState::Reverting);

                match self.revert().await {
                    Ok(()) => {
                        self.notify(Notification::Restored {
                            owner_key: self.owner_key.clone(),
                            reason: error.to_string(),
                        });
                        ReorderOutcome::Restored { error }
                    }
                    Err(fetch_error) => {
                        warn!(owner = %self.owner_key, error = %fetch_error, "restore failed, view is out of sync");
                        self.view.send_modify(|view| {
                            view.state = ReorderState::Idle;
                            view.in_sync = false;
                        });
                        self.notify(Notification::OutOfSync {
                            owner_key: self.owner_key.clone(),
                            reason: format!("{}; {}", error, fetch_error),
                        });
                        ReorderOutcome::OutOfSync { error, fetch_error }
                    }
                }
            }
        }
    }

    /// Send the full rank list. Only a `success` reply counts.
    async fn commit(&self, updates: &[RankUpdate]) -> Result<(), ReorderError> {
        let reply = self
            .with_timeout(self.store.batch_update_ranks(updates))
            .await??;
        match reply {
            BatchReply::Success => Ok(()),
            BatchReply::Rejected(msg) => Err(ReorderError::Rejected(msg)),
            BatchReply::Malformed(raw) => Err(ReorderError::Malformed(raw)),
        }
    }

    /// Replace the optimistic order with the stored one and return to idle
    async fn revert(&self) -> Result<(), ReorderError> {
        let page = self.fetch().await?;
        self.view.send_modify(|view| {
            view.coins = page.coins;
            view.total = page.total;
            view.state = ReorderState::Idle;
            view.in_sync = true;
        });
        Ok(())
    }

    async fn fetch(&self) -> Result<CoinPage, ReorderError> {
        let page = self
            .with_timeout(self.store.fetch_ordered_items(&self.owner_key))
            .await??;
        Ok(page)
    }

    async fn with_timeout<T, F>(&self, fut: F) -> Result<T, ReorderError>
    where
        F: Future<Output = T>,
    {
        let limit = self.config.commit_timeout();
        tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| ReorderError::TimedOut(limit))
    }

    fn notify(&self, notification: Notification) {
        // no subscribers is fine
        let _ = self.notifications.send(notification);
    }
}
