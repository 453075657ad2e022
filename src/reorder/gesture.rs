//! Pointer gesture binding
//!
//! Feeds raw pointer events through a [`DragTracker`] and turns drag start
//! and drop into `begin_drag` / `end_drag` on the engine.

use std::sync::Arc;

use drag_gesture::{DragTracker, GestureEnd};

use crate::repository::CollectionStore;
use super::engine::{ReorderEngine, ReorderOutcome};

/// What the host should do after a pointer-up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerRelease {
    /// Nothing was pressed
    None,
    /// A plain click on the coin at `index` (open details, etc.)
    Click { index: usize },
    /// A drop was handed to the engine
    Reordered(ReorderOutcome),
}

/// One gallery's pointer handling, bound to its engine
pub struct GestureBinding<S: CollectionStore + ?Sized> {
    engine: Arc<ReorderEngine<S>>,
    tracker: DragTracker,
}

impl<S: CollectionStore + ?Sized> GestureBinding<S> {
    pub fn new(engine: Arc<ReorderEngine<S>>) -> Self {
        Self::with_tracker(engine, DragTracker::new())
    }

    pub fn with_tracker(engine: Arc<ReorderEngine<S>>, tracker: DragTracker) -> Self {
        Self { engine, tracker }
    }

    pub fn engine(&self) -> &Arc<ReorderEngine<S>> {
        &self.engine
    }

    /// Index currently being dragged
    pub fn dragging(&self) -> Option<usize> {
        self.tracker.dragging()
    }

    /// Press on the coin at `index`; ignored while a commit is in flight
    pub fn pointer_down(&mut self, index: usize, button: i16, x: i32, y: i32) -> bool {
        if self.engine.state().is_busy() {
            return false;
        }
        self.tracker.pointer_down(index, button, x, y)
    }

    /// Returns true when this movement started a drag the engine accepted
    pub fn pointer_move(&mut self, x: i32, y: i32) -> bool {
        let Some(source) = self.tracker.pointer_move(x, y) else {
            return false;
        };
        if self.engine.begin_drag(source) {
            return true;
        }
        // engine refused (busy or stale index): drop the gesture
        self.tracker.cancel();
        false
    }

    pub fn enter_slot(&mut self, index: usize) {
        self.tracker.enter_slot(index);
    }

    pub fn leave_slot(&mut self) {
        self.tracker.leave_slot();
    }

    pub async fn pointer_up(&mut self) -> PointerRelease {
        match self.tracker.pointer_up() {
            GestureEnd::None => PointerRelease::None,
            GestureEnd::Click { index } => PointerRelease::Click { index },
            GestureEnd::Drop { destination, .. } => {
                PointerRelease::Reordered(self.engine.end_drag(destination).await)
            }
        }
    }

    /// Whether the click event now arriving is the tail of a drop
    pub fn suppress_click(&mut self) -> bool {
        self.tracker.take_just_ended()
    }
}
