//! Collection reordering
//!
//! Drag-and-drop priority reassignment with optimistic display, a single
//! batch commit, and rollback by re-fetch when the commit fails.

mod state;
mod ranking;
mod notify;
mod engine;
mod gesture;


pub use state::{CollectionView, ReorderState};
pub use ranking::{assign_dense_ranks, move_index, ranks_are_dense};
pub use notify::Notification;
pub use engine::{ReorderEngine, ReorderError, ReorderOutcome};
pub use gesture::{GestureBinding, PointerRelease};
