//! User-facing notifications emitted by the reorder engine.

use serde::Serialize;

/// A transient message for the person rearranging their collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    /// The new order was not saved and the stored order is shown again
    Restored { owner_key: String, reason: String },
    /// The new order was not saved and the stored order could not be reloaded
    OutOfSync { owner_key: String, reason: String },
}

impl Notification {
    pub fn message(&self) -> &'static str {
        match self {
            Notification::Restored { .. } => "Your new order failed to save; it has been restored.",
            Notification::OutOfSync { .. } => {
                "Your new order failed to save and the saved order could not be reloaded. The collection may be out of sync."
            }
        }
    }

    pub fn reason(&self) -> &str {
        match self {
            Notification::Restored { reason, .. } | Notification::OutOfSync { reason, .. } => reason,
        }
    }
}
