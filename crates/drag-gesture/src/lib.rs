//! Drag Gesture Tracking
//!
//! Simple drag-and-drop for reorderable lists driven by raw pointer events.
//! Uses a movement threshold to distinguish click from drag.
//! Rendering-agnostic: the host forwards pointer down/move/up and
//! slot enter/leave events and acts on the returned results.

/// Movement threshold in pixels to start dragging
pub const DRAG_THRESHOLD_PX: i32 = 5;

/// Primary (left) pointer button
pub const PRIMARY_BUTTON: i16 = 0;

/// How a pointer-up ended the gesture
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureEnd {
    /// No press was recorded
    None,
    /// Pressed and released without passing the threshold
    Click { index: usize },
    /// A drag finished; `destination` is the hovered slot, if any
    Drop { source: usize, destination: Option<usize> },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Pending {
    index: usize,
    start_x: i32,
    start_y: i32,
}

/// Gesture state for one list
#[derive(Clone, Debug)]
pub struct DragTracker {
    threshold: i32,
    /// Pressed but not yet dragging
    pending: Option<Pending>,
    dragging: Option<usize>,
    hovered: Option<usize>,
    /// Set when a drag ends so the click that follows can be swallowed
    just_ended: bool,
}

impl Default for DragTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl DragTracker {
    pub fn new() -> Self {
        Self::with_threshold(DRAG_THRESHOLD_PX)
    }

    pub fn with_threshold(threshold: i32) -> Self {
        Self {
            threshold: threshold.max(0),
            pending: None,
            dragging: None,
            hovered: None,
            just_ended: false,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging.is_some()
    }

    /// Index being dragged
    pub fn dragging(&self) -> Option<usize> {
        self.dragging
    }

    /// Slot currently under the pointer during a drag
    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    /// Record a press on the item at `index`. Only the primary button arms a drag;
    /// presses on inner controls should not be forwarded.
    pub fn pointer_down(&mut self, index: usize, button: i16, x: i32, y: i32) -> bool {
        if button != PRIMARY_BUTTON || self.dragging.is_some() {
            return false;
        }
        self.pending = Some(Pending { index, start_x: x, start_y: y });
        true
    }

    /// Track movement. Returns the source index exactly once, when the
    /// pointer first moves beyond the threshold.
    pub fn pointer_move(&mut self, x: i32, y: i32) -> Option<usize> {
        let pending = self.pending?;
        if self.dragging.is_some() {
            return None;
        }

        let dx = (x - pending.start_x).abs();
        let dy = (y - pending.start_y).abs();
        if dx > self.threshold || dy > self.threshold {
            self.dragging = Some(pending.index);
            log::trace!("drag started at index {}", pending.index);
            return Some(pending.index);
        }
        None
    }

    /// The pointer entered the slot at `index` (the dragged item's own slot included)
    pub fn enter_slot(&mut self, index: usize) {
        if self.dragging.is_some() {
            self.hovered = Some(index);
        }
    }

    /// The pointer left the hovered slot
    pub fn leave_slot(&mut self) {
        if self.dragging.is_some() {
            self.hovered = None;
        }
    }

    /// Finish the gesture
    pub fn pointer_up(&mut self) -> GestureEnd {
        let pending = self.pending.take();
        let dragging = self.dragging.take();
        let hovered = self.hovered.take();

        match (dragging, pending) {
            (Some(source), _) => {
                self.just_ended = true;
                log::trace!("drop from {} onto {:?}", source, hovered);
                GestureEnd::Drop { source, destination: hovered }
            }
            (None, Some(p)) => GestureEnd::Click { index: p.index },
            (None, None) => GestureEnd::None,
        }
    }

    /// Abandon any pending or active drag without producing a drop
    pub fn cancel(&mut self) {
        self.just_ended = self.dragging.is_some();
        self.pending = None;
        self.dragging = None;
        self.hovered = None;
    }

    /// Whether a drag just ended; clears the flag.
    /// Hosts call this from their click handler to ignore the click a drop produces.
    pub fn take_just_ended(&mut self) -> bool {
        std::mem::take(&mut self.just_ended)
    }
}
