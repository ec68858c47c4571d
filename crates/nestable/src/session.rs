use tracing::trace;

use crate::collapse::CollapseState;
use crate::item::{Item, ItemId, Tree};

/// Pointer position in host units (pixels, cells...).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pointer {
    pub x: f32,
    pub y: f32,
}

impl Pointer {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthShift {
    Indent,
    Outdent,
}

/// State of one drag gesture, from `begin_drag` until commit or cancel.
#[derive(Debug, Clone)]
pub struct DragSession {
    item: Item,
    snapshot: Tree,
    collapse_snapshot: CollapseState,
    dirty: bool,
    pointer: Pointer,
    last_x: f32,
    shift_x: f32,
}

impl DragSession {
    pub(crate) fn new(
        item: Item,
        snapshot: Tree,
        collapse_snapshot: CollapseState,
        pointer: Pointer,
    ) -> Self {
        Self {
            item,
            snapshot,
            collapse_snapshot,
            dirty: false,
            pointer,
            last_x: pointer.x,
            shift_x: 0.0,
        }
    }

    #[inline]
    pub fn item(&self) -> &Item {
        &self.item
    }

    #[inline]
    pub fn item_id(&self) -> &ItemId {
        self.item.id()
    }

    /// Whether any move has been applied since the drag began.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Where the floating copy of the dragged item should be drawn.
    #[inline]
    pub fn pointer(&self) -> Pointer {
        self.pointer
    }

    #[inline]
    pub fn shift_x(&self) -> f32 {
        self.shift_x
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn into_snapshots(self) -> (Tree, CollapseState) {
        (self.snapshot, self.collapse_snapshot)
    }

    /// Records a pointer move and reports a depth change once the horizontal
    /// travel in one direction passes `threshold`.
    ///
    /// Reversing direction restarts the count, and so does every reported
    /// shift. Repeating the same position is a no-op.
    pub(crate) fn track(&mut self, pointer: Pointer, threshold: f32) -> Option<DepthShift> {
        self.pointer = pointer;
        let diff_x = pointer.x - self.last_x;
        if (diff_x >= 0.0 && self.shift_x >= 0.0) || (diff_x <= 0.0 && self.shift_x <= 0.0) {
            self.shift_x += diff_x;
        } else {
            self.shift_x = 0.0;
        }
        self.last_x = pointer.x;
        trace!(x = pointer.x, shift_x = self.shift_x, "drag pointer");

        if self.shift_x.abs() <= threshold {
            return None;
        }
        let shift = if self.shift_x > 0.0 {
            DepthShift::Indent
        } else {
            DepthShift::Outdent
        };
        self.shift_x = 0.0;
        Some(shift)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> DragSession {
        DragSession::new(
            Item::new("A"),
            Tree::default(),
            CollapseState::default(),
            Pointer::new(100.0, 0.0),
        )
    }

    #[test]
    fn shift_fires_once_past_threshold() {
        let mut session = session();
        assert_eq!(session.track(Pointer::new(120.0, 0.0), 30.0), None);
        assert_eq!(session.track(Pointer::new(131.0, 5.0), 30.0), Some(DepthShift::Indent));
        assert_eq!(session.shift_x(), 0.0);
        assert_eq!(session.pointer(), Pointer::new(131.0, 5.0));

        assert_eq!(session.track(Pointer::new(110.0, 5.0), 30.0), None);
        assert_eq!(session.track(Pointer::new(100.0, 5.0), 30.0), Some(DepthShift::Outdent));
    }

    #[test]
    fn same_position_does_not_accumulate() {
        let mut session = session();
        session.track(Pointer::new(125.0, 0.0), 30.0);
        for _ in 0..10 {
            assert_eq!(session.track(Pointer::new(125.0, 0.0), 30.0), None);
        }
        assert_eq!(session.shift_x(), 25.0);
    }

    #[test]
    fn reversing_direction_resets_accumulator() {
        let mut session = session();
        session.track(Pointer::new(125.0, 0.0), 30.0);
        session.track(Pointer::new(120.0, 0.0), 30.0);
        assert_eq!(session.shift_x(), 0.0);
        assert_eq!(session.track(Pointer::new(145.0, 0.0), 30.0), None);
        assert_eq!(session.shift_x(), 25.0);
    }
}
