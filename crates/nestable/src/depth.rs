use crate::item::{Item, Tree};

impl Item {
    /// Number of levels in the subtree rooted here; a leaf has height 1.
    pub fn height(&self) -> usize {
        1 + self.children.iter().map(Item::height).max().unwrap_or(0)
    }
}

impl Tree {
    /// Deepest level in use, 0 for an empty tree.
    pub fn height(&self) -> usize {
        self.roots().iter().map(Item::height).max().unwrap_or(0)
    }
}

/// Whether a subtree of `height` levels placed at `depth` (its path length)
/// stays within `max_depth`.
#[inline]
pub fn fits_max_depth(depth: usize, height: usize, max_depth: usize) -> bool {
    depth + height.saturating_sub(1) <= max_depth
}
