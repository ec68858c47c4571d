use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::item::{Item, ItemId, Tree};

/// What `collapse` should leave collapsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollapseTarget {
    All,
    None,
    Ids(Vec<ItemId>),
}

/// Effective expanded and collapsed parents after a collapse change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollapseChange {
    pub open_ids: Vec<ItemId>,
    pub closed_ids: Vec<ItemId>,
}

/// Ids whose subtree visibility differs from the default policy.
///
/// With `collapsed_by_default == false` the set lists collapsed items; with
/// `true` it lists expanded ones. All operations return a new value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollapseState {
    collapsed_by_default: bool,
    ids: HashSet<ItemId>,
}

impl CollapseState {
    pub fn new(collapsed_by_default: bool) -> Self {
        Self {
            collapsed_by_default,
            ids: HashSet::new(),
        }
    }

    pub fn with_ids(collapsed_by_default: bool, ids: impl IntoIterator<Item = ItemId>) -> Self {
        Self {
            collapsed_by_default,
            ids: ids.into_iter().collect(),
        }
    }

    #[inline]
    pub fn collapsed_by_default(&self) -> bool {
        self.collapsed_by_default
    }

    #[inline]
    pub fn ids(&self) -> &HashSet<ItemId> {
        &self.ids
    }

    #[inline]
    pub fn is_collapsed(&self, id: &ItemId) -> bool {
        self.ids.contains(id) ^ self.collapsed_by_default
    }

    pub fn toggled(&self, id: &ItemId) -> Self {
        let mut next = self.clone();
        if !next.ids.remove(id) {
            next.ids.insert(id.clone());
        }
        next
    }

    /// Sets the effective state of one id, whatever its current membership.
    pub fn with_collapsed(&self, id: &ItemId, collapsed: bool) -> Self {
        if self.is_collapsed(id) == collapsed {
            return self.clone();
        }
        self.toggled(id)
    }

    /// Uniformly collapses (`collapse_all`) or expands every parent in `tree`.
    ///
    /// Expanding everything under the collapsed-by-default policy lists every
    /// id, leaves included, so no item reports as collapsed afterwards.
    pub fn set_all(&self, tree: &Tree, collapse_all: bool) -> Self {
        let ids = match (collapse_all, self.collapsed_by_default) {
            (true, true) | (false, false) => Vec::new(),
            (true, false) => parent_ids(tree),
            (false, true) => tree.ids(),
        };
        Self::with_ids(self.collapsed_by_default, ids)
    }

    /// Leaves exactly the parents listed in `collapsed` collapsed and every
    /// other parent expanded.
    pub fn set_exactly(&self, collapsed: &[ItemId], tree: &Tree) -> Self {
        let wanted: HashSet<&ItemId> = collapsed.iter().collect();
        let ids = parent_ids(tree)
            .into_iter()
            .filter(|id| wanted.contains(id) ^ self.collapsed_by_default);
        Self::with_ids(self.collapsed_by_default, ids)
    }

    pub fn apply_target(&self, tree: &Tree, target: &CollapseTarget) -> Self {
        match target {
            CollapseTarget::All => self.set_all(tree, true),
            CollapseTarget::None => self.set_all(tree, false),
            CollapseTarget::Ids(ids) => self.set_exactly(ids, tree),
        }
    }

    /// Parents currently shown expanded, in pre-order.
    pub fn open_ids(&self, tree: &Tree) -> Vec<ItemId> {
        parent_ids(tree)
            .into_iter()
            .filter(|id| !self.is_collapsed(id))
            .collect()
    }

    /// Parents currently shown collapsed, in pre-order.
    pub fn closed_ids(&self, tree: &Tree) -> Vec<ItemId> {
        parent_ids(tree)
            .into_iter()
            .filter(|id| self.is_collapsed(id))
            .collect()
    }

    pub fn change(&self, tree: &Tree) -> CollapseChange {
        CollapseChange {
            open_ids: self.open_ids(tree),
            closed_ids: self.closed_ids(tree),
        }
    }
}

/// Ids of every item with at least one child, in pre-order.
pub fn parent_ids(tree: &Tree) -> Vec<ItemId> {
    fn walk(items: &[Item], out: &mut Vec<ItemId>) {
        for item in items {
            if item.has_children() {
                out.push(item.id().clone());
            }
            walk(item.child_items(), out);
        }
    }
    let mut out = Vec::new();
    walk(tree.roots(), &mut out);
    out
}
