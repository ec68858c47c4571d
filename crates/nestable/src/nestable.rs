use std::{fmt, sync::Arc};

use serde_json::Value;
use tracing::{debug, trace};

use crate::collapse::{CollapseChange, CollapseState, CollapseTarget};
use crate::config::NestableConfig;
use crate::depth::fits_max_depth;
use crate::error::NestableError;
use crate::item::{Item, ItemId, Tree};
use crate::ops::Move;
use crate::path::{Path, parent_of};
use crate::planner::{MoveRequest, plan_move};
use crate::session::{DepthShift, DragSession, Pointer};

/// Arguments of the move confirmation hook.
#[derive(Debug, Clone, Copy)]
pub struct ConfirmMove<'a> {
    pub item: &'a Item,
    /// New parent of the item, `None` when it lands at the root.
    pub destination_parent: Option<&'a Item>,
}

/// Arguments of the drag veto hook.
#[derive(Debug, Clone, Copy)]
pub struct DragCandidate<'a> {
    pub item: &'a Item,
    /// Position among its siblings.
    pub index: usize,
    /// Zero for root items.
    pub depth: usize,
}

/// Reported when a drag that moved something is committed.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub items: Tree,
    pub drag_item: Item,
    pub target_path: Path,
    pub group: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Other,
}

pub type ConfirmMoveFn = Arc<dyn Fn(&ConfirmMove<'_>) -> bool + Send + Sync>;
pub type ChangeFn = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;
pub type DisableDragFn = Arc<dyn Fn(&DragCandidate<'_>) -> bool + Send + Sync>;
pub type DragStartFn = Arc<dyn Fn(&Item) + Send + Sync>;
pub type CollapseChangeFn = Arc<dyn Fn(&CollapseChange) + Send + Sync>;

/// A reorderable tree with collapse state and at most one drag in progress.
pub struct Nestable {
    config: NestableConfig,
    tree: Tree,
    collapse: CollapseState,
    drag: Option<DragSession>,
    confirm_move: Option<ConfirmMoveFn>,
    on_change: Option<ChangeFn>,
    disable_drag: Option<DisableDragFn>,
    on_drag_start: Option<DragStartFn>,
    on_collapse_change: Option<CollapseChangeFn>,
}

impl fmt::Debug for Nestable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Nestable")
            .field("config", &self.config)
            .field("tree", &self.tree)
            .field("collapse", &self.collapse)
            .field("drag", &self.drag)
            .finish_non_exhaustive()
    }
}

impl Nestable {
    pub fn new(config: NestableConfig) -> Self {
        let config = config.with_defaults();
        Self {
            collapse: CollapseState::new(config.collapsed_by_default),
            config,
            tree: Tree::default(),
            drag: None,
            confirm_move: None,
            on_change: None,
            disable_drag: None,
            on_drag_start: None,
            on_collapse_change: None,
        }
    }

    pub fn items(mut self, items: &[Value]) -> Result<Self, NestableError> {
        self.set_items(items)?;
        Ok(self)
    }

    pub fn with_tree(mut self, tree: Tree) -> Self {
        self.set_tree(tree);
        self
    }

    /// Veto hook consulted before every move; returning `false` leaves the
    /// tree as it is.
    pub fn confirm_move(
        mut self,
        confirm: impl Fn(&ConfirmMove<'_>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.confirm_move = Some(Arc::new(confirm));
        self
    }

    pub fn on_change(mut self, on_change: impl Fn(&ChangeEvent) + Send + Sync + 'static) -> Self {
        self.on_change = Some(Arc::new(on_change));
        self
    }

    /// Items for which the predicate returns `true` cannot be picked up.
    pub fn disable_drag(
        mut self,
        disable: impl Fn(&DragCandidate<'_>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.disable_drag = Some(Arc::new(disable));
        self
    }

    pub fn on_drag_start(mut self, on_drag_start: impl Fn(&Item) + Send + Sync + 'static) -> Self {
        self.on_drag_start = Some(Arc::new(on_drag_start));
        self
    }

    pub fn on_collapse_change(
        mut self,
        on_collapse_change: impl Fn(&CollapseChange) + Send + Sync + 'static,
    ) -> Self {
        self.on_collapse_change = Some(Arc::new(on_collapse_change));
        self
    }

    #[inline]
    pub fn config(&self) -> &NestableConfig {
        &self.config
    }

    #[inline]
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// The current tree in the caller's JSON shape.
    pub fn to_values(&self) -> Vec<Value> {
        self.tree.to_values(&self.config.item_fields())
    }

    #[inline]
    pub fn collapse_state(&self) -> &CollapseState {
        &self.collapse
    }

    #[inline]
    pub fn drag_session(&self) -> Option<&DragSession> {
        self.drag.as_ref()
    }

    #[inline]
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn is_collapsed(&self, id: &ItemId) -> bool {
        self.collapse.is_collapsed(id)
    }

    /// Replaces the tree from raw items. Any drag in progress is dropped and
    /// the collapse state starts over.
    pub fn set_items(&mut self, items: &[Value]) -> Result<(), NestableError> {
        let tree = Tree::from_values(items, &self.config.item_fields())?;
        self.set_tree(tree);
        Ok(())
    }

    pub fn set_tree(&mut self, tree: Tree) {
        if self.drag.take().is_some() {
            debug!(group = %self.config.group, "drag dropped by new items");
        }
        self.tree = tree;
        self.collapse = CollapseState::new(self.config.collapsed_by_default);
    }

    /// Replaces the configuration. Flipping the default collapse policy starts
    /// the collapse state over.
    pub fn set_config(&mut self, config: NestableConfig) {
        let config = config.with_defaults();
        let policy_changed = config.collapsed_by_default != self.config.collapsed_by_default;
        self.config = config;
        if policy_changed {
            self.set_collapse_state(CollapseState::new(self.config.collapsed_by_default));
        }
    }

    pub fn collapse(&mut self, target: &CollapseTarget) {
        let next = self.collapse.apply_target(&self.tree, target);
        self.set_collapse_state(next);
    }

    pub fn toggle_collapse(&mut self, id: &ItemId) -> Result<(), NestableError> {
        if !self.tree.contains(id) {
            return Err(NestableError::UnknownItem(id.clone()));
        }
        let next = self.collapse.toggled(id);
        self.set_collapse_state(next);
        Ok(())
    }

    /// Starts dragging `id`. Returns `Ok(false)` when the item may not be
    /// dragged. A drag already in progress is cancelled first.
    pub fn begin_drag(&mut self, id: &ItemId, pointer: Pointer) -> Result<bool, NestableError> {
        if self.drag.is_some() {
            debug!(group = %self.config.group, "new drag cancels the active one");
            self.cancel_drag()?;
        }

        let path = self
            .tree
            .path_of(id)
            .ok_or_else(|| NestableError::UnknownItem(id.clone()))?;
        let item = self.tree.item_at(&path)?.clone();

        if let Some(disable) = &self.disable_drag {
            let candidate = DragCandidate {
                item: &item,
                index: path.last().copied().unwrap_or_default(),
                depth: path.len() - 1,
            };
            if disable(&candidate) {
                trace!(group = %self.config.group, %id, "drag disabled");
                return Ok(false);
            }
        }

        debug!(group = %self.config.group, %id, from = ?path, "drag started");
        self.drag = Some(DragSession::new(
            item.clone(),
            self.tree.clone(),
            self.collapse.clone(),
            pointer,
        ));
        if let Some(on_drag_start) = &self.on_drag_start {
            on_drag_start(&item);
        }
        Ok(true)
    }

    /// Feeds a pointer position. Returns `true` when the tree changed through
    /// an indent or outdent.
    pub fn pointer_move(&mut self, pointer: Pointer) -> Result<bool, NestableError> {
        let threshold = self.config.drag_shift_threshold;
        let session = self.drag.as_mut().ok_or(NestableError::NoActiveDrag)?;
        match session.track(pointer, threshold) {
            Some(DepthShift::Indent) => self.indent(),
            Some(DepthShift::Outdent) => self.outdent(),
            None => Ok(false),
        }
    }

    /// Pointer entered the row of `id`. Returns `true` when the tree changed.
    pub fn hover(&mut self, id: &ItemId) -> Result<bool, NestableError> {
        let (source, item) = self.dragged()?;
        // Own row and own descendants are never drop targets.
        if item.subtree_contains(id) {
            return Ok(false);
        }
        let target = self
            .tree
            .path_of(id)
            .ok_or_else(|| NestableError::UnknownItem(id.clone()))?;

        // Leaving a parent empty closes it again when parents start closed.
        let mut collapse = None;
        if self.config.collapsed_by_default && source.len() > 1 {
            let parent = self.tree.item_at(parent_of(&source))?;
            if parent.child_items().len() == 1 {
                collapse = Some(self.collapse.with_collapsed(parent.id(), true));
            }
        }

        let request = MoveRequest {
            source,
            target,
            height: item.height(),
            max_depth: self.config.max_depth,
        };
        let state = &self.collapse;
        let planned = plan_move(&self.tree, &request, |item| state.is_collapsed(item.id()))?;
        let Some(real) = planned else {
            return Ok(false);
        };
        self.commit_move(Move::new(request.source, real, item), collapse)
    }

    /// Nests the dragged item as the last child of its previous sibling.
    pub fn indent(&mut self) -> Result<bool, NestableError> {
        let (source, item) = self.dragged()?;
        let Some((&index, parent)) = source.split_last() else {
            return Ok(false);
        };
        if index == 0 || !fits_max_depth(source.len() + 1, item.height(), self.config.max_depth)
        {
            return Ok(false);
        }

        let mut sibling_path = parent.to_vec();
        sibling_path.push(index - 1);
        let sibling = self.tree.item_at(&sibling_path)?;
        if sibling.has_children() && self.collapse.is_collapsed(sibling.id()) {
            return Ok(false);
        }

        // An empty sibling is opened so the item stays visible inside it.
        let collapse = (self.config.collapsed_by_default && !sibling.has_children())
            .then(|| self.collapse.with_collapsed(sibling.id(), false));
        let mut target = sibling_path;
        target.push(sibling.child_items().len());

        // Both the sibling and the parent precede the source, so the removal
        // leaves these paths valid as they are.
        self.commit_move(Move::new(source, target, item), collapse)
    }

    /// Moves the dragged item out of its parent, right after it. Only the
    /// last child of a parent can be outdented.
    pub fn outdent(&mut self) -> Result<bool, NestableError> {
        let (source, item) = self.dragged()?;
        if source.len() < 2 {
            return Ok(false);
        }
        let parent_path = parent_of(&source);
        let parent = self.tree.item_at(parent_path)?;
        let siblings = parent.child_items().len();
        if source[source.len() - 1] + 1 != siblings {
            return Ok(false);
        }

        let collapse = (self.config.collapsed_by_default && siblings == 1)
            .then(|| self.collapse.with_collapsed(parent.id(), true));
        let mut target = parent_path.to_vec();
        if let Some(last) = target.last_mut() {
            *last += 1;
        }

        self.commit_move(Move::new(source, target, item), collapse)
    }

    pub fn key_down(&mut self, key: Key) -> Result<bool, NestableError> {
        match key {
            Key::Escape if self.drag.is_some() => {
                self.cancel_drag()?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Commits the drag. Returns the change when anything moved; the
    /// `on_change` hook sees the same event.
    pub fn end_drag(&mut self) -> Result<Option<ChangeEvent>, NestableError> {
        let session = self.drag.take().ok_or(NestableError::NoActiveDrag)?;
        let id = session.item_id();
        if !session.is_dirty() {
            debug!(group = %self.config.group, %id, "drag ended without changes");
            return Ok(None);
        }

        let target_path = self
            .tree
            .path_of(id)
            .ok_or_else(|| NestableError::UnknownItem(id.clone()))?;
        let event = ChangeEvent {
            items: self.tree.clone(),
            drag_item: self.tree.item_at(&target_path)?.clone(),
            target_path,
            group: self.config.group.clone(),
        };
        debug!(group = %self.config.group, %id, to = ?event.target_path, "drag committed");

        if let Some(on_change) = &self.on_change {
            on_change(&event);
        }
        Ok(Some(event))
    }

    /// Abandons the drag and restores the tree and collapse state it started
    /// from. No change is reported.
    pub fn cancel_drag(&mut self) -> Result<(), NestableError> {
        let session = self.drag.take().ok_or(NestableError::NoActiveDrag)?;
        debug!(group = %self.config.group, id = %session.item_id(), "drag cancelled");
        let (tree, collapse) = session.into_snapshots();
        self.tree = tree;
        self.set_collapse_state(collapse);
        Ok(())
    }

    fn dragged(&self) -> Result<(Path, Item), NestableError> {
        let session = self.drag.as_ref().ok_or(NestableError::NoActiveDrag)?;
        let id = session.item_id();
        let path = self
            .tree
            .path_of(id)
            .ok_or_else(|| NestableError::UnknownItem(id.clone()))?;
        let item = self.tree.item_at(&path)?.clone();
        Ok((path, item))
    }

    /// Confirms and applies one step of the drag. `mv.to` is in post-removal
    /// coordinates. `collapse` is stored only if the move goes through.
    fn commit_move(
        &mut self,
        mv: Move,
        collapse: Option<CollapseState>,
    ) -> Result<bool, NestableError> {
        let [remove, insert] = mv.ops();
        let mut next = self.tree.clone();
        next.apply(remove)?;

        if let Some(confirm) = &self.confirm_move {
            let destination_parent = match parent_of(&mv.to) {
                [] => None,
                parent => Some(next.item_at(parent)?),
            };
            let args = ConfirmMove {
                item: &mv.item,
                destination_parent,
            };
            if !confirm(&args) {
                trace!(
                    group = %self.config.group,
                    id = %mv.item.id(),
                    to = ?mv.to,
                    "move rejected"
                );
                return Ok(false);
            }
        }

        next.apply(insert)?;
        debug!(
            group = %self.config.group,
            id = %mv.item.id(),
            from = ?mv.from,
            to = ?mv.to,
            "item moved"
        );
        self.tree = next;
        if let Some(collapse) = collapse {
            self.set_collapse_state(collapse);
        }
        if let Some(session) = self.drag.as_mut() {
            session.mark_dirty();
        }
        Ok(true)
    }

    fn set_collapse_state(&mut self, next: CollapseState) {
        if next == self.collapse {
            return;
        }
        self.collapse = next;
        let change = self.collapse.change(&self.tree);
        debug!(
            group = %self.config.group,
            open = change.open_ids.len(),
            closed = change.closed_ids.len(),
            "collapse state changed"
        );
        if let Some(on_collapse_change) = &self.on_collapse_change {
            on_collapse_change(&change);
        }
    }
}
