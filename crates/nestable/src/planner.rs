use std::cmp::Ordering;

use tracing::trace;

use crate::depth::fits_max_depth;
use crate::error::PathError;
use crate::item::{Item, Tree};
use crate::path::{Path, shift_after_removal};

/// One drag step: the dragged item sits at `source`, the pointer is over
/// `target` (both in the coordinates of the current tree).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRequest {
    pub source: Path,
    pub target: Path,
    /// Height of the dragged subtree.
    pub height: usize,
    pub max_depth: usize,
}

/// Computes where the dragged item should be inserted once it has been
/// removed from `source`.
///
/// `target` may also name a free slot, one past the last child of an item.
/// `Ok(None)` means the step is a no-op: the target lies inside the dragged
/// subtree, depth clamping ran out of levels, or the item would land where it
/// already is. Paths that do not resolve in `tree` are errors.
pub fn plan_move(
    tree: &Tree,
    request: &MoveRequest,
    is_collapsed: impl Fn(&Item) -> bool,
) -> Result<Option<Path>, PathError> {
    let MoveRequest {
        source,
        target,
        height,
        max_depth,
    } = request;
    tree.item_at(source)?;
    check_slot(tree, target)?;

    if target.starts_with(source) {
        return Ok(None);
    }

    let real = real_target_path(
        tree,
        source,
        target.clone(),
        *height,
        *max_depth,
        &is_collapsed,
    )?;
    trace!(from = ?source, hovered = ?target, to = ?real, "planned move");
    Ok(real.filter(|real| !real.is_empty() && real != source))
}

fn real_target_path(
    tree: &Tree,
    source: &[usize],
    mut target: Path,
    height: usize,
    max_depth: usize,
    is_collapsed: &dyn Fn(&Item) -> bool,
) -> Result<Option<Path>, PathError> {
    if target.is_empty() {
        return Ok(None);
    }

    match target.len().cmp(&source.len()) {
        Ordering::Greater => {
            // Too deep to become a child here: settle for a sibling one level up.
            if !fits_max_depth(target.len(), height, max_depth) {
                target.pop();
                return real_target_path(tree, source, target, height, max_depth, is_collapsed);
            }
            if tree.item_at(&target).is_err() {
                // A free slot has no hovered item to land after.
                return Ok(Some(shift_after_removal(source, &target)));
            }
            Ok(Some(shift_into_depth(source, &target)))
        }
        Ordering::Equal => {
            // A higher index than the source's onto an expanded parent drops in
            // as its first child.
            let hovered = match target.split_last() {
                Some((&ix, parent)) => tree.children_at(parent)?.get(ix),
                None => None,
            };
            if target.last() > source.last()
                && let Some(hovered) = hovered
                && hovered.has_children()
                && !is_collapsed(hovered)
                && fits_max_depth(target.len() + 1, height, max_depth)
            {
                let mut first_child = shift_after_removal(source, &target);
                first_child.push(0);
                return Ok(Some(first_child));
            }
            Ok(Some(target))
        }
        Ordering::Less => Ok(Some(target)),
    }
}

fn check_slot(tree: &Tree, path: &[usize]) -> Result<(), PathError> {
    let Some((&index, parent)) = path.split_last() else {
        return Err(PathError::Empty);
    };
    let len = tree.children_at(parent)?.len();
    if index > len {
        return Err(PathError::OutOfBounds {
            depth: parent.len(),
            index,
            len,
        });
    }
    Ok(())
}

/// A deeper target past the source's own position moves up by one at the
/// source's level; it then lands after the hovered item rather than before.
fn shift_into_depth(source: &[usize], target: &[usize]) -> Path {
    let mut shifted = shift_after_removal(source, target);
    if shifted != target
        && let Some(last) = shifted.last_mut()
    {
        *last += 1;
    }
    shifted
}
