use crate::error::PathError;
use crate::item::{Item, Tree};
use crate::path::Path;

/// A single structural edit addressed by path.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    RemoveNode { path: Path },
    InsertNode { path: Path, item: Item },
}

/// Relocation of one item: removal at `from`, then insertion at `to`.
///
/// `to` is expressed in the coordinates of the tree after the removal.
#[derive(Debug, Clone, PartialEq)]
pub struct Move {
    pub from: Path,
    pub to: Path,
    pub item: Item,
}

impl Move {
    pub fn new(from: Path, to: Path, item: Item) -> Self {
        Self { from, to, item }
    }

    pub fn ops(&self) -> [Op; 2] {
        [
            Op::RemoveNode {
                path: self.from.clone(),
            },
            Op::InsertNode {
                path: self.to.clone(),
                item: self.item.clone(),
            },
        ]
    }

    /// Applies both edits to a copy of `tree`. `tree` itself is untouched.
    pub fn apply_to(&self, tree: &Tree) -> Result<Tree, PathError> {
        let mut next = tree.clone();
        for op in self.ops() {
            next.apply(op)?;
        }
        Ok(next)
    }
}

impl Tree {
    /// Applies `op` in place and returns its inverse.
    pub fn apply(&mut self, op: Op) -> Result<Op, PathError> {
        match op {
            Op::RemoveNode { path } => {
                let item = self.remove(&path)?;
                Ok(Op::InsertNode { path, item })
            }
            Op::InsertNode { path, item } => {
                self.insert(&path, item)?;
                Ok(Op::RemoveNode { path })
            }
        }
    }

    /// Takes out exactly the item at `path`.
    pub fn remove(&mut self, path: &[usize]) -> Result<Item, PathError> {
        // Validate first so a bad path never unshares anything.
        self.item_at(path)?;
        let Some((&index, parent)) = path.split_last() else {
            return Err(PathError::Empty);
        };
        let children = self.children_mut_at(parent)?;
        Ok(children.remove(index))
    }

    /// Splices `item` in at `path`, shifting later siblings. The index may
    /// equal the sibling count to append.
    pub fn insert(&mut self, path: &[usize], item: Item) -> Result<(), PathError> {
        let Some((&index, parent)) = path.split_last() else {
            return Err(PathError::Empty);
        };
        let len = self.children_at(parent)?.len();
        if index > len {
            return Err(PathError::OutOfBounds {
                depth: parent.len(),
                index,
                len,
            });
        }
        let children = self.children_mut_at(parent)?;
        children.insert(index, item);
        Ok(())
    }

    pub fn with_removed(&self, path: &[usize]) -> Result<(Tree, Item), PathError> {
        let mut next = self.clone();
        let item = next.remove(path)?;
        Ok((next, item))
    }

    pub fn with_inserted(&self, path: &[usize], item: Item) -> Result<Tree, PathError> {
        let mut next = self.clone();
        next.insert(path, item)?;
        Ok(next)
    }
}
