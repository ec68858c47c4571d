pub type Path = Vec<usize>;

/// The parent part of `path`; empty for root items.
pub fn parent_of(path: &[usize]) -> &[usize] {
    match path.split_last() {
        Some((_, parent)) => parent,
        None => &[],
    }
}

/// Maps `path`, taken before the item at `removed` is taken out, to where the
/// same position sits afterwards.
///
/// Only paths running through a later sibling of the removed item move: the
/// index at the removed item's level drops by one.
pub fn shift_after_removal(removed: &[usize], path: &[usize]) -> Path {
    let mut path = path.to_vec();
    let Some((&removed_ix, parent)) = removed.split_last() else {
        return path;
    };
    let level = parent.len();
    if path.len() > level && path.starts_with(parent) && path[level] > removed_ix {
        path[level] -= 1;
    }
    path
}
