use std::{borrow::Borrow, collections::HashSet, fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{NestableError, PathError};
use crate::path::Path;

pub type Fields = Map<String, Value>;

/// Stable identifier of an item, unique across the whole tree.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ItemId(Arc<str>);

impl ItemId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// Reads an id out of a JSON value. Strings are taken as-is and numbers by
    /// their decimal text; anything else has no id.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::new(s)),
            Value::Number(n) => Some(Self::new(n.to_string())),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

impl From<ItemId> for String {
    fn from(value: ItemId) -> Self {
        value.0.to_string()
    }
}

impl Borrow<str> for ItemId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

/// Names of the JSON fields holding the id and the children of an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFields {
    pub id_field: String,
    pub children_field: String,
}

impl Default for ItemFields {
    fn default() -> Self {
        Self {
            id_field: "id".to_string(),
            children_field: "children".to_string(),
        }
    }
}

/// A tree item: an id, ordered children and the caller's payload fields.
///
/// Cloning is cheap. Children and fields are shared until one side is edited,
/// so a snapshot of a tree keeps every untouched subtree in common with the
/// live value.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    id: ItemId,
    fields: Arc<Fields>,
    pub(crate) children: Arc<Vec<Item>>,
}

impl Item {
    pub fn new(id: impl Into<ItemId>) -> Self {
        Self {
            id: id.into(),
            fields: Arc::default(),
            children: Arc::default(),
        }
    }

    pub fn child(mut self, child: Item) -> Self {
        Arc::make_mut(&mut self.children).push(child);
        self
    }

    pub fn children(mut self, children: impl Into<Vec<Item>>) -> Self {
        Arc::make_mut(&mut self.children).extend(children.into());
        self
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        Arc::make_mut(&mut self.fields).insert(key.into(), value.into());
        self
    }

    #[inline]
    pub fn id(&self) -> &ItemId {
        &self.id
    }

    #[inline]
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    #[inline]
    pub fn get_field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    #[inline]
    pub fn child_items(&self) -> &[Item] {
        &self.children
    }

    #[inline]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Whether `id` is this item or one of its descendants.
    pub fn subtree_contains(&self, id: &ItemId) -> bool {
        if self.id == *id {
            return true;
        }
        self.children.iter().any(|child| child.subtree_contains(id))
    }

    fn from_value(
        value: Value,
        fields: &ItemFields,
        path: &mut Path,
    ) -> Result<Self, NestableError> {
        let Value::Object(mut map) = value else {
            return Err(NestableError::InvalidItem(path.clone()));
        };
        let id = map
            .get(&fields.id_field)
            .and_then(ItemId::from_value)
            .ok_or_else(|| NestableError::MissingId(path.clone()))?;

        let children = match map.remove(&fields.children_field) {
            Some(Value::Array(children)) => {
                let mut items = Vec::with_capacity(children.len());
                for (ix, child) in children.into_iter().enumerate() {
                    path.push(ix);
                    items.push(Self::from_value(child, fields, path)?);
                    path.pop();
                }
                items
            }
            _ => Vec::new(),
        };

        Ok(Self {
            id,
            fields: Arc::new(map),
            children: Arc::new(children),
        })
    }

    /// Converts back to the caller's JSON shape. Payload fields are written
    /// verbatim, the children field always holds an array.
    pub fn to_value(&self, fields: &ItemFields) -> Value {
        let mut map = Fields::clone(&self.fields);
        if !map.contains_key(&fields.id_field) {
            map.insert(
                fields.id_field.clone(),
                Value::String(self.id.as_str().to_string()),
            );
        }
        map.insert(
            fields.children_field.clone(),
            Value::Array(
                self.children
                    .iter()
                    .map(|child| child.to_value(fields))
                    .collect(),
            ),
        );
        Value::Object(map)
    }
}

/// Guarantees every object in `items` carries a children array, recursively.
///
/// Returns fresh values; absent or non-array children become an empty array.
/// Non-object entries are copied through untouched.
pub fn normalize_values(items: &[Value], children_field: &str) -> Vec<Value> {
    items
        .iter()
        .map(|item| normalize_value(item, children_field))
        .collect()
}

fn normalize_value(item: &Value, children_field: &str) -> Value {
    let Value::Object(map) = item else {
        return item.clone();
    };

    let mut out = Fields::new();
    for (key, value) in map {
        if key != children_field {
            out.insert(key.clone(), value.clone());
        }
    }
    let children = match map.get(children_field) {
        Some(Value::Array(children)) => normalize_values(children, children_field),
        _ => Vec::new(),
    };
    out.insert(children_field.to_string(), Value::Array(children));
    Value::Object(out)
}

/// An ordered sequence of root items.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tree {
    roots: Arc<Vec<Item>>,
}

impl Tree {
    /// Builds a tree, rejecting duplicate ids anywhere in it.
    pub fn from_items(items: impl Into<Vec<Item>>) -> Result<Self, NestableError> {
        let roots: Vec<Item> = items.into();
        let mut seen = HashSet::new();
        check_unique(&roots, &mut seen)?;
        Ok(Self {
            roots: Arc::new(roots),
        })
    }

    /// Normalizes raw JSON items and converts them into a tree.
    pub fn from_values(items: &[Value], fields: &ItemFields) -> Result<Self, NestableError> {
        let normalized = normalize_values(items, &fields.children_field);
        let mut roots = Vec::with_capacity(normalized.len());
        let mut path = Path::new();
        for (ix, value) in normalized.into_iter().enumerate() {
            path.push(ix);
            roots.push(Item::from_value(value, fields, &mut path)?);
            path.pop();
        }
        Self::from_items(roots)
    }

    pub fn to_values(&self, fields: &ItemFields) -> Vec<Value> {
        self.roots.iter().map(|item| item.to_value(fields)).collect()
    }

    #[inline]
    pub fn roots(&self) -> &[Item] {
        &self.roots
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Number of items at every depth.
    pub fn len(&self) -> usize {
        fn count(items: &[Item]) -> usize {
            items.iter().map(|item| 1 + count(&item.children)).sum()
        }
        count(&self.roots)
    }

    /// All ids in pre-order.
    pub fn ids(&self) -> Vec<ItemId> {
        fn walk(items: &[Item], out: &mut Vec<ItemId>) {
            for item in items {
                out.push(item.id.clone());
                walk(&item.children, out);
            }
        }
        let mut out = Vec::new();
        walk(&self.roots, &mut out);
        out
    }

    pub fn get(&self, id: &ItemId) -> Option<&Item> {
        fn find<'a>(items: &'a [Item], id: &ItemId) -> Option<&'a Item> {
            for item in items {
                if item.id == *id {
                    return Some(item);
                }
                if let Some(found) = find(&item.children, id) {
                    return Some(found);
                }
            }
            None
        }
        find(&self.roots, id)
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.get(id).is_some()
    }

    /// Depth-first, pre-order search for `id`. `None` when it is not in the tree.
    pub fn path_of(&self, id: &ItemId) -> Option<Path> {
        fn find(items: &[Item], id: &ItemId) -> Option<Path> {
            for (ix, item) in items.iter().enumerate() {
                if item.id == *id {
                    return Some(vec![ix]);
                }
                if let Some(mut path) = find(&item.children, id) {
                    path.insert(0, ix);
                    return Some(path);
                }
            }
            None
        }
        find(&self.roots, id)
    }

    /// Resolves the item at `path`. An empty path or an index that does not
    /// resolve is an error, never a silent miss.
    pub fn item_at(&self, path: &[usize]) -> Result<&Item, PathError> {
        let Some((&last, parent)) = path.split_last() else {
            return Err(PathError::Empty);
        };
        let children = self.children_at(parent)?;
        children.get(last).ok_or(PathError::OutOfBounds {
            depth: parent.len(),
            index: last,
            len: children.len(),
        })
    }

    /// Children of the item at `parent`, or the roots for the empty path.
    pub fn children_at(&self, parent: &[usize]) -> Result<&[Item], PathError> {
        let mut children: &[Item] = &self.roots;
        for (depth, &ix) in parent.iter().enumerate() {
            let item = children.get(ix).ok_or(PathError::OutOfBounds {
                depth,
                index: ix,
                len: children.len(),
            })?;
            children = &item.children;
        }
        Ok(children)
    }

    /// Copy-on-write access to the children list at `parent`. Only the spine
    /// along `parent` is cloned when it is shared.
    pub(crate) fn children_mut_at(
        &mut self,
        parent: &[usize],
    ) -> Result<&mut Vec<Item>, PathError> {
        let mut children = Arc::make_mut(&mut self.roots);
        for (depth, &ix) in parent.iter().enumerate() {
            let len = children.len();
            let item = children.get_mut(ix).ok_or(PathError::OutOfBounds {
                depth,
                index: ix,
                len,
            })?;
            children = Arc::make_mut(&mut item.children);
        }
        Ok(children)
    }
}

fn check_unique(items: &[Item], seen: &mut HashSet<ItemId>) -> Result<(), NestableError> {
    for item in items {
        if !seen.insert(item.id.clone()) {
            return Err(NestableError::DuplicateId(item.id.clone()));
        }
        check_unique(&item.children, seen)?;
    }
    Ok(())
}
