use serde::{Deserialize, Serialize};

use crate::item::ItemFields;

const DEFAULT_MAX_DEPTH: usize = 10;
const DEFAULT_DRAG_SHIFT_THRESHOLD: f32 = 30.0;
const DEFAULT_GROUP: &str = "nestable";

fn default_id_field() -> String {
    "id".to_string()
}

fn default_children_field() -> String {
    "children".to_string()
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_drag_shift_threshold() -> f32 {
    DEFAULT_DRAG_SHIFT_THRESHOLD
}

fn default_group() -> String {
    DEFAULT_GROUP.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestableConfig {
    #[serde(default = "default_id_field")]
    pub id_field: String,
    #[serde(default = "default_children_field")]
    pub children_field: String,
    /// Deepest level any item may end up at after a move.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default)]
    pub collapsed_by_default: bool,
    /// Horizontal pointer travel that triggers one indent or outdent.
    #[serde(default = "default_drag_shift_threshold")]
    pub drag_shift_threshold: f32,
    /// Scope name for this instance, reported with every change.
    #[serde(default = "default_group")]
    pub group: String,
}

impl Default for NestableConfig {
    fn default() -> Self {
        Self {
            id_field: default_id_field(),
            children_field: default_children_field(),
            max_depth: DEFAULT_MAX_DEPTH,
            collapsed_by_default: false,
            drag_shift_threshold: DEFAULT_DRAG_SHIFT_THRESHOLD,
            group: default_group(),
        }
    }
}

impl NestableConfig {
    pub fn with_defaults(mut self) -> Self {
        if self.max_depth == 0 {
            self.max_depth = 1;
        }
        if !self.drag_shift_threshold.is_finite() || self.drag_shift_threshold < 0.0 {
            self.drag_shift_threshold = DEFAULT_DRAG_SHIFT_THRESHOLD;
        }
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn collapsed_by_default(mut self, collapsed_by_default: bool) -> Self {
        self.collapsed_by_default = collapsed_by_default;
        self
    }

    pub fn drag_shift_threshold(mut self, threshold: f32) -> Self {
        self.drag_shift_threshold = threshold;
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    pub fn item_fields(&self) -> ItemFields {
        ItemFields {
            id_field: self.id_field.clone(),
            children_field: self.children_field.clone(),
        }
    }
}
