use std::collections::HashSet;

use anyhow::{Context as _, Result};
use manos_nestable::{
    ChangeEvent, CollapseTarget, Item, ItemId, Key, Nestable, NestableConfig, Pointer,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

/// A recorded drag interaction: initial items plus the input it receives.
#[derive(Debug, Clone, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub config: NestableConfig,
    pub items: Vec<Value>,
    /// Parents that refuse new children.
    #[serde(default)]
    pub locked: Vec<ItemId>,
    /// Items that cannot be picked up.
    #[serde(default)]
    pub fixed: Vec<ItemId>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    BeginDrag {
        id: ItemId,
        #[serde(default)]
        x: f32,
        #[serde(default)]
        y: f32,
    },
    PointerMove {
        x: f32,
        #[serde(default)]
        y: f32,
    },
    Hover {
        id: ItemId,
    },
    Escape,
    EndDrag,
    CancelDrag,
    Collapse {
        target: CollapseTarget,
    },
    ToggleCollapse {
        id: ItemId,
    },
}

impl Scene {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("invalid scene")
    }

    fn build(&self) -> Result<Nestable> {
        let locked: HashSet<ItemId> = self.locked.iter().cloned().collect();
        let fixed: HashSet<ItemId> = self.fixed.iter().cloned().collect();
        let nestable = Nestable::new(self.config.clone())
            .items(&self.items)
            .context("invalid scene items")?
            .confirm_move(move |args| {
                args.destination_parent
                    .is_none_or(|parent| !locked.contains(parent.id()))
            })
            .disable_drag(move |candidate| fixed.contains(candidate.item.id()))
            .on_change(|event| {
                info!(
                    group = %event.group,
                    id = %event.drag_item.id(),
                    to = ?event.target_path,
                    "change"
                );
            });
        Ok(nestable)
    }

    /// Runs every step and returns one frame per step: the step, what it
    /// reported and the tree afterwards.
    pub fn replay(&self) -> Result<Vec<String>> {
        let mut nestable = self.build()?;
        let mut frames = vec![format!("initial\n{}", format_tree(&nestable))];
        for (ix, step) in self.steps.iter().enumerate() {
            let outcome = run_step(&mut nestable, step)
                .with_context(|| format!("step {ix} ({step:?}) failed"))?;
            frames.push(format!("{step:?} -> {outcome}\n{}", format_tree(&nestable)));
        }
        Ok(frames)
    }
}

fn run_step(nestable: &mut Nestable, step: &Step) -> Result<String> {
    let outcome = match step {
        Step::BeginDrag { id, x, y } => {
            if nestable.begin_drag(id, Pointer::new(*x, *y))? {
                "dragging".to_string()
            } else {
                "drag disabled".to_string()
            }
        }
        Step::PointerMove { x, y } => moved(nestable.pointer_move(Pointer::new(*x, *y))?),
        Step::Hover { id } => moved(nestable.hover(id)?),
        Step::Escape => {
            if nestable.key_down(Key::Escape)? {
                "cancelled".to_string()
            } else {
                "ignored".to_string()
            }
        }
        Step::EndDrag => match nestable.end_drag()? {
            Some(ChangeEvent { target_path, .. }) => format!("committed at {target_path:?}"),
            None => "nothing to commit".to_string(),
        },
        Step::CancelDrag => {
            nestable.cancel_drag()?;
            "cancelled".to_string()
        }
        Step::Collapse { target } => {
            nestable.collapse(target);
            "collapse updated".to_string()
        }
        Step::ToggleCollapse { id } => {
            nestable.toggle_collapse(id)?;
            "collapse toggled".to_string()
        }
    };
    Ok(outcome)
}

fn moved(moved: bool) -> String {
    let outcome = if moved { "moved" } else { "unchanged" };
    outcome.to_string()
}

/// Indented outline; `+` marks collapsed parents, `-` expanded ones and `*`
/// the item being dragged.
pub fn format_tree(nestable: &Nestable) -> String {
    fn walk(nestable: &Nestable, items: &[Item], depth: usize, out: &mut String) {
        for item in items {
            out.push_str(&"  ".repeat(depth));
            if item.has_children() {
                out.push_str(if nestable.is_collapsed(item.id()) { "+ " } else { "- " });
            }
            out.push_str(item.id().as_str());
            if nestable
                .drag_session()
                .is_some_and(|session| session.item_id() == item.id())
            {
                out.push_str(" *");
            }
            out.push('\n');
            if !item.has_children() || !nestable.is_collapsed(item.id()) {
                walk(nestable, item.child_items(), depth + 1, out);
            }
        }
    }

    let mut out = String::new();
    walk(nestable, nestable.tree().roots(), 0, &mut out);
    out
}
