mod collapse;
mod config;
mod depth;
mod error;
mod item;
mod nestable;
mod ops;
mod path;
mod planner;
mod session;

pub use collapse::{CollapseChange, CollapseState, CollapseTarget, parent_ids};
pub use config::NestableConfig;
pub use depth::fits_max_depth;
pub use error::{NestableError, PathError};
pub use item::{Fields, Item, ItemFields, ItemId, Tree, normalize_values};
pub use nestable::{
    ChangeEvent, ChangeFn, CollapseChangeFn, ConfirmMove, ConfirmMoveFn, DisableDragFn,
    DragCandidate, DragStartFn, Key, Nestable,
};
pub use ops::{Move, Op};
pub use path::{Path, parent_of, shift_after_removal};
pub use planner::{MoveRequest, plan_move};
pub use session::{DepthShift, DragSession, Pointer};
