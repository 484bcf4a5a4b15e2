//! Editor domain: open tabs, version tracking and the active pointer.

mod registry;
mod tab;

pub use registry::{TabRegistry, ViewMode};
pub use tab::{
    BufferState, EditorTab, ImagePayload, LifetimeToken, OpenKind, TabId, TabKind,
    PREVIEW_DECORATION,
};
