//! Headless session core (state/action/effect).

pub mod action;
pub mod editor;
pub mod effect;
pub mod encoding;
pub mod error;
pub mod locator;
pub mod pipeline;
pub mod services;
pub mod state;
pub mod store;
pub mod vcs;

pub use action::Action;
pub use editor::{EditorTab, OpenKind, TabId, TabKind, TabRegistry, ViewMode};
pub use effect::Effect;
pub use encoding::TextEncoding;
pub use error::{Notification, NotificationLevel, SessionError, SessionErrorKind};
pub use locator::{Locator, LocatorError};
pub use state::{SessionSnapshot, SessionState};
pub use store::{DispatchResult, Store};
pub use vcs::{VcsFileStatus, VcsSnapshot, VcsState};
