//! editor-session - document session layer for a text editor
//!
//! Module layout:
//! - kernel: locators, encodings, tab registry, VCS cache and the
//!   Store/Action/Effect reducer
//! - kernel::services: collaborator ports (content store, VCS, text model host,
//!   settings) and their adapters (local filesystem, git CLI, tokio runtime,
//!   workspace watcher)
//! - session: control-thread driver wiring the store to the adapters
//! - logging: tracing setup

pub mod kernel;
pub mod logging;
pub mod session;

pub use kernel::{
    Action, Effect, Locator, Notification, NotificationLevel, SessionError, SessionSnapshot,
    SessionState, Store, TextEncoding,
};
pub use session::{EditorSession, SessionObserver};
