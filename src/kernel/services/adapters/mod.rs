//! Service adapters: OS/runtime specific implementations (IO/async).

pub mod file;
pub mod file_watcher;
pub mod git;
pub mod model_host;
pub mod paths;
pub mod runtime;
pub mod settings;

pub use file::LocalContentStore;
pub use file_watcher::WorkspaceWatcher;
pub use git::{GitCliProvider, NoopVcs};
pub use model_host::{DiffView, HeadlessModelHost};
pub use paths::{ensure_log_dir, get_log_dir, get_settings_path};
pub use runtime::AsyncRuntime;
pub use settings::{ensure_settings_file, load_settings, load_settings_from};
