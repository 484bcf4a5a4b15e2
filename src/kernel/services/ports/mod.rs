//! Service ports: traits + data contracts.

pub mod content;
pub mod model_host;
pub mod settings;
pub mod vcs;

pub use content::{ContentError, ContentStore, Result as ContentResult, WriteOptions};
pub use model_host::{ModelCommand, TextModelHost};
pub use settings::SessionSettings;
pub use vcs::{Result as VcsResult, VcsError, VcsProvider, VcsStatus};
