//! VCS Status Provider port.

use crate::kernel::vcs::VcsFileStatus;
use crate::kernel::Locator;
use rustc_hash::FxHashMap;

pub type Result<T> = std::result::Result<T, VcsError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VcsError {
    #[error("no repository is loaded")]
    NoRepository,
    #[error("{} is outside the repository", .0.display_name())]
    OutsideRepository(Locator),
    #[error("`{command}` failed: {message}")]
    Command { command: String, message: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VcsStatus {
    pub indexed: FxHashMap<Locator, VcsFileStatus>,
    pub worktree: FxHashMap<Locator, VcsFileStatus>,
    pub branch: String,
}

pub trait VcsProvider: Send + Sync {
    fn load_directory(&self, root: &Locator) -> Result<()>;

    fn status(&self) -> Result<VcsStatus>;

    fn ahead_behind(&self) -> Result<(usize, usize)>;

    /// Text of `locator` as of the last commit.
    fn previous_content(&self, locator: &Locator) -> Result<String>;

    fn has_remote(&self) -> bool;
}
