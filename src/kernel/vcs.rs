use super::services::ports::VcsStatus;
use super::Locator;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VcsFileStatus {
    Modified,
    Added,
    Untracked,
    Conflict,
}

impl VcsFileStatus {
    pub fn marker(self) -> char {
        match self {
            Self::Modified => 'M',
            Self::Added => 'A',
            Self::Untracked => 'U',
            Self::Conflict => '!',
        }
    }
}

/// Result of one background status poll.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VcsSnapshot {
    pub status: VcsStatus,
    pub ahead_behind: Option<(usize, usize)>,
    pub has_remote: bool,
}

#[derive(Debug, Clone, Default)]
pub struct VcsState {
    pub root: Option<Locator>,
    pub branch: String,
    pub remote: Option<String>,
    pub indexed: FxHashMap<Locator, VcsFileStatus>,
    pub worktree: FxHashMap<Locator, VcsFileStatus>,
    /// Union of `indexed` and `worktree`; the worktree status wins.
    pub tracked: FxHashMap<Locator, VcsFileStatus>,
    pub ahead_behind: Option<(usize, usize)>,
    issued_seq: u64,
    applied_seq: u64,
}

impl VcsState {
    pub fn next_seq(&mut self) -> u64 {
        self.issued_seq += 1;
        self.issued_seq
    }

    pub fn is_stale(&self, seq: u64) -> bool {
        seq <= self.applied_seq
    }

    pub fn is_tracked(&self, locator: &Locator) -> bool {
        self.tracked.contains_key(&locator.undecorated())
    }

    pub fn status_of(&self, locator: &Locator) -> Option<VcsFileStatus> {
        self.tracked.get(&locator.undecorated()).copied()
    }

    /// Applies a poll result. Returns false (and changes nothing) for a result
    /// older than one already applied.
    pub fn apply(&mut self, seq: u64, snapshot: VcsSnapshot) -> bool {
        if self.is_stale(seq) {
            return false;
        }
        self.applied_seq = seq;

        let VcsSnapshot {
            status,
            ahead_behind,
            has_remote,
        } = snapshot;

        let mut tracked = status.indexed.clone();
        tracked.extend(status.worktree.iter().map(|(k, v)| (k.clone(), *v)));

        self.branch = status.branch;
        self.remote = has_remote.then(|| "origin".to_string());
        self.indexed = status.indexed;
        self.worktree = status.worktree;
        self.tracked = tracked;
        self.ahead_behind = ahead_behind;
        true
    }

    /// A failed poll leaves no stale status behind.
    pub fn clear(&mut self, seq: u64) -> bool {
        if self.is_stale(seq) {
            return false;
        }
        self.applied_seq = seq;
        self.branch.clear();
        self.remote = None;
        self.indexed.clear();
        self.worktree.clear();
        self.tracked.clear();
        self.ahead_behind = None;
        true
    }

    pub fn reset_root(&mut self, root: Option<Locator>) {
        let issued = self.issued_seq;
        *self = Self {
            root,
            issued_seq: issued,
            applied_seq: issued,
            ..Self::default()
        };
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/vcs.rs"]
mod tests;
