use crate::kernel::{Action, Locator};
use notify::event::{ModifyKind, RenameMode};
use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

const WATCHER_POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, PartialEq, Eq)]
enum FsDelta {
    Modified(PathBuf),
    Removed(PathBuf),
}

/// Recursive watch on the workspace root. Raw notify events are buffered and
/// folded into one [`Action::PathsChanged`] per drain.
pub struct WorkspaceWatcher {
    _watcher: RecommendedWatcher,
    raw_event_rx: mpsc::Receiver<notify::Event>,
    root: PathBuf,
}

impl WorkspaceWatcher {
    pub fn new(root: &Path) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel();
        let mut watcher = RecommendedWatcher::new(
            move |res: Result<notify::Event, notify::Error>| {
                let Ok(event) = res else { return };
                let _ = tx.send(event);
            },
            Config::default().with_poll_interval(WATCHER_POLL_INTERVAL),
        )?;
        watcher.watch(root, RecursiveMode::Recursive)?;
        tracing::info!(target: "watch", root = %root.display(), "watching workspace");
        Ok(Self {
            _watcher: watcher,
            raw_event_rx: rx,
            root: root.to_path_buf(),
        })
    }

    pub fn for_locator(root: &Locator) -> Option<Result<Self, notify::Error>> {
        root.to_file_path().map(|path| Self::new(&path))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn drain(&mut self) -> Option<Action> {
        let mut modified: FxHashSet<PathBuf> = FxHashSet::default();
        let mut removed: FxHashSet<PathBuf> = FxHashSet::default();
        while let Ok(event) = self.raw_event_rx.try_recv() {
            for delta in normalize_notify_event(event) {
                match delta {
                    FsDelta::Modified(path) => {
                        removed.remove(&path);
                        modified.insert(path);
                    }
                    FsDelta::Removed(path) => {
                        modified.remove(&path);
                        removed.insert(path);
                    }
                }
            }
        }
        if modified.is_empty() && removed.is_empty() {
            return None;
        }

        let to_locators = |paths: FxHashSet<PathBuf>| {
            let mut out: Vec<Locator> = paths.iter().map(|p| Locator::from_path(p)).collect();
            out.sort_unstable();
            out
        };
        Some(Action::PathsChanged {
            modified: to_locators(modified),
            removed: to_locators(removed),
        })
    }
}

fn normalize_notify_event(event: notify::Event) -> Vec<FsDelta> {
    match event.kind {
        EventKind::Remove(_) => event.paths.into_iter().map(FsDelta::Removed).collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            event.paths.into_iter().map(FsDelta::Removed).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            let mut paths = event.paths.into_iter();
            let mut out = Vec::new();
            if let Some(from) = paths.next() {
                out.push(FsDelta::Removed(from));
            }
            out.extend(paths.map(FsDelta::Modified));
            out
        }
        EventKind::Modify(ModifyKind::Metadata(_)) | EventKind::Access(_) => Vec::new(),
        EventKind::Create(_) | EventKind::Modify(_) => {
            event.paths.into_iter().map(FsDelta::Modified).collect()
        }
        EventKind::Any | EventKind::Other => Vec::new(),
    }
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/adapters/file_watcher.rs"]
mod tests;
