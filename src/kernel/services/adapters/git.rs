//! VCS Status Provider backed by the `git` command line.

use crate::kernel::encoding::decode_with_fallback;
use crate::kernel::services::ports::vcs::{Result, VcsError, VcsProvider, VcsStatus};
use crate::kernel::vcs::VcsFileStatus;
use crate::kernel::Locator;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PorcelainEntry {
    pub path: PathBuf,
    pub index: Option<VcsFileStatus>,
    pub worktree: Option<VcsFileStatus>,
}

pub fn parse_status_porcelain_z(data: &[u8], repo_root: &Path) -> Vec<PorcelainEntry> {
    let mut out = Vec::new();
    let mut tokens = data.split(|b| *b == 0).filter(|t| !t.is_empty());
    while let Some(token) = tokens.next() {
        if token.len() < 4 {
            continue;
        }

        let x = token[0] as char;
        let y = token[1] as char;
        if (x == '!' && y == '!') || (x == ' ' && y == ' ') {
            continue;
        }
        if token[2] != b' ' {
            continue;
        }

        // `-z` renames list the new path first, then the original.
        if x == 'R' || x == 'C' {
            let _ = tokens.next();
        }

        let rel = PathBuf::from(String::from_utf8_lossy(&token[3..]).to_string());
        let (index, worktree) = status_from_xy(x, y);
        out.push(PorcelainEntry {
            path: repo_root.join(rel),
            index,
            worktree,
        });
    }
    out
}

fn status_from_xy(x: char, y: char) -> (Option<VcsFileStatus>, Option<VcsFileStatus>) {
    if x == 'U' || y == 'U' || (x == 'A' && y == 'A') || (x == 'D' && y == 'D') {
        return (Some(VcsFileStatus::Conflict), Some(VcsFileStatus::Conflict));
    }
    if x == '?' && y == '?' {
        return (None, Some(VcsFileStatus::Untracked));
    }
    (kind_from_status_char(x), kind_from_status_char(y))
}

fn kind_from_status_char(ch: char) -> Option<VcsFileStatus> {
    match ch {
        ' ' => None,
        '?' => Some(VcsFileStatus::Untracked),
        'A' => Some(VcsFileStatus::Added),
        'U' => Some(VcsFileStatus::Conflict),
        _ => Some(VcsFileStatus::Modified),
    }
}

pub fn status_from_entries(entries: Vec<PorcelainEntry>, branch: String) -> VcsStatus {
    let mut status = VcsStatus {
        branch,
        ..VcsStatus::default()
    };
    for entry in entries {
        let locator = Locator::from_path(&entry.path);
        if let Some(kind) = entry.index {
            status.indexed.insert(locator.clone(), kind);
        }
        if let Some(kind) = entry.worktree {
            status.worktree.insert(locator, kind);
        }
    }
    status
}

/// Parses `git rev-list --left-right --count` output (`<ahead>\t<behind>`).
pub fn parse_ahead_behind(text: &str) -> Option<(usize, usize)> {
    let mut parts = text.split_whitespace();
    let ahead = parts.next()?.parse().ok()?;
    let behind = parts.next()?.parse().ok()?;
    Some((ahead, behind))
}

pub struct GitCliProvider {
    repo_root: RwLock<Option<PathBuf>>,
}

impl GitCliProvider {
    pub fn new() -> Self {
        Self {
            repo_root: RwLock::new(None),
        }
    }

    fn root(&self) -> Result<PathBuf> {
        self.repo_root
            .read()
            .ok()
            .and_then(|root| root.clone())
            .ok_or(VcsError::NoRepository)
    }

    fn run(&self, dir: &Path, args: &[&str]) -> Result<Vec<u8>> {
        let command = format!("git {}", args.join(" "));
        let output = Command::new("git")
            .arg("-C")
            .arg(dir)
            .args(args)
            .output()
            .map_err(|e| VcsError::Command {
                command: command.clone(),
                message: e.to_string(),
            })?;
        if !output.status.success() {
            return Err(VcsError::Command {
                command,
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }

    fn run_text(&self, dir: &Path, args: &[&str]) -> Result<String> {
        self.run(dir, args)
            .map(|out| String::from_utf8_lossy(&out).trim().to_string())
    }
}

impl Default for GitCliProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl VcsProvider for GitCliProvider {
    fn load_directory(&self, root: &Locator) -> Result<()> {
        let dir = root
            .to_file_path()
            .ok_or_else(|| VcsError::OutsideRepository(root.clone()))?;
        let resolved = self
            .run_text(&dir, &["rev-parse", "--show-toplevel"])
            .map(PathBuf::from);
        let mut slot = self
            .repo_root
            .write()
            .map_err(|_| VcsError::NoRepository)?;
        match resolved {
            Ok(top) => {
                tracing::info!(target: "vcs", root = %top.display(), "repository loaded");
                *slot = Some(top);
                Ok(())
            }
            Err(_) => {
                *slot = None;
                Err(VcsError::NoRepository)
            }
        }
    }

    fn status(&self) -> Result<VcsStatus> {
        let root = self.root()?;
        let raw = self.run(&root, &["status", "--porcelain=v1", "-z"])?;
        let branch = self
            .run_text(&root, &["rev-parse", "--abbrev-ref", "HEAD"])
            .unwrap_or_default();
        Ok(status_from_entries(
            parse_status_porcelain_z(&raw, &root),
            branch,
        ))
    }

    fn ahead_behind(&self) -> Result<(usize, usize)> {
        let root = self.root()?;
        let text = self.run_text(&root, &["rev-list", "--left-right", "--count", "HEAD...@{u}"])?;
        parse_ahead_behind(&text).ok_or_else(|| VcsError::Command {
            command: "git rev-list".to_string(),
            message: format!("unexpected output: {text}"),
        })
    }

    fn previous_content(&self, locator: &Locator) -> Result<String> {
        let root = self.root()?;
        let path = locator
            .to_file_path()
            .ok_or_else(|| VcsError::OutsideRepository(locator.clone()))?;
        let rel = path
            .strip_prefix(&root)
            .map_err(|_| VcsError::OutsideRepository(locator.clone()))?;
        let spec = format!("HEAD:{}", rel.to_string_lossy().replace('\\', "/"));
        let bytes = self.run(&root, &["show", &spec])?;
        Ok(decode_with_fallback(&bytes)
            .map(|(text, _)| text)
            .unwrap_or_else(|| String::from_utf8_lossy(&bytes).to_string()))
    }

    fn has_remote(&self) -> bool {
        let Ok(root) = self.root() else {
            return false;
        };
        self.run_text(&root, &["remote"])
            .is_ok_and(|remotes| !remotes.is_empty())
    }
}

/// Provider for sessions with no repository at all.
#[derive(Debug, Default)]
pub struct NoopVcs;

impl VcsProvider for NoopVcs {
    fn load_directory(&self, _root: &Locator) -> Result<()> {
        Err(VcsError::NoRepository)
    }

    fn status(&self) -> Result<VcsStatus> {
        Err(VcsError::NoRepository)
    }

    fn ahead_behind(&self) -> Result<(usize, usize)> {
        Err(VcsError::NoRepository)
    }

    fn previous_content(&self, _locator: &Locator) -> Result<String> {
        Err(VcsError::NoRepository)
    }

    fn has_remote(&self) -> bool {
        false
    }
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/adapters/git.rs"]
mod tests;
