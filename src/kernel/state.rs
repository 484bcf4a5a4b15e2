use super::editor::{EditorTab, TabKind, TabRegistry};
use super::services::ports::SessionSettings;
use super::vcs::VcsState;
use super::Locator;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

/// An open that has been sent to the Content Store and not answered yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingOpen {
    pub request: u64,
    pub new_tab: bool,
    /// A preview was asked for while the read was in flight.
    pub preview: bool,
}

#[derive(Debug)]
pub struct SessionState {
    pub settings: SessionSettings,
    pub workspace_root: Option<Locator>,
    pub registry: TabRegistry,
    pub vcs: VcsState,
    pub selected_for_compare: Option<Locator>,
    pub pending_opens: FxHashMap<Locator, PendingOpen>,
    pub pending_previews: FxHashSet<Locator>,
    next_request: u64,
}

impl SessionState {
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            settings,
            workspace_root: None,
            registry: TabRegistry::new(),
            vcs: VcsState::default(),
            selected_for_compare: None,
            pending_opens: FxHashMap::default(),
            pending_previews: FxHashSet::default(),
            next_request: 1,
        }
    }

    pub fn alloc_request(&mut self) -> u64 {
        let id = self.next_request;
        self.next_request = self.next_request.saturating_add(1);
        id
    }

    pub fn active_tab(&self) -> Option<&EditorTab> {
        self.registry.active_tab()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let opened = self
            .registry
            .tabs()
            .iter()
            .filter(|tab| tab.kind != TabKind::Diff)
            .map(|tab| tab.locator.clone())
            .collect();
        let active = self
            .registry
            .active_tab()
            .filter(|tab| tab.kind != TabKind::Diff)
            .map(|tab| tab.locator.clone());
        SessionSnapshot { opened, active }
    }
}

/// Serializable list of what was open, for restoring a session later.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub opened: Vec<Locator>,
    pub active: Option<Locator>,
}
