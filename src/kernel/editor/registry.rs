use super::tab::{EditorTab, OpenKind, TabId, TabKind};
use crate::kernel::Locator;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Normal,
    Diff,
}

/// Ordered open tabs plus the active pointer.
///
/// The active pointer always names a member of `tabs`; removing the active tab
/// clears it, and an empty registry never has one.
#[derive(Debug)]
pub struct TabRegistry {
    tabs: Vec<EditorTab>,
    active: Option<TabId>,
    view_mode: ViewMode,
    next_tab_id: u64,
}

impl Default for TabRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TabRegistry {
    pub fn new() -> Self {
        Self {
            tabs: Vec::new(),
            active: None,
            view_mode: ViewMode::Normal,
            next_tab_id: 1,
        }
    }

    pub fn alloc_tab_id(&mut self) -> TabId {
        let id = TabId::new(self.next_tab_id);
        self.next_tab_id = self.next_tab_id.saturating_add(1);
        id
    }

    pub fn tabs(&self) -> &[EditorTab] {
        &self.tabs
    }

    pub fn tabs_mut(&mut self) -> impl Iterator<Item = &mut EditorTab> {
        self.tabs.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) -> bool {
        let changed = self.view_mode != mode;
        self.view_mode = mode;
        changed
    }

    pub fn active_id(&self) -> Option<TabId> {
        self.active
    }

    pub fn active_tab(&self) -> Option<&EditorTab> {
        self.active.and_then(|id| self.get(id))
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active.and_then(|id| self.index_of(id))
    }

    pub fn set_active(&mut self, id: TabId) -> bool {
        if self.index_of(id).is_none() || self.active == Some(id) {
            return false;
        }
        self.active = Some(id);
        true
    }

    pub fn index_of(&self, id: TabId) -> Option<usize> {
        self.tabs.iter().position(|tab| tab.id == id)
    }

    pub fn get(&self, id: TabId) -> Option<&EditorTab> {
        self.tabs.iter().find(|tab| tab.id == id)
    }

    pub fn get_mut(&mut self, id: TabId) -> Option<&mut EditorTab> {
        self.tabs.iter_mut().find(|tab| tab.id == id)
    }

    pub fn at(&self, index: usize) -> Option<&EditorTab> {
        self.tabs.get(index)
    }

    /// Last tab at `locator` whose kind `kind` accepts.
    pub fn find(&self, locator: &Locator, kind: OpenKind) -> Option<TabId> {
        self.tabs
            .iter()
            .rev()
            .find(|tab| &tab.locator == locator && kind.matches(tab.kind))
            .map(|tab| tab.id)
    }

    pub fn find_diff(&self, locator: &Locator, compare_target: &Locator) -> Option<TabId> {
        self.tabs
            .iter()
            .find(|tab| {
                tab.kind == TabKind::Diff
                    && &tab.locator == locator
                    && tab.compare_target.as_ref() == Some(compare_target)
            })
            .map(|tab| tab.id)
    }

    /// How many times `locator` appears as a tab locator or a compare target.
    pub fn reference_count(&self, locator: &Locator) -> usize {
        self.tabs
            .iter()
            .map(|tab| {
                usize::from(&tab.locator == locator)
                    + usize::from(tab.compare_target.as_ref() == Some(locator))
            })
            .sum()
    }

    pub fn ids_within(&self, ancestor: &Locator) -> Vec<TabId> {
        self.tabs
            .iter()
            .filter(|tab| tab.locator.undecorated().is_within(ancestor))
            .map(|tab| tab.id)
            .collect()
    }

    pub fn push(&mut self, tab: EditorTab) -> TabId {
        let id = tab.id;
        self.tabs.push(tab);
        id
    }

    /// Puts `tab` where `index` was and hands back the old tab; the active
    /// pointer follows if it named the replaced tab.
    pub fn replace_at(&mut self, index: usize, tab: EditorTab) -> Option<EditorTab> {
        let slot = self.tabs.get_mut(index)?;
        let new_id = tab.id;
        let old = std::mem::replace(slot, tab);
        old.token().cancel();
        if self.active == Some(old.id) {
            self.active = Some(new_id);
        }
        Some(old)
    }

    /// Neighbour that takes over when the tab at `index` goes away.
    pub fn neighbour_of(&self, index: usize) -> Option<TabId> {
        if index > 0 {
            return self.tabs.get(index - 1).map(|tab| tab.id);
        }
        self.tabs.get(index + 1).map(|tab| tab.id)
    }

    pub fn remove(&mut self, id: TabId) -> Option<EditorTab> {
        let index = self.index_of(id)?;
        let tab = self.tabs.remove(index);
        if self.active == Some(id) {
            self.active = None;
        }
        tab.token().cancel();
        Some(tab)
    }

    /// Empties the registry; returned tabs have their tokens cancelled.
    pub fn clear(&mut self) -> Vec<EditorTab> {
        self.active = None;
        let tabs = std::mem::take(&mut self.tabs);
        for tab in &tabs {
            tab.token().cancel();
        }
        tabs
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/kernel/editor/registry.rs"]
mod tests;
