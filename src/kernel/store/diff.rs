use super::{diff_view_command, DispatchResult};
use crate::kernel::editor::{EditorTab, OpenKind, TabId};
use crate::kernel::error::{Notification, SessionError};
use crate::kernel::{Effect, Locator};
use ropey::Rope;

impl super::Store {
    pub(super) fn compare_with_previous(&mut self, locator: Locator) -> DispatchResult {
        if !self.state.vcs.is_tracked(&locator) {
            return DispatchResult::notify(&SessionError::NoTrackedChanges { locator });
        }
        DispatchResult::effects_only(vec![Effect::FetchPrevious { locator }])
    }

    pub(super) fn compare_with_selected(&mut self, locator: Locator) -> DispatchResult {
        let Some(selected) = self.state.selected_for_compare.clone() else {
            return DispatchResult::effects_only(vec![Effect::Notify(Notification::info(
                "Select a file to compare with first",
            ))]);
        };
        DispatchResult::effects_only(vec![Effect::ReadPair {
            original: selected,
            modified: locator,
        }])
    }

    pub(super) fn on_diff_read(
        &mut self,
        locator: Locator,
        compare_target: Locator,
        result: Result<(String, String), SessionError>,
    ) -> DispatchResult {
        let (original, modified) = match result {
            Ok(pair) => pair,
            Err(err) => {
                tracing::warn!(target: "io", %locator, error = %err, "compare failed");
                return DispatchResult::notify(&err);
            }
        };

        let live = self.state.registry.find(&locator, OpenKind::File);
        if let Some(id) = self.state.registry.find_diff(&locator, &compare_target) {
            let was_active = self.state.registry.active_id() == Some(id);
            self.seed_from_file_tab(id, live, &modified);
            if let Some(tab) = self.state.registry.get_mut(id) {
                tab.compare_content = Some(Rope::from_str(&original));
            }
            let mut effects = self.activate(id);
            if was_active {
                if let Some(tab) = self.state.registry.get(id) {
                    effects.push(diff_view_command(tab));
                }
            }
            return DispatchResult::changed(effects);
        }

        let id = self.state.registry.alloc_tab_id();
        let tab = EditorTab::diff(id, locator, compare_target, &modified, &original);
        self.state.registry.push(tab);
        self.seed_from_file_tab(id, live, &modified);
        let effects = self.activate(id);
        DispatchResult::changed(effects)
    }

    /// The modified side of a diff shows the host's model for its locator, so
    /// an open File tab there (with any unsaved edits) wins over disk text.
    fn seed_from_file_tab(&mut self, diff: TabId, file: Option<TabId>, disk_text: &str) {
        let live = file
            .and_then(|file| self.state.registry.get(file))
            .map(EditorTab::buffer_state);
        let Some(tab) = self.state.registry.get_mut(diff) else {
            return;
        };
        match live {
            Some(state) => tab.adopt_buffer(state),
            None => tab.set_text(disk_text),
        }
    }
}
