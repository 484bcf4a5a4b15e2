use super::DispatchResult;
use crate::kernel::editor::TabKind;
use crate::kernel::error::{Notification, SessionError};
use crate::kernel::state::PendingOpen;
use crate::kernel::{Effect, Locator, LocatorError};
use rustc_hash::FxHashSet;

impl super::Store {
    pub(super) fn rename(&mut self, locator: Locator, new_name: &str) -> DispatchResult {
        let new_name = new_name.trim();
        if new_name.is_empty() || new_name.contains('/') {
            let err = SessionError::InvalidLocator(LocatorError::Relative(new_name.to_string()));
            return DispatchResult::notify(&err);
        }
        let Some(to) = locator.with_file_name(new_name) else {
            return DispatchResult::unchanged();
        };
        if to == locator {
            return DispatchResult::unchanged();
        }
        DispatchResult::effects_only(vec![Effect::RenamePath { from: locator, to }])
    }

    pub(super) fn on_path_renamed(
        &mut self,
        from: &Locator,
        to: &Locator,
        result: Result<(), SessionError>,
    ) -> DispatchResult {
        if let Err(err) = result {
            tracing::warn!(target: "io", %from, %to, error = %err, "rename failed");
            return DispatchResult::notify(&err);
        }

        let mut effects = self.rebase_tabs(from, to);
        if let Some(selected) = self
            .state
            .selected_for_compare
            .as_ref()
            .and_then(|selected| selected.rebase(from, to))
        {
            self.state.selected_for_compare = Some(selected);
        }
        effects.extend(self.reissue_pending_reads(from, to));

        tracing::info!(target: "io", %from, %to, "renamed");
        effects.push(self.refresh_vcs_effect());
        DispatchResult::changed(effects)
    }

    /// Reads still in flight under `from` would land on a vanished path;
    /// their results are dropped and the reads start over at the new location.
    fn reissue_pending_reads(&mut self, from: &Locator, to: &Locator) -> Vec<Effect> {
        let mut effects = Vec::new();
        let moved: Vec<Locator> = self
            .state
            .pending_opens
            .keys()
            .filter(|locator| locator.is_within(from))
            .cloned()
            .collect();
        for old in moved {
            let Some(pending) = self.state.pending_opens.remove(&old) else {
                continue;
            };
            let Some(locator) = old.rebase(from, to) else {
                continue;
            };
            let request = self.state.alloc_request();
            tracing::debug!(target: "session", %old, %locator, request, "open follows rename");
            self.state.pending_opens.insert(
                locator.clone(),
                PendingOpen {
                    request,
                    ..pending
                },
            );
            effects.push(Effect::ReadForOpen { request, locator });
        }

        let moved: Vec<Locator> = self
            .state
            .pending_previews
            .iter()
            .filter(|locator| locator.is_within(from))
            .cloned()
            .collect();
        for old in moved {
            self.state.pending_previews.remove(&old);
            if let Some(locator) = old.rebase(from, to) {
                self.state.pending_previews.insert(locator.clone());
                effects.push(Effect::ReadForPreview { locator });
            }
        }
        effects
    }

    pub(super) fn on_path_duplicated(
        &mut self,
        from: &Locator,
        result: Result<Locator, SessionError>,
    ) -> DispatchResult {
        match result {
            Ok(to) => {
                tracing::info!(target: "io", %from, %to, "duplicated");
                DispatchResult::effects_only(vec![self.refresh_vcs_effect()])
            }
            Err(err) => {
                tracing::warn!(target: "io", %from, error = %err, "duplicate failed");
                DispatchResult::notify(&err)
            }
        }
    }

    pub(super) fn on_path_deleted(
        &mut self,
        locator: &Locator,
        result: Result<(), SessionError>,
    ) -> DispatchResult {
        if let Err(err) = result {
            tracing::warn!(target: "io", %locator, error = %err, "delete failed");
            return DispatchResult::notify(&err);
        }

        let mut effects = Vec::new();
        for id in self.state.registry.ids_within(locator) {
            effects.extend(self.close_tab(id));
        }
        if self
            .state
            .selected_for_compare
            .as_ref()
            .is_some_and(|selected| selected.is_within(locator))
        {
            self.state.selected_for_compare = None;
        }
        tracing::info!(target: "io", %locator, "deleted");
        effects.push(self.refresh_vcs_effect());
        DispatchResult::changed(effects)
    }

    pub(super) fn on_folder_created(
        &mut self,
        parent: &Locator,
        result: Result<Locator, SessionError>,
    ) -> DispatchResult {
        match result {
            Ok(folder) => {
                tracing::info!(target: "io", %folder, "folder created");
                DispatchResult::unchanged()
            }
            Err(err) => {
                tracing::warn!(target: "io", %parent, error = %err, "create folder failed");
                DispatchResult::notify(&err)
            }
        }
    }

    pub(super) fn paths_changed(
        &mut self,
        modified: Vec<Locator>,
        removed: Vec<Locator>,
    ) -> DispatchResult {
        let mut effects = Vec::new();

        let mut to_check: Vec<Locator> = Vec::new();
        for tab in self.state.registry.tabs() {
            let source = tab.locator.undecorated();
            if tab.kind == TabKind::Preview || tab.is_deleted || to_check.contains(&source) {
                continue;
            }
            if removed.iter().any(|gone| source.is_within(gone)) {
                to_check.push(source);
            }
        }
        if !to_check.is_empty() {
            effects.push(Effect::CheckExistence { locators: to_check });
        }

        let modified: FxHashSet<Locator> = modified.into_iter().collect();
        for tab in self.state.registry.tabs() {
            if tab.kind != TabKind::File || !modified.contains(&tab.locator) {
                continue;
            }
            if tab.is_dirty() || tab.pending_save().is_some() {
                continue;
            }
            effects.push(Effect::ReloadContent {
                tab: tab.id,
                token: tab.token().clone(),
                locator: tab.locator.clone(),
                encoding: tab.encoding,
                external: true,
            });
        }

        DispatchResult::effects_only(effects)
    }

    pub(super) fn on_existence_checked(&mut self, missing: Vec<Locator>) -> DispatchResult {
        let mut effects = Vec::new();
        let mut flagged: FxHashSet<Locator> = FxHashSet::default();
        for tab in self.state.registry.tabs_mut() {
            if tab.kind == TabKind::Preview || tab.is_deleted || !missing.contains(&tab.locator) {
                continue;
            }
            tab.is_deleted = true;
            if flagged.insert(tab.locator.clone()) {
                let err = SessionError::ResourceMissing {
                    locator: tab.locator.clone(),
                };
                tracing::info!(target: "watch", locator = %tab.locator, "backing resource removed");
                effects.push(Effect::Notify(Notification::error(&err)));
            }
        }
        DispatchResult {
            state_changed: !flagged.is_empty(),
            effects,
        }
    }

    pub(super) fn on_download_requested(
        &mut self,
        locator: &Locator,
        result: Result<(), SessionError>,
    ) -> DispatchResult {
        let notification = match result {
            Ok(()) => Notification::info(format!("Downloading {}", locator.display_name())),
            Err(err) => Notification::error(&err),
        };
        DispatchResult::effects_only(vec![Effect::Notify(notification)])
    }
}
