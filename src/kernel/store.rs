use super::editor::{EditorTab, TabId, TabKind, ViewMode};
use super::error::{Notification, SessionError};
use super::services::ports::{ModelCommand, SessionSettings};
use super::state::SessionState;
use super::{Action, Effect, Locator};
use rustc_hash::FxHashSet;

mod diff;
mod fs_ops;
mod open;
mod save;
mod vcs;

pub struct DispatchResult {
    pub effects: Vec<Effect>,
    pub state_changed: bool,
}

impl DispatchResult {
    fn unchanged() -> Self {
        Self {
            effects: Vec::new(),
            state_changed: false,
        }
    }

    fn changed(effects: Vec<Effect>) -> Self {
        Self {
            effects,
            state_changed: true,
        }
    }

    fn effects_only(effects: Vec<Effect>) -> Self {
        Self {
            effects,
            state_changed: false,
        }
    }

    fn notify(err: &SessionError) -> Self {
        Self::effects_only(vec![Effect::Notify(Notification::error(err))])
    }
}

pub struct Store {
    state: SessionState,
}

impl Store {
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            state: SessionState::new(settings),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn set_settings(&mut self, settings: SessionSettings) {
        self.state.settings = settings;
    }

    pub fn dispatch(&mut self, action: Action) -> DispatchResult {
        match action {
            Action::Open {
                locator,
                kind,
                new_tab,
            } => self.open(locator, kind, new_tab),
            Action::OpenPreview { locator } => self.open_preview(locator),
            Action::ActivateTab { tab } => {
                let effects = self.activate(tab);
                DispatchResult {
                    state_changed: !effects.is_empty(),
                    effects,
                }
            }
            Action::Close { locator, kind } => self.close(&locator, kind),
            Action::CloseAll => self.close_all(),
            Action::OpenRead {
                request,
                locator,
                outcome,
            } => self.on_open_read(request, locator, outcome),
            Action::PreviewRead { locator, result } => self.on_preview_read(locator, result),

            Action::ContentChanged { locator, text } => self.content_changed(&locator, &text),
            Action::Save { tab } => self.save(tab),
            Action::SaveActive => match self.state.registry.active_id() {
                Some(tab) => self.save(tab),
                None => DispatchResult::unchanged(),
            },
            Action::Saved {
                locator,
                versions,
                result,
            } => self.on_saved(locator, versions, result),
            Action::ReloadWithEncoding { encoding } => self.reload_with_encoding(encoding),
            Action::Reloaded {
                tab,
                encoding,
                external,
                result,
            } => self.on_reloaded(tab, encoding, external, result),

            Action::CompareWithPrevious { locator } => self.compare_with_previous(locator),
            Action::SelectForCompare { locator } => {
                let changed = self.state.selected_for_compare.as_ref() != Some(&locator);
                self.state.selected_for_compare = Some(locator);
                DispatchResult {
                    effects: Vec::new(),
                    state_changed: changed,
                }
            }
            Action::CompareWithSelected { locator } => self.compare_with_selected(locator),
            Action::DiffRead {
                locator,
                compare_target,
                result,
            } => self.on_diff_read(locator, compare_target, result),

            Action::Rename { locator, new_name } => self.rename(locator, &new_name),
            Action::PathRenamed { from, to, result } => self.on_path_renamed(&from, &to, result),
            Action::Duplicate { locator } => DispatchResult::effects_only(vec![
                Effect::DuplicatePath { from: locator },
            ]),
            Action::PathDuplicated { from, result } => self.on_path_duplicated(&from, result),
            Action::Delete { locator } => {
                DispatchResult::effects_only(vec![Effect::RemovePath { locator }])
            }
            Action::PathDeleted { locator, result } => self.on_path_deleted(&locator, result),
            Action::CreateFolder { parent } => {
                DispatchResult::effects_only(vec![Effect::CreateFolder { parent }])
            }
            Action::FolderCreated { parent, result } => self.on_folder_created(&parent, result),
            Action::PathsChanged { modified, removed } => self.paths_changed(modified, removed),
            Action::ExistenceChecked { missing } => self.on_existence_checked(missing),
            Action::DownloadRequested { locator, result } => {
                self.on_download_requested(&locator, result)
            }

            Action::LoadWorkspace { root } => self.load_workspace(root),
            Action::WorkspaceLoaded { root, result } => self.on_workspace_loaded(root, result),
            Action::RefreshVcs => DispatchResult::effects_only(vec![self.refresh_vcs_effect()]),
            Action::VcsRefreshed { seq, result } => self.on_vcs_refreshed(seq, result),
        }
    }

    /// Makes `id` the active tab, emitting whatever view and model switches
    /// the host needs. Returns no effects when `id` is already active.
    fn activate(&mut self, id: TabId) -> Vec<Effect> {
        let registry = &self.state.registry;
        if registry.active_id() == Some(id) {
            return Vec::new();
        }
        let Some(target) = registry.get(id) else {
            return Vec::new();
        };

        let from = registry
            .active_tab()
            .filter(|tab| tab.kind == TabKind::File)
            .map(|tab| tab.locator.clone());
        let target_kind = target.kind;
        let target_locator = target.locator.clone();

        let mut effects = Vec::new();
        if target_kind == TabKind::Diff {
            effects.push(diff_view_command(target));
            self.state.registry.set_view_mode(ViewMode::Diff);
        } else if self.state.registry.set_view_mode(ViewMode::Normal) {
            effects.push(Effect::Model(ModelCommand::SwitchToNormalView));
        }
        if target_kind == TabKind::File {
            effects.push(Effect::Model(ModelCommand::SetModel {
                from,
                to: target_locator,
            }));
        }
        self.state.registry.set_active(id);
        effects
    }

    /// Puts a freshly read tab into the registry, replacing the active tab in
    /// place when the reuse policy allows it.
    fn install_tab(&mut self, tab: EditorTab, new_tab: bool) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.state.registry.set_view_mode(ViewMode::Normal) {
            effects.push(Effect::Model(ModelCommand::SwitchToNormalView));
        }

        let settings = &self.state.settings;
        let may_reuse =
            settings.reuse_unedited_tab && !settings.always_open_in_new_tab && !new_tab;
        let reuse_index = self
            .state
            .registry
            .active_tab()
            .filter(|active| may_reuse && active.is_reusable())
            .and_then(|active| self.state.registry.index_of(active.id));
        let from = self
            .state
            .registry
            .active_tab()
            .filter(|active| active.kind == TabKind::File)
            .map(|active| active.locator.clone());

        let id = tab.id;
        let kind = tab.kind;
        let locator = tab.locator.clone();
        if kind == TabKind::File {
            effects.push(Effect::Model(ModelCommand::NewModel {
                locator: locator.clone(),
                content: tab.text(),
            }));
            effects.push(Effect::Model(ModelCommand::SetModel {
                from,
                to: locator.clone(),
            }));
        }

        match reuse_index {
            Some(index) => {
                if let Some(old) = self.state.registry.replace_at(index, tab) {
                    tracing::debug!(
                        target: "session",
                        old = %old.locator,
                        new = %locator,
                        "replaced unedited tab in place"
                    );
                    effects.extend(self.release_models(&old));
                }
            }
            None => {
                self.state.registry.push(tab);
                self.state.registry.set_active(id);
            }
        }
        effects
    }

    /// `RemoveModel` for each text model of `tab` that no remaining tab references.
    fn release_models(&self, tab: &EditorTab) -> Vec<Effect> {
        if !tab.is_text_model() {
            return Vec::new();
        }
        let mut effects = Vec::new();
        for locator in std::iter::once(&tab.locator).chain(tab.compare_target.as_ref()) {
            if self.state.registry.reference_count(locator) == 0 {
                effects.push(Effect::Model(ModelCommand::RemoveModel {
                    locator: locator.clone(),
                }));
            }
        }
        effects
    }

    /// Removes one tab and activates its neighbour, the left one first.
    fn close_tab(&mut self, id: TabId) -> Vec<Effect> {
        let registry = &self.state.registry;
        let Some(index) = registry.index_of(id) else {
            return Vec::new();
        };

        let mut effects = Vec::new();
        if registry.len() == 1 {
            if let Some(tab) = self.state.registry.remove(id) {
                effects.extend(self.release_models(&tab));
            }
            self.state.registry.set_view_mode(ViewMode::Normal);
            effects.push(Effect::Model(ModelCommand::SwitchToNormalView));
            return effects;
        }

        if let Some(neighbour) = registry.neighbour_of(index) {
            effects.extend(self.activate(neighbour));
        }
        if let Some(tab) = self.state.registry.remove(id) {
            tracing::debug!(target: "session", locator = %tab.locator, kind = ?tab.kind, "tab closed");
            effects.extend(self.release_models(&tab));
        }
        effects
    }

    fn refresh_vcs_effect(&mut self) -> Effect {
        Effect::RefreshVcs {
            seq: self.state.vcs.next_seq(),
        }
    }

    /// Re-points `tab` and any compare target below `from` at `to`.
    fn rebase_tabs(&mut self, from: &Locator, to: &Locator) -> Vec<Effect> {
        let mut effects = Vec::new();
        let mut renamed_models: FxHashSet<Locator> = FxHashSet::default();
        let active = self.state.registry.active_id();

        for tab in self.state.registry.tabs_mut() {
            let is_text_model = tab.is_text_model();
            if let Some(new_locator) = tab.locator.rebase(from, to) {
                let old_locator = tab.locator.clone();
                if is_text_model && renamed_models.insert(old_locator.clone()) {
                    effects.push(Effect::Model(ModelCommand::RenameModel {
                        old: old_locator.clone(),
                        new: new_locator.clone(),
                    }));
                }
                tab.relocate(new_locator.clone());
                if Some(tab.id) == active && tab.kind == TabKind::File {
                    effects.push(Effect::Model(ModelCommand::SetModel {
                        from: Some(old_locator),
                        to: new_locator,
                    }));
                }
            }
            let rebased_target = tab
                .compare_target
                .as_ref()
                .and_then(|target| target.rebase(from, to).map(|new| (target.clone(), new)));
            if let Some((old_target, new_target)) = rebased_target {
                if renamed_models.insert(old_target.clone()) {
                    effects.push(Effect::Model(ModelCommand::RenameModel {
                        old: old_target,
                        new: new_target.clone(),
                    }));
                }
                tab.compare_target = Some(new_target);
            }
        }
        effects
    }
}

fn diff_view_command(tab: &EditorTab) -> Effect {
    let original = tab
        .compare_target
        .clone()
        .unwrap_or_else(|| tab.locator.previous_version());
    Effect::Model(ModelCommand::SwitchToDiffView {
        original_content: tab.compare_text(),
        modified_content: tab.text(),
        original,
        modified: tab.locator.clone(),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/store.rs"]
mod tests;
