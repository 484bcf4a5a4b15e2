use super::DispatchResult;
use crate::kernel::editor::{TabId, TabKind, PREVIEW_DECORATION};
use crate::kernel::error::{Notification, SessionError};
use crate::kernel::pipeline::encode_for_save;
use crate::kernel::services::ports::ModelCommand;
use crate::kernel::{Effect, Locator, TextEncoding};

impl super::Store {
    pub(super) fn content_changed(&mut self, locator: &Locator, text: &str) -> DispatchResult {
        let preview = locator.decorated(PREVIEW_DECORATION);
        let mut changed = false;
        for tab in self.state.registry.tabs_mut() {
            if tab.is_text_model() && &tab.locator == locator {
                tab.set_text(text);
                tab.mark_modified();
                changed = true;
            } else if tab.kind == TabKind::Preview && tab.locator == preview {
                tab.set_text(text);
                changed = true;
            }
        }
        DispatchResult {
            effects: Vec::new(),
            state_changed: changed,
        }
    }

    pub(super) fn save(&mut self, id: TabId) -> DispatchResult {
        let Some(requested) = self.state.registry.get(id) else {
            return DispatchResult::unchanged();
        };
        if !requested.is_text_model() || requested.locator.is_previous_version() {
            return DispatchResult::unchanged();
        }
        // A File tab and a Diff tab over the same locator share one host
        // buffer; whichever of them holds unsaved text decides.
        let Some(tab) = self
            .state
            .registry
            .tabs()
            .iter()
            .filter(|tab| tab.is_text_model() && tab.locator == requested.locator)
            .filter(|tab| tab.needs_save())
            .max_by_key(|tab| tab.current_version_id())
        else {
            return DispatchResult::unchanged();
        };
        if tab.pending_save() == Some(tab.current_version_id()) {
            return DispatchResult::unchanged();
        }

        let locator = tab.locator.clone();
        let bytes = match encode_for_save(&locator, &tab.text(), tab.encoding) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(target: "io", %locator, error = %err, "save aborted before write");
                return DispatchResult::notify(&err);
            }
        };

        // Every text tab at this locator shows the same host buffer, so one
        // write covers all of them.
        let mut versions = Vec::new();
        for tab in self.state.registry.tabs_mut() {
            if tab.is_text_model() && tab.locator == locator {
                let version = tab.current_version_id();
                tab.begin_save(version);
                versions.push((tab.id, version));
            }
        }
        tracing::debug!(target: "io", %locator, ?versions, "saving");
        DispatchResult::changed(vec![Effect::WriteContent {
            locator,
            versions,
            bytes,
        }])
    }

    pub(super) fn on_saved(
        &mut self,
        locator: Locator,
        versions: Vec<(TabId, u64)>,
        result: Result<(), SessionError>,
    ) -> DispatchResult {
        match result {
            Ok(()) => {
                for (id, version) in versions {
                    if let Some(tab) = self.state.registry.get_mut(id) {
                        tab.mark_saved(version);
                        tab.is_deleted = false;
                    }
                }
                tracing::info!(target: "io", %locator, "saved");
                let refresh = self.refresh_vcs_effect();
                DispatchResult::changed(vec![refresh])
            }
            Err(err) => {
                let missing = matches!(err, SessionError::ResourceMissing { .. });
                for (id, version) in versions {
                    if let Some(tab) = self.state.registry.get_mut(id) {
                        tab.abort_save(version);
                        if missing {
                            tab.is_deleted = true;
                        }
                    }
                }
                tracing::warn!(target: "io", %locator, error = %err, "save failed");
                DispatchResult::changed(vec![Effect::Notify(Notification::error(&err))])
            }
        }
    }

    pub(super) fn reload_with_encoding(&mut self, encoding: TextEncoding) -> DispatchResult {
        let Some(tab) = self.state.registry.active_tab() else {
            return DispatchResult::unchanged();
        };
        if !tab.is_text_model() || tab.locator.is_previous_version() {
            return DispatchResult::unchanged();
        }
        DispatchResult::effects_only(vec![Effect::ReloadContent {
            tab: tab.id,
            token: tab.token().clone(),
            locator: tab.locator.clone(),
            encoding,
            external: false,
        }])
    }

    pub(super) fn on_reloaded(
        &mut self,
        id: TabId,
        encoding: TextEncoding,
        external: bool,
        result: Result<String, SessionError>,
    ) -> DispatchResult {
        let Some(tab) = self.state.registry.get(id) else {
            return DispatchResult::unchanged();
        };
        let locator = tab.locator.clone();

        let text = match result {
            Ok(text) => text,
            Err(err) if external => {
                tracing::debug!(target: "watch", %locator, error = %err, "external reload failed");
                return DispatchResult::unchanged();
            }
            Err(err) => {
                tracing::warn!(target: "io", %locator, %encoding, error = %err, "reload failed");
                return DispatchResult::notify(&err);
            }
        };
        if external && (tab.is_dirty() || tab.pending_save().is_some() || tab.text() == text) {
            return DispatchResult::unchanged();
        }

        for tab in self.state.registry.tabs_mut() {
            if tab.is_text_model() && tab.locator == locator {
                tab.set_text(&text);
                if !external {
                    tab.encoding = encoding;
                }
            }
        }
        DispatchResult::changed(vec![Effect::Model(ModelCommand::UpdateModelContent {
            locator,
            content: text,
        })])
    }
}
