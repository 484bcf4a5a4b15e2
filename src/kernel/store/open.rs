use super::DispatchResult;
use crate::kernel::editor::{EditorTab, OpenKind, TabKind, ViewMode, PREVIEW_DECORATION};
use crate::kernel::error::{Notification, SessionError};
use crate::kernel::pipeline::ReadOutcome;
use crate::kernel::services::ports::ModelCommand;
use crate::kernel::state::PendingOpen;
use crate::kernel::{Effect, Locator};

impl super::Store {
    pub(super) fn open(&mut self, locator: Locator, kind: OpenKind, new_tab: bool) -> DispatchResult {
        if kind == OpenKind::Preview || locator.decoration() == Some(PREVIEW_DECORATION) {
            return self.open_preview(locator.undecorated());
        }

        if let Some(id) = self.state.registry.find(&locator, kind) {
            let effects = self.activate(id);
            return DispatchResult {
                state_changed: !effects.is_empty(),
                effects,
            };
        }
        if kind == OpenKind::Diff {
            // Diff tabs only come from a compare.
            return DispatchResult::unchanged();
        }

        if let Some(pending) = self.state.pending_opens.get_mut(&locator) {
            pending.new_tab |= new_tab;
            return DispatchResult::unchanged();
        }

        if self.state.settings.is_placeholder(locator.extension()) {
            return DispatchResult::effects_only(vec![Effect::RequestDownload { locator }]);
        }

        let request = self.state.alloc_request();
        self.state.pending_opens.insert(
            locator.clone(),
            PendingOpen {
                request,
                new_tab,
                preview: false,
            },
        );
        tracing::debug!(target: "session", %locator, request, "open requested");
        DispatchResult::changed(vec![Effect::ReadForOpen { request, locator }])
    }

    pub(super) fn open_preview(&mut self, locator: Locator) -> DispatchResult {
        let preview_locator = locator.decorated(PREVIEW_DECORATION);
        if let Some(id) = self.state.registry.find(&preview_locator, OpenKind::Preview) {
            let effects = self.activate(id);
            return DispatchResult {
                state_changed: !effects.is_empty(),
                effects,
            };
        }
        if !self.state.settings.supports_preview(locator.extension()) {
            return DispatchResult::unchanged();
        }

        if let Some(id) = self.state.registry.find(&locator, OpenKind::File) {
            let text = self
                .state
                .registry
                .get(id)
                .map(EditorTab::text)
                .unwrap_or_default();
            let effects = self.push_preview(&locator, &text);
            return DispatchResult::changed(effects);
        }

        if let Some(pending) = self.state.pending_opens.get_mut(&locator) {
            pending.preview = true;
            return DispatchResult::changed(Vec::new());
        }
        if !self.state.pending_previews.insert(locator.clone()) {
            return DispatchResult::unchanged();
        }
        DispatchResult::changed(vec![Effect::ReadForPreview { locator }])
    }

    fn push_preview(&mut self, locator: &Locator, text: &str) -> Vec<Effect> {
        let id = self.state.registry.alloc_tab_id();
        self.state.registry.push(EditorTab::preview(id, locator, text));
        self.activate(id)
    }

    pub(super) fn on_open_read(
        &mut self,
        request: u64,
        locator: Locator,
        outcome: ReadOutcome,
    ) -> DispatchResult {
        let Some(pending) = self
            .state
            .pending_opens
            .get(&locator)
            .copied()
            .filter(|pending| pending.request == request)
        else {
            tracing::debug!(target: "session", %locator, request, "dropping stale open result");
            return DispatchResult::unchanged();
        };
        self.state.pending_opens.remove(&locator);

        let mut effects = Vec::new();
        match outcome {
            ReadOutcome::Text { text, encoding } => {
                let id = self.state.registry.alloc_tab_id();
                let tab = EditorTab::file(id, locator.clone(), &text, encoding);
                effects.extend(self.install_tab(tab, pending.new_tab));
                if pending.preview {
                    effects.extend(self.push_preview(&locator, &text));
                }
            }
            ReadOutcome::Image(payload) => {
                let id = self.state.registry.alloc_tab_id();
                let tab = EditorTab::image(id, locator, payload);
                effects.extend(self.install_tab(tab, pending.new_tab));
            }
            ReadOutcome::Failed(err) => {
                tracing::warn!(target: "io", %locator, error = %err, "open failed");
                if pending.preview {
                    self.state.pending_previews.remove(&locator);
                }
                effects.push(Effect::Notify(Notification::error(&err)));
            }
        }
        DispatchResult::changed(effects)
    }

    pub(super) fn on_preview_read(
        &mut self,
        locator: Locator,
        result: Result<String, SessionError>,
    ) -> DispatchResult {
        if !self.state.pending_previews.remove(&locator) {
            return DispatchResult::unchanged();
        }
        match result {
            Ok(text) => {
                let effects = self.push_preview(&locator, &text);
                DispatchResult::changed(effects)
            }
            Err(err) => DispatchResult::notify(&err),
        }
    }

    pub(super) fn close(&mut self, locator: &Locator, kind: OpenKind) -> DispatchResult {
        let Some(id) = self.state.registry.find(locator, kind) else {
            return DispatchResult::unchanged();
        };
        let effects = self.close_tab(id);
        DispatchResult::changed(effects)
    }

    pub(super) fn close_all(&mut self) -> DispatchResult {
        self.state.pending_opens.clear();
        self.state.pending_previews.clear();
        if self.state.registry.is_empty() {
            return DispatchResult::unchanged();
        }

        let mut effects = vec![Effect::Model(ModelCommand::RemoveAllModels)];
        let in_diff = self
            .state
            .registry
            .active_tab()
            .is_some_and(|tab| tab.kind == TabKind::Diff);
        if in_diff {
            effects.push(Effect::Model(ModelCommand::SwitchToNormalView));
        }
        self.state.registry.set_view_mode(ViewMode::Normal);
        let closed = self.state.registry.clear();
        tracing::debug!(target: "session", count = closed.len(), "closed all tabs");
        DispatchResult::changed(effects)
    }
}
