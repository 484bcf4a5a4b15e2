use super::DispatchResult;
use crate::kernel::error::SessionError;
use crate::kernel::vcs::VcsSnapshot;
use crate::kernel::{Effect, Locator};

impl super::Store {
    pub(super) fn load_workspace(&mut self, root: Locator) -> DispatchResult {
        let mut effects = self.close_all().effects;
        self.state.selected_for_compare = None;
        self.state.workspace_root = Some(root.clone());
        self.state.vcs.reset_root(Some(root.clone()));
        tracing::info!(target: "session", %root, "workspace loaded");
        effects.push(Effect::WatchWorkspace { root: root.clone() });
        effects.push(Effect::LoadRepository { root });
        DispatchResult::changed(effects)
    }

    pub(super) fn on_workspace_loaded(
        &mut self,
        root: Locator,
        result: Result<(), SessionError>,
    ) -> DispatchResult {
        if self.state.workspace_root.as_ref() != Some(&root) {
            return DispatchResult::unchanged();
        }
        match result {
            Ok(()) => DispatchResult::effects_only(vec![self.refresh_vcs_effect()]),
            Err(err) => {
                tracing::info!(target: "vcs", %root, error = %err, "no repository");
                DispatchResult::unchanged()
            }
        }
    }

    pub(super) fn on_vcs_refreshed(
        &mut self,
        seq: u64,
        result: Result<VcsSnapshot, SessionError>,
    ) -> DispatchResult {
        let changed = match result {
            Ok(snapshot) => self.state.vcs.apply(seq, snapshot),
            Err(err) => {
                tracing::warn!(target: "vcs", seq, error = %err, "status refresh failed");
                self.state.vcs.clear(seq)
            }
        };
        if !changed {
            tracing::debug!(target: "vcs", seq, "dropping stale status");
        }
        DispatchResult {
            effects: Vec::new(),
            state_changed: changed,
        }
    }
}
