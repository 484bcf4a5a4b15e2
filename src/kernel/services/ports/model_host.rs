//! Text Model Host port: the widget that owns live buffers.
//!
//! Calls happen on the control thread only. The kernel never talks to the host
//! directly; it emits [`ModelCommand`]s that the session applies in order.

use crate::kernel::Locator;

pub trait TextModelHost {
    fn new_model(&mut self, locator: &Locator, content: &str);

    fn update_model_content(&mut self, locator: &Locator, content: &str);

    fn remove_model(&mut self, locator: &Locator);

    fn rename_model(&mut self, old: &Locator, new: &Locator);

    fn set_model(&mut self, from: Option<&Locator>, to: &Locator);

    fn switch_to_diff_view(
        &mut self,
        original_content: &str,
        modified_content: &str,
        original: &Locator,
        modified: &Locator,
    );

    fn switch_to_normal_view(&mut self);

    fn remove_all_models(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelCommand {
    NewModel {
        locator: Locator,
        content: String,
    },
    UpdateModelContent {
        locator: Locator,
        content: String,
    },
    RemoveModel {
        locator: Locator,
    },
    RenameModel {
        old: Locator,
        new: Locator,
    },
    SetModel {
        from: Option<Locator>,
        to: Locator,
    },
    SwitchToDiffView {
        original_content: String,
        modified_content: String,
        original: Locator,
        modified: Locator,
    },
    SwitchToNormalView,
    RemoveAllModels,
}

impl ModelCommand {
    pub fn apply(&self, host: &mut dyn TextModelHost) {
        match self {
            Self::NewModel { locator, content } => host.new_model(locator, content),
            Self::UpdateModelContent { locator, content } => {
                host.update_model_content(locator, content)
            }
            Self::RemoveModel { locator } => host.remove_model(locator),
            Self::RenameModel { old, new } => host.rename_model(old, new),
            Self::SetModel { from, to } => host.set_model(from.as_ref(), to),
            Self::SwitchToDiffView {
                original_content,
                modified_content,
                original,
                modified,
            } => host.switch_to_diff_view(original_content, modified_content, original, modified),
            Self::SwitchToNormalView => host.switch_to_normal_view(),
            Self::RemoveAllModels => host.remove_all_models(),
        }
    }
}
