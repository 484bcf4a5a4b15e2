use crate::kernel::services::ports::TextModelHost;
use crate::kernel::Locator;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffView {
    pub original: Locator,
    pub modified: Locator,
}

/// In-memory Text Model Host for headless sessions: keeps every model's text
/// and which one is shown.
#[derive(Debug, Default)]
pub struct HeadlessModelHost {
    models: FxHashMap<Locator, String>,
    current: Option<Locator>,
    diff: Option<DiffView>,
}

impl HeadlessModelHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(&self, locator: &Locator) -> Option<&str> {
        self.models.get(locator).map(String::as_str)
    }

    pub fn has_model(&self, locator: &Locator) -> bool {
        self.models.contains_key(locator)
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    pub fn current(&self) -> Option<&Locator> {
        self.current.as_ref()
    }

    pub fn diff_view(&self) -> Option<&DiffView> {
        self.diff.as_ref()
    }

    pub fn is_diff_view(&self) -> bool {
        self.diff.is_some()
    }
}

impl TextModelHost for HeadlessModelHost {
    fn new_model(&mut self, locator: &Locator, content: &str) {
        self.models.insert(locator.clone(), content.to_string());
    }

    fn update_model_content(&mut self, locator: &Locator, content: &str) {
        if let Some(model) = self.models.get_mut(locator) {
            content.clone_into(model);
        }
    }

    fn remove_model(&mut self, locator: &Locator) {
        self.models.remove(locator);
        if self.current.as_ref() == Some(locator) {
            self.current = None;
        }
    }

    fn rename_model(&mut self, old: &Locator, new: &Locator) {
        if let Some(content) = self.models.remove(old) {
            self.models.insert(new.clone(), content);
        }
        if self.current.as_ref() == Some(old) {
            self.current = Some(new.clone());
        }
    }

    fn set_model(&mut self, _from: Option<&Locator>, to: &Locator) {
        self.current = Some(to.clone());
    }

    fn switch_to_diff_view(
        &mut self,
        original_content: &str,
        modified_content: &str,
        original: &Locator,
        modified: &Locator,
    ) {
        self.models
            .insert(original.clone(), original_content.to_string());
        self.models
            .entry(modified.clone())
            .or_insert_with(|| modified_content.to_string());
        self.diff = Some(DiffView {
            original: original.clone(),
            modified: modified.clone(),
        });
    }

    fn switch_to_normal_view(&mut self) {
        self.diff = None;
    }

    fn remove_all_models(&mut self) {
        self.models.clear();
        self.current = None;
    }
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/adapters/model_host.rs"]
mod tests;
