use compact_str::CompactString;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Every open appends a tab, even from an unedited active one.
    #[serde(default)]
    pub always_open_in_new_tab: bool,
    /// An unedited active tab is replaced in place by the next open.
    #[serde(default = "default_true")]
    pub reuse_unedited_tab: bool,
    #[serde(default = "default_placeholder_extension")]
    pub placeholder_extension: CompactString,
    #[serde(default = "default_preview_extensions")]
    pub preview_extensions: Vec<CompactString>,
}

fn default_true() -> bool {
    true
}

fn default_placeholder_extension() -> CompactString {
    CompactString::from("icloud")
}

fn default_preview_extensions() -> Vec<CompactString> {
    vec![CompactString::from("md"), CompactString::from("markdown")]
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            always_open_in_new_tab: false,
            reuse_unedited_tab: true,
            placeholder_extension: default_placeholder_extension(),
            preview_extensions: default_preview_extensions(),
        }
    }
}

impl SessionSettings {
    pub fn is_placeholder(&self, extension: Option<&str>) -> bool {
        extension.is_some_and(|ext| ext.eq_ignore_ascii_case(&self.placeholder_extension))
    }

    pub fn supports_preview(&self, extension: Option<&str>) -> bool {
        extension.is_some_and(|ext| {
            self.preview_extensions
                .iter()
                .any(|candidate| candidate.eq_ignore_ascii_case(ext))
        })
    }
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/ports/settings.rs"]
mod tests;
