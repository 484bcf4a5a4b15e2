use crate::kernel::editor::{LifetimeToken, TabId};
use crate::kernel::error::Notification;
use crate::kernel::services::ports::ModelCommand;
use crate::kernel::{Locator, TextEncoding};

#[derive(Debug, Clone)]
pub enum Effect {
    ReadForOpen {
        request: u64,
        locator: Locator,
    },
    ReadForPreview {
        locator: Locator,
    },
    WriteContent {
        locator: Locator,
        versions: Vec<(TabId, u64)>,
        bytes: Vec<u8>,
    },
    ReloadContent {
        tab: TabId,
        token: LifetimeToken,
        locator: Locator,
        encoding: TextEncoding,
        external: bool,
    },
    /// Committed text and current text, fetched together.
    FetchPrevious {
        locator: Locator,
    },
    /// Both sides of a compare-with-selected; `original` is the selected one.
    ReadPair {
        original: Locator,
        modified: Locator,
    },
    RenamePath {
        from: Locator,
        to: Locator,
    },
    DuplicatePath {
        from: Locator,
    },
    RemovePath {
        locator: Locator,
    },
    CreateFolder {
        parent: Locator,
    },
    RequestDownload {
        locator: Locator,
    },
    LoadRepository {
        root: Locator,
    },
    RefreshVcs {
        seq: u64,
    },
    WatchWorkspace {
        root: Locator,
    },
    CheckExistence {
        locators: Vec<Locator>,
    },
    Model(ModelCommand),
    Notify(Notification),
}

impl Effect {
    /// Handled synchronously on the control thread.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Model(_) | Self::Notify(_) | Self::WatchWorkspace { .. })
    }
}
