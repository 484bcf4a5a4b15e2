use crate::kernel::editor::{OpenKind, TabId};
use crate::kernel::error::SessionError;
use crate::kernel::pipeline::ReadOutcome;
use crate::kernel::vcs::VcsSnapshot;
use crate::kernel::{Locator, TextEncoding};

#[derive(Debug, Clone)]
pub enum Action {
    Open {
        locator: Locator,
        kind: OpenKind,
        new_tab: bool,
    },
    OpenPreview {
        locator: Locator,
    },
    ActivateTab {
        tab: TabId,
    },
    Close {
        locator: Locator,
        kind: OpenKind,
    },
    CloseAll,
    /// The host buffer for `locator` changed; the only path that bumps versions.
    ContentChanged {
        locator: Locator,
        text: String,
    },
    Save {
        tab: TabId,
    },
    SaveActive,
    ReloadWithEncoding {
        encoding: TextEncoding,
    },
    CompareWithPrevious {
        locator: Locator,
    },
    SelectForCompare {
        locator: Locator,
    },
    CompareWithSelected {
        locator: Locator,
    },
    Rename {
        locator: Locator,
        new_name: String,
    },
    Duplicate {
        locator: Locator,
    },
    Delete {
        locator: Locator,
    },
    CreateFolder {
        parent: Locator,
    },
    LoadWorkspace {
        root: Locator,
    },
    RefreshVcs,
    /// Watcher report for the workspace.
    PathsChanged {
        modified: Vec<Locator>,
        removed: Vec<Locator>,
    },

    OpenRead {
        request: u64,
        locator: Locator,
        outcome: ReadOutcome,
    },
    PreviewRead {
        locator: Locator,
        result: Result<String, SessionError>,
    },
    Saved {
        locator: Locator,
        versions: Vec<(TabId, u64)>,
        result: Result<(), SessionError>,
    },
    Reloaded {
        tab: TabId,
        encoding: TextEncoding,
        /// Triggered by an on-disk change rather than a user request.
        external: bool,
        result: Result<String, SessionError>,
    },
    DiffRead {
        locator: Locator,
        compare_target: Locator,
        /// `(original, modified)`.
        result: Result<(String, String), SessionError>,
    },
    PathRenamed {
        from: Locator,
        to: Locator,
        result: Result<(), SessionError>,
    },
    PathDuplicated {
        from: Locator,
        result: Result<Locator, SessionError>,
    },
    PathDeleted {
        locator: Locator,
        result: Result<(), SessionError>,
    },
    FolderCreated {
        parent: Locator,
        result: Result<Locator, SessionError>,
    },
    WorkspaceLoaded {
        root: Locator,
        result: Result<(), SessionError>,
    },
    VcsRefreshed {
        seq: u64,
        result: Result<VcsSnapshot, SessionError>,
    },
    ExistenceChecked {
        missing: Vec<Locator>,
    },
    DownloadRequested {
        locator: Locator,
        result: Result<(), SessionError>,
    },
}
