use crate::kernel::{Locator, TextEncoding};
use compact_str::CompactString;
use ropey::Rope;
use std::fmt;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const PREVIEW_DECORATION: &str = "preview";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TabId(u64);

impl TabId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TabKind {
    File,
    Preview,
    Diff,
    Image,
}

/// What an open or close request is willing to match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum OpenKind {
    /// File, Preview or Image; never Diff.
    #[default]
    Any,
    File,
    Preview,
    Diff,
    Image,
}

impl OpenKind {
    pub fn matches(self, kind: TabKind) -> bool {
        match self {
            Self::Any => kind != TabKind::Diff,
            Self::File => kind == TabKind::File,
            Self::Preview => kind == TabKind::Preview,
            Self::Diff => kind == TabKind::Diff,
            Self::Image => kind == TabKind::Image,
        }
    }
}

impl From<TabKind> for OpenKind {
    fn from(kind: TabKind) -> Self {
        match kind {
            TabKind::File => Self::File,
            TabKind::Preview => Self::Preview,
            TabKind::Diff => Self::Diff,
            TabKind::Image => Self::Image,
        }
    }
}

/// Shared flag that background work checks before reporting back; cancelled
/// when the owning tab is closed.
#[derive(Clone, Debug, Default)]
pub struct LifetimeToken(Arc<AtomicBool>);

impl LifetimeToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub format: image::ImageFormat,
    pub width: u32,
    pub height: u32,
    pub bytes: Arc<Vec<u8>>,
}

impl ImagePayload {
    /// Sniffs `bytes` for a supported raster format and reads its dimensions.
    pub fn classify(bytes: &[u8]) -> Option<Self> {
        let reader = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .ok()?;
        let format = reader.format()?;
        let (width, height) = reader.into_dimensions().ok()?;
        Some(Self {
            format,
            width,
            height,
            bytes: Arc::new(bytes.to_vec()),
        })
    }
}

impl fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImagePayload")
            .field("format", &self.format)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Buffer and version bookkeeping of a text tab, as handed between tabs
/// that show the same model.
#[derive(Debug, Clone)]
pub struct BufferState {
    content: Rope,
    encoding: TextEncoding,
    current_version_id: u64,
    last_saved_version_id: u64,
    pending_save: Option<u64>,
    edited: bool,
    is_deleted: bool,
}

pub struct EditorTab {
    pub id: TabId,
    pub title: CompactString,
    pub locator: Locator,
    pub kind: TabKind,
    /// Original side of a Diff tab.
    pub compare_target: Option<Locator>,
    pub content: Rope,
    /// Text shown for `compare_target` when the diff is re-rendered.
    pub compare_content: Option<Rope>,
    pub encoding: TextEncoding,
    pub is_deleted: bool,
    pub image: Option<ImagePayload>,
    current_version_id: u64,
    last_saved_version_id: u64,
    pending_save: Option<u64>,
    edited: bool,
    token: LifetimeToken,
}

impl EditorTab {
    fn new(id: TabId, locator: Locator, kind: TabKind, content: Rope) -> Self {
        let title = CompactString::from(locator.display_name());
        Self {
            id,
            title,
            locator,
            kind,
            compare_target: None,
            content,
            compare_content: None,
            encoding: TextEncoding::default(),
            is_deleted: false,
            image: None,
            current_version_id: 1,
            last_saved_version_id: 1,
            pending_save: None,
            edited: false,
            token: LifetimeToken::new(),
        }
    }

    pub fn file(id: TabId, locator: Locator, text: &str, encoding: TextEncoding) -> Self {
        let mut tab = Self::new(id, locator, TabKind::File, Rope::from_str(text));
        tab.encoding = encoding;
        tab
    }

    /// `locator` is the undecorated source; the tab is keyed by its preview form.
    pub fn preview(id: TabId, locator: &Locator, text: &str) -> Self {
        let mut tab = Self::new(
            id,
            locator.decorated(PREVIEW_DECORATION),
            TabKind::Preview,
            Rope::from_str(text),
        );
        tab.title = CompactString::from(format!("Preview {}", locator.display_name()));
        tab
    }

    pub fn diff(
        id: TabId,
        modified: Locator,
        original: Locator,
        modified_text: &str,
        original_text: &str,
    ) -> Self {
        let mut tab = Self::new(id, modified, TabKind::Diff, Rope::from_str(modified_text));
        tab.title = CompactString::from(format!("{} (diff)", tab.locator.display_name()));
        tab.compare_target = Some(original);
        tab.compare_content = Some(Rope::from_str(original_text));
        tab
    }

    pub fn image(id: TabId, locator: Locator, payload: ImagePayload) -> Self {
        let mut tab = Self::new(id, locator, TabKind::Image, Rope::new());
        tab.image = Some(payload);
        tab
    }

    pub fn current_version_id(&self) -> u64 {
        self.current_version_id
    }

    pub fn last_saved_version_id(&self) -> u64 {
        self.last_saved_version_id
    }

    pub fn is_dirty(&self) -> bool {
        self.current_version_id != self.last_saved_version_id
    }

    /// A save does I/O only for a dirty tab or one whose backing resource vanished.
    pub fn needs_save(&self) -> bool {
        self.is_dirty() || self.is_deleted
    }

    pub fn was_edited(&self) -> bool {
        self.edited
    }

    /// Whether the next open may replace this tab in place.
    pub fn is_reusable(&self) -> bool {
        matches!(self.kind, TabKind::File | TabKind::Diff | TabKind::Image)
            && !self.edited
            && !self.is_dirty()
    }

    pub fn buffer_state(&self) -> BufferState {
        BufferState {
            content: self.content.clone(),
            encoding: self.encoding,
            current_version_id: self.current_version_id,
            last_saved_version_id: self.last_saved_version_id,
            pending_save: self.pending_save,
            edited: self.edited,
            is_deleted: self.is_deleted,
        }
    }

    /// Tabs sharing a model must agree on buffer and versions, or a save from
    /// one of them is skipped while the other still holds unsaved text.
    pub fn adopt_buffer(&mut self, state: BufferState) {
        self.content = state.content;
        self.encoding = state.encoding;
        self.current_version_id = state.current_version_id;
        self.last_saved_version_id = state.last_saved_version_id;
        self.pending_save = state.pending_save;
        self.edited = state.edited;
        self.is_deleted = state.is_deleted;
    }

    pub fn is_text_model(&self) -> bool {
        matches!(self.kind, TabKind::File | TabKind::Diff)
    }

    pub fn mark_modified(&mut self) {
        self.current_version_id = self.current_version_id.saturating_add(1);
        self.edited = true;
    }

    /// Records an acknowledged write of `version`. Never moves backwards, so a
    /// slow write finishing after a newer one cannot make the tab look older.
    pub fn mark_saved(&mut self, version: u64) {
        self.last_saved_version_id = self.last_saved_version_id.max(version);
        if self.pending_save.is_some_and(|pending| pending <= version) {
            self.pending_save = None;
        }
    }

    /// Claims `version` for an outgoing write; false when that exact version
    /// is already being written.
    pub fn begin_save(&mut self, version: u64) -> bool {
        if self.pending_save == Some(version) {
            return false;
        }
        self.pending_save = Some(version);
        true
    }

    pub fn abort_save(&mut self, version: u64) {
        if self.pending_save == Some(version) {
            self.pending_save = None;
        }
    }

    pub fn pending_save(&self) -> Option<u64> {
        self.pending_save
    }

    pub fn set_text(&mut self, text: &str) {
        self.content = Rope::from_str(text);
    }

    pub fn text(&self) -> String {
        self.content.to_string()
    }

    pub fn compare_text(&self) -> String {
        self.compare_content
            .as_ref()
            .map(Rope::to_string)
            .unwrap_or_default()
    }

    pub fn token(&self) -> &LifetimeToken {
        &self.token
    }

    pub fn relocate(&mut self, locator: Locator) {
        self.title = match self.kind {
            TabKind::Preview => CompactString::from(format!("Preview {}", locator.display_name())),
            TabKind::Diff => CompactString::from(format!("{} (diff)", locator.display_name())),
            TabKind::File | TabKind::Image => CompactString::from(locator.display_name()),
        };
        self.locator = locator;
    }
}

impl fmt::Debug for EditorTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorTab")
            .field("id", &self.id)
            .field("locator", &self.locator)
            .field("kind", &self.kind)
            .field("compare_target", &self.compare_target)
            .field("encoding", &self.encoding)
            .field("current_version_id", &self.current_version_id)
            .field("last_saved_version_id", &self.last_saved_version_id)
            .field("is_deleted", &self.is_deleted)
            .finish()
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/kernel/editor/tab.rs"]
mod tests;
