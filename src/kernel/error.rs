use super::encoding::TextEncoding;
use super::locator::{Locator, LocatorError};
use super::services::ports::{ContentError, VcsError};

/// Failures surfaced to the user. Every variant renders a human-readable message;
/// nothing here is fatal to the control thread.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("{message}")]
    ContentUnavailable { locator: Locator, message: String },
    #[error("The file cannot be opened because it is in an unsupported encoding")]
    UnsupportedEncoding { locator: Locator },
    #[error("Failed to read file with {encoding}")]
    EncodingMismatch {
        locator: Locator,
        encoding: TextEncoding,
    },
    #[error("The content cannot be saved with {encoding}")]
    Unencodable {
        locator: Locator,
        encoding: TextEncoding,
    },
    #[error("No changes are made in this file")]
    NoTrackedChanges { locator: Locator },
    #[error("{} no longer exists", .locator.display_name())]
    ResourceMissing { locator: Locator },
    #[error("Version control: {message}")]
    Vcs { message: String },
    #[error("Download failed: {message}")]
    DownloadFailed { locator: Locator, message: String },
    #[error("Invalid location: {0}")]
    InvalidLocator(#[from] LocatorError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionErrorKind {
    ContentUnavailable,
    UnsupportedEncoding,
    EncodingMismatch,
    Unencodable,
    NoTrackedChanges,
    ResourceMissing,
    Vcs,
    DownloadFailed,
    InvalidLocator,
}

impl SessionError {
    pub fn kind(&self) -> SessionErrorKind {
        match self {
            Self::ContentUnavailable { .. } => SessionErrorKind::ContentUnavailable,
            Self::UnsupportedEncoding { .. } => SessionErrorKind::UnsupportedEncoding,
            Self::EncodingMismatch { .. } => SessionErrorKind::EncodingMismatch,
            Self::Unencodable { .. } => SessionErrorKind::Unencodable,
            Self::NoTrackedChanges { .. } => SessionErrorKind::NoTrackedChanges,
            Self::ResourceMissing { .. } => SessionErrorKind::ResourceMissing,
            Self::Vcs { .. } => SessionErrorKind::Vcs,
            Self::DownloadFailed { .. } => SessionErrorKind::DownloadFailed,
            Self::InvalidLocator(_) => SessionErrorKind::InvalidLocator,
        }
    }

    /// Maps a Content Store failure on a read-like operation.
    pub fn from_content(locator: &Locator, err: &ContentError) -> Self {
        Self::ContentUnavailable {
            locator: locator.clone(),
            message: err.to_string(),
        }
    }

    /// Maps a Content Store failure on a write; a vanished target becomes
    /// `ResourceMissing` so the tab can be flagged instead of dropped.
    pub fn from_write(locator: &Locator, err: &ContentError) -> Self {
        match err {
            ContentError::NotFound(_) => Self::ResourceMissing {
                locator: locator.clone(),
            },
            other => Self::from_content(locator, other),
        }
    }

    pub fn from_vcs(err: &VcsError) -> Self {
        Self::Vcs {
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub kind: Option<SessionErrorKind>,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
            kind: None,
        }
    }

    pub fn error(err: &SessionError) -> Self {
        let level = match err {
            SessionError::ResourceMissing { .. } => NotificationLevel::Warning,
            _ => NotificationLevel::Error,
        };
        Self {
            level,
            message: err.to_string(),
            kind: Some(err.kind()),
        }
    }
}
