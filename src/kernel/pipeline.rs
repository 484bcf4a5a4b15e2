//! Save/reload pipeline: byte reads turned into tab content and back.
//!
//! Everything here blocks on the [`ContentStore`] and runs on background
//! workers; the store only ever sees the resulting [`ReadOutcome`] or error.

use super::editor::ImagePayload;
use super::encoding::{decode_with_fallback, TextEncoding};
use super::error::SessionError;
use super::services::ports::{ContentStore, WriteOptions};
use super::Locator;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Text {
        text: String,
        encoding: TextEncoding,
    },
    Image(ImagePayload),
    Failed(SessionError),
}

/// Reads `locator` for an open: fallback-chain text first, then an image sniff
/// of the same bytes.
pub fn read_for_open(store: &dyn ContentStore, locator: &Locator) -> ReadOutcome {
    let bytes = match store.read(locator) {
        Ok(bytes) => bytes,
        Err(e) => return ReadOutcome::Failed(SessionError::from_content(locator, &e)),
    };
    classify_bytes(locator, &bytes)
}

pub fn classify_bytes(locator: &Locator, bytes: &[u8]) -> ReadOutcome {
    if let Some((text, encoding)) = decode_with_fallback(bytes) {
        return ReadOutcome::Text { text, encoding };
    }
    match ImagePayload::classify(bytes) {
        Some(image) => ReadOutcome::Image(image),
        None => ReadOutcome::Failed(SessionError::UnsupportedEncoding {
            locator: locator.clone(),
        }),
    }
}

/// Text-only read through the fallback chain.
pub fn read_text(store: &dyn ContentStore, locator: &Locator) -> Result<String, SessionError> {
    let bytes = store
        .read(locator)
        .map_err(|e| SessionError::from_content(locator, &e))?;
    decode_with_fallback(&bytes)
        .map(|(text, _)| text)
        .ok_or_else(|| SessionError::UnsupportedEncoding {
            locator: locator.clone(),
        })
}

/// Re-reads `locator` with exactly `encoding`; no fallback.
pub fn read_with_encoding(
    store: &dyn ContentStore,
    locator: &Locator,
    encoding: TextEncoding,
) -> Result<String, SessionError> {
    let bytes = store
        .read(locator)
        .map_err(|e| SessionError::from_content(locator, &e))?;
    encoding
        .decode_strict(&bytes)
        .ok_or_else(|| SessionError::EncodingMismatch {
            locator: locator.clone(),
            encoding,
        })
}

pub fn encode_for_save(
    locator: &Locator,
    text: &str,
    encoding: TextEncoding,
) -> Result<Vec<u8>, SessionError> {
    encoding
        .encode(text)
        .ok_or_else(|| SessionError::Unencodable {
            locator: locator.clone(),
            encoding,
        })
}

pub fn write_back(
    store: &dyn ContentStore,
    locator: &Locator,
    bytes: &[u8],
) -> Result<(), SessionError> {
    store
        .write(locator, bytes, WriteOptions::SAVE)
        .map_err(|e| SessionError::from_write(locator, &e))
}

/// `name`, `name 2`, `name 3`, ... with `ext` re-attached.
pub fn numbered_names<'a>(
    base: String,
    ext: Option<&'a str>,
) -> impl Iterator<Item = String> + 'a {
    (1u32..).map(move |n| {
        let stem = if n == 1 {
            base.clone()
        } else {
            format!("{base} {n}")
        };
        match ext {
            Some(ext) => format!("{stem}.{ext}"),
            None => stem,
        }
    })
}

/// First sibling of `locator` named `<stem> copy[ N].<ext>` that does not exist yet.
pub fn free_duplicate_target(store: &dyn ContentStore, locator: &Locator) -> Option<Locator> {
    let parent = locator.parent()?;
    let stem = locator.file_stem()?;
    for name in numbered_names(format!("{stem} copy"), locator.extension()) {
        let candidate = parent.join(&name);
        if !store.exists(&candidate) {
            return Some(candidate);
        }
    }
    None
}

/// First `New Folder[ N]` under `parent` that does not exist yet.
pub fn free_folder_target(store: &dyn ContentStore, parent: &Locator) -> Locator {
    numbered_names("New Folder".to_string(), None)
        .map(|name| parent.join(&name))
        .find(|candidate| !store.exists(candidate))
        .unwrap_or_else(|| parent.join("New Folder"))
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/pipeline.rs"]
mod tests;
