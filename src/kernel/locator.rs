//! Canonical resource addresses.
//!
//! Every URI entering the kernel goes through [`Locator::parse`] (or
//! [`Locator::from_path`]), so `file:///a/b%20c.txt`, `file:///a/b c.txt` and
//! `/a/b c.txt` all compare equal. The path is kept decoded; percent-encoding only
//! happens when rendering with [`Locator::to_uri_string`].

use compact_str::CompactString;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const PATH_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

// Other `{tag}` suffixes are part of the file name.
const PARSED_DECORATIONS: [&str; 1] = [crate::kernel::editor::PREVIEW_DECORATION];

const FILE_SCHEME: &str = "file";
const PREVIOUS_AUTHORITY: &str = "previous";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocatorError {
    #[error("empty locator")]
    Empty,
    #[error("relative locator is not allowed: {0}")]
    Relative(String),
    #[error("invalid scheme in locator: {0}")]
    InvalidScheme(String),
}

#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Locator {
    scheme: CompactString,
    authority: CompactString,
    path: String,
    decoration: Option<CompactString>,
}

impl Locator {
    pub fn parse(raw: &str) -> Result<Self, LocatorError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(LocatorError::Empty);
        }

        let (body, decoration) = split_decoration(raw);

        if let Some((scheme, rest)) = body.split_once("://") {
            let valid = !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
            if !valid {
                return Err(LocatorError::InvalidScheme(raw.to_string()));
            }
            let (authority, path) = match rest.find('/') {
                Some(i) => (&rest[..i], &rest[i..]),
                None => (rest, "/"),
            };
            let decoded = percent_decode_str(path).decode_utf8_lossy();
            return Ok(Self::from_parts(
                &scheme.to_ascii_lowercase(),
                authority,
                &decoded,
                decoration,
            ));
        }

        if body.starts_with('/') {
            return Ok(Self::from_parts(FILE_SCHEME, "", body, decoration));
        }

        Err(LocatorError::Relative(raw.to_string()))
    }

    pub fn from_path(path: &Path) -> Self {
        Self::from_parts(FILE_SCHEME, "", &path.to_string_lossy(), None)
    }

    fn from_parts(scheme: &str, authority: &str, path: &str, decoration: Option<&str>) -> Self {
        Self {
            scheme: CompactString::from(scheme),
            authority: CompactString::from(authority),
            path: normalize_path(path),
            decoration: decoration.map(CompactString::from),
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn decoration(&self) -> Option<&str> {
        self.decoration.as_deref()
    }

    pub fn is_local_file(&self) -> bool {
        self.scheme == FILE_SCHEME && self.authority.is_empty()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.path.rsplit('/').next().filter(|s| !s.is_empty())
    }

    pub fn file_stem(&self) -> Option<&str> {
        let name = self.file_name()?;
        match name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => Some(stem),
            _ => Some(name),
        }
    }

    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name()?;
        match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext),
            _ => None,
        }
    }

    pub fn parent(&self) -> Option<Self> {
        if self.path == "/" {
            return None;
        }
        let idx = self.path.rfind('/')?;
        let parent = if idx == 0 { "/" } else { &self.path[..idx] };
        Some(Self {
            scheme: self.scheme.clone(),
            authority: self.authority.clone(),
            path: parent.to_string(),
            decoration: None,
        })
    }

    pub fn join(&self, name: &str) -> Self {
        let joined = format!("{}/{}", self.path, name);
        Self {
            scheme: self.scheme.clone(),
            authority: self.authority.clone(),
            path: normalize_path(&joined),
            decoration: None,
        }
    }

    pub fn with_file_name(&self, name: &str) -> Option<Self> {
        self.parent().map(|parent| parent.join(name))
    }

    /// Same resource (ignoring decoration) or something below it.
    pub fn is_within(&self, ancestor: &Locator) -> bool {
        if self.scheme != ancestor.scheme || self.authority != ancestor.authority {
            return false;
        }
        if ancestor.path == "/" || self.path == ancestor.path {
            return true;
        }
        self.path
            .strip_prefix(ancestor.path.as_str())
            .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Moves `self` from below `from` to the same relative place below `to`.
    pub fn rebase(&self, from: &Locator, to: &Locator) -> Option<Self> {
        if !self.is_within(from) {
            return None;
        }
        let suffix = if from.path == "/" {
            self.path.as_str()
        } else {
            &self.path[from.path.len()..]
        };
        let path = if suffix.is_empty() {
            to.path.clone()
        } else {
            normalize_path(&format!("{}/{}", to.path, suffix))
        };
        Some(Self {
            scheme: to.scheme.clone(),
            authority: to.authority.clone(),
            path,
            decoration: self.decoration.clone(),
        })
    }

    pub fn decorated(&self, tag: &str) -> Self {
        Self {
            decoration: Some(CompactString::from(tag)),
            ..self.clone()
        }
    }

    pub fn undecorated(&self) -> Self {
        Self {
            decoration: None,
            ..self.clone()
        }
    }

    /// Synthetic address for the committed version of this resource.
    pub fn previous_version(&self) -> Self {
        Self {
            scheme: CompactString::from(FILE_SCHEME),
            authority: CompactString::from(PREVIOUS_AUTHORITY),
            path: self.path.clone(),
            decoration: None,
        }
    }

    pub fn is_previous_version(&self) -> bool {
        self.scheme == FILE_SCHEME && self.authority == PREVIOUS_AUTHORITY
    }

    pub fn to_file_path(&self) -> Option<PathBuf> {
        if !self.is_local_file() || self.decoration.is_some() {
            return None;
        }
        Some(PathBuf::from(&self.path))
    }

    pub fn to_uri_string(&self) -> String {
        let mut out = format!(
            "{}://{}{}",
            self.scheme,
            self.authority,
            utf8_percent_encode(&self.path, PATH_ENCODE_SET)
        );
        if let Some(tag) = &self.decoration {
            out.push('{');
            out.push_str(tag);
            out.push('}');
        }
        out
    }

    pub fn display_name(&self) -> &str {
        self.file_name().unwrap_or(self.path.as_str())
    }
}

fn split_decoration(raw: &str) -> (&str, Option<&str>) {
    if !raw.ends_with('}') {
        return (raw, None);
    }
    let Some(open) = raw.rfind('{') else {
        return (raw, None);
    };
    let tag = &raw[open + 1..raw.len() - 1];
    if !PARSED_DECORATIONS.contains(&tag) {
        return (raw, None);
    }
    (&raw[..open], Some(tag))
}

fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    if segments.is_empty() {
        return "/".to_string();
    }
    let mut out = String::with_capacity(path.len());
    for segment in segments {
        out.push('/');
        out.push_str(segment);
    }
    out
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uri_string())
    }
}

impl fmt::Debug for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Locator({})", self.to_uri_string())
    }
}

impl FromStr for Locator {
    type Err = LocatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Locator {
    type Error = LocatorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Locator> for String {
    fn from(value: Locator) -> Self {
        value.to_uri_string()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/locator.rs"]
mod tests;
