use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Codecs tried, in order, when a file is opened without an explicit encoding.
pub const FALLBACK_CHAIN: [TextEncoding; 4] = [
    TextEncoding::Utf8,
    TextEncoding::Windows1252,
    TextEncoding::Gb18030,
    TextEncoding::EucKr,
];

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

// Code points Windows-1252 leaves undefined.
const CP1252_UNDEFINED: [u8; 5] = [0x81, 0x8D, 0x8F, 0x90, 0x9D];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextEncoding {
    #[default]
    Utf8,
    Windows1252,
    Gb18030,
    EucKr,
    ShiftJis,
    Utf16Le,
    Utf16Be,
}

impl TextEncoding {
    pub const ALL: [TextEncoding; 7] = [
        TextEncoding::Utf8,
        TextEncoding::Windows1252,
        TextEncoding::Gb18030,
        TextEncoding::EucKr,
        TextEncoding::ShiftJis,
        TextEncoding::Utf16Le,
        TextEncoding::Utf16Be,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::Windows1252 => "Windows-1252",
            Self::Gb18030 => "GB18030",
            Self::EucKr => "EUC-KR",
            Self::ShiftJis => "Shift_JIS",
            Self::Utf16Le => "UTF-16LE",
            Self::Utf16Be => "UTF-16BE",
        }
    }

    fn codec(self) -> &'static Encoding {
        match self {
            Self::Utf8 => encoding_rs::UTF_8,
            Self::Windows1252 => encoding_rs::WINDOWS_1252,
            Self::Gb18030 => encoding_rs::GB18030,
            Self::EucKr => encoding_rs::EUC_KR,
            Self::ShiftJis => encoding_rs::SHIFT_JIS,
            Self::Utf16Le => encoding_rs::UTF_16LE,
            Self::Utf16Be => encoding_rs::UTF_16BE,
        }
    }

    /// Decodes `bytes` with this codec only; malformed input yields `None`.
    pub fn decode_strict(self, bytes: &[u8]) -> Option<String> {
        let bytes = match self {
            Self::Utf8 => bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes),
            Self::Utf16Le => bytes.strip_prefix(&[0xFF, 0xFE]).unwrap_or(bytes),
            Self::Utf16Be => bytes.strip_prefix(&[0xFE, 0xFF]).unwrap_or(bytes),
            Self::Windows1252 => {
                if bytes.iter().any(|b| CP1252_UNDEFINED.contains(b)) {
                    return None;
                }
                bytes
            }
            _ => bytes,
        };
        self.codec()
            .decode_without_bom_handling_and_without_replacement(bytes)
            .map(|text| text.into_owned())
    }

    /// Encodes `text`; `None` when a character has no representation in this codec.
    pub fn encode(self, text: &str) -> Option<Vec<u8>> {
        match self {
            Self::Utf8 => Some(text.as_bytes().to_vec()),
            // UTF-16 keeps its BOM so the file still sniffs as text on the next open.
            Self::Utf16Le => Some(
                std::iter::once(0xFEFF)
                    .chain(text.encode_utf16())
                    .flat_map(u16::to_le_bytes)
                    .collect(),
            ),
            Self::Utf16Be => Some(
                std::iter::once(0xFEFF)
                    .chain(text.encode_utf16())
                    .flat_map(u16::to_be_bytes)
                    .collect(),
            ),
            _ => {
                let (bytes, _, had_unmappable) = self.codec().encode(text);
                if had_unmappable {
                    None
                } else {
                    Some(bytes.into_owned())
                }
            }
        }
    }

    fn from_bom(bytes: &[u8]) -> Option<Self> {
        let (codec, _) = Encoding::for_bom(bytes)?;
        if codec == encoding_rs::UTF_8 {
            Some(Self::Utf8)
        } else if codec == encoding_rs::UTF_16LE {
            Some(Self::Utf16Le)
        } else if codec == encoding_rs::UTF_16BE {
            Some(Self::Utf16Be)
        } else {
            None
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Codec named by a leading BOM, else the first codec of [`FALLBACK_CHAIN`]
/// that decodes `bytes`.
///
/// Without a BOM, input containing NUL bytes is treated as binary and never
/// decodes.
pub fn decode_with_fallback(bytes: &[u8]) -> Option<(String, TextEncoding)> {
    if let Some(encoding) = TextEncoding::from_bom(bytes) {
        return encoding.decode_strict(bytes).map(|text| (text, encoding));
    }
    if bytes.contains(&0) {
        return None;
    }
    FALLBACK_CHAIN
        .iter()
        .find_map(|encoding| encoding.decode_strict(bytes).map(|text| (text, *encoding)))
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/encoding.rs"]
mod tests;
