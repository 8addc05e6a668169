//! Object content returned by `read_file`

use std::str::FromStr;

use crate::error::{Error, Result};

/// Text encodings accepted by `read_file`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Ascii,
    Latin1,
}

impl FromStr for TextEncoding {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "utf-8" | "utf8" => Ok(TextEncoding::Utf8),
            "ascii" | "us-ascii" => Ok(TextEncoding::Ascii),
            "latin-1" | "latin1" | "iso-8859-1" | "iso8859-1" => Ok(TextEncoding::Latin1),
            _ => Err(Error::InvalidArgument(format!("unknown text encoding '{name}'"))),
        }
    }
}

impl TextEncoding {
    /// Decode `bytes`, failing on any byte sequence invalid in this encoding
    pub fn decode(self, bytes: Vec<u8>) -> Result<String> {
        match self {
            TextEncoding::Utf8 => {
                String::from_utf8(bytes).map_err(|e| Error::Decode(format!("invalid UTF-8: {e}")))
            }
            TextEncoding::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(pos) => Err(Error::Decode(format!("non-ASCII byte at offset {pos}"))),
                None => Ok(bytes.into_iter().map(char::from).collect()),
            },
            // Latin-1 maps every byte to the code point of the same value
            TextEncoding::Latin1 => Ok(bytes.into_iter().map(char::from).collect()),
        }
    }
}

/// Body of an object, raw or decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    Bytes(Vec<u8>),
    Text(String),
}

impl FileContent {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FileContent::Text(s) => Some(s),
            FileContent::Bytes(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            FileContent::Bytes(b) => b.len(),
            FileContent::Text(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
