//! Format values and insertable content

use std::fmt;

use serde::{Deserialize, Serialize};

/// Value carried by a format or an embed.
///
/// Boolean formats (bold, italic) use `Bool`; valued formats (a link target,
/// an image source) use `Text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormatValue {
    Bool(bool),
    Text(String),
}

impl FormatValue {
    /// Whether this value applies the format. `false` and `""` clear it.
    pub fn is_set(&self) -> bool {
        match self {
            FormatValue::Bool(b) => *b,
            FormatValue::Text(s) => !s.is_empty(),
        }
    }
}

impl Default for FormatValue {
    fn default() -> Self {
        FormatValue::Bool(true)
    }
}

impl From<bool> for FormatValue {
    fn from(value: bool) -> Self {
        FormatValue::Bool(value)
    }
}

impl From<&str> for FormatValue {
    fn from(value: &str) -> Self {
        FormatValue::Text(value.to_string())
    }
}

impl From<String> for FormatValue {
    fn from(value: String) -> Self {
        FormatValue::Text(value)
    }
}

impl fmt::Display for FormatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatValue::Bool(b) => write!(f, "{}", b),
            FormatValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One semantic content unit produced by `Document::values`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeafValue {
    Text(String),
    Embed { kind: String, value: FormatValue },
}

impl LeafValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            LeafValue::Text(s) => Some(s),
            LeafValue::Embed { .. } => None,
        }
    }
}

/// Content handed to `Document::insert_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insert<'a> {
    Text(&'a str),
    Embed {
        kind: &'a str,
        value: &'a FormatValue,
    },
}
