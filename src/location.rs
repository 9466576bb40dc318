//! Source locations and structural paths
//!
//! Every scope and use carries one or more `SourceLocation`s. Besides the
//! usual file/line/column triple, a location records the *structural path* of
//! the element it came from: a slash-separated element path with one-based
//! sibling ordinals, e.g. `/unit/namespace[1]/class[1]/function[2]`.
//!
//! Structural paths are what make scope identity and containment checks
//! independent of formatting: two scopes cover the same source construct
//! exactly when their paths are equal, and a location sits inside a scope
//! exactly when the scope's path is a prefix of the location's path.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Structural path of an element within one file's parse tree.
///
/// Stored in normalized string form. Paths are compared segment-wise, so
/// `/unit/class[1]` is a prefix of `/unit/class[1]/function[2]` but not of
/// `/unit/class[12]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StructuralPath(String);

impl StructuralPath {
    /// Parse a structural path, validating its shape.
    ///
    /// A valid path is `/seg(/seg)*` where each segment is an element name
    /// optionally followed by a one-based ordinal in brackets.
    pub fn parse(raw: &str) -> Result<Self> {
        if !raw.starts_with('/') || raw.len() < 2 {
            return Err(Error::InvalidStructure(format!(
                "structural path must start with '/': {raw:?}"
            )));
        }
        for segment in raw[1..].split('/') {
            Self::validate_segment(segment, raw)?;
        }
        Ok(Self(raw.to_string()))
    }

    fn validate_segment(segment: &str, raw: &str) -> Result<()> {
        let (name, ordinal) = match segment.split_once('[') {
            Some((name, rest)) => {
                let ordinal = rest.strip_suffix(']').ok_or_else(|| {
                    Error::InvalidStructure(format!("unterminated ordinal in {raw:?}"))
                })?;
                (name, Some(ordinal))
            }
            None => (segment, None),
        };
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(Error::InvalidStructure(format!(
                "bad element name {name:?} in {raw:?}"
            )));
        }
        if let Some(ordinal) = ordinal {
            match ordinal.parse::<u32>() {
                Ok(n) if n >= 1 => {}
                _ => {
                    return Err(Error::InvalidStructure(format!(
                        "bad ordinal {ordinal:?} in {raw:?}"
                    )))
                }
            }
        }
        Ok(())
    }

    /// The raw path string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Segment-wise prefix check. A path is a prefix of itself.
    pub fn is_prefix_of(&self, other: &StructuralPath) -> bool {
        if self.0 == other.0 {
            return true;
        }
        other
            .0
            .strip_prefix(&self.0)
            .is_some_and(|rest| rest.starts_with('/'))
    }

    /// The path of the enclosing element, or `None` at the root.
    pub fn parent(&self) -> Option<StructuralPath> {
        let idx = self.0.rfind('/')?;
        if idx == 0 {
            return None;
        }
        Some(Self(self.0[..idx].to_string()))
    }

    /// Append one child segment.
    pub fn child(&self, name: &str, ordinal: u32) -> StructuralPath {
        Self(format!("{}/{}[{}]", self.0, name, ordinal))
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        self.0[1..].split('/').count()
    }
}

impl fmt::Display for StructuralPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for StructuralPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for StructuralPath {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for StructuralPath {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        StructuralPath::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// A single location of a scope or use in source.
///
/// `is_reference` distinguishes locations where the entity is merely named
/// (the `A.B` in `namespace A.B.C`, a forward declaration) from locations
/// where it is defined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    /// File the location belongs to, relative to the project root
    pub file: String,
    /// 1-indexed line
    pub line: u32,
    /// 1-indexed column
    pub column: u32,
    /// Structural path of the element within the file
    pub path: StructuralPath,
    /// True when the entity is referenced rather than defined here
    pub is_reference: bool,
}

impl SourceLocation {
    /// Create a definition location.
    pub fn definition(file: impl Into<String>, line: u32, column: u32, path: StructuralPath) -> Self {
        Self {
            file: file.into(),
            line,
            column,
            path,
            is_reference: false,
        }
    }

    /// Create a reference location.
    pub fn reference(file: impl Into<String>, line: u32, column: u32, path: StructuralPath) -> Self {
        Self {
            file: file.into(),
            line,
            column,
            path,
            is_reference: true,
        }
    }

    /// Whether `other` falls inside this location: same file and this
    /// location's structural path encloses the other's.
    pub fn contains(&self, other: &SourceLocation) -> bool {
        self.file == other.file && self.path.is_prefix_of(&other.path)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}
