//! Namespace imports and named aliases
//!
//! Two forms share one record, distinguished by `is_namespace_import`:
//! `using NS;` brings a namespace's children into scope, while
//! `using X = NS.Y;` binds a new name to a target.

use crate::language::Language;
use crate::location::SourceLocation;
use serde::{Deserialize, Serialize};

/// One alias directive, valid for the file it appears in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alias {
    /// The bound name; `None` for plain namespace imports
    #[serde(default)]
    pub name: Option<String>,
    /// Target namespace or type, as a qualified name in source form
    pub target: String,
    pub is_namespace_import: bool,
    pub location: SourceLocation,
    pub language: Language,
}

impl Alias {
    /// `using NS;`
    pub fn namespace_import(
        target: impl Into<String>,
        location: SourceLocation,
        language: Language,
    ) -> Self {
        Self {
            name: None,
            target: target.into(),
            is_namespace_import: true,
            location,
            language,
        }
    }

    /// `using X = NS.Y;`
    pub fn named(
        name: impl Into<String>,
        target: impl Into<String>,
        location: SourceLocation,
        language: Language,
    ) -> Self {
        Self {
            name: Some(name.into()),
            target: target.into(),
            is_namespace_import: false,
            location,
            language,
        }
    }

    /// Whether this alias can rewrite a use of `name`.
    pub fn binds(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name)
    }
}
