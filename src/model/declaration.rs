//! Variable declarations
//!
//! Each scope carries a table of variables declared directly in it. The
//! declared type stays an unresolved type use until a resolution query asks
//! for it.

use crate::location::SourceLocation;
use crate::model::scope::Accessibility;
use crate::model::uses::Use;
use serde::{Deserialize, Serialize};

/// A variable (field, local, parameter captured as a local) declared in a scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDeclaration {
    pub name: String,
    /// Declared type, when the front end could extract one
    #[serde(default)]
    pub variable_type: Option<Use>,
    pub location: SourceLocation,
    #[serde(default)]
    pub accessibility: Accessibility,
}

impl VariableDeclaration {
    pub fn new(name: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            name: name.into(),
            variable_type: None,
            location,
            accessibility: Accessibility::Unspecified,
        }
    }

    pub fn with_type(mut self, variable_type: Use) -> Self {
        self.variable_type = Some(variable_type);
        self
    }
}
