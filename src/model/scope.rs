//! Scope kinds
//!
//! One closed tagged variant covers every scope the database tracks. Blocks
//! are anonymous and identified by structural path; namespaces, types,
//! methods, and properties are named and identified by name. Per-kind merge
//! constraints live in `tree.rs`, matching predicates in `resolve/`.

use crate::model::uses::Use;
use serde::{Deserialize, Serialize};

/// The kind of a scope node, with per-kind payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "lowercase")]
pub enum ScopeKind {
    /// Anonymous block scope (function body, `if`, `for`, ...)
    Block,
    /// Namespace; the global namespace has an empty name
    Namespace(NamespaceData),
    /// Class, struct, union, interface, or enum
    Type(TypeData),
    /// Method, constructor, or destructor
    Method(MethodData),
    /// Property with optional declared type
    Property(PropertyData),
}

impl ScopeKind {
    /// The scope's name, `None` for anonymous blocks.
    pub fn name(&self) -> Option<&str> {
        match self {
            ScopeKind::Block => None,
            ScopeKind::Namespace(data) => Some(&data.name),
            ScopeKind::Type(data) => Some(&data.name),
            ScopeKind::Method(data) => Some(&data.name),
            ScopeKind::Property(data) => Some(&data.name),
        }
    }

    /// Whether this is the global (unnamed) namespace.
    pub fn is_global_namespace(&self) -> bool {
        matches!(self, ScopeKind::Namespace(data) if data.name.is_empty())
    }

    /// Short label for display and logging.
    pub fn label(&self) -> &'static str {
        match self {
            ScopeKind::Block => "block",
            ScopeKind::Namespace(_) => "namespace",
            ScopeKind::Type(_) => "type",
            ScopeKind::Method(_) => "method",
            ScopeKind::Property(_) => "property",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceData {
    /// Empty for the global namespace
    pub name: String,
}

impl NamespaceData {
    pub fn global() -> Self {
        Self { name: String::new() }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Class-like kinds a `Type` scope can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Class,
    Struct,
    Union,
    Interface,
    Enum,
}

/// Declared accessibility of a type or member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accessibility {
    /// No modifier present in source
    #[default]
    Unspecified,
    Public,
    Internal,
    Protected,
    Private,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeData {
    pub name: String,
    pub kind: TypeKind,
    #[serde(default)]
    pub accessibility: Accessibility,
    /// Partial types may be declared across files and merge into one node
    #[serde(default)]
    pub is_partial: bool,
    /// Base types and implemented interfaces, as unresolved type uses
    #[serde(default)]
    pub parents: Vec<Use>,
}

impl TypeData {
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            accessibility: Accessibility::Unspecified,
            is_partial: false,
            parents: Vec::new(),
        }
    }

    pub fn partial(mut self) -> Self {
        self.is_partial = true;
        self
    }

    pub fn with_parent(mut self, parent: Use) -> Self {
        self.parents.push(parent);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    /// Declared type, when the front end could extract one
    #[serde(default)]
    pub param_type: Option<Use>,
    /// True when the parameter carries a default value
    #[serde(default)]
    pub has_default: bool,
}

impl Parameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type: None,
            has_default: false,
        }
    }

    pub fn with_type(mut self, param_type: Use) -> Self {
        self.param_type = Some(param_type);
        self
    }

    pub fn with_default(mut self) -> Self {
        self.has_default = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodData {
    pub name: String,
    #[serde(default)]
    pub is_constructor: bool,
    #[serde(default)]
    pub is_destructor: bool,
    /// Ordered parameter list
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub return_type: Option<Use>,
}

impl MethodData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_constructor: false,
            is_destructor: false,
            parameters: Vec::new(),
            return_type: None,
        }
    }

    pub fn constructor(name: impl Into<String>) -> Self {
        Self {
            is_constructor: true,
            ..Self::new(name)
        }
    }

    pub fn destructor(name: impl Into<String>) -> Self {
        Self {
            is_destructor: true,
            ..Self::new(name)
        }
    }

    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Smallest argument count this method accepts: every defaulted
    /// parameter may be omitted.
    pub fn min_arity(&self) -> usize {
        self.parameters.len() - self.parameters.iter().filter(|p| p.has_default).count()
    }

    /// Largest argument count this method accepts.
    pub fn max_arity(&self) -> usize {
        self.parameters.len()
    }

    /// Whether a call with `arguments` arguments is arity-compatible.
    pub fn accepts_arity(&self, arguments: usize) -> bool {
        arguments >= self.min_arity() && arguments <= self.max_arity()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyData {
    pub name: String,
    #[serde(default)]
    pub value_type: Option<Use>,
    #[serde(default)]
    pub accessibility: Accessibility,
}

impl PropertyData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value_type: None,
            accessibility: Accessibility::Unspecified,
        }
    }
}
