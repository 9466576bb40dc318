//! Unresolved uses
//!
//! A `Use` is a reference to something not yet resolved: a type name, a bare
//! name, a namespace, or a method call. It carries enough context (owning
//! scope, qualifying prefix, visible aliases) for the resolution engine to
//! answer "what does this refer to" later, against whatever the global tree
//! looks like at query time.

use crate::language::Language;
use crate::location::SourceLocation;
use crate::model::alias::Alias;
use crate::model::tree::ScopeId;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A qualifying name prefix (`A.B` in `A.B.C`), outermost first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamePrefix(Vec<String>);

impl NamePrefix {
    pub fn new(links: Vec<String>) -> Self {
        Self(links)
    }

    /// Split a qualified name on the language separator; returns the prefix
    /// and the final simple name.
    pub fn split_qualified(qualified: &str, language: Language) -> (Option<NamePrefix>, String) {
        let sep = language.separator();
        let mut parts: Vec<&str> = qualified.split(sep).collect();
        let name = parts.pop().unwrap_or_default().to_string();
        if parts.is_empty() {
            (None, name)
        } else {
            (
                Some(Self(parts.into_iter().map(str::to_string).collect())),
                name,
            )
        }
    }

    pub fn links(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NamePrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// The expression a member access hangs off (`x` in `x.Foo()`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "caller", rename_all = "lowercase")]
pub enum Caller {
    /// The language's self keyword (`this.Foo()`)
    SelfRef,
    /// A named operand, itself an unresolved name use
    Name(Box<Use>),
}

/// Payload of a method-call use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallData {
    /// Number of arguments at the call site; argument types are never inspected
    pub arguments: usize,
    #[serde(default)]
    pub type_arguments: Vec<Use>,
    #[serde(default)]
    pub is_constructor: bool,
    #[serde(default)]
    pub is_destructor: bool,
    #[serde(default)]
    pub caller: Option<Caller>,
}

/// Discriminates what a use may resolve to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "use", rename_all = "lowercase")]
pub enum UseKind {
    Type,
    Name,
    Namespace,
    Call(CallData),
}

/// An unresolved reference to a named entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Use {
    pub name: String,
    pub location: SourceLocation,
    /// Owning scope; `None` until the use is attached to a tree
    #[serde(default)]
    pub parent_scope: Option<ScopeId>,
    /// Qualifying prefix (`A.B` in `A.B.C`)
    #[serde(default)]
    pub prefix: Option<NamePrefix>,
    /// Aliases in effect at the use site
    #[serde(default)]
    pub aliases: Vec<Alias>,
    pub language: Language,
    pub kind: UseKind,
}

impl Use {
    fn new(name: impl Into<String>, location: SourceLocation, language: Language, kind: UseKind) -> Self {
        Self {
            name: name.into(),
            location,
            parent_scope: None,
            prefix: None,
            aliases: Vec::new(),
            language,
            kind,
        }
    }

    pub fn type_use(name: impl Into<String>, location: SourceLocation, language: Language) -> Self {
        Self::new(name, location, language, UseKind::Type)
    }

    pub fn name_use(name: impl Into<String>, location: SourceLocation, language: Language) -> Self {
        Self::new(name, location, language, UseKind::Name)
    }

    pub fn namespace_use(
        name: impl Into<String>,
        location: SourceLocation,
        language: Language,
    ) -> Self {
        Self::new(name, location, language, UseKind::Namespace)
    }

    pub fn call(
        name: impl Into<String>,
        location: SourceLocation,
        language: Language,
        data: CallData,
    ) -> Self {
        Self::new(name, location, language, UseKind::Call(data))
    }

    pub fn with_prefix(mut self, prefix: NamePrefix) -> Self {
        self.prefix = Some(prefix);
        self
    }

    pub fn with_aliases(mut self, aliases: Vec<Alias>) -> Self {
        self.aliases = aliases;
        self
    }

    /// Bind the use to its owning scope. Called by the tree when the use is
    /// stored in a node; re-bound whenever merge moves it.
    pub(crate) fn bind(&mut self, scope: ScopeId) {
        self.parent_scope = Some(scope);
        if let UseKind::Call(data) = &mut self.kind {
            if let Some(Caller::Name(inner)) = &mut data.caller {
                inner.bind(scope);
            }
        }
    }

    /// The owning scope, or a detached-use error for uses never attached to
    /// a tree.
    pub fn parent_scope(&self) -> Result<ScopeId> {
        self.parent_scope
            .ok_or_else(|| Error::DetachedUse(format!("{} at {}", self.name, self.location)))
    }

    /// Call payload accessor; `None` for non-call uses.
    pub fn call_data(&self) -> Option<&CallData> {
        match &self.kind {
            UseKind::Call(data) => Some(data),
            _ => None,
        }
    }
}

impl fmt::Display for Use {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{}.{}", prefix, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::StructuralPath;

    fn loc() -> SourceLocation {
        SourceLocation::reference(
            "a.cs",
            1,
            1,
            StructuralPath::parse("/unit/name[1]").unwrap(),
        )
    }

    #[test]
    fn test_split_qualified() {
        let (prefix, name) = NamePrefix::split_qualified("A.B.C", Language::CSharp);
        assert_eq!(prefix.unwrap().links(), ["A", "B"]);
        assert_eq!(name, "C");

        let (prefix, name) = NamePrefix::split_qualified("C", Language::CSharp);
        assert!(prefix.is_none());
        assert_eq!(name, "C");

        let (prefix, name) = NamePrefix::split_qualified("std::vector", Language::Cpp);
        assert_eq!(prefix.unwrap().links(), ["std"]);
        assert_eq!(name, "vector");
    }

    #[test]
    fn test_detached_use_is_an_error() {
        let use_ = Use::type_use("Widget", loc(), Language::CSharp);
        let err = use_.parent_scope().unwrap_err();
        assert!(matches!(err, Error::DetachedUse(_)));
    }

    #[test]
    fn test_bind_reaches_caller_operand() {
        let operand = Use::name_use("x", loc(), Language::CSharp);
        let mut call = Use::call(
            "Frob",
            loc(),
            Language::CSharp,
            CallData {
                arguments: 0,
                type_arguments: Vec::new(),
                is_constructor: false,
                is_destructor: false,
                caller: Some(Caller::Name(Box::new(operand))),
            },
        );
        call.bind(ScopeId(7));
        assert_eq!(call.parent_scope().unwrap(), ScopeId(7));
        match call.call_data().unwrap().caller.as_ref().unwrap() {
            Caller::Name(inner) => assert_eq!(inner.parent_scope().unwrap(), ScopeId(7)),
            other => panic!("unexpected caller {other:?}"),
        }
    }
}
