//! Front-end contract
//!
//! Per-language extraction lives outside this crate: a front end consumes
//! one externally-parsed file and produces a scope fragment (one scope tree
//! rooted at the file's global namespace, plus the aliases in effect for the
//! file). The database only ever sees fragments.
//!
//! The built-in `JsonFragmentExtractor` reads fragments that were serialized
//! to JSON; it is what the CLI and tests feed the working set with.

use crate::model::alias::Alias;
use crate::model::tree::ScopeTree;
use crate::{Error, Language, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One source file as handed to a front end: the external parser's output
/// plus the language tag that selects the extractor.
#[derive(Debug, Clone)]
pub struct FileUnit {
    /// Path of the source file, relative to the project root
    pub path: String,
    pub language: Language,
    /// Parsed representation of the file, in whatever form the front end
    /// consumes
    pub content: String,
}

impl FileUnit {
    pub fn new(path: impl Into<String>, language: Language, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            language,
            content: content.into(),
        }
    }
}

/// What a front end produces for one file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScopeFragment {
    /// Scope tree rooted at the file's global namespace
    pub root: ScopeTree,
    /// Aliases in effect for the file
    #[serde(default)]
    pub aliases: Vec<Alias>,
}

impl ScopeFragment {
    pub fn new(root: ScopeTree, aliases: Vec<Alias>) -> Self {
        Self { root, aliases }
    }

    /// Reject fragments the merge engine cannot consume.
    pub fn validate(&self) -> Result<()> {
        let root = self
            .root
            .get(self.root.root())
            .ok_or_else(|| Error::InvalidStructure("fragment has no root scope".into()))?;
        if !root.kind.is_global_namespace() {
            return Err(Error::InvalidStructure(format!(
                "fragment root must be the global namespace, got {}",
                root.kind.label()
            )));
        }
        if self.root.files().count() > 1 {
            return Err(Error::InvalidStructure(
                "fragment spans more than one file".into(),
            ));
        }
        for alias in &self.aliases {
            if alias.target.is_empty() {
                return Err(Error::InvalidStructure(format!(
                    "alias at {} has an empty target",
                    alias.location
                )));
            }
        }
        Ok(())
    }

    /// The single source file this fragment was extracted from, if it
    /// recorded any locations at all.
    pub fn source_file(&self) -> Option<&str> {
        self.root.files().next()
    }
}

/// Trait for scope-fragment front ends
///
/// Each front end is responsible for:
/// 1. Identifying files it can consume
/// 2. Turning one parsed file into a scope fragment
/// 3. Collecting the file's alias directives
pub trait FragmentExtractor: Send + Sync {
    /// Get the front end's name (for display)
    fn name(&self) -> &str;

    /// Check if this front end can handle a file
    fn can_handle(&self, path: &Path) -> bool;

    /// Extract the scope fragment for one file
    fn extract(&self, unit: &FileUnit) -> Result<ScopeFragment>;
}

/// Registry of fragment extractors
#[derive(Default)]
pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn FragmentExtractor>>,
}

impl ExtractorRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an extractor
    pub fn register(&mut self, extractor: impl FragmentExtractor + 'static) {
        self.extractors.push(Box::new(extractor));
    }

    /// Find an extractor for a file
    pub fn find_extractor(&self, path: &Path) -> Option<&dyn FragmentExtractor> {
        self.extractors
            .iter()
            .find(|e| e.can_handle(path))
            .map(|e| e.as_ref())
    }

    /// Extract a fragment using the appropriate front end; `None` when no
    /// registered front end handles the file.
    pub fn extract(&self, unit: &FileUnit) -> Result<Option<ScopeFragment>> {
        match self.find_extractor(Path::new(&unit.path)) {
            Some(extractor) => {
                let fragment = extractor.extract(unit)?;
                fragment.validate()?;
                Ok(Some(fragment))
            }
            None => Ok(None),
        }
    }
}

/// Create a default registry with the built-in extractors
pub fn default_registry() -> ExtractorRegistry {
    let mut registry = ExtractorRegistry::new();
    registry.register(JsonFragmentExtractor::new());
    registry
}

/// Front end for fragments serialized as JSON (`*.scope.json`).
#[derive(Debug, Default)]
pub struct JsonFragmentExtractor;

impl JsonFragmentExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl FragmentExtractor for JsonFragmentExtractor {
    fn name(&self) -> &str {
        "json"
    }

    fn can_handle(&self, path: &Path) -> bool {
        path.to_str().is_some_and(|p| p.ends_with(".scope.json"))
    }

    fn extract(&self, unit: &FileUnit) -> Result<ScopeFragment> {
        let fragment: ScopeFragment = serde_json::from_str(&unit.content)?;
        Ok(fragment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::{SourceLocation, StructuralPath};
    use crate::model::scope::{NamespaceData, ScopeKind};

    struct TestExtractor;

    impl FragmentExtractor for TestExtractor {
        fn name(&self) -> &str {
            "test"
        }
        fn can_handle(&self, path: &Path) -> bool {
            path.extension().and_then(|e| e.to_str()) == Some("test")
        }
        fn extract(&self, _unit: &FileUnit) -> Result<ScopeFragment> {
            Ok(ScopeFragment::default())
        }
    }

    #[test]
    fn test_registry() {
        let mut registry = ExtractorRegistry::new();
        registry.register(TestExtractor);

        assert!(registry.find_extractor(Path::new("foo.test")).is_some());
        assert!(registry.find_extractor(Path::new("foo.other")).is_none());
    }

    fn sample_fragment() -> ScopeFragment {
        let mut tree = ScopeTree::new();
        let ns = tree.create_scope(
            ScopeKind::Namespace(NamespaceData::named("App")),
            Language::CSharp,
        );
        tree.add_location(
            ns,
            SourceLocation::definition(
                "a.cs",
                1,
                1,
                StructuralPath::parse("/unit/namespace[1]").unwrap(),
            ),
        );
        tree.attach(tree.root(), ns);
        ScopeFragment::new(tree, Vec::new())
    }

    #[test]
    fn test_json_extractor_roundtrip() {
        let fragment = sample_fragment();
        let json = serde_json::to_string(&fragment).unwrap();

        let registry = default_registry();
        let unit = FileUnit::new("a.scope.json", Language::CSharp, json);
        let extracted = registry.extract(&unit).unwrap().unwrap();
        assert!(extracted.root.structurally_eq(&fragment.root));
    }

    #[test]
    fn test_unhandled_file_is_none() {
        let registry = default_registry();
        let unit = FileUnit::new("a.cs", Language::CSharp, "");
        assert!(registry.extract(&unit).unwrap().is_none());
    }

    #[test]
    fn test_malformed_fragment_is_an_error() {
        let registry = default_registry();
        let unit = FileUnit::new("a.scope.json", Language::CSharp, "{not json");
        assert!(registry.extract(&unit).is_err());
    }

    #[test]
    fn test_bad_structural_path_is_rejected() {
        let fragment = sample_fragment();
        let mut value: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&fragment).unwrap()).unwrap();
        // Corrupt one structural path.
        let raw = value["root"].to_string().replace("/unit/namespace[1]", "not-a-path");
        value["root"] = serde_json::from_str(&raw).unwrap();

        let registry = default_registry();
        let unit = FileUnit::new("a.scope.json", Language::CSharp, value.to_string());
        assert!(registry.extract(&unit).is_err());
    }
}
