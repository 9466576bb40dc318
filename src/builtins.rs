//! Built-in type inventory
//!
//! Language primitives (`int`, `string`, ...) resolve without a user-authored
//! definition. The table lazily materializes one synthetic definition per
//! distinct `(language, name)` pair and caches it, so repeated uses of the
//! same built-in resolve to the identical definition object and reference
//! equality holds across queries.

use crate::language::Language;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// A synthetic definition for a language primitive.
#[derive(Debug, PartialEq, Eq)]
pub struct BuiltInType {
    pub language: Language,
    pub name: String,
}

const CSHARP_BUILTINS: &[&str] = &[
    "bool", "byte", "sbyte", "char", "decimal", "double", "float", "int", "uint", "nint",
    "nuint", "long", "ulong", "short", "ushort", "object", "string", "void", "dynamic",
];

const CPP_BUILTINS: &[&str] = &[
    "bool", "char", "char16_t", "char32_t", "wchar_t", "short", "int", "long", "float",
    "double", "void", "signed", "unsigned", "size_t",
];

const JAVA_BUILTINS: &[&str] = &[
    "boolean", "byte", "char", "short", "int", "long", "float", "double", "void", "String",
];

fn inventory(language: Language) -> &'static [&'static str] {
    match language {
        Language::CSharp => CSHARP_BUILTINS,
        Language::Cpp => CPP_BUILTINS,
        Language::Java => JAVA_BUILTINS,
    }
}

/// Lazy cache of built-in type definitions.
#[derive(Debug, Default)]
pub struct BuiltInTypeTable {
    cache: Mutex<HashMap<(Language, String), Arc<BuiltInType>>>,
}

impl BuiltInTypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `name` is a primitive of `language`.
    pub fn is_builtin(&self, language: Language, name: &str) -> bool {
        inventory(language).contains(&name)
    }

    /// Resolve a built-in name to its shared definition, materializing it on
    /// first use. Returns `None` for names that are not primitives of the
    /// language.
    pub fn resolve(&self, language: Language, name: &str) -> Option<Arc<BuiltInType>> {
        if !self.is_builtin(language, name) {
            return None;
        }
        let mut cache = self.cache.lock();
        Some(Arc::clone(cache.entry((language, name.to_string())).or_insert_with(
            || {
                Arc::new(BuiltInType {
                    language,
                    name: name.to_string(),
                })
            },
        )))
    }
}
