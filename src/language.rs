//! Programming language tags
//!
//! Every scope, use, and alias carries the language of the file it came
//! from. The tag drives the few language-specific decisions the database
//! makes: name separators for full names, self/supertype keywords for
//! resolution, and the built-in type inventory.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Languages understood by the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    CSharp,
    Cpp,
    Java,
}

impl Language {
    /// Get the string representation of the language
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::CSharp => "csharp",
            Language::Cpp => "cpp",
            Language::Java => "java",
        }
    }

    /// Get all languages
    pub fn all() -> &'static [Language] {
        &[Language::CSharp, Language::Cpp, Language::Java]
    }

    /// Separator used when concatenating ancestor names into a full name.
    pub fn separator(&self) -> &'static str {
        match self {
            Language::Cpp => "::",
            Language::CSharp | Language::Java => ".",
        }
    }

    /// The self-reference keyword (`this`), if the language has one.
    pub fn self_keyword(&self) -> Option<&'static str> {
        match self {
            Language::CSharp | Language::Java | Language::Cpp => Some("this"),
        }
    }

    /// The supertype keyword (`base`, `super`), if the language has one.
    /// C++ names base classes explicitly, so it has none.
    pub fn supertype_keyword(&self) -> Option<&'static str> {
        match self {
            Language::CSharp => Some("base"),
            Language::Java => Some("super"),
            Language::Cpp => None,
        }
    }

    /// Whether `name` is a self-reference or supertype keyword.
    pub fn is_resolution_keyword(&self, name: &str) -> bool {
        self.self_keyword() == Some(name) || self.supertype_keyword() == Some(name)
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "csharp" | "c#" | "cs" => Ok(Language::CSharp),
            "cpp" | "c++" | "cxx" => Ok(Language::Cpp),
            "java" => Ok(Language::Java),
            _ => Err(Error::UnknownLanguage(s.to_string())),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
