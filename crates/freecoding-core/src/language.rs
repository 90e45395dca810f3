//! Language selection for a chat session.
//!
//! Codes are opaque: the backend decides what it understands, so nothing
//! here validates a code against a known list. [`Language::is_well_formed`]
//! only checks that a code can travel inside a single frame payload.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Language used when nothing else has been selected.
pub const DEFAULT_LANGUAGE: &str = "en";

/// A language code such as `en`, `es` or `pt-BR`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Language(String);

impl Language {
    /// Creates a language from any code, verbatim.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Returns the code as a string slice.
    pub fn code(&self) -> &str {
        &self.0
    }

    /// Returns true if the code is non-empty and has no whitespace.
    pub fn is_well_formed(&self) -> bool {
        !self.0.is_empty() && !self.0.chars().any(char::is_whitespace)
    }
}

impl Default for Language {
    fn default() -> Self {
        Self(DEFAULT_LANGUAGE.to_string())
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Language {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl From<String> for Language {
    fn from(code: String) -> Self {
        Self(code)
    }
}

impl AsRef<str> for Language {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_english() {
        assert_eq!(Language::default().code(), "en");
    }

    #[test]
    fn unknown_codes_pass_through() {
        let lang = Language::from("xx-Klingon");
        assert_eq!(lang.to_string(), "xx-Klingon");
        assert!(lang.is_well_formed());
    }

    #[test]
    fn whitespace_is_not_well_formed() {
        assert!(!Language::new("").is_well_formed());
        assert!(!Language::new("en US").is_well_formed());
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&Language::new("es")).unwrap();
        assert_eq!(json, "\"es\"");
        let back: Language = serde_json::from_str("\"fr\"").unwrap();
        assert_eq!(back.code(), "fr");
    }
}
