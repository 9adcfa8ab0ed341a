//! Key Pattern Module
//!
//! Patterns used for bulk invalidation. Keys match with regex search
//! semantics: a pattern matches if it occurs anywhere in the key.

use regex::Regex;

use crate::error::Result;

// == Key Pattern ==
#[derive(Debug, Clone)]
pub struct KeyPattern {
    regex: Regex,
}

impl KeyPattern {
    /// Compiles `pattern` as a regular expression.
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }

    /// Matches `text` as a plain substring, metacharacters included.
    pub fn literal(text: &str) -> Result<Self> {
        Self::new(&regex::escape(text))
    }

    pub fn is_match(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl From<Regex> for KeyPattern {
    fn from(regex: Regex) -> Self {
        Self { regex }
    }
}

// == Into Pattern ==
/// Anything accepted by `remove_by_pattern`: compiled regexes, patterns, or
/// strings to be compiled.
pub trait IntoPattern {
    fn into_pattern(self) -> Result<KeyPattern>;
}

impl IntoPattern for KeyPattern {
    fn into_pattern(self) -> Result<KeyPattern> {
        Ok(self)
    }
}

impl IntoPattern for &KeyPattern {
    fn into_pattern(self) -> Result<KeyPattern> {
        Ok(self.clone())
    }
}

impl IntoPattern for Regex {
    fn into_pattern(self) -> Result<KeyPattern> {
        Ok(KeyPattern::from(self))
    }
}

impl IntoPattern for &str {
    fn into_pattern(self) -> Result<KeyPattern> {
        KeyPattern::new(self)
    }
}

impl IntoPattern for String {
    fn into_pattern(self) -> Result<KeyPattern> {
        KeyPattern::new(&self)
    }
}

impl IntoPattern for &String {
    fn into_pattern(self) -> Result<KeyPattern> {
        KeyPattern::new(self)
    }
}
