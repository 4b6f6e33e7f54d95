//! Dotted module names
//!
//! A module name such as `goog.asserts.AssertionError` is a sequence of
//! identifier segments. The last segment is the binding the module is known by
//! once flattened; everything before it is the package path.

use std::{fmt, str::FromStr};

use anyhow::{Result, bail};

/// A validated, non-empty dotted module name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleName(String);

/// Check whether a character can appear inside a JavaScript identifier
///
/// Non-ASCII letters are accepted so that the boundary checks of the
/// flattening pass never split an identifier in the middle.
pub fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty() && segment.chars().all(is_ident_char)
}

impl ModuleName {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            bail!("Module name must not be empty");
        }
        if !name.split('.').all(is_valid_segment) {
            bail!("Invalid module name '{name}'");
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// The flattened local name, e.g. `AssertionError` for
    /// `goog.asserts.AssertionError`
    pub fn binding(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    /// Everything but the last segment, empty for single-segment names
    pub fn package(&self) -> &str {
        self.0.rsplit_once('.').map_or("", |(package, _)| package)
    }

    /// True when `self`'s segments are a strict prefix of `other`'s
    ///
    /// `a.B` is a prefix of `a.B.C` but not of `a.Bc`.
    pub fn is_strict_prefix_of(&self, other: &Self) -> bool {
        other.0.len() > self.0.len()
            && other.0.starts_with(&self.0)
            && other.0.as_bytes()[self.0.len()] == b'.'
    }

    /// Camel-cased concatenation of all segments, used to alias a binding that
    /// would otherwise collide with a local name
    ///
    /// `goog.asserts` becomes `googAsserts`.
    pub fn camel_alias(&self) -> String {
        let mut alias = String::with_capacity(self.0.len());
        for (i, segment) in self.segments().enumerate() {
            if i == 0 {
                alias.push_str(segment);
                continue;
            }
            let mut chars = segment.chars();
            if let Some(first) = chars.next() {
                alias.extend(first.to_uppercase());
                alias.push_str(chars.as_str());
            }
        }
        alias
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ModuleName {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl AsRef<str> for ModuleName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> ModuleName {
        ModuleName::new(s).unwrap()
    }

    #[test]
    fn test_binding_and_package() {
        let module = name("goog.asserts.AssertionError");
        assert_eq!(module.binding(), "AssertionError");
        assert_eq!(module.package(), "goog.asserts");

        let single = name("Example");
        assert_eq!(single.binding(), "Example");
        assert_eq!(single.package(), "");
    }

    #[test]
    fn test_rejects_malformed_names() {
        assert!(ModuleName::new("").is_err());
        assert!(ModuleName::new("a..b").is_err());
        assert!(ModuleName::new(".a").is_err());
        assert!(ModuleName::new("a.b-c").is_err());
        assert!(ModuleName::new("a.$b_1").is_ok());
    }

    #[test]
    fn test_strict_prefix_respects_segments() {
        assert!(name("a.B").is_strict_prefix_of(&name("a.B.C")));
        assert!(!name("a.B").is_strict_prefix_of(&name("a.Bc")));
        assert!(!name("a.B").is_strict_prefix_of(&name("a.B")));
        assert!(!name("a.B.C").is_strict_prefix_of(&name("a.B")));
    }

    #[test]
    fn test_camel_alias() {
        assert_eq!(name("goog.asserts").camel_alias(), "googAsserts");
        assert_eq!(name("goog.events.Event").camel_alias(), "googEventsEvent");
        assert_eq!(name("single").camel_alias(), "single");
    }
}
