//! Statement patterns of the legacy module vocabulary
//!
//! There is no parser here. The handful of statement shapes the converter
//! cares about are recognized line by line with regular expressions compiled
//! once per namespace root, and turned into small records that carry the
//! byte range of the matched statement so rewrite passes can splice text.

use std::ops::Range;

use anyhow::{Context, Result};
use log::debug;
use regex::Regex;

use crate::{module_name::ModuleName, types::DeclarationKind};

/// A `provide`/`module` statement found in a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationStatement {
    pub name: ModuleName,
    pub kind: DeclarationKind,
    /// Byte range of the statement, leading indentation included
    pub range: Range<usize>,
}

/// One entry of a destructuring reference, `{imported: local}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestructuredName {
    pub imported: String,
    pub local: String,
}

impl DestructuredName {
    /// Import specifier text, `A` or `A as B`
    pub fn specifier(&self) -> String {
        if self.imported == self.local {
            self.imported.clone()
        } else {
            format!("{} as {}", self.imported, self.local)
        }
    }
}

/// How the result of a `require` call is bound
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceBinding {
    /// `goog.require('a.b.C');`
    Bare,
    /// `const local = goog.require('a.b.C');`
    Single(String),
    /// `const {A, B} = goog.require('a.b.C');`
    Destructured(Vec<DestructuredName>),
}

/// A `require`/`requireType` statement found in a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceStatement {
    pub name: ModuleName,
    pub binding: ReferenceBinding,
    pub range: Range<usize>,
}

impl ReferenceStatement {
    /// The local name the whole module ends up bound to, if any
    pub fn local_binding(&self) -> Option<&str> {
        match &self.binding {
            ReferenceBinding::Bare => Some(self.name.binding()),
            ReferenceBinding::Single(local) => Some(local),
            ReferenceBinding::Destructured(_) => None,
        }
    }
}

/// Compiled statement patterns for one namespace root (usually `goog`)
#[derive(Debug, Clone)]
pub struct Syntax {
    namespace: String,
    declaration: Regex,
    reference: Regex,
    legacy_namespace: Regex,
}

impl Syntax {
    pub fn new(namespace: &str) -> Result<Self> {
        let ns = regex::escape(namespace);
        let declaration = Regex::new(&format!(
            r#"(?m)^[ \t]*{ns}\.(provide|module)\(['"]([\w.$]+)['"]\);?"#
        ))
        .context("Failed to compile declaration pattern")?;
        let reference = Regex::new(&format!(
            r#"(?m)^[ \t]*(?:(?:const|let|var)\s+(\{{[^}}]*\}}|[\w$]+)\s*=\s*)?{ns}\.require(?:Type)?\(['"]([\w.$]+)['"]\);?"#
        ))
        .context("Failed to compile reference pattern")?;
        let legacy_namespace = Regex::new(&format!(
            r"(?m)^[ \t]*{ns}\.module\.declareLegacyNamespace\(\);?[ \t]*(?:\r?\n)?"
        ))
        .context("Failed to compile legacy namespace pattern")?;

        Ok(Self {
            namespace: namespace.to_owned(),
            declaration,
            reference,
            legacy_namespace,
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// All declaration statements, in source order
    pub fn declarations(&self, text: &str) -> Vec<DeclarationStatement> {
        self.declaration
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let raw_name = caps.get(2)?.as_str();
                let name = match ModuleName::new(raw_name) {
                    Ok(name) => name,
                    Err(e) => {
                        debug!("Skipping declaration: {e}");
                        return None;
                    }
                };
                let kind = if &caps[1] == "provide" {
                    DeclarationKind::LegacyProvide
                } else {
                    DeclarationKind::Module
                };
                Some(DeclarationStatement {
                    name,
                    kind,
                    range: whole.range(),
                })
            })
            .collect()
    }

    /// All dependency references, in source order
    pub fn references(&self, text: &str) -> Vec<ReferenceStatement> {
        self.reference
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let name = match ModuleName::new(&caps[2]) {
                    Ok(name) => name,
                    Err(e) => {
                        debug!("Skipping reference: {e}");
                        return None;
                    }
                };
                let binding = match caps.get(1).map(|m| m.as_str()) {
                    None => ReferenceBinding::Bare,
                    Some(pattern) if pattern.starts_with('{') => {
                        ReferenceBinding::Destructured(parse_destructuring(pattern))
                    }
                    Some(local) => ReferenceBinding::Single(local.to_owned()),
                };
                Some(ReferenceStatement {
                    name,
                    binding,
                    range: whole.range(),
                })
            })
            .collect()
    }

    /// Names referenced by the file, deduplicated, in source order
    pub fn referenced_names(&self, text: &str) -> Vec<ModuleName> {
        let mut seen = crate::types::FxIndexSet::default();
        for reference in self.references(text) {
            seen.insert(reference.name);
        }
        seen.into_iter().collect()
    }

    pub(crate) fn legacy_namespace_pattern(&self) -> &Regex {
        &self.legacy_namespace
    }
}

/// Parse `{A, B: C}` into its entries
fn parse_destructuring(pattern: &str) -> Vec<DestructuredName> {
    pattern
        .trim_start_matches('{')
        .trim_end_matches('}')
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once(':') {
            Some((imported, local)) => DestructuredName {
                imported: imported.trim().to_owned(),
                local: local.trim().to_owned(),
            },
            None => DestructuredName {
                imported: entry.to_owned(),
                local: entry.to_owned(),
            },
        })
        .collect()
}

/// Check whether the file defines a top-level binding with this name
///
/// Matches `class X`, `function X`, `const X`, `let X` and `var X`, optionally
/// preceded by `export`, outside of any block.
pub fn defines_binding(text: &str, binding: &str) -> bool {
    let pattern = format!(
        r"(?m)^[ \t]*(?:export\s+)?(?:async\s+)?(?:class|function\*?|const|let|var)\s+{}(?:[^\w$]|$)",
        regex::escape(binding)
    );
    Regex::new(&pattern).is_ok_and(|re| {
        re.find_iter(text)
            .any(|m| brace_depth_at(text, m.start()) == 0)
    })
}

/// Brace nesting depth at byte `offset`
///
/// Braces inside string literals and comments are not counted.
pub(crate) fn brace_depth_at(text: &str, offset: usize) -> usize {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < offset {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => depth = depth.saturating_sub(1),
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < offset && bytes[i] != b'\n' {
                    i += 1;
                }
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = text[i + 2..]
                    .find("*/")
                    .map_or(text.len(), |end| i + 2 + end + 2);
                continue;
            }
            quote @ (b'\'' | b'"' | b'`') => {
                i += 1;
                while i < offset && bytes[i] != quote && (quote == b'`' || bytes[i] != b'\n') {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    depth
}
