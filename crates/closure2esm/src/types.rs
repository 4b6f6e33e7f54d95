//! Shared type definitions for the closure2esm crate
//!
//! This module contains common types that are used across multiple components
//! of the converter, ensuring consistency and avoiding circular dependencies.

use std::hash::BuildHasherDefault;

use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHasher;

/// Type alias for IndexMap with FxHasher for better performance
pub type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;
/// Type alias for IndexSet with FxHasher for better performance
pub type FxIndexSet<T> = IndexSet<T, BuildHasherDefault<FxHasher>>;

/// How a file introduces a dotted module name
///
/// Closure files either use the legacy `provide` form, which attaches the
/// module to a global namespace object, or the `module` form, which scopes the
/// file and publishes its API through `exports`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclarationKind {
    /// `goog.provide('a.b.C')`
    LegacyProvide,

    /// `goog.module('a.b.C')`
    Module,
}

impl DeclarationKind {
    /// Check if this is a `provide` declaration
    pub fn is_legacy_provide(&self) -> bool {
        matches!(self, DeclarationKind::LegacyProvide)
    }

    /// Check if this is a `module` declaration
    pub fn is_module(&self) -> bool {
        matches!(self, DeclarationKind::Module)
    }
}

impl std::fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeclarationKind::LegacyProvide => write!(f, "provide"),
            DeclarationKind::Module => write!(f, "module"),
        }
    }
}

/// Where generated import statements point to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ImportTarget {
    /// `./<package>.index.js`, the per-package barrel file
    #[default]
    PackageIndex,

    /// The referenced module's own output file, as recorded in the module index
    ModuleFile,
}

impl std::fmt::Display for ImportTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportTarget::PackageIndex => write!(f, "package-index"),
            ImportTarget::ModuleFile => write!(f, "module-file"),
        }
    }
}
