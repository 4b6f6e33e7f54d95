//! Module index for tracking where each module name lives
//!
//! The ModuleIndex is the single source of truth for module identity during a
//! conversion run. It maps dotted module names to the file declaring them and
//! to the flat output file they are emitted as. Entries are only ever added,
//! and the index can be shared across the threads of a parallel traversal.

use std::path::{Path, PathBuf};

use dashmap::{DashMap, mapref::entry::Entry};
use log::debug;

use crate::{module_name::ModuleName, types::DeclarationKind};

/// Everything known about one declared module name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleEntry {
    pub name: ModuleName,
    pub kind: DeclarationKind,
    /// The file containing the declaration statement
    pub declaring_file: PathBuf,
    /// Flat output name without extension, e.g. `goog.debug.error` for `goog/debug/error.js`
    pub output_stem: String,
}

impl ModuleEntry {
    pub fn binding(&self) -> &str {
        self.name.binding()
    }

    pub fn package(&self) -> &str {
        self.name.package()
    }

    /// Import specifier of the emitted file, e.g. `./goog.debug.error.js`
    pub fn output_specifier(&self) -> String {
        format!("./{}.js", self.output_stem)
    }
}

/// Concurrent, append-only map from module name to [`ModuleEntry`]
#[derive(Debug, Default)]
pub struct ModuleIndex {
    entries: DashMap<ModuleName, ModuleEntry>,
}

impl ModuleIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module, returns false when the name was already known
    ///
    /// The first registration wins; a later one for the same name is ignored.
    pub fn register(&self, entry: ModuleEntry) -> bool {
        match self.entries.entry(entry.name.clone()) {
            Entry::Occupied(existing) => {
                if existing.get().declaring_file != entry.declaring_file {
                    debug!(
                        "Module {} already registered from {}, ignoring {}",
                        entry.name,
                        existing.get().declaring_file.display(),
                        entry.declaring_file.display()
                    );
                }
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(entry);
                true
            }
        }
    }

    pub fn get(&self, name: &ModuleName) -> Option<ModuleEntry> {
        self.entries.get(name).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, name: &ModuleName) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries sorted by module name
    pub fn entries_sorted(&self) -> Vec<ModuleEntry> {
        let mut entries: Vec<_> = self.entries.iter().map(|e| e.value().clone()).collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries
    }

    /// Entries declared by a given output file, sorted by module name
    pub fn entries_for_stem(&self, stem: &str) -> Vec<ModuleEntry> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .filter(|e| e.value().output_stem == stem)
            .map(|e| e.value().clone())
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries
    }
}

/// Flat output stem for a source file declaring `primary`
///
/// `javascript/net/grpc/web/abstractclientbase.js` declaring
/// `grpc.web.AbstractClientBase` becomes `grpc.web.abstractclientbase`.
pub fn output_stem(primary: &ModuleName, source: &Path) -> String {
    let basename = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let basename = basename.strip_suffix(".js").unwrap_or(&basename);

    match primary.package() {
        "" => basename.to_owned(),
        package => format!("{package}.{basename}"),
    }
}

/// Specifier of the barrel file for a package, e.g. `./goog.asserts.index.js`
///
/// Single-segment module names have no package and therefore no barrel file.
pub fn package_index_specifier(package: &str) -> Option<String> {
    package_index_file_name(package).map(|file| format!("./{file}"))
}

/// File name of the barrel file for a package
pub fn package_index_file_name(package: &str) -> Option<String> {
    (!package.is_empty()).then(|| format!("{package}.index.js"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, file: &str, stem: &str) -> ModuleEntry {
        ModuleEntry {
            name: ModuleName::new(name).unwrap(),
            kind: DeclarationKind::LegacyProvide,
            declaring_file: PathBuf::from(file),
            output_stem: stem.to_owned(),
        }
    }

    #[test]
    fn test_module_index_basic_operations() {
        let index = ModuleIndex::new();
        assert!(index.is_empty());

        assert!(index.register(entry("goog.asserts", "/src/asserts.js", "goog.asserts")));
        assert!(index.register(entry(
            "goog.asserts.AssertionError",
            "/src/asserts.js",
            "goog.asserts"
        )));
        assert_eq!(index.len(), 2);

        let name = ModuleName::new("goog.asserts.AssertionError").unwrap();
        let found = index.get(&name).unwrap();
        assert_eq!(found.binding(), "AssertionError");
        assert_eq!(found.package(), "goog.asserts");
        assert_eq!(found.output_specifier(), "./goog.asserts.js");

        let by_stem: Vec<_> = index
            .entries_for_stem("goog.asserts")
            .into_iter()
            .map(|e| e.name.to_string())
            .collect();
        assert_eq!(by_stem, vec!["goog.asserts", "goog.asserts.AssertionError"]);
    }

    #[test]
    fn test_first_registration_wins() {
        let index = ModuleIndex::new();
        assert!(index.register(entry("a.B", "/one/b.js", "a.b")));
        assert!(!index.register(entry("a.B", "/two/b.js", "a.b")));
        let name = ModuleName::new("a.B").unwrap();
        assert_eq!(index.get(&name).unwrap().declaring_file, PathBuf::from("/one/b.js"));
    }

    #[test]
    fn test_output_stem() {
        let primary = ModuleName::new("grpc.web.AbstractClientBase").unwrap();
        assert_eq!(
            output_stem(&primary, Path::new("javascript/net/grpc/web/abstractclientbase.js")),
            "grpc.web.abstractclientbase"
        );
        let namespace = ModuleName::new("goog.array").unwrap();
        assert_eq!(
            output_stem(&namespace, Path::new("closure/goog/array/array.js")),
            "goog.array"
        );
        let bare = ModuleName::new("Exports").unwrap();
        assert_eq!(output_stem(&bare, Path::new("exports.js")), "exports");
    }

    #[test]
    fn test_package_index_names() {
        assert_eq!(
            package_index_specifier("goog.string").as_deref(),
            Some("./goog.string.index.js")
        );
        assert_eq!(package_index_file_name(""), None);
    }
}
