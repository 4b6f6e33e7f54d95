//! Source-to-source rewriting of one file
//!
//! The engine is a fixed sequence of passes. Each pass is a plain function
//! from text to a [`RewriteResult`]: the new text plus whatever facts the pass
//! discovered, which later passes (and the package index writer) consume.
//!
//! Pass order:
//! 1. alias bare references whose binding would collide with a local name
//! 2. declarations to `export { X };`
//! 3. references to `import { X } from "...";`
//! 4. flatten dotted names of everything declared or referenced, longest first
//! 5. normalize ad-hoc `exports` statements
//! 6. drop `declareLegacyNamespace()`
//! 7. import utility namespace symbols
//! 8. merge consecutive import/export statements

pub mod aliases;
pub mod declarations;
pub mod exports;
pub mod flatten;
pub mod legacy;
pub mod references;
pub mod utility;

use log::trace;

use crate::{
    config::UtilityConfig,
    merger,
    module_index::{ModuleIndex, package_index_specifier},
    module_name::ModuleName,
    syntax::Syntax,
    types::{FxIndexMap, FxIndexSet, ImportTarget},
};

pub use self::{
    declarations::DeclaredExport,
    flatten::Rename,
    references::ImportBinding,
};

/// Output of a single pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteResult<T> {
    pub text: String,
    pub side: T,
}

impl<T> RewriteResult<T> {
    pub fn new(text: String, side: T) -> Self {
        Self { text, side }
    }
}

/// Everything the pipeline produced for one file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileRewrite {
    pub text: String,
    /// Bindings exported by declaration statements
    pub declarations: Vec<DeclaredExport>,
    pub imports: Vec<ImportBinding>,
    /// Bindings exported by normalized `exports` statements
    pub exports: Vec<String>,
    /// Modules that had to be aliased, with their alias
    pub aliases: Vec<(ModuleName, String)>,
    pub utility_symbols: Vec<String>,
}

/// Runs the rewrite passes against one file at a time
///
/// The engine only reads shared state, so one instance can rewrite many files
/// in parallel.
#[derive(Debug)]
pub struct RewriteEngine<'a> {
    syntax: &'a Syntax,
    index: &'a ModuleIndex,
    import_target: ImportTarget,
    utility: Option<&'a UtilityConfig>,
}

impl<'a> RewriteEngine<'a> {
    pub fn new(syntax: &'a Syntax, index: &'a ModuleIndex) -> Self {
        Self {
            syntax,
            index,
            import_target: ImportTarget::default(),
            utility: None,
        }
    }

    #[must_use]
    pub fn with_import_target(mut self, import_target: ImportTarget) -> Self {
        self.import_target = import_target;
        self
    }

    #[must_use]
    pub fn with_utility(mut self, utility: Option<&'a UtilityConfig>) -> Self {
        self.utility = utility;
        self
    }

    pub fn rewrite(&self, text: &str) -> FileRewrite {
        let aliased = aliases::alias_collisions(self.syntax, text);
        let declared = declarations::rewrite_declarations(self.syntax, &aliased.text);
        let referenced =
            references::rewrite_references(self.syntax, &declared.text, |m| self.import_source(m));

        // One flattening pass over the union of declared and referenced names
        let mut targets: FxIndexMap<&str, &str> = FxIndexMap::default();
        for declaration in &declared.side {
            targets
                .entry(declaration.module.as_str())
                .or_insert(declaration.binding.as_str());
        }
        for import in &referenced.side {
            targets
                .entry(import.module.as_str())
                .or_insert(import.flatten_to.as_str());
        }
        let renames: Vec<_> = targets
            .into_iter()
            .map(|(from, to)| Rename::new(from, to))
            .collect();
        let flattened = flatten::flatten_names(&referenced.text, &renames);
        trace!("Flattened {} dotted names", flattened.side.len());

        let exported: FxIndexSet<String> = declared
            .side
            .iter()
            .map(|d| d.binding.clone())
            .collect();
        let normalized = exports::normalize_exports(&flattened.text, &exported);
        let stripped = legacy::remove_legacy_namespace(self.syntax, &normalized.text);
        let utility = utility::import_utility_symbols(self.syntax, &stripped, self.utility);
        let merged = merger::merge(&utility.text);

        FileRewrite {
            text: merged,
            declarations: declared.side,
            imports: referenced.side,
            exports: normalized.side,
            aliases: aliased.side,
            utility_symbols: utility.side,
        }
    }

    /// Specifier a generated import for `module` points to
    pub fn import_source(&self, module: &ModuleName) -> String {
        let entry = self.index.get(module);
        if entry.is_none() {
            trace!("Module {module} is not in the module index");
        }

        let by_file = || {
            entry
                .as_ref()
                .map(crate::module_index::ModuleEntry::output_specifier)
        };
        let by_package = || package_index_specifier(module.package());

        let specifier = match self.import_target {
            ImportTarget::PackageIndex => by_package().or_else(by_file),
            ImportTarget::ModuleFile => by_file().or_else(by_package),
        };
        specifier.unwrap_or_else(|| format!("./{}.js", module.binding()))
    }
}

/// Replace byte ranges of `text`, ranges must be sorted and disjoint
pub(crate) fn splice(text: &str, edits: &[(std::ops::Range<usize>, String)]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    for (range, replacement) in edits {
        out.push_str(&text[copied..range.start]);
        out.push_str(replacement);
        copied = range.end;
    }
    out.push_str(&text[copied..]);
    out
}
