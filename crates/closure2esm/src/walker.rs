//! Dependency discovery
//!
//! Starting from the entry file, every `require` is resolved to its declaring
//! file, which is copied into the output directory under its flat name and
//! then visited in turn. Sibling references are followed in parallel; the
//! visited sets are concurrent so a module shared by several branches is only
//! ever copied once.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use dashmap::{DashMap, DashSet};
use log::{debug, info, warn};
use rayon::prelude::*;

use crate::{
    issues::{ConversionIssue, IssueLog},
    locator::DeclarationLookup,
    module_index::{ModuleEntry, ModuleIndex, output_stem},
    module_name::ModuleName,
    syntax::Syntax,
};

/// Suffix of the verbatim copies made during traversal
pub const INTERMEDIATE_SUFFIX: &str = ".closure.js";

/// A source file copied into the output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopiedFile {
    pub source: PathBuf,
    pub stem: String,
    pub intermediate: PathBuf,
    /// Distance from the entry file in the dependency graph
    pub depth: usize,
}

/// Outcome of a traversal, copied files sorted by output stem
#[derive(Debug, Default)]
pub struct Traversal {
    pub copied: Vec<CopiedFile>,
}

impl Traversal {
    pub fn stems(&self) -> impl Iterator<Item = &str> {
        self.copied.iter().map(|f| f.stem.as_str())
    }
}

#[derive(Debug)]
pub struct DependencyWalker<'a, L: DeclarationLookup> {
    syntax: &'a Syntax,
    lookup: &'a L,
    out_dir: &'a Path,
    index: &'a ModuleIndex,
    issues: &'a IssueLog,
    visited_modules: DashSet<ModuleName>,
    visited_files: DashSet<PathBuf>,
    copied: DashMap<String, CopiedFile>,
}

impl<'a, L: DeclarationLookup> DependencyWalker<'a, L> {
    pub fn new(
        syntax: &'a Syntax,
        lookup: &'a L,
        out_dir: &'a Path,
        index: &'a ModuleIndex,
        issues: &'a IssueLog,
    ) -> Self {
        Self {
            syntax,
            lookup,
            out_dir,
            index,
            issues,
            visited_modules: DashSet::new(),
            visited_files: DashSet::new(),
            copied: DashMap::new(),
        }
    }

    /// Copy the entry file and its whole dependency closure
    ///
    /// Only a missing entry file is an error; every other problem is recorded
    /// in the issue log and the affected branch is skipped.
    pub fn traverse(&self, entry: &Path) -> Result<Traversal> {
        let entry = entry
            .canonicalize()
            .with_context(|| format!("Entry file {} not found", entry.display()))?;
        self.visited_files.insert(entry.clone());
        self.visit(&entry, 0);

        let mut copied: Vec<_> = self.copied.iter().map(|e| e.value().clone()).collect();
        copied.sort_by(|a, b| a.stem.cmp(&b.stem));
        info!(
            "Discovered {} files declaring {} modules",
            copied.len(),
            self.index.len()
        );
        Ok(Traversal { copied })
    }

    fn visit(&self, file: &Path, depth: usize) {
        let text = match fs::read_to_string(file) {
            Ok(text) => text,
            Err(e) => {
                self.issues.record(ConversionIssue::UnreadableFile {
                    file: file.to_path_buf(),
                    message: e.to_string(),
                });
                return;
            }
        };

        let declarations = self.syntax.declarations(&text);
        let Some(primary) = declarations
            .iter()
            .find(|d| d.kind.is_module())
            .or_else(|| declarations.first())
        else {
            self.issues.record(ConversionIssue::MissingDeclaration {
                file: file.to_path_buf(),
            });
            return;
        };

        let stem = output_stem(&primary.name, file);
        debug!("{}Found module {}", "-".repeat(depth), primary.name);

        for declaration in &declarations {
            self.index.register(ModuleEntry {
                name: declaration.name.clone(),
                kind: declaration.kind,
                declaring_file: file.to_path_buf(),
                output_stem: stem.clone(),
            });
        }

        let intermediate = self.out_dir.join(format!("{stem}{INTERMEDIATE_SUFFIX}"));
        if let Some(previous) = self.copied.get(&stem) {
            if previous.source != file {
                warn!(
                    "{} and {} both map to {stem}, the later copy wins",
                    previous.source.display(),
                    file.display()
                );
            }
        }
        if let Err(e) = fs::write(&intermediate, &text) {
            self.issues.record(ConversionIssue::UnreadableFile {
                file: intermediate,
                message: e.to_string(),
            });
            return;
        }
        self.copied.insert(
            stem.clone(),
            CopiedFile {
                source: file.to_path_buf(),
                stem,
                intermediate,
                depth,
            },
        );

        self.syntax
            .referenced_names(&text)
            .par_iter()
            .for_each(|name| self.follow(name, file, depth));
    }

    fn follow(&self, name: &ModuleName, referenced_from: &Path, depth: usize) {
        // Atomic test-and-set: only one branch ever resolves a given name
        if !self.visited_modules.insert(name.clone()) {
            return;
        }
        if self.index.contains(name) {
            return;
        }

        let resolved = match self.lookup.resolve(name) {
            Ok(Some(resolved)) => resolved,
            Ok(None) => {
                self.issues.record(ConversionIssue::UnresolvedReference {
                    module: name.clone(),
                    referenced_from: referenced_from.to_path_buf(),
                });
                return;
            }
            Err(e) => {
                self.issues.record(ConversionIssue::UnreadableFile {
                    file: referenced_from.to_path_buf(),
                    message: format!("lookup of '{name}' failed: {e}"),
                });
                return;
            }
        };

        for ignored in &resolved.ignored {
            self.issues.record(ConversionIssue::AmbiguousResolution {
                module: name.clone(),
                chosen: resolved.file.clone(),
                ignored: ignored.clone(),
            });
        }

        if !self.visited_files.insert(resolved.file.clone()) {
            return;
        }
        self.visit(&resolved.file, depth + 1);
    }
}
