//! Resolve module names to the files declaring them
//!
//! The lookup scans the configured include directories for `.js` files and
//! indexes every declaration statement it finds. The scan happens once, on
//! first use, and is shared by all threads of the traversal.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Result;
use log::{debug, trace, warn};
use once_cell::sync::OnceCell;
use walkdir::WalkDir;

use crate::{
    module_name::ModuleName,
    syntax::Syntax,
    types::{FxIndexMap, FxIndexSet},
};

/// A module name resolved to its declaring file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModule {
    pub file: PathBuf,
    /// Other files declaring the same name, ignored because they came later
    pub ignored: Vec<PathBuf>,
}

/// Lookup from module name to declaring file
pub trait DeclarationLookup: Send + Sync {
    fn resolve(&self, module: &ModuleName) -> Result<Option<ResolvedModule>>;
}

/// Searches a list of include directories, first match wins
///
/// "First" is include-directory order, then path order within a directory, so
/// the choice is the same on every run.
#[derive(Debug)]
pub struct IncludeDirLocator {
    include_dirs: Vec<PathBuf>,
    syntax: Syntax,
    declarations: OnceCell<FxIndexMap<ModuleName, Vec<PathBuf>>>,
}

impl IncludeDirLocator {
    pub fn new(include_dirs: &[PathBuf], syntax: Syntax) -> Self {
        let mut unique_dirs = FxIndexSet::default();
        for dir in include_dirs {
            if let Ok(canonical) = dir.canonicalize() {
                unique_dirs.insert(canonical);
            } else {
                warn!("Include directory {} does not exist", dir.display());
            }
        }

        Self {
            include_dirs: unique_dirs.into_iter().collect(),
            syntax,
            declarations: OnceCell::new(),
        }
    }

    pub fn include_dirs(&self) -> &[PathBuf] {
        &self.include_dirs
    }

    fn declarations(&self) -> &FxIndexMap<ModuleName, Vec<PathBuf>> {
        self.declarations.get_or_init(|| self.scan())
    }

    fn scan(&self) -> FxIndexMap<ModuleName, Vec<PathBuf>> {
        let mut declarations: FxIndexMap<ModuleName, Vec<PathBuf>> = FxIndexMap::default();
        let mut seen_files = FxIndexSet::default();

        for dir in &self.include_dirs {
            for entry in WalkDir::new(dir)
                .sort_by_file_name()
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.file_type().is_file() && is_js_file(e.path()))
            {
                let path = entry.into_path();
                if !seen_files.insert(path.clone()) {
                    continue;
                }
                let text = match fs::read_to_string(&path) {
                    Ok(text) => text,
                    Err(e) => {
                        debug!("Skipping unreadable file {}: {e}", path.display());
                        continue;
                    }
                };
                for declaration in self.syntax.declarations(&text) {
                    trace!("{} declares {}", path.display(), declaration.name);
                    let files = declarations.entry(declaration.name).or_default();
                    if !files.contains(&path) {
                        files.push(path.clone());
                    }
                }
            }
        }

        debug!(
            "Indexed {} declared modules in {} files",
            declarations.len(),
            seen_files.len()
        );
        declarations
    }
}

impl DeclarationLookup for IncludeDirLocator {
    fn resolve(&self, module: &ModuleName) -> Result<Option<ResolvedModule>> {
        Ok(self
            .declarations()
            .get(module)
            .and_then(|files| files.split_first())
            .map(|(first, rest)| ResolvedModule {
                file: first.clone(),
                ignored: rest.to_vec(),
            }))
    }
}

fn is_js_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "js")
}
