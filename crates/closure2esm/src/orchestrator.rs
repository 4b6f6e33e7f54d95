//! Conversion orchestrator
//!
//! Runs the stages of one conversion in order:
//! 1. Reset the output directory
//! 2. Copy utility files
//! 3. Write the public `index.js`
//! 4. Discover and copy the dependency closure of the entry file
//! 5. Apply patches to the copies
//! 6. Refresh the module index from the patched copies
//! 7. Rewrite every copy to an ES module, in parallel
//! 8. Write the package barrel files
//! 9. Merge statements in every index file
//! 10. Remove the intermediate copies

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::{debug, info, warn};
use rayon::prelude::*;

use crate::{
    config::Config,
    issues::{ConversionIssue, IssueLog},
    locator::IncludeDirLocator,
    merger,
    module_index::{ModuleEntry, ModuleIndex},
    package_index::{self, PUBLIC_INDEX_FILE_NAME, RewrittenFile},
    patches,
    rewriter::RewriteEngine,
    syntax::Syntax,
    walker::{CopiedFile, DependencyWalker, INTERMEDIATE_SUFFIX, Traversal},
};

/// Summary of a finished run
#[derive(Debug, Default)]
pub struct ConversionReport {
    /// Modules written to the output directory
    pub files_written: usize,
    pub modules_declared: usize,
    pub package_indexes: usize,
    pub patches_applied: usize,
    pub issues: Vec<ConversionIssue>,
}

impl ConversionReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// State owned by one conversion run
#[derive(Debug)]
pub struct ConversionContext {
    config: Config,
    syntax: Syntax,
    index: ModuleIndex,
    issues: IssueLog,
}

impl ConversionContext {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let syntax = Syntax::new(&config.namespace)?;
        Ok(Self {
            config,
            syntax,
            index: ModuleIndex::new(),
            issues: IssueLog::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn index(&self) -> &ModuleIndex {
        &self.index
    }

    /// Run every stage and consume the context
    pub fn run(self) -> Result<ConversionReport> {
        let out_dir = self.config.out_dir.clone();
        let entry = self.config.entry()?.to_path_buf();
        let mut report = ConversionReport::default();

        info!("Converting {} into {}", entry.display(), out_dir.display());

        debug!("Stage 1: Resetting output directory");
        reset_out_dir(&out_dir)?;

        debug!("Stage 2: Copying utility files");
        self.copy_utility_files(&out_dir);

        debug!("Stage 3: Writing public index");
        if let Some(text) = package_index::build_public_index(&self.config.public_exports)? {
            let path = out_dir.join(PUBLIC_INDEX_FILE_NAME);
            fs::write(&path, text)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }

        debug!("Stage 4: Traversing dependencies");
        let locator = IncludeDirLocator::new(&self.config.include_dirs, self.syntax.clone());
        let traversal = DependencyWalker::new(&self.syntax, &locator, &out_dir, &self.index, &self.issues)
            .traverse(&entry)?;

        debug!("Stage 5: Applying patches");
        report.patches_applied = patches::apply_patches(&out_dir, &self.config.patches, &self.issues)?;

        debug!("Stage 6: Refreshing module index");
        self.refresh_index(&traversal);

        debug!("Stage 7: Rewriting modules");
        let rewritten = self.rewrite_all(&traversal)?;
        report.files_written = rewritten.len();

        debug!("Stage 8: Writing package indexes");
        let indexes = package_index::build_package_indexes(&rewritten);
        package_index::write_indexes(&out_dir, &indexes)?;
        report.package_indexes = indexes.len();

        debug!("Stage 9: Merging index files");
        merge_index_files(&out_dir)?;

        debug!("Stage 10: Removing intermediate copies");
        remove_intermediate_copies(&out_dir)?;

        report.modules_declared = self.index.len();
        report.issues = self.issues.into_vec();
        info!(
            "Wrote {} modules and {} package indexes to {}",
            report.files_written,
            report.package_indexes,
            out_dir.display()
        );
        Ok(report)
    }

    fn copy_utility_files(&self, out_dir: &Path) {
        for file in &self.config.utility_files {
            let dest = out_dir.join(&file.dest);
            if let Err(e) = fs::copy(&file.source, &dest) {
                self.issues.record(ConversionIssue::UnreadableFile {
                    file: file.source.clone(),
                    message: e.to_string(),
                });
                continue;
            }
            debug!("Copied {} to {}", file.source.display(), file.dest);
        }
    }

    /// Register declarations a patch added to a copy
    fn refresh_index(&self, traversal: &Traversal) {
        for copied in &traversal.copied {
            let Ok(text) = fs::read_to_string(&copied.intermediate) else {
                continue;
            };
            for declaration in self.syntax.declarations(&text) {
                if self.index.contains(&declaration.name) {
                    continue;
                }
                debug!("Patched copy {} now declares {}", copied.stem, declaration.name);
                self.index.register(ModuleEntry {
                    name: declaration.name,
                    kind: declaration.kind,
                    declaring_file: copied.source.clone(),
                    output_stem: copied.stem.clone(),
                });
            }
        }
    }

    /// Rewrite every copy in parallel, in traversal order
    fn rewrite_all(&self, traversal: &Traversal) -> Result<Vec<RewrittenFile>> {
        let engine = RewriteEngine::new(&self.syntax, &self.index)
            .with_import_target(self.config.import_target)
            .with_utility(self.config.utility.as_ref());

        let results: Vec<Option<RewrittenFile>> = traversal
            .copied
            .par_iter()
            .map(|copied| self.rewrite_one(&engine, copied))
            .collect::<Result<_>>()?;
        Ok(results.into_iter().flatten().collect())
    }

    fn rewrite_one(
        &self,
        engine: &RewriteEngine<'_>,
        copied: &CopiedFile,
    ) -> Result<Option<RewrittenFile>> {
        let text = match fs::read_to_string(&copied.intermediate) {
            Ok(text) => text,
            Err(e) => {
                self.issues.record(ConversionIssue::UnreadableFile {
                    file: copied.intermediate.clone(),
                    message: e.to_string(),
                });
                return Ok(None);
            }
        };

        let rewrite = engine.rewrite(&text);
        for (module, alias) in &rewrite.aliases {
            debug!("{}: imported {module} as {alias}", copied.stem);
        }

        let path = output_path(copied);
        fs::write(&path, rewrite.text)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(Some(RewrittenFile {
            stem: copied.stem.clone(),
            declarations: rewrite.declarations,
            exports: rewrite.exports,
        }))
    }
}

/// Convert with a fully layered configuration
pub fn convert(config: Config) -> Result<ConversionReport> {
    ConversionContext::new(config)?.run()
}

fn output_path(copied: &CopiedFile) -> PathBuf {
    copied.intermediate.with_file_name(format!("{}.js", copied.stem))
}

fn reset_out_dir(out_dir: &Path) -> Result<()> {
    if out_dir.exists() {
        fs::remove_dir_all(out_dir)
            .with_context(|| format!("Failed to clear output directory {}", out_dir.display()))?;
        debug!("Removed {}", out_dir.display());
    }
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;
    Ok(())
}

fn file_names(out_dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(out_dir)
        .with_context(|| format!("Failed to list output directory {}", out_dir.display()))?
    {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

fn merge_index_files(out_dir: &Path) -> Result<()> {
    for name in file_names(out_dir)?
        .into_iter()
        .filter(|name| package_index::is_index_file(name) && !name.ends_with(INTERMEDIATE_SUFFIX))
    {
        let path = out_dir.join(&name);
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let merged = merger::merge(&text);
        if merged != text {
            fs::write(&path, merged).with_context(|| format!("Failed to write {}", path.display()))?;
            debug!("Merged statements in {name}");
        }
    }
    Ok(())
}

fn remove_intermediate_copies(out_dir: &Path) -> Result<()> {
    for name in file_names(out_dir)?
        .into_iter()
        .filter(|name| name.ends_with(INTERMEDIATE_SUFFIX))
    {
        let path = out_dir.join(&name);
        if let Err(e) = fs::remove_file(&path) {
            warn!("Failed to remove {}: {e}", path.display());
        }
    }
    Ok(())
}
