//! Layered configuration
//!
//! Settings come from built-in defaults, the user config file, the project
//! `closure2esm.toml` (or the file passed with `--config`) and the
//! `CLOSURE2ESM_*` environment variables, each layer overriding the previous
//! one. Command line flags are applied on top by the binary.

use std::{
    env,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow, bail};
use etcetera::BaseStrategy;
use log::debug;
use serde::Deserialize;

use crate::{module_name::is_ident_char, patches::PatchOp, types::ImportTarget};

/// Name of the project configuration file looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "closure2esm.toml";

pub const ENV_INCLUDE_DIRS: &str = "CLOSURE2ESM_INCLUDE_DIRS";
pub const ENV_OUT_DIR: &str = "CLOSURE2ESM_OUT_DIR";
pub const ENV_NAMESPACE: &str = "CLOSURE2ESM_NAMESPACE";

/// Helpers called directly off the namespace root, e.g. `goog.isObject`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UtilityConfig {
    /// Import specifier the symbols are imported from, e.g. `./goog.goog.js`
    pub import_from: String,
    pub symbols: Vec<String>,
}

/// A file copied verbatim into the output directory before traversal
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UtilityFile {
    pub source: PathBuf,
    /// File name inside the output directory
    pub dest: String,
}

/// A binding re-exported from the public `index.js`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PublicExport {
    pub name: String,
    /// Module the binding belongs to, its package picks the barrel file
    pub module: String,
}

/// Fully layered configuration of one conversion run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub entry: Option<PathBuf>,
    pub include_dirs: Vec<PathBuf>,
    pub out_dir: PathBuf,
    /// Root of the legacy vocabulary, `goog` for Closure
    pub namespace: String,
    pub import_target: ImportTarget,
    pub utility: Option<UtilityConfig>,
    pub utility_files: Vec<UtilityFile>,
    pub public_exports: Vec<PublicExport>,
    pub patches: Vec<PatchOp>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            entry: None,
            include_dirs: Vec::new(),
            out_dir: PathBuf::from("esm"),
            namespace: "goog".to_owned(),
            import_target: ImportTarget::default(),
            utility: None,
            utility_files: Vec::new(),
            public_exports: Vec::new(),
            patches: Vec::new(),
        }
    }
}

/// One configuration file, every key optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub entry: Option<PathBuf>,
    pub include_dirs: Option<Vec<PathBuf>>,
    pub out_dir: Option<PathBuf>,
    pub namespace: Option<String>,
    pub import_target: Option<ImportTarget>,
    pub utility: Option<UtilityConfig>,
    pub utility_files: Option<Vec<UtilityFile>>,
    pub public_exports: Option<Vec<PublicExport>>,
    pub patches: Option<Vec<PatchOp>>,
}

impl ConfigFile {
    /// Parse a configuration file, relative paths are resolved against its directory
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut file: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        if let Some(base) = path.parent() {
            file.resolve_paths(base);
        }
        Ok(file)
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        if let Some(entry) = &mut self.entry {
            resolve(entry);
        }
        if let Some(out_dir) = &mut self.out_dir {
            resolve(out_dir);
        }
        for dir in self.include_dirs.iter_mut().flatten() {
            resolve(dir);
        }
        for file in self.utility_files.iter_mut().flatten() {
            resolve(&mut file.source);
        }
    }
}

impl Config {
    /// Layer defaults, the user config, the project config and the environment
    ///
    /// `explicit` replaces the project config lookup in the current directory
    /// and must exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::load_layers(user_config_path().as_deref(), explicit, Path::new("."))
    }

    /// Same as [`Config::load`] with every location given explicitly
    pub fn load_layers(user: Option<&Path>, explicit: Option<&Path>, project_dir: &Path) -> Result<Self> {
        let mut config = Self::default();

        if let Some(user) = user.filter(|p| p.is_file()) {
            debug!("Loading user config from {}", user.display());
            config.apply_file(ConfigFile::load(user)?);
        }

        match explicit {
            Some(path) => {
                if !path.is_file() {
                    bail!("Config file not found: {}", path.display());
                }
                debug!("Loading config from {}", path.display());
                config.apply_file(ConfigFile::load(path)?);
            }
            None => {
                let project = project_dir.join(CONFIG_FILE_NAME);
                if project.is_file() {
                    debug!("Loading project config from {}", project.display());
                    config.apply_file(ConfigFile::load(&project)?);
                }
            }
        }

        config.apply_env_overrides();
        Ok(config)
    }

    /// Overlay the keys present in `file`
    pub fn apply_file(&mut self, file: ConfigFile) {
        if let Some(entry) = file.entry {
            self.entry = Some(entry);
        }
        if let Some(include_dirs) = file.include_dirs {
            self.include_dirs = include_dirs;
        }
        if let Some(out_dir) = file.out_dir {
            self.out_dir = out_dir;
        }
        if let Some(namespace) = file.namespace {
            self.namespace = namespace;
        }
        if let Some(import_target) = file.import_target {
            self.import_target = import_target;
        }
        if let Some(utility) = file.utility {
            self.utility = Some(utility);
        }
        if let Some(utility_files) = file.utility_files {
            self.utility_files = utility_files;
        }
        if let Some(public_exports) = file.public_exports {
            self.public_exports = public_exports;
        }
        if let Some(patches) = file.patches {
            self.patches = patches;
        }
    }

    /// Apply `CLOSURE2ESM_*` environment variables
    pub fn apply_env_overrides(&mut self) {
        if let Some(value) = env::var_os(ENV_INCLUDE_DIRS).filter(|v| !v.is_empty()) {
            self.include_dirs = env::split_paths(&value).collect();
            debug!("Include directories from {ENV_INCLUDE_DIRS}: {:?}", self.include_dirs);
        }
        if let Some(value) = env::var_os(ENV_OUT_DIR).filter(|v| !v.is_empty()) {
            self.out_dir = PathBuf::from(value);
        }
        if let Some(value) = env::var(ENV_NAMESPACE).ok().filter(|v| !v.is_empty()) {
            self.namespace = value;
        }
    }

    /// Entry file of the run
    pub fn entry(&self) -> Result<&Path> {
        self.entry
            .as_deref()
            .ok_or_else(|| anyhow!("No entry file configured, pass --entry or set `entry` in {CONFIG_FILE_NAME}"))
    }

    /// Reject settings no run could succeed with
    pub fn validate(&self) -> Result<()> {
        self.entry()?;
        if self.namespace.is_empty() || !self.namespace.chars().all(is_ident_char) {
            bail!("Invalid namespace root '{}'", self.namespace);
        }
        if self.out_dir.as_os_str().is_empty() {
            bail!("Output directory must not be empty");
        }
        for export in &self.public_exports {
            if export.name.is_empty() || !export.name.chars().all(is_ident_char) {
                bail!("Invalid public export name '{}'", export.name);
            }
        }
        Ok(())
    }
}

/// `<config dir>/closure2esm/closure2esm.toml`
pub fn user_config_path() -> Option<PathBuf> {
    let strategy = etcetera::choose_base_strategy().ok()?;
    Some(strategy.config_dir().join("closure2esm").join(CONFIG_FILE_NAME))
}
