//! Conversion of Closure-style namespaced JavaScript into flat ES modules
//!
//! Starting from an entry file, the dependency closure is discovered through
//! the include directories, copied into a flat output directory and rewritten
//! so every `provide`/`module`/`require` statement becomes a plain ES
//! `export`/`import`.

pub mod cli;
pub mod config;
pub mod issues;
pub mod locator;
pub mod merger;
pub mod module_index;
pub mod module_name;
pub mod orchestrator;
pub mod package_index;
pub mod patches;
pub mod rewriter;
pub mod syntax;
pub mod types;
pub mod walker;
