//! Non-fatal problems collected during a conversion run
//!
//! None of these stop the run. They are logged as they happen and summarized
//! at the end so a user can tell a clean conversion from a partial one.

use std::{fmt, path::PathBuf, sync::Mutex};

use log::warn;

use crate::module_name::ModuleName;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionIssue {
    /// A discovered file has no `provide`/`module` statement
    MissingDeclaration { file: PathBuf },

    /// A referenced module is not declared in any include directory
    UnresolvedReference {
        module: ModuleName,
        referenced_from: PathBuf,
    },

    /// More than one file declares the same module, the first one is used
    AmbiguousResolution {
        module: ModuleName,
        chosen: PathBuf,
        ignored: PathBuf,
    },

    /// A file could not be read or written
    UnreadableFile { file: PathBuf, message: String },

    /// A configured patch did not find its target file or anchor text
    PatchSkipped { file: String, reason: String },
}

impl fmt::Display for ConversionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingDeclaration { file } => {
                write!(f, "no module declaration found in {}", file.display())
            }
            Self::UnresolvedReference {
                module,
                referenced_from,
            } => write!(
                f,
                "module '{module}' referenced from {} was not found",
                referenced_from.display()
            ),
            Self::AmbiguousResolution {
                module,
                chosen,
                ignored,
            } => write!(
                f,
                "module '{module}' is declared by both {} and {}, using the first",
                chosen.display(),
                ignored.display()
            ),
            Self::UnreadableFile { file, message } => {
                write!(f, "failed to process {}: {message}", file.display())
            }
            Self::PatchSkipped { file, reason } => write!(f, "patch for {file} skipped: {reason}"),
        }
    }
}

/// Thread-safe issue sink shared by the pipeline stages
#[derive(Debug, Default)]
pub struct IssueLog {
    issues: Mutex<Vec<ConversionIssue>>,
}

impl IssueLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log the issue as a warning and keep it for the final report
    pub fn record(&self, issue: ConversionIssue) {
        warn!("{issue}");
        match self.issues.lock() {
            Ok(mut issues) => issues.push(issue),
            Err(poisoned) => poisoned.into_inner().push(issue),
        }
    }

    pub fn len(&self) -> usize {
        self.issues.lock().map_or(0, |issues| issues.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_vec(self) -> Vec<ConversionIssue> {
        self.issues
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
