//! One-off text edits applied to copied files before rewriting
//!
//! Real-world Closure trees have quirks no general rule covers: a missing
//! `require`, a `define` that has to become a local constant, a utility file
//! lacking an export. Patches describe those edits in configuration:
//!
//! ```toml
//! [[patches]]
//! op = "replace"
//! file = "goog.base.js"
//! find = "goog.global.CLOSURE_NO_DEPS;"
//! with = "goog.global.CLOSURE_NO_DEPS = true;"
//! ```

use std::{borrow::Cow, fs, path::Path};

use anyhow::{Context, Result};
use cow_utils::CowUtils;
use log::{debug, info};
use serde::Deserialize;

use crate::issues::{ConversionIssue, IssueLog};

/// A single edit of one file in the output directory
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum PatchOp {
    /// Insert `line` after every line containing `anchor`
    AppendAfter {
        file: String,
        anchor: String,
        line: String,
    },

    /// Replace every occurrence of `find`
    Replace {
        file: String,
        find: String,
        with: String,
    },

    /// Delete every line containing `anchor`
    DeleteLine { file: String, anchor: String },

    /// Append `text` to the end of the file
    AppendToFile { file: String, text: String },
}

impl PatchOp {
    /// File name inside the output directory the patch edits
    pub fn file(&self) -> &str {
        match self {
            Self::AppendAfter { file, .. }
            | Self::Replace { file, .. }
            | Self::DeleteLine { file, .. }
            | Self::AppendToFile { file, .. } => file,
        }
    }

    /// Apply the edit to `text`, `None` when the anchor text is absent
    pub fn apply(&self, text: &str) -> Option<String> {
        match self {
            Self::AppendAfter { anchor, line, .. } => append_after(text, anchor, line),
            Self::Replace { find, with, .. } => match text.cow_replace(find.as_str(), with.as_str()) {
                Cow::Borrowed(_) => None,
                Cow::Owned(replaced) => Some(replaced),
            },
            Self::DeleteLine { anchor, .. } => delete_lines(text, anchor),
            Self::AppendToFile { text: appended, .. } => {
                let mut out = String::with_capacity(text.len() + appended.len() + 1);
                out.push_str(text);
                if !text.is_empty() && !text.ends_with('\n') {
                    out.push('\n');
                }
                out.push_str(appended);
                if !appended.ends_with('\n') {
                    out.push('\n');
                }
                Some(out)
            }
        }
    }
}

fn append_after(text: &str, anchor: &str, line: &str) -> Option<String> {
    if anchor.is_empty() || !text.contains(anchor) {
        return None;
    }
    let mut out = String::with_capacity(text.len() + line.len() + 1);
    for current in text.split_inclusive('\n') {
        out.push_str(current);
        if current.contains(anchor) {
            if !current.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(line);
            out.push('\n');
        }
    }
    Some(out)
}

fn delete_lines(text: &str, anchor: &str) -> Option<String> {
    if anchor.is_empty() || !text.contains(anchor) {
        return None;
    }
    Some(
        text.split_inclusive('\n')
            .filter(|current| !current.contains(anchor))
            .collect(),
    )
}

/// Apply `patches` in order to files in `out_dir`
///
/// A patch whose file or anchor is missing is recorded as an issue and
/// skipped. Returns the number of patches applied.
pub fn apply_patches(out_dir: &Path, patches: &[PatchOp], issues: &IssueLog) -> Result<usize> {
    let mut applied = 0;
    for patch in patches {
        let path = out_dir.join(patch.file());
        if !path.is_file() {
            issues.record(ConversionIssue::PatchSkipped {
                file: patch.file().to_owned(),
                reason: "file not found in the output directory".to_owned(),
            });
            continue;
        }

        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read patch target: {}", path.display()))?;
        let Some(patched) = patch.apply(&text) else {
            issues.record(ConversionIssue::PatchSkipped {
                file: patch.file().to_owned(),
                reason: "anchor text not found".to_owned(),
            });
            continue;
        };
        fs::write(&path, patched)
            .with_context(|| format!("Failed to write patched file: {}", path.display()))?;
        debug!("Patched {}", patch.file());
        applied += 1;
    }
    if !patches.is_empty() {
        info!("Applied {applied} of {} patches", patches.len());
    }
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    fn append_after_op(anchor: &str, line: &str) -> PatchOp {
        PatchOp::AppendAfter {
            file: "goog.html.safeurl.closure.js".to_owned(),
            anchor: anchor.to_owned(),
            line: line.to_owned(),
        }
    }

    #[test]
    fn test_append_after() {
        let op = append_after_op(
            "goog.provide('goog.html.SafeUrl');",
            "goog.provide('goog.html');",
        );
        assert_eq!(
            op.apply("goog.provide('goog.html.SafeUrl');\n\ngoog.require('goog.asserts');\n"),
            Some(
                "goog.provide('goog.html.SafeUrl');\ngoog.provide('goog.html');\n\ngoog.require('goog.asserts');\n"
                    .to_owned()
            )
        );
        assert_eq!(
            op.apply("goog.provide('goog.html.SafeUrl');"),
            Some("goog.provide('goog.html.SafeUrl');\ngoog.provide('goog.html');\n".to_owned())
        );
        assert_eq!(op.apply("goog.provide('goog.html.Other');\n"), None);
    }

    #[test]
    fn test_replace_every_occurrence() {
        let op = PatchOp::Replace {
            file: "goog.async.run.closure.js".to_owned(),
            find: "goog.ASSUME_NATIVE_PROMISE".to_owned(),
            with: "ASSUME_NATIVE_PROMISE".to_owned(),
        };
        assert_eq!(
            op.apply("if (goog.ASSUME_NATIVE_PROMISE) {}\nx = goog.ASSUME_NATIVE_PROMISE;\n"),
            Some("if (ASSUME_NATIVE_PROMISE) {}\nx = ASSUME_NATIVE_PROMISE;\n".to_owned())
        );
        assert_eq!(op.apply("nothing here\n"), None);
    }

    #[test]
    fn test_delete_line() {
        let op = PatchOp::DeleteLine {
            file: "grpc.web.interceptor.closure.js".to_owned(),
            anchor: "goog.module('grpc.web.Interceptor');".to_owned(),
        };
        assert_eq!(
            op.apply("goog.module('grpc.web.Interceptor');\nclass A {}\n"),
            Some("class A {}\n".to_owned())
        );
    }

    #[test]
    fn test_append_to_file() {
        let op = PatchOp::AppendToFile {
            file: "goog.base.js".to_owned(),
            text: "export { goog };".to_owned(),
        };
        assert_eq!(
            op.apply("var goog = goog || {};"),
            Some("var goog = goog || {};\nexport { goog };\n".to_owned())
        );
    }

    #[test]
    fn test_apply_patches_records_skips() -> Result<()> {
        let temp = TempDir::new()?;
        fs::write(
            temp.path().join("goog.base.js"),
            "goog.global.CLOSURE_NO_DEPS;\n",
        )?;
        let patches = vec![
            PatchOp::Replace {
                file: "goog.base.js".to_owned(),
                find: "goog.global.CLOSURE_NO_DEPS;".to_owned(),
                with: "goog.global.CLOSURE_NO_DEPS = true;".to_owned(),
            },
            PatchOp::DeleteLine {
                file: "goog.base.js".to_owned(),
                anchor: "not present".to_owned(),
            },
            PatchOp::AppendToFile {
                file: "missing.js".to_owned(),
                text: "x".to_owned(),
            },
        ];
        let issues = IssueLog::new();

        assert_eq!(apply_patches(temp.path(), &patches, &issues)?, 1);
        assert_eq!(
            fs::read_to_string(temp.path().join("goog.base.js"))?,
            "goog.global.CLOSURE_NO_DEPS = true;\n"
        );
        let skipped: Vec<_> = issues.into_vec().into_iter().map(|i| i.to_string()).collect();
        assert_eq!(
            skipped,
            vec![
                "patch for goog.base.js skipped: anchor text not found",
                "patch for missing.js skipped: file not found in the output directory",
            ]
        );
        Ok(())
    }

    #[test]
    fn test_later_patches_see_earlier_edits() -> Result<()> {
        let temp = TempDir::new()?;
        let file = "goog.array.array.closure.js";
        fs::write(
            temp.path().join(file),
            "goog.NATIVE_ARRAY_PROTOTYPES = goog.define('goog.NATIVE_ARRAY_PROTOTYPES', goog.TRUSTED_SITE);\nif (goog.NATIVE_ARRAY_PROTOTYPES) {}\n",
        )?;
        let patches = vec![
            PatchOp::DeleteLine {
                file: file.to_owned(),
                anchor: "goog.define('goog.NATIVE_ARRAY_PROTOTYPES'".to_owned(),
            },
            PatchOp::Replace {
                file: file.to_owned(),
                find: "goog.NATIVE_ARRAY_PROTOTYPES".to_owned(),
                with: "NATIVE_ARRAY_PROTOTYPES".to_owned(),
            },
        ];
        apply_patches(temp.path(), &patches, &IssueLog::new())?;
        assert_eq!(
            fs::read_to_string(temp.path().join(file))?,
            "if (NATIVE_ARRAY_PROTOTYPES) {}\n"
        );
        Ok(())
    }
}
