//! Barrel files re-exporting every converted module
//!
//! Each package `a.b` gets `a.b.index.js` re-exporting the bindings of all
//! modules declared under it, so generated imports only need to know a
//! module's package. The optional public `index.js` is the converted
//! library's API surface.

use std::{fs, path::Path};

use anyhow::{Context, Result, anyhow};
use log::debug;

use crate::{
    config::PublicExport,
    merger,
    module_index::{package_index_file_name, package_index_specifier},
    module_name::ModuleName,
    rewriter::DeclaredExport,
    types::FxIndexMap,
};

pub const PUBLIC_INDEX_FILE_NAME: &str = "index.js";

const PUBLIC_INDEX_HEADER: &str =
    "/**\n * @fileoverview Symbols exported to the outside world ES modules style\n */\n";

/// What one rewritten file contributes to the barrel files
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewrittenFile {
    pub stem: String,
    pub declarations: Vec<DeclaredExport>,
    /// Names exported by normalized `exports` statements
    pub exports: Vec<String>,
}

impl RewrittenFile {
    /// Package the file's ad-hoc exports are published under
    fn primary_package(&self) -> Option<&str> {
        self.declarations
            .iter()
            .find(|d| d.kind.is_module())
            .or_else(|| self.declarations.first())
            .map(|d| d.package.as_str())
    }
}

/// Contents of the package barrel files, keyed by file name
///
/// Declared bindings go to the barrel of their own package; names exported
/// through `exports` go to the barrel of the file's primary declaration.
/// Declarations in the root package have no barrel file. When two files
/// export the same name into one barrel the first file wins.
pub fn build_package_indexes(files: &[RewrittenFile]) -> FxIndexMap<String, String> {
    // barrel file name -> exported name -> stem
    let mut barrels: FxIndexMap<String, FxIndexMap<&str, &str>> = FxIndexMap::default();

    for file in files {
        let declared = file
            .declarations
            .iter()
            .map(|d| (d.package.as_str(), d.binding.as_str()));
        let exported = file
            .primary_package()
            .into_iter()
            .flat_map(|package| file.exports.iter().map(move |name| (package, name.as_str())));

        for (package, name) in declared.chain(exported) {
            let Some(file_name) = package_index_file_name(package) else {
                continue;
            };
            let names = barrels.entry(file_name).or_default();
            match names.get(name) {
                Some(stem) if *stem != file.stem => {
                    debug!("{name} is exported by both {stem} and {}, keeping {stem}", file.stem);
                }
                Some(_) => {}
                None => {
                    names.insert(name, &file.stem);
                }
            }
        }
    }

    let mut indexes: FxIndexMap<String, String> = barrels
        .into_iter()
        .map(|(file_name, names)| {
            let mut lines: Vec<String> = names
                .into_iter()
                .map(|(name, stem)| format!("export {{ {name} }} from \"./{stem}.js\";\n"))
                .collect();
            lines.sort();
            (file_name, merger::merge(&lines.concat()))
        })
        .collect();
    indexes.sort_keys();
    indexes
}

/// Contents of the public `index.js`, `None` when nothing is configured
pub fn build_public_index(exports: &[PublicExport]) -> Result<Option<String>> {
    if exports.is_empty() {
        return Ok(None);
    }
    let mut text = PUBLIC_INDEX_HEADER.to_owned();
    for export in exports {
        let module = ModuleName::new(&export.module)
            .with_context(|| format!("Invalid module in public export '{}'", export.name))?;
        let source = package_index_specifier(module.package()).ok_or_else(|| {
            anyhow!(
                "Public export '{}' names module '{module}' which has no package",
                export.name
            )
        })?;
        text.push_str(&format!("export {{ {} }} from \"{source}\";\n", export.name));
    }
    text.push('\n');
    Ok(Some(text))
}

/// Write every barrel file into `out_dir`
pub fn write_indexes(out_dir: &Path, indexes: &FxIndexMap<String, String>) -> Result<()> {
    for (file_name, text) in indexes {
        let path = out_dir.join(file_name);
        fs::write(&path, text)
            .with_context(|| format!("Failed to write package index: {}", path.display()))?;
        debug!("Wrote {file_name}");
    }
    Ok(())
}

/// Whether `file_name` is a barrel file this module produces
pub fn is_index_file(file_name: &str) -> bool {
    file_name.ends_with("index.js")
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::types::DeclarationKind;

    fn declared(module: &str) -> DeclaredExport {
        let module = ModuleName::new(module).unwrap();
        DeclaredExport {
            binding: module.binding().to_owned(),
            package: module.package().to_owned(),
            module,
            kind: DeclarationKind::Module,
        }
    }

    fn rewritten(stem: &str, modules: &[&str], exports: &[&str]) -> RewrittenFile {
        RewrittenFile {
            stem: stem.to_owned(),
            declarations: modules.iter().map(|m| declared(m)).collect(),
            exports: exports.iter().map(|e| (*e).to_owned()).collect(),
        }
    }

    #[test]
    fn test_package_indexes_group_by_package_and_stem() {
        let files = vec![
            rewritten(
                "goog.net.xmlhttp",
                &[
                    "goog.net.XmlHttp",
                    "goog.net.XmlHttpDefines",
                    "goog.net.DefaultXmlHttpFactory",
                ],
                &[],
            ),
            rewritten("goog.net.xhrlike", &["goog.net.XhrLike"], &[]),
            rewritten("standalone", &["Standalone"], &[]),
        ];

        let indexes = build_package_indexes(&files);
        assert_eq!(indexes.keys().collect::<Vec<_>>(), vec!["goog.net.index.js"]);
        let text = &indexes["goog.net.index.js"];
        assert_snapshot!(text, @r#"
        export { DefaultXmlHttpFactory, XmlHttp, XmlHttpDefines } from "./goog.net.xmlhttp.js";
        export { XhrLike } from "./goog.net.xhrlike.js";
        "#);
    }

    #[test]
    fn test_ad_hoc_exports_join_the_primary_package() {
        let files = vec![
            rewritten(
                "grpc.web.interceptor",
                &["grpc.web.Interceptor"],
                &["UnaryInterceptor", "StreamInterceptor"],
            ),
            rewritten("grpc.web.other", &["grpc.web.Other"], &["UnaryInterceptor"]),
        ];

        let indexes = build_package_indexes(&files);
        assert_eq!(
            indexes["grpc.web.index.js"],
            "export { Interceptor, StreamInterceptor, UnaryInterceptor } from \"./grpc.web.interceptor.js\";\n\
             export { Other } from \"./grpc.web.other.js\";\n"
        );
    }

    #[test]
    fn test_public_index() -> Result<()> {
        let exports = vec![
            PublicExport {
                name: "StatusCode".to_owned(),
                module: "grpc.web.StatusCode".to_owned(),
            },
            PublicExport {
                name: "MethodType".to_owned(),
                module: "grpc.web.MethodType".to_owned(),
            },
        ];
        let text = build_public_index(&exports)?.unwrap();
        assert!(text.starts_with("/**\n"));
        assert!(text.contains("export { StatusCode } from \"./grpc.web.index.js\";\n"));
        assert!(text.contains("export { MethodType } from \"./grpc.web.index.js\";\n"));
        assert_eq!(build_public_index(&[])?, None);
        Ok(())
    }

    #[test]
    fn test_public_export_needs_a_package() {
        let exports = vec![PublicExport {
            name: "Lonely".to_owned(),
            module: "Lonely".to_owned(),
        }];
        assert!(build_public_index(&exports).is_err());
    }

    #[test]
    fn test_is_index_file() {
        assert!(is_index_file("index.js"));
        assert!(is_index_file("goog.net.index.js"));
        assert!(!is_index_file("goog.net.xmlhttp.js"));
    }
}
