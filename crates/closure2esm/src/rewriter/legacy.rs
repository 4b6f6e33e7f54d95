//! Removal of `declareLegacyNamespace()` markers

use crate::syntax::Syntax;

/// Drop `declareLegacyNamespace()` statements together with their line break
pub fn remove_legacy_namespace(syntax: &Syntax, text: &str) -> String {
    syntax
        .legacy_namespace_pattern()
        .replace_all(text, "")
        .into_owned()
}
