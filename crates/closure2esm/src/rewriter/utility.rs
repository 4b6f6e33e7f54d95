//! Imports for symbols of the utility namespace
//!
//! Closure code calls helpers straight off the namespace root
//! (`goog.isObject(x)`, `goog.DEBUG`). Those become bare names imported from
//! a utility module that is shipped next to the converted files.

use super::{
    RewriteResult,
    flatten::{Rename, flatten_names},
};
use crate::{config::UtilityConfig, syntax::Syntax};

/// Flatten `ns.<symbol>` to `<symbol>` and prepend one import per used symbol
///
/// The side table lists the used symbols in alphabetical order. Without a
/// utility configuration the text is returned unchanged.
pub fn import_utility_symbols(
    syntax: &Syntax,
    text: &str,
    utility: Option<&UtilityConfig>,
) -> RewriteResult<Vec<String>> {
    let Some(utility) = utility.filter(|u| !u.symbols.is_empty()) else {
        return RewriteResult::new(text.to_owned(), Vec::new());
    };

    let prefix = format!("{}.", syntax.namespace());
    let renames: Vec<Rename> = utility
        .symbols
        .iter()
        .map(|symbol| Rename::new(format!("{prefix}{symbol}"), symbol.as_str()))
        .collect();
    let flattened = flatten_names(text, &renames);

    let mut used: Vec<String> = flattened
        .side
        .iter()
        .filter_map(|from| from.strip_prefix(&prefix))
        .map(str::to_owned)
        .collect();
    if used.is_empty() {
        return RewriteResult::new(flattened.text, used);
    }
    used.sort();

    let mut out = String::with_capacity(flattened.text.len() + used.len() * 48);
    for symbol in &used {
        out.push_str(&format!(
            "import {{ {symbol} }} from \"{}\";\n",
            utility.import_from
        ));
    }
    out.push_str(&flattened.text);
    RewriteResult::new(out, used)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn utility() -> UtilityConfig {
        UtilityConfig {
            import_from: "./goog.goog.js".to_owned(),
            symbols: vec![
                "isObject".to_owned(),
                "DEBUG".to_owned(),
                "global".to_owned(),
            ],
        }
    }

    #[test]
    fn test_used_symbols_are_imported_sorted() {
        let syntax = Syntax::new("goog").unwrap();
        let utility = utility();
        let result = import_utility_symbols(
            &syntax,
            "if (goog.isObject(x) && goog.DEBUG) {\n  goog.global.console.log(x);\n}\n",
            Some(&utility),
        );
        assert_eq!(
            result.text,
            "import { DEBUG } from \"./goog.goog.js\";\n\
             import { global } from \"./goog.goog.js\";\n\
             import { isObject } from \"./goog.goog.js\";\n\
             if (isObject(x) && DEBUG) {\n  global.console.log(x);\n}\n"
        );
        assert_eq!(result.side, vec!["DEBUG", "global", "isObject"]);
    }

    #[test]
    fn test_partial_and_qualified_names_are_left_alone() {
        let syntax = Syntax::new("goog").unwrap();
        let utility = utility();
        let text = "goog.isObjectLike(x);\nfoo.goog.DEBUG;\n";
        let result = import_utility_symbols(&syntax, text, Some(&utility));
        assert_eq!(result.text, text);
        assert!(result.side.is_empty());
    }

    #[test]
    fn test_without_utility_config() {
        let syntax = Syntax::new("goog").unwrap();
        let text = "goog.isObject(x);\n";
        assert_eq!(import_utility_symbols(&syntax, text, None).text, text);
    }
}
