//! Boundary-aware replacement of dotted names
//!
//! Every pass that turns `a.b.C` into a local binding goes through here. The
//! scanner walks the text once; at each position that can start a name it
//! tries the candidates longest first, so `a.B.C` always wins over its prefix
//! `a.B`. A match counts only when:
//!
//! - the preceding character is not an identifier character, `.`, `/`, `\`
//!   or a quote (keeps `x.a.B`, `./a.B.index.js` and `'a.B'` intact)
//! - the following character is not an identifier character (keeps `a.Bc`)
//!
//! Single- and double-quoted string literals are skipped entirely, so
//! `'expected a.B.C here'` keeps its text. Comments and template literals are
//! scanned like code: JSDoc type annotations and `${}` interpolations hold
//! real references.

use crate::{module_name::is_ident_char, types::FxIndexSet};

use super::RewriteResult;

/// Replace occurrences of `from` with `to`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename {
    pub from: String,
    pub to: String,
}

impl Rename {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

fn blocks_match_before(c: char) -> bool {
    is_ident_char(c) || matches!(c, '.' | '/' | '\\' | '\'' | '"' | '`')
}

fn can_start_at(text: &str, at: usize) -> bool {
    text[..at]
        .chars()
        .next_back()
        .is_none_or(|prev| !blocks_match_before(prev))
}

fn ends_cleanly(rest: &str) -> bool {
    rest.chars().next().is_none_or(|next| !is_ident_char(next))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comment {
    None,
    Line,
    Block,
}

/// Byte offset just past the string literal opened by `quote` at `start`
///
/// An unterminated literal ends at the line break.
fn string_end(text: &str, start: usize, quote: char) -> usize {
    let mut escaped = false;
    for (offset, c) in text[start + 1..].char_indices() {
        let at = start + 1 + offset;
        match c {
            '\n' => return at,
            '\\' if !escaped => escaped = true,
            c if c == quote && !escaped => return at + 1,
            _ => escaped = false,
        }
    }
    text.len()
}

/// Apply all renames in one left-to-right scan
///
/// The side table lists the `from` names that matched at least once, in the
/// order they were first seen.
pub fn flatten_names(text: &str, renames: &[Rename]) -> RewriteResult<FxIndexSet<String>> {
    let mut used = FxIndexSet::default();
    if renames.is_empty() {
        return RewriteResult::new(text.to_owned(), used);
    }

    let mut ordered: Vec<&Rename> = renames.iter().filter(|r| !r.from.is_empty()).collect();
    ordered.sort_by(|a, b| b.from.len().cmp(&a.from.len()).then_with(|| a.from.cmp(&b.from)));

    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut at = 0;
    let mut comment = Comment::None;

    while let Some(c) = text[at..].chars().next() {
        let rest = &text[at..];
        match comment {
            Comment::None if rest.starts_with("//") => comment = Comment::Line,
            Comment::None if rest.starts_with("/*") => comment = Comment::Block,
            Comment::None if c == '\'' || c == '"' => {
                at = string_end(text, at, c);
                continue;
            }
            Comment::Line if c == '\n' => comment = Comment::None,
            Comment::Block if rest.starts_with("*/") => comment = Comment::None,
            _ => {}
        }
        if is_ident_char(c) && can_start_at(text, at) {
            let hit = ordered
                .iter()
                .find(|r| rest.starts_with(r.from.as_str()) && ends_cleanly(&rest[r.from.len()..]));
            if let Some(rename) = hit {
                out.push_str(&text[copied..at]);
                out.push_str(&rename.to);
                used.insert(rename.from.clone());
                at += rename.from.len();
                copied = at;
                continue;
            }
        }
        at += c.len_utf8();
    }
    out.push_str(&text[copied..]);

    RewriteResult::new(out, used)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn flatten(text: &str, renames: &[(&str, &str)]) -> String {
        let renames: Vec<_> = renames.iter().map(|(f, t)| Rename::new(*f, *t)).collect();
        flatten_names(text, &renames).text
    }

    #[test]
    fn test_longest_name_wins_regardless_of_order() {
        let text = "a.B.C.run();\na.B.help(a.B.C);\n";
        let expected = "C.run();\nB.help(C);\n";
        assert_eq!(flatten(text, &[("a.B", "B"), ("a.B.C", "C")]), expected);
        assert_eq!(flatten(text, &[("a.B.C", "C"), ("a.B", "B")]), expected);
    }

    #[test]
    fn test_partial_identifiers_are_untouched() {
        let text = "a.Bc; xa.B; a.B$; a.B_1; a.B";
        assert_eq!(flatten(text, &[("a.B", "B")]), "a.Bc; xa.B; a.B$; a.B_1; B");
    }

    #[test]
    fn test_paths_and_strings_are_untouched() {
        let text = "import { B } from \"./a.B.index.js\";\nuse('a.B');\nurl = \"http://x/a.B\";\n(a.B)";
        assert_eq!(
            flatten(text, &[("a.B", "B")]),
            "import { B } from \"./a.B.index.js\";\nuse('a.B');\nurl = \"http://x/a.B\";\n(B)"
        );
    }

    #[test]
    fn test_names_inside_string_text_are_untouched() {
        let renames = [("a.B.C", "C")];
        assert_eq!(
            flatten("throw Error('expected a.B.C here', \"a.B.C \\\" too\");", &renames),
            "throw Error('expected a.B.C here', \"a.B.C \\\" too\");"
        );
        assert_eq!(
            flatten("log(\"it's\" + a.B.C);\n// it's a.B.C\n/** @type {a.B.C} don't */", &renames),
            "log(\"it's\" + C);\n// it's C\n/** @type {C} don't */"
        );
    }

    #[test]
    fn test_unterminated_string_ends_at_line_break() {
        assert_eq!(
            flatten("x = 'broken\na.B.C.run();", &[("a.B.C", "C")]),
            "x = 'broken\nC.run();"
        );
    }

    #[test]
    fn test_member_of_other_object_is_untouched() {
        assert_eq!(flatten("foo.a.B = 1;", &[("a.B", "B")]), "foo.a.B = 1;");
    }

    #[test]
    fn test_parameter_sharing_binding_name() {
        let text = "a.array.peek = function(array) {\n  return array[array.length - 1];\n};\n";
        assert_eq!(
            flatten(text, &[("a.array", "array")]),
            "array.peek = function(array) {\n  return array[array.length - 1];\n};\n"
        );
    }

    #[test]
    fn test_reports_used_names() {
        let renames = vec![Rename::new("goog.bind", "bind"), Rename::new("goog.now", "now")];
        let result = flatten_names("goog.bind(f); goog.bind(g);", &renames);
        assert_eq!(result.side.into_iter().collect::<Vec<_>>(), vec!["goog.bind"]);
    }

    #[test]
    fn test_non_ascii_text_is_preserved() {
        assert_eq!(
            flatten("// é a.B ü\na.B.x", &[("a.B", "B")]),
            "// é B ü\nB.x"
        );
    }

    #[test]
    fn test_idempotent() {
        let renames = [("a.B", "B"), ("a.B.C", "C")];
        let once = flatten("a.B.C.x(a.B)", &renames);
        assert_eq!(flatten(&once, &renames), once);
    }
}
