//! `provide`/`module` statements to export bindings

use super::{RewriteResult, splice};
use crate::{
    module_name::ModuleName,
    syntax::{Syntax, defines_binding},
    types::{DeclarationKind, FxIndexSet},
};

/// A binding exported because the file declared the module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredExport {
    pub module: ModuleName,
    pub binding: String,
    pub package: String,
    pub kind: DeclarationKind,
}

/// Replace every declaration with `export { Binding };`
///
/// Provided namespaces are usually assigned to (`a.b.C = function() {}`)
/// rather than defined, so when the file has no `class`/`function`/`const`/
/// `let`/`var` of that name a `let Binding = {};` forward declaration follows
/// the export. A binding declared twice is exported once.
pub fn rewrite_declarations(syntax: &Syntax, text: &str) -> RewriteResult<Vec<DeclaredExport>> {
    let mut exported = FxIndexSet::default();
    let mut records = Vec::new();
    let mut edits = Vec::new();

    for declaration in syntax.declarations(text) {
        let binding = declaration.name.binding().to_owned();
        if !exported.insert(binding.clone()) {
            edits.push((declaration.range, String::new()));
            continue;
        }

        let replacement = if defines_binding(text, &binding) {
            format!("export {{ {binding} }};")
        } else {
            format!("export {{ {binding} }};\nlet {binding} = {{}};")
        };
        edits.push((declaration.range, replacement));
        records.push(DeclaredExport {
            package: declaration.name.package().to_owned(),
            module: declaration.name,
            binding,
            kind: declaration.kind,
        });
    }

    RewriteResult::new(splice(text, &edits), records)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn run(text: &str) -> RewriteResult<Vec<DeclaredExport>> {
        rewrite_declarations(&Syntax::new("goog").unwrap(), text)
    }

    #[test]
    fn test_single_provide_without_definition() {
        let result = run("goog.provide('goog.Example');");
        assert_eq!(result.text, "export { Example };\nlet Example = {};");
        assert_eq!(result.side[0].package, "goog");
        assert_eq!(result.side[0].kind, DeclarationKind::LegacyProvide);
    }

    #[test]
    fn test_declaration_with_existing_definition() {
        for definition in [
            "class Example {}",
            "function Example() {}",
            "const Example = 1;",
        ] {
            let text = format!("goog.module('goog.my.Example');\n{definition}\n");
            assert_eq!(run(&text).text, format!("export {{ Example }};\n{definition}\n"));
        }
    }

    #[test]
    fn test_local_of_same_name_still_gets_forward_declaration() {
        let result = run(
            "goog.provide('a.array');\n\na.array.copy = function(x) {\n  const array = x.slice();\n  return array;\n};\n",
        );
        assert_eq!(
            result.text,
            "export { array };\nlet array = {};\n\na.array.copy = function(x) {\n  const array = x.slice();\n  return array;\n};\n"
        );
    }

    #[test]
    fn test_indented_declarations_lose_indentation() {
        let result = run("\n  goog.provide('goog.Example');\ngoog.provide('goog.Example.Two');\n");
        assert_eq!(
            result.text,
            "\nexport { Example };\nlet Example = {};\nexport { Two };\nlet Two = {};\n"
        );
        let modules: Vec<_> = result.side.iter().map(|d| d.module.as_str()).collect();
        assert_eq!(modules, vec!["goog.Example", "goog.Example.Two"]);
    }

    #[test]
    fn test_duplicate_binding_is_exported_once() {
        let result = run("goog.provide('a.html');\ngoog.provide('b.html');\n");
        assert_eq!(result.text, "export { html };\nlet html = {};\n\n");
        assert_eq!(result.side.len(), 1);
    }

    #[test]
    fn test_other_statements_are_untouched() {
        let text = "goog.require('goog.events.EventId');\ngoog.events.Event;\n";
        assert_eq!(run(text).text, text);
    }
}
