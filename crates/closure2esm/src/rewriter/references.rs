//! `require` statements to ES imports

use super::{RewriteResult, splice};
use crate::{
    module_name::ModuleName,
    syntax::{DestructuredName, ReferenceBinding, Syntax},
};

/// An import generated from a dependency reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    pub module: ModuleName,
    /// Import specifiers, `X` or `X as y`
    pub specifiers: Vec<String>,
    /// Where the import points to, e.g. `./goog.array.index.js`
    pub source: String,
    /// Local name that dotted occurrences of the module flatten to
    pub flatten_to: String,
}

impl ImportBinding {
    pub fn statement(&self) -> String {
        if self.specifiers.is_empty() {
            format!("import \"{}\";", self.source)
        } else {
            format!(
                "import {{ {} }} from \"{}\";",
                self.specifiers.join(", "),
                self.source
            )
        }
    }
}

/// Replace every reference with an import statement
///
/// - bare references import the module's binding
/// - `const x = require(...)` imports the binding renamed to `x` when needed
/// - destructuring imports exactly the destructured names
pub fn rewrite_references<F>(syntax: &Syntax, text: &str, resolve: F) -> RewriteResult<Vec<ImportBinding>>
where
    F: Fn(&ModuleName) -> String,
{
    let mut imports = Vec::new();
    let mut edits = Vec::new();

    for reference in syntax.references(text) {
        let binding = reference.name.binding().to_owned();
        let (specifiers, flatten_to) = match reference.binding {
            ReferenceBinding::Bare => (vec![binding.clone()], binding),
            ReferenceBinding::Single(local) if local == binding => (vec![binding.clone()], binding),
            ReferenceBinding::Single(local) => (vec![format!("{binding} as {local}")], local),
            ReferenceBinding::Destructured(names) => (
                names.iter().map(DestructuredName::specifier).collect(),
                binding,
            ),
        };

        let import = ImportBinding {
            source: resolve(&reference.name),
            module: reference.name,
            specifiers,
            flatten_to,
        };
        edits.push((reference.range, import.statement()));
        imports.push(import);
    }

    RewriteResult::new(splice(text, &edits), imports)
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::module_index::package_index_specifier;

    fn run(text: &str) -> RewriteResult<Vec<ImportBinding>> {
        rewrite_references(&Syntax::new("goog").unwrap(), text, |m| {
            package_index_specifier(m.package()).unwrap_or_default()
        })
    }

    #[test]
    fn test_bare_references() {
        assert_eq!(
            run("goog.require('goog.Example');").text,
            "import { Example } from \"./goog.index.js\";"
        );
        assert_eq!(
            run("    goog.requireType('goog.mytype.Example');").text,
            "import { Example } from \"./goog.mytype.index.js\";"
        );
    }

    #[test]
    fn test_single_binding_references() {
        assert_eq!(
            run("const Example = goog.require('goog.mytype.Example');").text,
            "import { Example } from \"./goog.mytype.index.js\";"
        );
        assert_eq!(
            run("const example = goog.require('goog.mytype.Example');").text,
            "import { Example as example } from \"./goog.mytype.index.js\";"
        );
        let result = run("var googCrypt = goog.require('goog.crypt.base64');");
        assert_eq!(
            result.text,
            "import { base64 as googCrypt } from \"./goog.crypt.index.js\";"
        );
        assert_eq!(result.side[0].flatten_to, "googCrypt");
    }

    #[test]
    fn test_destructured_references_keep_names() {
        let result = run(
            "const {StreamInterceptor, UnaryInterceptor   } = goog.require('grpc.web.Interceptor');",
        );
        assert_eq!(
            result.text,
            "import { StreamInterceptor, UnaryInterceptor } from \"./grpc.web.index.js\";"
        );
        assert_eq!(result.side[0].flatten_to, "Interceptor");

        let single = run("const {Status} = goog.require('grpc.web.StatusCode');");
        assert_eq!(
            single.text,
            "import { Status } from \"./grpc.web.index.js\";"
        );
    }

    #[test]
    fn test_references_in_context() {
        let result = run(
            "goog.module('a.Main');\n\ngoog.require('goog.debug.Error');\nconst {A: B} = goog.require('x.Y');\n\nfoo();\n",
        );
        assert_snapshot!(result.text, @r#"
        goog.module('a.Main');

        import { Error } from "./goog.debug.index.js";
        import { A as B } from "./x.index.js";

        foo();
        "#);
    }

    #[test]
    fn test_empty_destructuring_becomes_side_effect_import() {
        assert_eq!(
            run("const {} = goog.require('a.b.Polyfill');").text,
            "import \"./a.b.index.js\";"
        );
    }
}
