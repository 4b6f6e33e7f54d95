//! Alias bare references that would shadow a local name
//!
//! `goog.require('goog.asserts')` imports `asserts`. If the file itself
//! declares or exports `asserts`, the import would clash, so the reference is
//! turned into `const googAsserts = goog.require('goog.asserts');` and the
//! reference pass imports it under that alias instead.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{RewriteResult, splice};
use crate::{
    module_name::ModuleName,
    syntax::{ReferenceBinding, Syntax, defines_binding},
    types::FxIndexMap,
};

static EXPORT_LIST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*export\s*\{([^}]*)\}").expect("valid export list pattern"));

/// Names already bound at the top level of the file, with the module a
/// reference bound them to
fn taken_names(syntax: &Syntax, text: &str) -> FxIndexMap<String, Option<ModuleName>> {
    let mut taken = FxIndexMap::default();
    for declaration in syntax.declarations(text) {
        taken.insert(declaration.name.binding().to_owned(), None);
    }
    for caps in EXPORT_LIST.captures_iter(text) {
        for entry in caps[1].split(',') {
            if let Some(local) = entry.split_whitespace().next() {
                taken.insert(local.to_owned(), None);
            }
        }
    }
    for reference in syntax.references(text) {
        match &reference.binding {
            ReferenceBinding::Bare => {}
            ReferenceBinding::Single(local) => {
                taken.insert(local.clone(), Some(reference.name.clone()));
            }
            ReferenceBinding::Destructured(names) => {
                for name in names {
                    taken.insert(name.local.clone(), Some(reference.name.clone()));
                }
            }
        }
    }
    taken
}

fn unique_alias(module: &ModuleName, taken: &FxIndexMap<String, Option<ModuleName>>) -> String {
    let base = module.camel_alias();
    if !taken.contains_key(&base) {
        return base;
    }
    (2..)
        .map(|n| format!("{base}{n}"))
        .find(|candidate| !taken.contains_key(candidate))
        .unwrap_or(base)
}

/// Rewrite colliding bare references to aliased single-binding references
///
/// A bare reference repeating an earlier reference to the same module (a
/// `require` next to a `requireType`) binds the same name and is left alone.
/// The side table lists each aliased module with the alias it received.
pub fn alias_collisions(syntax: &Syntax, text: &str) -> RewriteResult<Vec<(ModuleName, String)>> {
    let references = syntax.references(text);
    if !references
        .iter()
        .any(|r| matches!(r.binding, ReferenceBinding::Bare))
    {
        return RewriteResult::new(text.to_owned(), Vec::new());
    }

    let mut taken = taken_names(syntax, text);
    let mut edits = Vec::new();
    let mut aliased = Vec::new();

    for reference in references {
        if !matches!(reference.binding, ReferenceBinding::Bare) {
            continue;
        }
        let binding = reference.name.binding();
        let collides = match taken.get(binding) {
            Some(Some(owner)) if *owner == reference.name => false,
            Some(_) => true,
            None => defines_binding(text, binding),
        };
        if !collides {
            taken.insert(binding.to_owned(), Some(reference.name.clone()));
            continue;
        }

        let alias = unique_alias(&reference.name, &taken);
        let statement = &text[reference.range.clone()];
        let indent_len = statement.len() - statement.trim_start().len();
        edits.push((
            reference.range.clone(),
            format!(
                "{}const {alias} = {}.require('{}');",
                &statement[..indent_len],
                syntax.namespace(),
                reference.name
            ),
        ));
        taken.insert(alias.clone(), Some(reference.name.clone()));
        aliased.push((reference.name, alias));
    }

    RewriteResult::new(splice(text, &edits), aliased)
}
