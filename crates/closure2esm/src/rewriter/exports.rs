//! Normalization of ad-hoc `exports` statements
//!
//! `goog.module` files publish their API through `exports` in several shapes:
//!
//! ```js
//! exports = {UnaryInterceptor, StreamInterceptor};
//! exports = UnaryResponse;
//! exports.HTTP_HEADERS_PARAM_NAME = '$httpHeaders';
//! exports.Status = Status;
//! exports.GenericTransportInterface;
//! ```
//!
//! Shapes are tried in a fixed order because some are textual prefixes of
//! others: the literal form must run before the `name = local;` form, and any
//! other assignment at the start of a line becomes `export const` last.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::RewriteResult;
use crate::{syntax::brace_depth_at, types::FxIndexSet};

static EXPORT_OBJECT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^([ \t]*)exports\s*=\s*\{([\s\w$,]*)\};?").expect("valid exports object pattern")
});

static EXPORT_REASSIGN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^([ \t]*)exports\s*=\s*([\w$]+)\s*;[ \t]*(\r?\n)?")
        .expect("valid exports reassignment pattern")
});

static EXPORT_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?m)^([ \t]*)exports\.([\w$]+)\s*=\s*(['"`\[{]|-?\d|function\b|class\b|async\b|new\b|true\b|false\b|null\b)"#,
    )
    .expect("valid exports literal pattern")
});

static EXPORT_LOCAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^([ \t]*)exports\.([\w$]+)\s*=\s*([\w$]+)\s*;[ \t]*(\r?\n)?")
        .expect("valid exports local pattern")
});

static EXPORT_ASSIGN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^([ \t]*)exports\.([\w$]+)\s*=([^=])").expect("valid exports assignment pattern")
});

static EXPORT_FORWARD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^([ \t]*)exports\.([\w$]+)\s*;").expect("valid exports forward pattern")
});

static EXPORT_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(^|[^\w$.])exports\.([\w$]+)").expect("valid exports reference pattern")
});

fn newline(caps: &Captures<'_>, group: usize) -> String {
    caps.get(group)
        .map(|m| m.as_str().to_owned())
        .unwrap_or_default()
}

/// Rewrite `exports` statements to ES exports
///
/// `exported` holds the bindings the declaration pass already exported;
/// statements re-exporting one of those are dropped. The side table lists the
/// names this pass exported.
pub fn normalize_exports(text: &str, exported: &FxIndexSet<String>) -> RewriteResult<Vec<String>> {
    if !text.contains("exports") {
        return RewriteResult::new(text.to_owned(), Vec::new());
    }

    let mut exported = exported.clone();
    let mut added = Vec::new();

    // exports = { A, B };
    let text = EXPORT_OBJECT.replace_all(text, |caps: &Captures<'_>| {
        let names: Vec<String> = caps[2]
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .filter(|name| exported.insert((*name).to_owned()))
            .map(str::to_owned)
            .collect();
        if names.is_empty() {
            return String::new();
        }
        added.extend(names.iter().cloned());
        format!("{}export {{ {} }};", &caps[1], names.join(", "))
    });

    // exports = Name;
    let text = EXPORT_REASSIGN.replace_all(&text, |caps: &Captures<'_>| {
        let name = &caps[2];
        if !exported.insert(name.to_owned()) {
            return String::new();
        }
        added.push(name.to_owned());
        format!("{}export {{ {name} }};{}", &caps[1], newline(caps, 3))
    });

    // exports.name = 'literal' | function ...
    let text = EXPORT_LITERAL.replace_all(&text, |caps: &Captures<'_>| {
        let name = &caps[2];
        exported.insert(name.to_owned());
        added.push(name.to_owned());
        format!("{}export const {name} = {}", &caps[1], &caps[3])
    });

    // exports.name = local;
    let text = EXPORT_LOCAL.replace_all(&text, |caps: &Captures<'_>| {
        let (name, local) = (&caps[2], &caps[3]);
        if exported.contains(local) {
            return String::new();
        }
        exported.insert(name.to_owned());
        added.push(name.to_owned());
        let specifier = if name == local {
            local.to_owned()
        } else {
            format!("{local} as {name}")
        };
        format!("{}export {{ {specifier} }};{}", &caps[1], newline(caps, 4))
    });

    // exports.name = <any other expression>
    let text = EXPORT_ASSIGN.replace_all(&text, |caps: &Captures<'_>| {
        let whole = &caps[0];
        if caps.get(0).is_some_and(|m| brace_depth_at(&text, m.start()) > 0) {
            return whole.to_owned();
        }
        let name = &caps[2];
        exported.insert(name.to_owned());
        added.push(name.to_owned());
        format!("{}export const {name} ={}", &caps[1], &caps[3])
    });

    // exports.name;
    let text = EXPORT_FORWARD.replace_all(&text, "${1}let ${2};");

    // exports.name anywhere else
    let text = EXPORT_REFERENCE.replace_all(&text, "${1}${2}");

    RewriteResult::new(text.into_owned(), added)
}
