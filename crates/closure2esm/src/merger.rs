//! Coalescing of consecutive import and export statements
//!
//! Runs after every rewrite and over every package index. Only maximal runs
//! of adjacent lines of the same kind are touched, so a statement separated
//! by anything else (a comment, a blank line, code) is never moved.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::FxIndexMap;

static IMPORT_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^import \{\s*([^}]+?)\s*\} from "([^"]+)";$"#).expect("valid import line pattern")
});

static EXPORT_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^export \{\s*([^}]+?)\s*\}(?: from "([^"]+)")?;$"#)
        .expect("valid export line pattern")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatementKind {
    Import,
    Export,
}

#[derive(Debug)]
struct Statement<'a> {
    kind: StatementKind,
    names: Vec<&'a str>,
    source: Option<&'a str>,
}

fn parse_line(line: &str) -> Option<Statement<'_>> {
    let (kind, caps) = if let Some(caps) = IMPORT_LINE.captures(line) {
        (StatementKind::Import, caps)
    } else {
        (StatementKind::Export, EXPORT_LINE.captures(line)?)
    };
    let names = caps
        .get(1)?
        .as_str()
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect();
    Some(Statement {
        kind,
        names,
        source: caps.get(2).map(|m| m.as_str()),
    })
}

fn render(kind: StatementKind, names: &[&str], source: Option<&str>) -> String {
    let keyword = match kind {
        StatementKind::Import => "import",
        StatementKind::Export => "export",
    };
    match source {
        Some(source) => format!("{keyword} {{ {} }} from \"{source}\";", names.join(", ")),
        None => format!("{keyword} {{ {} }};", names.join(", ")),
    }
}

/// Merge one run of statements of the same kind
fn merge_run(run: &[Statement<'_>]) -> Vec<String> {
    let Some(kind) = run.first().map(|s| s.kind) else {
        return Vec::new();
    };

    let mut groups: FxIndexMap<Option<&str>, Vec<&str>> = FxIndexMap::default();
    for statement in run {
        let names = groups.entry(statement.source).or_default();
        for name in &statement.names {
            if !names.contains(name) {
                names.push(*name);
            }
        }
    }

    let mut statements: Vec<String> = groups
        .into_iter()
        .map(|(source, mut names)| {
            names.sort_by(|a, b| {
                a.to_lowercase()
                    .cmp(&b.to_lowercase())
                    .then_with(|| a.cmp(b))
            });
            render(kind, &names, source)
        })
        .collect();
    statements.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    statements
}

fn line_body(line: &str) -> (&str, &str) {
    let body = line.trim_end_matches(['\n', '\r']);
    (body, &line[body.len()..])
}

fn flush(out: &mut String, run: &mut Vec<Statement<'_>>, ending: &str) {
    if run.is_empty() {
        return;
    }
    let merged = merge_run(run);
    let last = merged.len().saturating_sub(1);
    for (i, statement) in merged.iter().enumerate() {
        out.push_str(statement);
        if i < last {
            out.push_str(if ending.is_empty() { "\n" } else { ending });
        } else {
            out.push_str(ending);
        }
    }
    run.clear();
}

/// Merge consecutive import and export statements sharing a source
///
/// Within a run, names are unioned and sorted case-insensitively and one
/// statement is emitted per source, longest statement first.
pub fn merge(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut run: Vec<Statement<'_>> = Vec::new();
    let mut run_ending = "";

    for line in text.split_inclusive('\n') {
        let (body, ending) = line_body(line);
        match parse_line(body) {
            Some(statement) => {
                if run.first().is_some_and(|first| first.kind != statement.kind) {
                    flush(&mut out, &mut run, run_ending);
                }
                run.push(statement);
                run_ending = ending;
            }
            None => {
                flush(&mut out, &mut run, run_ending);
                out.push_str(line);
            }
        }
    }
    flush(&mut out, &mut run, run_ending);
    out
}
