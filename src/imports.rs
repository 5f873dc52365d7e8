//! Import clean-up for generated code.
//!
//! Keeps the imports whose package name is used as a selector qualifier and
//! re-emits them as a single declaration, standard library first.

use std::collections::HashSet;

use go125_parser::ast::*;
use go125_parser::walk::{visit_pre, NodeRef, Visit};
use go125_parser::{parse_file, resolve};
use tracing::debug;

use crate::error::ImportError;

/// Package name an unaliased import of `path` is assumed to bind: the last
/// path element without a `/vN` suffix or a `go-` prefix, cut at the first
/// `.` or `-`.
pub fn assumed_package_name(path: &str) -> &str {
    let mut elems = path.rsplit('/');
    let mut last = elems.next().unwrap_or(path);
    if is_major_version(last) {
        if let Some(prev) = elems.next() {
            last = prev;
        }
    }
    let last = last.strip_prefix("go-").unwrap_or(last);
    match last.find(|c: char| c == '.' || c == '-') {
        Some(cut) => &last[..cut],
        None => last,
    }
}

fn is_major_version(elem: &str) -> bool {
    elem.strip_prefix('v')
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

/// Value of an interpreted or raw Go string literal holding an import path.
pub fn unquote(lit: &str) -> Option<String> {
    if let Some(raw) = lit.strip_prefix('`').and_then(|s| s.strip_suffix('`')) {
        return Some(raw.to_owned());
    }
    let inner = lit.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next()? {
                c @ ('\\' | '"') => out.push(c),
                _ => return None,
            },
            c => out.push(c),
        }
    }
    Some(out)
}

pub fn quote(path: &str) -> String {
    format!("\"{}\"", path.replace('\\', "\\\\").replace('"', "\\\""))
}

/// One import as it will be written.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Line {
    /// `.`, `_` or an alias.
    name: Option<String>,
    path: String,
    literal: String,
}

impl Line {
    fn render(&self) -> String {
        match &self.name {
            Some(name) => format!("{name} {}", self.literal),
            None => self.literal.clone(),
        }
    }

    fn is_std(&self) -> bool {
        !self.path.split('/').next().unwrap_or("").contains('.')
    }
}

/// Removes unused imports from `text` and writes the rest as one sorted,
/// grouped import declaration. Code outside the imports is kept as is.
pub fn organize_imports(filename: &str, text: &str) -> Result<String, ImportError> {
    let pf = parse_file(text, filename)?;
    let arena = &pf.arena;
    let bindings = resolve(arena, &pf.interner, &pf.file);

    let import_decls: Vec<DeclId> = arena
        .top_decls(pf.file.decls)
        .iter()
        .filter_map(|d| match *d {
            TopLevelDecl::Decl(id) if arena.decls[id].kind == GenDeclKind::Import => Some(id),
            _ => None,
        })
        .collect();
    let (Some(&first), Some(&last)) = (import_decls.first(), import_decls.last()) else {
        return Ok(text.to_owned());
    };

    let mut used = HashSet::new();
    visit_pre(arena, &pf.file, NodeRef::File, |arena, _, node| {
        match node {
            NodeRef::Expr(e) => {
                if let Expr::Selector { expr, .. } = arena.exprs[e] {
                    if let Expr::Ident(base) = arena.exprs[expr] {
                        if !bindings.is_resolved(base.pos) {
                            used.insert(pf.text(base.sym));
                        }
                    }
                }
            }
            NodeRef::Type(t) => {
                if let Type::Named { pkg: Some(pkg), .. } = arena.types[t] {
                    used.insert(pf.text(pkg.sym));
                }
            }
            _ => {}
        }
        Visit::Continue
    });

    let mut lines: Vec<Line> = Vec::new();
    let mut dropped = 0;
    for &decl in &import_decls {
        for spec in arena.specs_list(arena.decls[decl].specs) {
            let Spec::Import(imp) = spec else { continue };
            let literal = pf.text(imp.path.value);
            let path = unquote(literal).ok_or_else(|| ImportError::Path(literal.to_owned()))?;
            let (name, keep) = match imp.name {
                Some(ImportName::Dot(_)) => (Some(".".to_owned()), true),
                Some(ImportName::Blank(_)) => (Some("_".to_owned()), true),
                Some(ImportName::Name(n)) => {
                    let name = pf.text(n.sym);
                    (Some(name.to_owned()), used.contains(name))
                }
                None => (None, used.contains(assumed_package_name(&path))),
            };
            let line = Line {
                name,
                path,
                literal: literal.to_owned(),
            };
            if !keep {
                dropped += 1;
            } else if !lines.contains(&line) {
                lines.push(line);
            }
        }
    }
    debug!(kept = lines.len(), dropped, "organized imports");

    let start = match arena.decls[first].doc {
        Some(doc) => arena.comment_groups.span(doc).start,
        None => arena.decls.span(first).start,
    } as usize;
    let end = arena.decls.span(last).end as usize;
    let head = &text[..start];
    let rest = text[end..].trim_start_matches(|c: char| c == '\n' || c == '\r');

    let mut out = String::with_capacity(text.len());
    if lines.is_empty() {
        if rest.is_empty() {
            out.push_str(head.trim_end());
            out.push('\n');
        } else {
            out.push_str(head);
            out.push_str(rest);
        }
        return Ok(out);
    }

    out.push_str(head);
    out.push_str(&render_block(lines));
    out.push('\n');
    if !rest.is_empty() {
        out.push('\n');
        out.push_str(rest);
    }
    Ok(out)
}

fn render_block(lines: Vec<Line>) -> String {
    if let [only] = lines.as_slice() {
        return format!("import {}", only.render());
    }
    let (mut std, mut other): (Vec<Line>, Vec<Line>) = lines.into_iter().partition(Line::is_std);
    std.sort_by(|a, b| a.path.cmp(&b.path));
    other.sort_by(|a, b| a.path.cmp(&b.path));

    let mut out = String::from("import (\n");
    for line in &std {
        out.push('\t');
        out.push_str(&line.render());
        out.push('\n');
    }
    if !std.is_empty() && !other.is_empty() {
        out.push('\n');
    }
    for line in &other {
        out.push('\t');
        out.push_str(&line.render());
        out.push('\n');
    }
    out.push(')');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assumed_names() {
        assert_eq!(assumed_package_name("fmt"), "fmt");
        assert_eq!(assumed_package_name("io/ioutil"), "ioutil");
        assert_eq!(
            assumed_package_name("github.com/nkovacs/rei/examples/pointer/go-test"),
            "test"
        );
        assert_eq!(assumed_package_name("gopkg.in/yaml.v3"), "yaml");
        assert_eq!(assumed_package_name("github.com/jackc/pgx/v5"), "pgx");
        assert_eq!(assumed_package_name("github.com/go-chi/chi"), "chi");
        assert_eq!(assumed_package_name("example.com/mux-router"), "mux");
    }

    #[test]
    fn quoting() {
        assert_eq!(unquote("\"fmt\"").as_deref(), Some("fmt"));
        assert_eq!(unquote("`a/b`").as_deref(), Some("a/b"));
        assert_eq!(unquote("\"a\\\"b\"").as_deref(), Some("a\"b"));
        assert_eq!(unquote("\"a\\x41\""), None);
        assert_eq!(unquote("fmt"), None);
        assert_eq!(quote("a/b"), "\"a/b\"");
    }

    #[test]
    fn unused_imports_are_dropped_and_sorted() {
        let src = "package main

import (
	\"os\"
	\"io/ioutil\"
	\"io\"
)

func f(r *os.File) {
	ioutil.ReadAll(r)
}
";
        assert_eq!(
            organize_imports("a.go", src).unwrap(),
            "package main

import (
	\"io/ioutil\"
	\"os\"
)

func f(r *os.File) {
	ioutil.ReadAll(r)
}
"
        );
    }

    #[test]
    fn single_import_loses_parentheses() {
        let src = "package main\n\nimport (\n\t\"fmt\"\n)\n\nfunc f() {\n\tfmt.Println()\n}\n";
        assert_eq!(
            organize_imports("a.go", src).unwrap(),
            "package main\n\nimport \"fmt\"\n\nfunc f() {\n\tfmt.Println()\n}\n"
        );
    }

    #[test]
    fn third_party_imports_follow_a_blank_line() {
        let src = "package main

import (
	test \"github.com/x/go-test\"
	\"io/ioutil\"
	\"io/ioutil\"
	_ \"embed\"
)

var r *test.Reader

var b, _ = ioutil.ReadAll(nil)
";
        assert_eq!(
            organize_imports("a.go", src).unwrap(),
            "package main

import (
	_ \"embed\"
	\"io/ioutil\"

	test \"github.com/x/go-test\"
)

var r *test.Reader

var b, _ = ioutil.ReadAll(nil)
"
        );
    }

    #[test]
    fn shadowed_package_names_do_not_keep_imports() {
        let src = "package main\n\nimport \"fmt\"\n\nfunc f(fmt T) {\n\tfmt.Println()\n}\n";
        assert_eq!(
            organize_imports("a.go", src).unwrap(),
            "package main\n\nfunc f(fmt T) {\n\tfmt.Println()\n}\n"
        );
        assert_eq!(
            organize_imports("a.go", "package main\n\nimport \"fmt\"\n").unwrap(),
            "package main\n"
        );
    }

    #[test]
    fn files_without_imports_are_untouched() {
        let src = "package p\n\nfunc f() {\n}\n";
        assert_eq!(organize_imports("a.go", src).unwrap(), src);
    }

    #[test]
    fn broken_input_is_an_error() {
        assert!(matches!(
            organize_imports("a.go", "package p\nfunc (\n"),
            Err(ImportError::Parse(_))
        ));
    }
}
