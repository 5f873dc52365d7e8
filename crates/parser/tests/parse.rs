use go125_parser::ast::{Spec, TopLevelDecl, Type};
use go125_parser::positions::clear_positions;
use go125_parser::walk::{visit_pre, NodeRef, Visit};
use go125_parser::{parse_file, print_file, print_parsed, resolve, BindingKind};

fn roundtrip(src: &str) {
    let pf = parse_file(src, "t.go").unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(print_parsed(&pf).unwrap(), src);
}

#[test]
fn generic_declarations_print_unchanged() {
    roundtrip(
        "package list

type Number interface {
	~int | ~int64 | float64
}

type List[T any] struct {
	items []T
}

func (l *List[T]) Push(v T) {
	l.items = append(l.items, v)
}

func Map[T, U any](xs []T, f func(T) U) []U {
	out := make([]U, 0, len(xs))
	for _, x := range xs {
		out = append(out, f(x))
	}
	return out
}
",
    );
}

#[test]
fn statements_print_unchanged() {
    roundtrip(
        "package p

func run(ch chan int, done <-chan struct{}) (n int) {
outer:
	for {
		select {
		case v, ok := <-ch:
			if !ok {
				break outer
			}
			n += v
		case <-done:
			return
		default:
		}
	}
	go func() {
		ch <- n
	}()
	defer close(ch)
	switch {
	case n > 10:
		n--
	}
	return n
}
",
    );
}

#[test]
fn imports_keep_names_and_docs() {
    let src = "package p

import (
	\"fmt\"
	_ \"embed\"
	str \"strings\"
)

// Hello greets.
func Hello() string { return fmt.Sprint(str.ToUpper(\"hi\")) }
";
    let pf = parse_file(src, "t.go").unwrap();
    let decls = pf.arena.top_decls(pf.file.decls).to_vec();
    assert_eq!(decls.len(), 2);
    let TopLevelDecl::Decl(imports) = decls[0] else {
        panic!("first declaration should be the imports");
    };
    let specs = pf.arena.specs_list(pf.arena.decls[imports].specs);
    let paths: Vec<&str> = specs
        .iter()
        .map(|s| match s {
            Spec::Import(imp) => pf.text(imp.path.value),
            _ => panic!("non-import spec {s:?}"),
        })
        .collect();
    assert_eq!(paths, ["\"fmt\"", "\"embed\"", "\"strings\""]);
    let TopLevelDecl::Func(hello) = decls[1] else {
        panic!("second declaration should be a function");
    };
    let doc = pf.arena.funcs[hello].doc.expect("doc comment");
    assert_eq!(pf.arena.comment_group_text(&pf.interner, doc), "// Hello greets.");
    roundtrip(src);
}

#[test]
fn composite_literals_and_conversions() {
    roundtrip(
        "package p

type point struct{ x, y int }

var origin = point{}

var pts = []point{{1, 2}, {x: 3}}

var f = (*point)(nil)

var g = []byte(\"abc\")[1:]

var done = (<-chan int)(nil)
",
    );
}

#[test]
fn syntax_errors_name_file_line_and_column() {
    let err = parse_file("package p\nvar x\n", "t.go").unwrap_err();
    assert_eq!(err.to_string(), "t.go:2:6: missing variable type or initialization");

    let err = parse_file("package p\nvar s = \"abc\n", "t.go").unwrap_err();
    assert_eq!(err.to_string(), "t.go:2:9: unterminated string");
    assert_eq!(err.errors.len(), 1);

    let err = parse_file("package p\n\nfunc f( {\n}\n", "t.go").unwrap_err();
    assert!(err.to_string().starts_with("t.go:3:"), "{err}");
}

#[test]
fn deep_nesting_is_an_error() {
    let n = 10_000;
    let cases = [
        format!("package p\n\nvar x = {}1{}\n", "(".repeat(n), ")".repeat(n)),
        format!("package p\n\nvar x = {}true\n", "!".repeat(n)),
        format!("package p\n\nvar x {}int\n", "*".repeat(n)),
        format!("package p\n\nvar x = T{}{}\n", "{".repeat(n), "}".repeat(n)),
        format!("package p\n\nfunc f() {}{}\n", "{".repeat(n), "}".repeat(n)),
        format!("package p\n\nfunc f() {{\n{}}}\n", "L: ".repeat(n)),
    ];
    for src in &cases {
        let err = parse_file(src, "t.go").unwrap_err();
        assert!(err.to_string().contains("exceeded max nesting depth"), "{err}");
    }

    let src = format!("package p\n\nvar x = {}1{}\n", "(".repeat(100), ")".repeat(100));
    roundtrip(&src);
}

#[test]
fn names_resolve_to_their_declarations() {
    let src = "package p

type Item struct{ ID int64 }

func Load(id int64) *Item {
	it := &Item{ID: id}
	return it
}
";
    let pf = parse_file(src, "t.go").unwrap();
    let bindings = resolve(&pf.arena, &pf.interner, &pf.file);

    let mut uses = Vec::new();
    visit_pre(&pf.arena, &pf.file, NodeRef::File, |arena, _, node| {
        if let NodeRef::Type(t) = node {
            if let Type::Named { pkg: None, name, .. } = &arena.types[t] {
                if let Some(b) = bindings.lookup(name.pos) {
                    uses.push((pf.text(name.sym), b.kind));
                }
            }
        }
        Visit::Continue
    });
    assert!(uses.contains(&("Item", BindingKind::Type)));
    assert!(!uses.iter().any(|(n, _)| *n == "int64"));
}

#[test]
fn clearing_positions_then_printing_is_stable() {
    let src = "package p\n\nfunc f(a, b int) int { return a + b }\n";
    let mut pf = parse_file(src, "t.go").unwrap();
    clear_positions(&mut pf.arena, &mut pf.file);
    let once = print_file(&pf.arena, &pf.interner, &pf.file, None).unwrap();
    assert_eq!(once, "package p\n\nfunc f(a, b int) int {\n\treturn a + b\n}\n");

    let reparsed = parse_file(&once, "t.go").unwrap();
    assert_eq!(print_parsed(&reparsed).unwrap(), once);
}
