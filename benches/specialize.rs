use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use go125_parser::lexer::Lexer;
use go125_parser::{parse_file, print_parsed, resolve};
use goreify::{organize_imports, specialize, SpecializeOptions, TypeMapping};
use std::hint::black_box as bb;

// =============================================================================
// Corpus
// =============================================================================

const DAO: &str = r#"package dao

import (
	"errors"
	"fmt"
)

type Type struct {
	ID int64
}

// TypeDAO stores Type values by id.
type TypeDAO struct {
	items map[int64]*Type
}

var errNoType = errors.New("no such Type")

func NewTypeDAO() *TypeDAO {
	return &TypeDAO{items: map[int64]*Type{}}
}

// Get loads the Type with the given id.
func (dao *TypeDAO) Get(id int64) (*Type, error) {
	t, ok := dao.items[id]
	if !ok {
		return nil, fmt.Errorf("get %d: %w", id, errNoType)
	}
	return t, nil
}

func (dao *TypeDAO) Put(t *Type) {
	dao.items[t.ID] = t
}

func unrelated(x int) int { return x * 2 }
"#;

/// A template with `n` functions over the placeholder plus as many
/// unrelated ones, chained so the closure needs several passes.
fn generated(n: usize) -> String {
    let mut src = String::from("package gen\n\ntype Elem int\n\n");
    for i in 0..n {
        if i == 0 {
            src.push_str("func step0Elem(e Elem) Elem { return e }\n\n");
        } else {
            src.push_str(&format!(
                "func step{i}Elem(x int) int {{ return int(step{}Elem(Elem(x))) }}\n\n",
                i - 1
            ));
        }
        src.push_str(&format!("func other{i}(a, b int) int {{ return a*{i} + b }}\n\n"));
    }
    src
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_front_end(c: &mut Criterion) {
    let mut group = c.benchmark_group("front_end");
    group.throughput(Throughput::Bytes(DAO.len() as u64));

    group.bench_function("lex", |b| {
        b.iter(|| Lexer::new(bb(DAO)).count());
    });
    group.bench_function("parse", |b| {
        b.iter(|| parse_file(bb(DAO), "dao.go").map(|pf| pf.arena.exprs.len()));
    });
    group.bench_function("parse_resolve", |b| {
        b.iter(|| {
            let pf = parse_file(bb(DAO), "dao.go").ok()?;
            Some(resolve(&pf.arena, &pf.interner, &pf.file).len())
        });
    });

    let pf = match parse_file(DAO, "dao.go") {
        Ok(pf) => pf,
        Err(e) => panic!("{e}"),
    };
    group.bench_function("print", |b| {
        b.iter(|| print_parsed(bb(&pf)));
    });
    group.bench_function("organize_imports", |b| {
        b.iter(|| organize_imports("dao.go", bb(DAO)));
    });

    group.finish();
}

fn bench_specialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("specialize");
    let options = SpecializeOptions::default();

    let mapping: TypeMapping = "Type=*(\"example.com/models\")models.User".parse().unwrap();
    group.throughput(Throughput::Bytes(DAO.len() as u64));
    group.bench_function("dao", |b| {
        b.iter(|| specialize(bb(DAO), "dao.go", &mapping, &options));
    });

    let mapping: TypeMapping = "Elem=float64".parse().unwrap();
    for n in [10usize, 100, 400] {
        let src = generated(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("chain", n), &src, |b, src| {
            b.iter(|| specialize(bb(src), "gen.go", &mapping, &options));
        });
    }

    group.finish();
}

// =============================================================================
// Criterion registration
// =============================================================================

criterion_group!(benches, bench_front_end, bench_specialize);
criterion_main!(benches);
