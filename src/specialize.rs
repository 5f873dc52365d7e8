//! One specialization run: source text and mapping in, generated source out.

use std::collections::{HashMap, HashSet};

use go125_parser::ast::*;
use go125_parser::positions::clear_positions;
use go125_parser::{parse_file, print_file, resolve};
use tracing::{debug, info, warn};

use crate::analyze::{collect_dependants, register_placeholders, DeclSite, DeclTable, Unit};
use crate::context::{DeclKind, GenericContext, Replacement};
use crate::error::SpecializeError;
use crate::imports::{organize_imports, quote, unquote};
use crate::mapping::{ConcreteType, TypeMapping};
use crate::order::order;
use crate::rename::{apply_renames, plan_renames, rename_comments};

/// First line of generated files when [`SpecializeOptions::header`] is set.
pub const GENERATED_HEADER: &str = "// Code generated by reify. DO NOT EDIT.";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecializeOptions {
    /// Package clause of the output; the input's own when `None`.
    pub package_name: Option<String>,
    /// Start the output with [`GENERATED_HEADER`].
    pub header: bool,
}

/// An import of the input file.
struct Imported {
    spec: ImportSpec,
    path: String,
}

/// An import the output needs and the input lacks.
#[derive(Debug, Clone, PartialEq, Eq)]
struct NewImport {
    path: String,
    /// Name the package is referred to by.
    local: String,
    /// Write `local` as an explicit import name.
    named: bool,
}

/// Specializes `src` for `mapping`.
///
/// The output holds the declarations that depend on a placeholder, renamed
/// for the concrete types, followed by nothing else: the placeholders, their
/// methods and unrelated code are left out. `filename` is only used in error
/// messages.
pub fn specialize(
    src: &str,
    filename: &str,
    mapping: &TypeMapping,
    options: &SpecializeOptions,
) -> Result<String, SpecializeError> {
    let ParsedFile {
        mut arena,
        mut interner,
        mut file,
        ..
    } = parse_file(src, filename)?;

    let imported = imports_of(&arena, &interner, &file)?;
    let (replacements, injected) = plan_imports(mapping, &imported, &interner);

    let bindings = resolve(&arena, &interner, &file);
    let table = DeclTable::collect(&arena, &file);
    let mut ctx = GenericContext::new();
    let jobs = {
        let unit = Unit {
            arena: &arena,
            interner: &interner,
            file: &file,
            bindings: &bindings,
        };
        let found = register_placeholders(unit, &table, &replacements, &mut ctx);
        if found < mapping.len() {
            let declared: HashSet<&str> = table
                .iter()
                .filter(|d| d.kind == DeclKind::Type)
                .map(|d| unit.text(d.names[0].sym))
                .collect();
            for (name, _) in mapping.iter().filter(|(n, _)| !declared.contains(n)) {
                warn!(placeholder = name, "no type declaration for template type");
            }
        }
        collect_dependants(unit, &table, &mut ctx);
        plan_renames(unit, &table, &ctx)
    };

    apply_renames(&mut arena, &mut interner, &mut file, &ctx, &jobs)?;
    let comments = rename_comments(&mut arena, &mut interner, &file, &table, &ctx);
    ctx.prune_placeholders();
    let kept = order(&ctx, &table);
    info!(
        placeholders = ctx.placeholder_count(),
        declarations = kept.len(),
        renames = jobs.len(),
        comments,
        "specialized {filename}"
    );

    let name = match &options.package_name {
        Some(name) => IdentName::new(interner.intern(name), Span::NONE),
        None => file.name,
    };
    let mut out = assemble(&mut arena, &mut interner, name, &table, &kept, &injected, &imported);
    clear_positions(&mut arena, &mut out);
    let printed = print_file(&arena, &interner, &out, None)?;
    let organized = organize_imports(filename, &printed)?;

    Ok(if options.header {
        format!("{GENERATED_HEADER}\n\n{organized}")
    } else {
        organized
    })
}

fn imports_of(
    arena: &AstArena,
    interner: &Interner,
    file: &SourceFile,
) -> Result<Vec<Imported>, SpecializeError> {
    let mut out = Vec::new();
    for &top in arena.top_decls(file.decls) {
        let TopLevelDecl::Decl(decl) = top else { continue };
        for spec in arena.specs_list(arena.decls[decl].specs) {
            if let Spec::Import(spec) = *spec {
                let literal = interner.resolve(spec.path.value);
                let path = unquote(literal)
                    .ok_or_else(|| SpecializeError::ImportPath(literal.to_owned()))?;
                out.push(Imported { spec, path });
            }
        }
    }
    Ok(out)
}

/// Works out how each concrete type is referred to in the output, reusing
/// the input's imports where possible.
fn plan_imports(
    mapping: &TypeMapping,
    imported: &[Imported],
    interner: &Interner,
) -> (HashMap<String, Replacement>, Vec<NewImport>) {
    let mut replacements = HashMap::with_capacity(mapping.len());
    let mut injected: Vec<NewImport> = Vec::new();
    for (placeholder, concrete) in mapping.iter() {
        let qualifier = if concrete.has_import() {
            qualifier_for(concrete, imported, &mut injected, interner)
        } else {
            None
        };
        replacements.insert(
            placeholder.to_owned(),
            Replacement::Concrete {
                qualifier,
                name: concrete.type_name.clone(),
                pointer: concrete.is_pointer,
            },
        );
    }
    debug!(injected = injected.len(), "planned imports");
    (replacements, injected)
}

fn qualifier_for(
    concrete: &ConcreteType,
    imported: &[Imported],
    injected: &mut Vec<NewImport>,
    interner: &Interner,
) -> Option<String> {
    // a blank import does not make the package's names usable
    let existing = imported.iter().find(|i| {
        i.path == concrete.import_path && !matches!(i.spec.name, Some(ImportName::Blank(_)))
    });
    if let Some(existing) = existing {
        return match existing.spec.name {
            Some(ImportName::Dot(_)) => None,
            Some(ImportName::Name(n)) => Some(interner.resolve(n.sym).to_owned()),
            Some(ImportName::Blank(_)) | None => Some(concrete.package_alias.clone()),
        };
    }
    if let Some(new) = injected.iter().find(|i| i.path == concrete.import_path) {
        return Some(new.local.clone());
    }
    let last = concrete
        .import_path
        .rsplit('/')
        .next()
        .unwrap_or(&concrete.import_path);
    injected.push(NewImport {
        path: concrete.import_path.clone(),
        local: concrete.package_alias.clone(),
        named: concrete.is_aliased_import && concrete.package_alias != last,
    });
    Some(concrete.package_alias.clone())
}

/// Builds the output file: one import declaration, then every kept
/// declaration in `kept` order. Each spec becomes its own declaration and
/// carries the doc it had, or its group's.
fn assemble(
    arena: &mut AstArena,
    interner: &mut Interner,
    name: IdentName,
    table: &DeclTable,
    kept: &[usize],
    injected: &[NewImport],
    imported: &[Imported],
) -> SourceFile {
    let mut decls = Vec::with_capacity(kept.len() + 1);

    let new_specs = injected.iter().map(|imp| {
        Spec::Import(ImportSpec {
            doc: None,
            name: imp
                .named
                .then(|| ImportName::Name(IdentName::new(interner.intern(&imp.local), Span::NONE))),
            path: StringLit {
                value: interner.intern(&quote(&imp.path)),
                pos: Span::NONE,
            },
            comment: None,
        })
    });
    let mut import_specs: Vec<Spec> = new_specs.collect();
    import_specs.extend(imported.iter().map(|imp| {
        Spec::Import(ImportSpec {
            doc: None,
            comment: None,
            ..imp.spec
        })
    }));
    if !import_specs.is_empty() {
        let specs = arena.list_specs(import_specs);
        decls.push(TopLevelDecl::Decl(gen_decl(arena, GenDeclKind::Import, None, specs)));
    }

    for decl in kept.iter().map(|&idx| table.get(idx)) {
        let top = match decl.site {
            DeclSite::Func(id) => TopLevelDecl::Func(id),
            DeclSite::Spec { decl: group, spec } => {
                let kind = arena.decls[group].kind;
                let mut spec = *arena.spec(spec);
                spec.set_doc(None);
                let specs = arena.list_specs([spec]);
                TopLevelDecl::Decl(gen_decl(arena, kind, decl.doc, specs))
            }
        };
        decls.push(top);
    }

    SourceFile {
        doc: None,
        package_pos: Span::NONE,
        name,
        decls: arena.list_top_decls(decls),
        comments: ListRef::EMPTY,
    }
}

fn gen_decl(
    arena: &mut AstArena,
    kind: GenDeclKind,
    doc: Option<CommentGroupId>,
    specs: ListRef<Spec>,
) -> DeclId {
    let decl = GenDecl {
        doc,
        kw_pos: Span::NONE,
        kind,
        // parentheses are settled when positions are cleared
        l_paren: None,
        specs,
        r_paren: None,
    };
    arena.decls.alloc(decl, Span::NONE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(src: &str, mapping: &str) -> String {
        let mapping = TypeMapping::parse(mapping).unwrap();
        specialize(src, "t.go", &mapping, &SpecializeOptions::default()).unwrap()
    }

    #[test]
    fn existing_imports_decide_the_qualifier() {
        let src = "package p

import (
	\"fmt\"
	o \"os\"
)

type Item interface{}

func PrintItem(it Item) { fmt.Println(it) }
";
        assert_eq!(
            run(src, "Item=*os.File"),
            "package p\n\nimport (\n\t\"fmt\"\n\to \"os\"\n)\n\nfunc PrintFile(it *o.File) {\n\tfmt.Println(it)\n}\n"
        );
    }

    #[test]
    fn dot_imports_leave_types_unqualified() {
        let src = "package p\n\nimport . \"os\"\n\ntype T interface{}\n\nvar Zero T\n";
        assert_eq!(
            run(src, "T=os.File"),
            "package p\n\nimport . \"os\"\n\nvar Zero File\n"
        );
    }

    #[test]
    fn aliases_matching_the_path_are_not_written() {
        let src = "package p\n\ntype T int\n\nvar ZeroT T\n";
        assert_eq!(
            run(src, "T=(\"example.com/money\")money.Amount"),
            "package p\n\nimport \"example.com/money\"\n\nvar ZeroAmount money.Amount\n"
        );
    }

    #[test]
    fn several_placeholders_are_replaced_together() {
        let src = "package p

type K int
type V int

type KVPair struct {
	Key   K
	Value V
}

func NewKVPair(k K, v V) KVPair { return KVPair{k, v} }
";
        assert_eq!(
            run(src, "K=string,V=int"),
            "package p

type StringIntPair struct {
	Key   string
	Value int
}

func NewStringIntPair(k string, v int) StringIntPair {
	return StringIntPair{k, v}
}
"
        );
    }

    #[test]
    fn package_name_can_be_replaced() {
        let mapping = TypeMapping::parse("T=int").unwrap();
        let options = SpecializeOptions {
            package_name: Some("ints".to_owned()),
            header: false,
        };
        let src = "package p\ntype T int\nvar X T\n";
        let out = specialize(src, "t.go", &mapping, &options).unwrap();
        assert_eq!(out, "package ints\n\nvar X int\n");
    }
}
