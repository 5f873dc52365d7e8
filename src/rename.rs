//! Rewrites references to retained declarations.
//!
//! Planning walks the retained declarations read-only and records one job
//! per identifier to rewrite; applying allocates the replacement nodes and
//! stores them through [`replace_field`]. Lookups made while planning all see
//! the unmodified tree.

use std::collections::HashSet;

use go125_parser::ast::*;
use go125_parser::walk::{replace_field, visit_pre, Cursor, NodeRef, Slot, StructuralError, Visit};
use go125_parser::DeclKey;
use tracing::{debug, trace};

use crate::analyze::{DeclTable, Unit};
use crate::context::{GenericContext, Replacement};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    /// A defining name, or the name of a `Type::Named` replaced by a plain identifier.
    Name,
    /// A whole `Type::Named` replaced by a qualified or pointer type.
    Type(TypeId),
    /// An identifier expression.
    Expr { callee: bool },
}

/// One pending substitution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenameJob {
    parent: NodeRef,
    slot: Slot,
    index: i32,
    key: DeclKey,
    shape: Shape,
}

/// Collects a job for every reference to a renamed declaration inside the
/// retained declarations. Placeholder declarations are skipped whole.
pub fn plan_renames(unit: Unit<'_>, table: &DeclTable, ctx: &GenericContext) -> Vec<RenameJob> {
    let mut jobs = Vec::new();
    let roots = table.iter().filter(|d| ctx.is_retained(d.key));
    for decl in roots {
        visit_pre(unit.arena, unit.file, decl.site.node(), |arena, at, node| {
            plan_node(unit, ctx, arena, at, node, &mut jobs)
        });
    }
    debug!(jobs = jobs.len(), "planned renames");
    jobs
}

fn plan_node(
    unit: Unit<'_>,
    ctx: &GenericContext,
    arena: &AstArena,
    at: Cursor,
    node: NodeRef,
    jobs: &mut Vec<RenameJob>,
) -> Visit {
    let renamed = |pos: Span| {
        let key = unit.bindings.lookup(pos)?.key;
        ctx.rename_of(key).map(|r| (key, r))
    };
    let mut push = |parent: Option<NodeRef>, slot, index, key, shape| {
        if let Some(parent) = parent {
            jobs.push(RenameJob {
                parent,
                slot,
                index,
                key,
                shape,
            });
        }
    };

    match node {
        NodeRef::Spec(id) => {
            if let Spec::Type(spec) = arena.spec(id) {
                if ctx.is_placeholder(DeclKey::of(&spec.name)) {
                    return Visit::SkipChildren;
                }
            }
        }
        NodeRef::Name(name) => {
            // only defining names of top-level declarations are renamed here
            let defining = matches!(
                (at.parent, at.slot),
                (Some(NodeRef::Spec(_)), Slot::Name | Slot::Names)
                    | (Some(NodeRef::Func(_)), Slot::Name)
            );
            let key = DeclKey::of(&name);
            if defining && ctx.rename_of(key).is_some() {
                push(at.parent, at.slot, at.index, key, Shape::Name);
            }
        }
        NodeRef::Type(t) => {
            if let Type::Named {
                pkg: None, name, ..
            } = arena.types[t]
            {
                if let Some((key, r)) = renamed(name.pos) {
                    if r.is_ident() {
                        push(Some(node), Slot::Name, -1, key, Shape::Name);
                    } else {
                        push(at.parent, at.slot, at.index, key, Shape::Type(t));
                    }
                }
            }
        }
        NodeRef::Expr(e) => {
            if let Expr::Ident(name) = arena.exprs[e] {
                if let Some((key, _)) = renamed(name.pos) {
                    let callee = at.slot == Slot::Fun;
                    push(at.parent, at.slot, at.index, key, Shape::Expr { callee });
                }
            }
        }
        _ => {}
    }
    Visit::Continue
}

/// Applies planned jobs. A failure means the plan addressed a slot the tree
/// does not have.
pub fn apply_renames(
    arena: &mut AstArena,
    interner: &mut Interner,
    file: &mut SourceFile,
    ctx: &GenericContext,
    jobs: &[RenameJob],
) -> Result<(), StructuralError> {
    for job in jobs {
        let Some(replacement) = ctx.rename_of(job.key) else {
            continue;
        };
        let new = build(arena, interner, replacement, job.shape);
        trace!(
            parent = job.parent.kind(),
            slot = %job.slot,
            index = job.index,
            to = replacement.name(),
            "rename"
        );
        replace_field(arena, file, job.parent, job.slot, job.index, new)?;
    }
    Ok(())
}

fn ident(interner: &mut Interner, text: &str) -> IdentName {
    IdentName {
        sym: interner.intern(text),
        pos: Span::NONE,
    }
}

fn build(
    arena: &mut AstArena,
    interner: &mut Interner,
    replacement: &Replacement,
    shape: Shape,
) -> NodeRef {
    let name = ident(interner, replacement.name());
    let (qualifier, pointer) = match replacement {
        Replacement::Ident(_) => (None, false),
        Replacement::Concrete {
            qualifier, pointer, ..
        } => (qualifier.as_deref(), *pointer),
    };
    match shape {
        Shape::Name => NodeRef::Name(name),
        Shape::Type(original) => {
            let (l_brack, args, r_brack) = match arena.types[original] {
                Type::Named {
                    l_brack,
                    args,
                    r_brack,
                    ..
                } => (l_brack, args, r_brack),
                _ => (None, ListRef::EMPTY, None),
            };
            let named = Type::Named {
                pkg: qualifier.map(|q| ident(interner, q)),
                name,
                l_brack,
                args,
                r_brack,
            };
            let mut t = arena.types.alloc(named, Span::NONE);
            if pointer {
                let star = Type::Pointer {
                    star_pos: Span::NONE,
                    elem: t,
                };
                t = arena.types.alloc(star, Span::NONE);
            }
            NodeRef::Type(t)
        }
        Shape::Expr { callee } => {
            let base = match qualifier {
                Some(q) => {
                    let pkg = Expr::Ident(ident(interner, q));
                    Expr::Selector {
                        expr: arena.exprs.alloc(pkg, Span::NONE),
                        dot_pos: Span::NONE,
                        sel: name,
                    }
                }
                None => Expr::Ident(name),
            };
            let mut e = arena.exprs.alloc(base, Span::NONE);
            if pointer {
                let deref = Expr::Unary {
                    op: UnaryOp::Deref,
                    op_pos: Span::NONE,
                    expr: e,
                };
                e = arena.exprs.alloc(deref, Span::NONE);
                if callee {
                    // *T(x) would dereference the conversion
                    let paren = Expr::Paren {
                        l_paren: Span::NONE,
                        expr: e,
                        r_paren: Span::NONE,
                    };
                    e = arena.exprs.alloc(paren, Span::NONE);
                }
            }
            NodeRef::Expr(e)
        }
    }
}

/// Runs the replacer over every comment group attached to the retained
/// declarations, including inherited group docs. Each group is rewritten once.
pub fn rename_comments(
    arena: &mut AstArena,
    interner: &mut Interner,
    file: &SourceFile,
    table: &DeclTable,
    ctx: &GenericContext,
) -> usize {
    if ctx.replacer().is_empty() {
        return 0;
    }
    let mut groups: Vec<CommentGroupId> = Vec::new();
    for decl in table.iter().filter(|d| ctx.is_retained(d.key) && !ctx.is_placeholder(d.key)) {
        groups.extend(decl.doc);
        visit_pre(arena, file, decl.site.node(), |_, _, node| {
            if let NodeRef::CommentGroup(g) = node {
                groups.push(g);
            }
            Visit::Continue
        });
    }

    let mut seen = HashSet::new();
    let mut rewritten = 0;
    for group in groups {
        if !seen.insert(group) {
            continue;
        }
        let comments = arena.comment_groups[group].comments;
        for &c in arena.comment_ids(comments).to_vec().iter() {
            let text = interner.resolve(arena.comments[c].text);
            let replaced = ctx.replacer().replace(text);
            if replaced != text {
                arena.comments[c].text = interner.intern(&replaced);
                rewritten += 1;
            }
        }
    }
    rewritten
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::{collect_dependants, register_placeholders};
    use go125_parser::{parse_file, print_file, resolve};
    use std::collections::HashMap;

    /// Renames in place and prints the whole input file back.
    fn renamed(src: &str, placeholder: &str, replacement: Replacement) -> String {
        let mut pf = parse_file(src, "t.go").unwrap();
        let bindings = resolve(&pf.arena, &pf.interner, &pf.file);
        let table = DeclTable::collect(&pf.arena, &pf.file);
        let mut ctx = GenericContext::new();
        let jobs = {
            let unit = Unit {
                arena: &pf.arena,
                interner: &pf.interner,
                file: &pf.file,
                bindings: &bindings,
            };
            let replacements = HashMap::from([(placeholder.to_owned(), replacement)]);
            register_placeholders(unit, &table, &replacements, &mut ctx);
            collect_dependants(unit, &table, &mut ctx);
            plan_renames(unit, &table, &ctx)
        };
        apply_renames(&mut pf.arena, &mut pf.interner, &mut pf.file, &ctx, &jobs).unwrap();
        rename_comments(&mut pf.arena, &mut pf.interner, &pf.file, &table, &ctx);
        print_file(&pf.arena, &pf.interner, &pf.file, Some(&pf.lines)).unwrap()
    }

    fn concrete(qualifier: Option<&str>, name: &str, pointer: bool) -> Replacement {
        Replacement::Concrete {
            qualifier: qualifier.map(str::to_owned),
            name: name.to_owned(),
            pointer,
        }
    }

    #[test]
    fn references_and_definitions_are_renamed() {
        let src = "package p

type Type struct{ ID int64 }

// TypeDAO stores Type values.
type TypeDAO struct{ cache map[int64]Type }

func (d *TypeDAO) Get(id int64) *Type { return nil }

func unrelated(Type int) int { return Type }
";
        let out = renamed(src, "Type", concrete(None, "Concrete", false));
        assert_eq!(
            out,
            "package p

type Type struct{ ID int64 }

// ConcreteDAO stores Concrete values.
type ConcreteDAO struct{ cache map[int64]Concrete }

func (d *ConcreteDAO) Get(id int64) *Concrete { return nil }

func unrelated(Type int) int { return Type }
"
        );
    }

    #[test]
    fn qualified_pointer_types_replace_the_whole_type() {
        let src = "package p

type Reader interface{}

func ReadFrom(r Reader, rs []Reader) {}
";
        let out = renamed(src, "Reader", concrete(Some("os"), "File", true));
        assert!(out.contains("func ReadFrom(r *os.File, rs []*os.File) {}"), "{out}");
    }

    #[test]
    fn pointer_conversions_are_parenthesized() {
        let src = "package p

type Reader interface{}

var r = Reader(nil)

var n = new(Reader)
";
        let out = renamed(src, "Reader", concrete(Some("os"), "File", true));
        assert!(out.contains("var r = (*os.File)(nil)"), "{out}");
        assert!(out.contains("var n = new(*os.File)"), "{out}");
    }

    #[test]
    fn value_names_are_renamed_one_by_one() {
        let src = "package p

type Number int

var ZeroNumber, other Number

var x = ZeroNumber + other
";
        let out = renamed(src, "Number", concrete(None, "int64", false));
        assert!(out.contains("var ZeroInt64, other int64"), "{out}");
        assert!(out.contains("var x = ZeroInt64 + other"), "{out}");
    }
}
