//! Which top-level declarations have to follow the placeholders.
//!
//! A declaration is a dependant when any identifier inside it resolves to a
//! retained declaration. Dependants are added until a pass over every
//! declaration adds nothing; each declaration is added at most once, so the
//! loop runs at most once per declaration.

use std::collections::HashMap;

use go125_parser::ast::*;
use go125_parser::walk::{visit_pre, NodeRef, Visit};
use go125_parser::{Bindings, DeclKey};
use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use crate::context::{DeclKind, GenericContext, Replacement};

/// A parsed file together with its name bindings.
#[derive(Clone, Copy)]
pub struct Unit<'a> {
    pub arena: &'a AstArena,
    pub interner: &'a Interner,
    pub file: &'a SourceFile,
    pub bindings: &'a Bindings,
}

impl<'a> Unit<'a> {
    pub fn text(&self, sym: Symbol) -> &'a str {
        self.interner.resolve(sym)
    }
}

/// Where a top-level declaration lives in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclSite {
    /// One spec of a `type`, `const` or `var` declaration.
    Spec { decl: DeclId, spec: SpecId },
    Func(FuncDeclId),
}

impl DeclSite {
    pub fn node(self) -> NodeRef {
        match self {
            DeclSite::Spec { spec, .. } => NodeRef::Spec(spec),
            DeclSite::Func(id) => NodeRef::Func(id),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TopDecl {
    pub kind: DeclKind,
    pub site: DeclSite,
    /// Identity: the first defining name.
    pub key: DeclKey,
    pub names: SmallVec<[IdentName; 2]>,
    /// Base type name of a method receiver.
    pub receiver: Option<IdentName>,
    /// The spec's own doc comment, or its group's.
    pub doc: Option<CommentGroupId>,
}

/// Flat list of the declarations the closure runs over, in source order.
#[derive(Debug, Default)]
pub struct DeclTable {
    decls: Vec<TopDecl>,
    owners: HashMap<DeclKey, usize>,
}

impl DeclTable {
    pub fn collect(arena: &AstArena, file: &SourceFile) -> Self {
        let mut table = Self::default();
        for &top in arena.top_decls(file.decls) {
            match top {
                TopLevelDecl::Func(id) => {
                    let func = arena.funcs[id];
                    table.push(TopDecl {
                        kind: DeclKind::Func,
                        site: DeclSite::Func(id),
                        key: DeclKey::of(&func.name),
                        names: SmallVec::from_slice(&[func.name]),
                        receiver: func.recv.and_then(|r| receiver_base(arena, r.typ)),
                        doc: func.doc,
                    });
                }
                TopLevelDecl::Decl(decl) => {
                    let group = arena.decls[decl];
                    let kind = match group.kind {
                        GenDeclKind::Import => continue,
                        GenDeclKind::Type => DeclKind::Type,
                        GenDeclKind::Const => DeclKind::Const,
                        GenDeclKind::Var => DeclKind::Var,
                    };
                    for spec in group.specs.ids() {
                        let names: SmallVec<[IdentName; 2]> = match arena.spec(spec) {
                            Spec::Type(s) => SmallVec::from_slice(&[s.name]),
                            Spec::Value(s) => SmallVec::from_slice(arena.ident_names(s.names)),
                            Spec::Import(_) => continue,
                        };
                        let Some(first) = names.first() else { continue };
                        table.push(TopDecl {
                            kind,
                            site: DeclSite::Spec { decl, spec },
                            key: DeclKey::of(first),
                            names,
                            receiver: None,
                            doc: arena.spec(spec).doc().or(group.doc),
                        });
                    }
                }
            }
        }
        table
    }

    fn push(&mut self, decl: TopDecl) {
        let idx = self.decls.len();
        for name in &decl.names {
            self.owners.insert(DeclKey::of(name), idx);
        }
        self.decls.push(decl);
    }

    /// Index of the declaration that defines the name at `key`.
    pub fn owner(&self, key: DeclKey) -> Option<usize> {
        self.owners.get(&key).copied()
    }

    pub fn get(&self, idx: usize) -> &TopDecl {
        &self.decls[idx]
    }

    pub fn iter(&self) -> impl Iterator<Item = &TopDecl> {
        self.decls.iter()
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }
}

/// `T` in `T`, `*T`, `(T)` and `T[P]`.
fn receiver_base(arena: &AstArena, typ: TypeId) -> Option<IdentName> {
    match arena.types[typ] {
        Type::Pointer { elem, .. } | Type::Paren { typ: elem, .. } => receiver_base(arena, elem),
        Type::Named {
            pkg: None, name, ..
        } => Some(name),
        _ => None,
    }
}

/// Marks every type declaration named in `replacements` as a placeholder.
///
/// Placeholders are registered in declaration order, which is also the order
/// their name pairs are tried in when renaming.
pub fn register_placeholders(
    unit: Unit<'_>,
    table: &DeclTable,
    replacements: &HashMap<String, Replacement>,
    ctx: &mut GenericContext,
) -> usize {
    let mut count = 0;
    for decl in table.iter().filter(|d| d.kind == DeclKind::Type) {
        let name = unit.text(decl.names[0].sym);
        if let Some(replacement) = replacements.get(name) {
            trace!(placeholder = name, ?replacement, "registered placeholder");
            ctx.add_placeholder(decl.key, name, replacement.clone());
            count += 1;
        }
    }
    count
}

/// Grows the retained set to its closure.
pub fn collect_dependants(unit: Unit<'_>, table: &DeclTable, ctx: &mut GenericContext) {
    let mut passes = 0;
    loop {
        passes += 1;
        let mut changed = false;
        for idx in 0..table.len() {
            let decl = table.get(idx);
            if ctx.is_visited(decl.key) || !is_dependant(unit, table, ctx, decl) {
                continue;
            }
            add_dependant(unit, table, ctx, idx);
            changed = true;
        }
        if !changed {
            break;
        }
    }
    debug!(passes, retained = ctx.retained_len(), "dependency closure complete");
}

fn is_dependant(unit: Unit<'_>, table: &DeclTable, ctx: &GenericContext, decl: &TopDecl) -> bool {
    // methods of a placeholder belong to the placeholder, not to the output
    if let Some(recv) = decl.receiver {
        if let Some(b) = unit.bindings.lookup(recv.pos) {
            if ctx.is_placeholder(b.key) {
                return false;
            }
        }
    }

    let refers_to_retained = |pos: Span| {
        unit.bindings
            .lookup(pos)
            .filter(|b| b.is_package_level())
            .and_then(|b| table.owner(b.key))
            .is_some_and(|owner| ctx.is_retained(table.get(owner).key))
    };
    let completed = visit_pre(unit.arena, unit.file, decl.site.node(), |arena, _, node| {
        let pos = match node {
            NodeRef::Name(name) => name.pos,
            NodeRef::Expr(e) => match arena.exprs[e] {
                Expr::Ident(name) => name.pos,
                _ => return Visit::Continue,
            },
            _ => return Visit::Continue,
        };
        if refers_to_retained(pos) {
            Visit::Stop
        } else {
            Visit::Continue
        }
    });
    !completed
}

fn add_dependant(unit: Unit<'_>, table: &DeclTable, ctx: &mut GenericContext, idx: usize) {
    let decl = table.get(idx);
    trace!(
        name = unit.text(decl.names[0].sym),
        kind = ?decl.kind,
        "adding dependant"
    );
    match (decl.kind, decl.receiver) {
        (DeclKind::Func, Some(recv)) => {
            // methods keep their name; their receiver type is what gets renamed
            ctx.retain(decl.key, DeclKind::Func);
            let owner = unit
                .bindings
                .lookup(recv.pos)
                .and_then(|b| table.owner(b.key));
            match owner {
                Some(owner) if !ctx.is_visited(table.get(owner).key) => {
                    add_dependant(unit, table, ctx, owner)
                }
                Some(_) => {}
                None => warn!(
                    receiver = unit.text(recv.sym),
                    "receiver type is not declared in this file"
                ),
            }
        }
        _ => {
            let names = decl
                .names
                .iter()
                .map(|n| (DeclKey::of(n), unit.text(n.sym)));
            ctx.retain_renamed(decl.key, decl.kind, names);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use go125_parser::{parse_file, resolve};

    /// Runs the closure and returns the retained names in source order.
    fn closure(src: &str, placeholder: &str, concrete: &str) -> Vec<String> {
        let pf = parse_file(src, "t.go").unwrap();
        let bindings = resolve(&pf.arena, &pf.interner, &pf.file);
        let unit = Unit {
            arena: &pf.arena,
            interner: &pf.interner,
            file: &pf.file,
            bindings: &bindings,
        };
        let table = DeclTable::collect(&pf.arena, &pf.file);
        let mut ctx = GenericContext::new();
        let replacements =
            HashMap::from([(placeholder.to_owned(), Replacement::Ident(concrete.to_owned()))]);
        assert_eq!(register_placeholders(unit, &table, &replacements, &mut ctx), 1);
        collect_dependants(unit, &table, &mut ctx);
        ctx.prune_placeholders();
        table
            .iter()
            .filter(|d| ctx.is_retained(d.key))
            .map(|d| pf.text(d.names[0].sym).to_owned())
            .collect()
    }

    #[test]
    fn closure_is_transitive_and_drops_unrelated_code() {
        let src = "package p
type T struct{ ID int64 }
func helper(id int64) {}
type Box struct{ t T }
func open(b Box) {}
func main() { open(Box{}) }
var unrelated = 3
";
        assert_eq!(closure(src, "T", "C"), ["Box", "open", "main"]);
    }

    #[test]
    fn methods_follow_their_receiver() {
        let src = "package p
type T int
type DAO struct{}
func (d *DAO) Get() T { return 0 }
func (d *DAO) Empty() {}
func NewDAO() *DAO { return &DAO{} }
";
        assert_eq!(closure(src, "T", "C"), ["DAO", "Get", "Empty", "NewDAO"]);
    }

    #[test]
    fn methods_of_placeholders_are_never_retained() {
        let src = "package p
type T int
func (t T) Double() T { return t * 2 }
func Use(t T) T { return t.Double() }
";
        assert_eq!(closure(src, "T", "C"), ["Use"]);
    }

    #[test]
    fn shadowed_names_do_not_count() {
        let src = "package p
type T int
func f() { T := 1; _ = T }
func g(x T) {}
";
        assert_eq!(closure(src, "T", "C"), ["g"]);
    }

    #[test]
    fn renames_go_through_the_replacer() {
        let src = "package p
type Number int
const ZeroNumber Number = 0
var a, numberB = Number(1), 2
";
        let pf = parse_file(src, "t.go").unwrap();
        let bindings = resolve(&pf.arena, &pf.interner, &pf.file);
        let unit = Unit {
            arena: &pf.arena,
            interner: &pf.interner,
            file: &pf.file,
            bindings: &bindings,
        };
        let table = DeclTable::collect(&pf.arena, &pf.file);
        let mut ctx = GenericContext::new();
        let replacements = HashMap::from([(
            "Number".to_owned(),
            Replacement::Concrete {
                qualifier: None,
                name: "int64".to_owned(),
                pointer: false,
            },
        )]);
        register_placeholders(unit, &table, &replacements, &mut ctx);
        collect_dependants(unit, &table, &mut ctx);

        let renamed: Vec<_> = table
            .iter()
            .flat_map(|d| d.names.iter())
            .filter_map(|n| ctx.rename_of(DeclKey::of(n)))
            .map(|r| r.name().to_owned())
            .collect();
        assert_eq!(renamed, ["int64", "ZeroInt64", "a", "int64B"]);
    }

    #[test]
    fn groups_lend_their_doc_to_specs() {
        let src = "package p

// Shared doc.
var (
	a int
	// Own doc.
	b int
)
";
        let pf = parse_file(src, "t.go").unwrap();
        let table = DeclTable::collect(&pf.arena, &pf.file);
        let docs: Vec<_> = table
            .iter()
            .map(|d| d.doc.map(|g| pf.arena.comment_group_text(&pf.interner, g)))
            .collect();
        assert_eq!(
            docs,
            [Some("// Shared doc.".to_owned()), Some("// Own doc.".to_owned())]
        );
    }
}
