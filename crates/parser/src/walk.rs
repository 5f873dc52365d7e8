//! Generic traversal and in-place child replacement.
//!
//! A node is addressed by a [`NodeRef`]; the place it hangs in its parent is a
//! [`Cursor`] of `(parent, slot, index)` where `index` is `-1` for a single
//! child and the list position otherwise. The child table in [`children`] and
//! the mutable slot table behind [`replace_field`] describe the same shape, so
//! any cursor handed to a visitor can be fed back to `replace_field`.
//!
//! Traversal is read-only. Callers that rewrite the tree collect
//! `(cursor, replacement)` jobs first and apply them afterwards.

use crate::ast::*;
use smallvec::SmallVec;
use std::fmt;

/// Handle to any node reachable from a [`SourceFile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRef {
    File,
    Decl(DeclId),
    Spec(SpecId),
    Func(FuncDeclId),
    Signature(SignatureId),
    Field(FieldId),
    TypeParams(TypeParamsId),
    TypeParamDecl(TypeParamDeclId),
    Stmt(StmtId),
    SimpleStmt(SimpleStmtId),
    SwitchClause(SwitchClauseId),
    CommClause(CommClauseId),
    Expr(ExprId),
    Element(ElementId),
    Type(TypeId),
    InterfaceElem(InterfaceElemId),
    CommentGroup(CommentGroupId),
    Comment(CommentId),
    /// Identifier leaf in a naming position (declared names, selectors, labels).
    Name(IdentName),
}

impl NodeRef {
    pub const fn kind(&self) -> &'static str {
        match self {
            NodeRef::File => "File",
            NodeRef::Decl(_) => "GenDecl",
            NodeRef::Spec(_) => "Spec",
            NodeRef::Func(_) => "FuncDecl",
            NodeRef::Signature(_) => "Signature",
            NodeRef::Field(_) => "Field",
            NodeRef::TypeParams(_) => "TypeParams",
            NodeRef::TypeParamDecl(_) => "TypeParamDecl",
            NodeRef::Stmt(_) => "Stmt",
            NodeRef::SimpleStmt(_) => "SimpleStmt",
            NodeRef::SwitchClause(_) => "SwitchClause",
            NodeRef::CommClause(_) => "CommClause",
            NodeRef::Expr(_) => "Expr",
            NodeRef::Element(_) => "KeyedElement",
            NodeRef::Type(_) => "Type",
            NodeRef::InterfaceElem(_) => "InterfaceElem",
            NodeRef::CommentGroup(_) => "CommentGroup",
            NodeRef::Comment(_) => "Comment",
            NodeRef::Name(_) => "Ident",
        }
    }
}

/// Named child field of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Root,
    Doc,
    Comment,
    Name,
    Names,
    Decls,
    Specs,
    Type,
    TypeParams,
    Values,
    RecvName,
    Recv,
    Body,
    List,
    Constraint,
    Params,
    Results,
    Stmt,
    Decl,
    Label,
    Call,
    Init,
    Cond,
    Post,
    Else,
    Lhs,
    Rhs,
    X,
    Y,
    Tag,
    Chan,
    Value,
    Elts,
    Index,
    Sel,
    Low,
    High,
    Max,
    Fun,
    Args,
    Key,
    Pkg,
    Len,
    Elt,
    Fields,
    Methods,
    Terms,
}

impl Slot {
    pub const fn name(self) -> &'static str {
        match self {
            Slot::Root => "Root",
            Slot::Doc => "Doc",
            Slot::Comment => "Comment",
            Slot::Name => "Name",
            Slot::Names => "Names",
            Slot::Decls => "Decls",
            Slot::Specs => "Specs",
            Slot::Type => "Type",
            Slot::TypeParams => "TypeParams",
            Slot::Values => "Values",
            Slot::RecvName => "RecvName",
            Slot::Recv => "Recv",
            Slot::Body => "Body",
            Slot::List => "List",
            Slot::Constraint => "Constraint",
            Slot::Params => "Params",
            Slot::Results => "Results",
            Slot::Stmt => "Stmt",
            Slot::Decl => "Decl",
            Slot::Label => "Label",
            Slot::Call => "Call",
            Slot::Init => "Init",
            Slot::Cond => "Cond",
            Slot::Post => "Post",
            Slot::Else => "Else",
            Slot::Lhs => "Lhs",
            Slot::Rhs => "Rhs",
            Slot::X => "X",
            Slot::Y => "Y",
            Slot::Tag => "Tag",
            Slot::Chan => "Chan",
            Slot::Value => "Value",
            Slot::Elts => "Elts",
            Slot::Index => "Index",
            Slot::Sel => "Sel",
            Slot::Low => "Low",
            Slot::High => "High",
            Slot::Max => "Max",
            Slot::Fun => "Fun",
            Slot::Args => "Args",
            Slot::Key => "Key",
            Slot::Pkg => "Pkg",
            Slot::Len => "Len",
            Slot::Elt => "Elt",
            Slot::Fields => "Fields",
            Slot::Methods => "Methods",
            Slot::Terms => "Terms",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a node hangs. The traversal root has no parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub parent: Option<NodeRef>,
    pub slot: Slot,
    /// `-1` for a single child, the position in the list otherwise.
    pub index: i32,
}

impl Cursor {
    pub const ROOT: Cursor = Cursor {
        parent: None,
        slot: Slot::Root,
        index: -1,
    };
}

/// What the traversal does after a callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Continue,
    /// From `pre`: do not descend and do not call `post` for this node.
    SkipChildren,
    /// Abandon the whole traversal.
    Stop,
}

pub trait Visitor {
    fn pre(&mut self, _arena: &AstArena, _at: Cursor, _node: NodeRef) -> Visit {
        Visit::Continue
    }

    fn post(&mut self, _arena: &AstArena, _at: Cursor, _node: NodeRef) -> Visit {
        Visit::Continue
    }
}

/// Adapts a pair of closures to [`Visitor`].
pub struct FnVisitor<Pre, Post> {
    pub pre: Pre,
    pub post: Post,
}

impl<Pre, Post> Visitor for FnVisitor<Pre, Post>
where
    Pre: FnMut(&AstArena, Cursor, NodeRef) -> Visit,
    Post: FnMut(&AstArena, Cursor, NodeRef) -> Visit,
{
    fn pre(&mut self, arena: &AstArena, at: Cursor, node: NodeRef) -> Visit {
        (self.pre)(arena, at, node)
    }

    fn post(&mut self, arena: &AstArena, at: Cursor, node: NodeRef) -> Visit {
        (self.post)(arena, at, node)
    }
}

struct Abort;

/// Walks `root` and everything below it in source order.
///
/// Returns `false` if a callback stopped the traversal.
pub fn visit<V: Visitor + ?Sized>(
    arena: &AstArena,
    file: &SourceFile,
    root: NodeRef,
    v: &mut V,
) -> bool {
    walk_node(arena, file, Cursor::ROOT, root, v).is_ok()
}

/// [`visit`] with only a pre-order callback.
pub fn visit_pre<F>(arena: &AstArena, file: &SourceFile, root: NodeRef, pre: F) -> bool
where
    F: FnMut(&AstArena, Cursor, NodeRef) -> Visit,
{
    let mut v = FnVisitor {
        pre,
        post: |_: &AstArena, _: Cursor, _: NodeRef| Visit::Continue,
    };
    visit(arena, file, root, &mut v)
}

fn walk_node<V: Visitor + ?Sized>(
    arena: &AstArena,
    file: &SourceFile,
    at: Cursor,
    node: NodeRef,
    v: &mut V,
) -> Result<(), Abort> {
    match v.pre(arena, at, node) {
        Visit::Continue => {}
        Visit::SkipChildren => return Ok(()),
        Visit::Stop => return Err(Abort),
    }
    for (slot, index, child) in children(arena, file, node) {
        let at = Cursor {
            parent: Some(node),
            slot,
            index,
        };
        walk_node(arena, file, at, child, v)?;
    }
    match v.post(arena, at, node) {
        Visit::Stop => Err(Abort),
        _ => Ok(()),
    }
}

pub type Children = SmallVec<[(Slot, i32, NodeRef); 8]>;

struct Kids<'a> {
    arena: &'a AstArena,
    out: Children,
}

impl Kids<'_> {
    fn one(&mut self, slot: Slot, node: NodeRef) {
        self.out.push((slot, -1, node));
    }

    fn opt<T>(&mut self, slot: Slot, x: Option<T>, f: impl Fn(T) -> NodeRef) {
        if let Some(x) = x {
            self.one(slot, f(x));
        }
    }

    fn many<T: Copy>(&mut self, slot: Slot, items: &[T], f: impl Fn(T) -> NodeRef) {
        for (i, &x) in items.iter().enumerate() {
            self.out.push((slot, i as i32, f(x)));
        }
    }

    fn names(&mut self, slot: Slot, names: ListRef<IdentName>) {
        let arena = self.arena;
        self.many(slot, arena.ident_names(names), NodeRef::Name);
    }

    fn exprs(&mut self, slot: Slot, list: ListRef<ExprId>) {
        let arena = self.arena;
        self.many(slot, arena.exprs_list(list), NodeRef::Expr);
    }

    fn stmts(&mut self, slot: Slot, list: ListRef<StmtId>) {
        let arena = self.arena;
        self.many(slot, arena.stmts_list(list), NodeRef::Stmt);
    }

    fn fields(&mut self, slot: Slot, list: ListRef<FieldId>) {
        let arena = self.arena;
        self.many(slot, arena.fields_list(list), NodeRef::Field);
    }

    fn expr_or_types(&mut self, slot: Slot, list: ListRef<ExprOrType>) {
        let arena = self.arena;
        self.many(slot, arena.expr_or_types(list), |x| match x {
            ExprOrType::Expr(e) => NodeRef::Expr(e),
            ExprOrType::Type(t) => NodeRef::Type(t),
        });
    }

    fn elements(&mut self, slot: Slot, lit: LiteralValue) {
        for (i, id) in lit.elements.ids().enumerate() {
            self.out.push((slot, i as i32, NodeRef::Element(id)));
        }
    }

    fn element_side(&mut self, slot: Slot, side: Element) {
        match side {
            Element::Expr(e) => self.one(slot, NodeRef::Expr(e)),
            Element::Literal(lit) => self.elements(slot, lit),
        }
    }

    fn range_lhs(&mut self, lhs: Option<RangeLhs>) {
        match lhs {
            Some(RangeLhs::Define { names, .. }) => self.names(Slot::Names, names),
            Some(RangeLhs::Assign { exprs, .. }) => self.exprs(Slot::Lhs, exprs),
            None => {}
        }
    }
}

/// Direct children of `node`, in source order.
pub fn children(arena: &AstArena, file: &SourceFile, node: NodeRef) -> Children {
    use NodeRef as N;
    let mut k = Kids {
        arena,
        out: Children::new(),
    };
    match node {
        N::File => {
            k.opt(Slot::Doc, file.doc, N::CommentGroup);
            k.one(Slot::Name, N::Name(file.name));
            k.many(Slot::Decls, arena.top_decls(file.decls), |d| match d {
                TopLevelDecl::Decl(id) => N::Decl(id),
                TopLevelDecl::Func(id) => N::Func(id),
            });
        }
        N::Decl(id) => {
            let decl = arena.decls[id];
            k.opt(Slot::Doc, decl.doc, N::CommentGroup);
            for (i, spec) in decl.specs.ids().enumerate() {
                k.out.push((Slot::Specs, i as i32, N::Spec(spec)));
            }
        }
        N::Spec(id) => match *arena.spec(id) {
            Spec::Import(s) => {
                k.opt(Slot::Doc, s.doc, N::CommentGroup);
                if let Some(ImportName::Name(name)) = s.name {
                    k.one(Slot::Name, N::Name(name));
                }
                k.opt(Slot::Comment, s.comment, N::CommentGroup);
            }
            Spec::Value(s) => {
                k.opt(Slot::Doc, s.doc, N::CommentGroup);
                k.names(Slot::Names, s.names);
                k.opt(Slot::Type, s.typ, N::Type);
                k.exprs(Slot::Values, s.values);
                k.opt(Slot::Comment, s.comment, N::CommentGroup);
            }
            Spec::Type(s) => {
                k.opt(Slot::Doc, s.doc, N::CommentGroup);
                k.one(Slot::Name, N::Name(s.name));
                k.opt(Slot::TypeParams, s.type_params, N::TypeParams);
                k.one(Slot::Type, N::Type(s.typ));
                k.opt(Slot::Comment, s.comment, N::CommentGroup);
            }
        },
        N::Func(id) => {
            let func = arena.funcs[id];
            k.opt(Slot::Doc, func.doc, N::CommentGroup);
            if let Some(recv) = func.recv {
                k.opt(Slot::RecvName, recv.name, N::Name);
                k.one(Slot::Recv, N::Type(recv.typ));
            }
            k.one(Slot::Name, N::Name(func.name));
            k.opt(Slot::TypeParams, func.type_params, N::TypeParams);
            k.one(Slot::Type, N::Signature(func.signature));
            if let Some(body) = func.body {
                k.stmts(Slot::Body, body.stmts);
            }
        }
        N::Signature(id) => {
            let sig = arena.signatures[id];
            k.fields(Slot::Params, sig.params.fields);
            match sig.results {
                Some(Results::Params(list)) => k.fields(Slot::Results, list.fields),
                Some(Results::Type(t)) => k.one(Slot::Results, N::Type(t)),
                None => {}
            }
        }
        N::Field(id) => {
            let field = arena.fields[id];
            k.opt(Slot::Doc, field.doc, N::CommentGroup);
            k.names(Slot::Names, field.names);
            k.one(Slot::Type, N::Type(field.typ));
            k.opt(Slot::Comment, field.comment, N::CommentGroup);
        }
        N::TypeParams(id) => {
            let params = arena.type_params[id];
            k.many(
                Slot::List,
                arena.type_param_decl_ids(params.params),
                N::TypeParamDecl,
            );
        }
        N::TypeParamDecl(id) => {
            let decl = arena.type_param_decls[id];
            k.names(Slot::Names, decl.names);
            k.one(Slot::Constraint, N::Type(decl.constraint));
        }
        N::Stmt(id) => stmt_children(&mut k, arena.stmts[id]),
        N::SimpleStmt(id) => match arena.simple_stmts[id] {
            SimpleStmt::Expr(e) => k.one(Slot::X, N::Expr(e)),
            SimpleStmt::Send { chan, value, .. } => {
                k.one(Slot::Chan, N::Expr(chan));
                k.one(Slot::Value, N::Expr(value));
            }
            SimpleStmt::IncDec { expr, .. } => k.one(Slot::X, N::Expr(expr)),
            SimpleStmt::Assign { lhs, rhs, .. } => {
                k.exprs(Slot::Lhs, lhs);
                k.exprs(Slot::Rhs, rhs);
            }
            SimpleStmt::ShortVarDecl { names, values, .. } => {
                k.names(Slot::Names, names);
                k.exprs(Slot::Rhs, values);
            }
        },
        N::SwitchClause(id) => match arena.switch_clauses[id] {
            SwitchClause::Expr { items, stmts, .. } => {
                k.exprs(Slot::List, items);
                k.stmts(Slot::Body, stmts);
            }
            SwitchClause::Type { items, stmts, .. } => {
                for (i, item) in arena.type_case_elems(items).iter().enumerate() {
                    if let TypeCaseElem::Type(t) = *item {
                        k.out.push((Slot::List, i as i32, N::Type(t)));
                    }
                }
                k.stmts(Slot::Body, stmts);
            }
        },
        N::CommClause(id) => match arena.comm_clauses[id] {
            CommClause::Case { comm, stmts, .. } => {
                match comm {
                    CommStmt::Send { chan, value, .. } => {
                        k.one(Slot::Chan, N::Expr(chan));
                        k.one(Slot::Value, N::Expr(value));
                    }
                    CommStmt::Recv { lhs, expr } => {
                        k.range_lhs(lhs);
                        k.one(Slot::X, N::Expr(expr));
                    }
                }
                k.stmts(Slot::Body, stmts);
            }
            CommClause::Default { stmts, .. } => k.stmts(Slot::Body, stmts),
        },
        N::Expr(id) => expr_children(&mut k, arena.exprs[id]),
        N::Element(id) => {
            let elem = *arena.element(id);
            match elem.key {
                Some(Key::Expr(e)) => k.one(Slot::Key, N::Expr(e)),
                Some(Key::Literal(lit)) => k.elements(Slot::Key, lit),
                None => {}
            }
            k.element_side(Slot::Value, elem.value);
        }
        N::Type(id) => type_children(&mut k, arena.types[id]),
        N::InterfaceElem(id) => match *arena.interface_elem(id) {
            InterfaceElem::Method { name, sig } => {
                k.one(Slot::Name, N::Name(name));
                k.one(Slot::Type, N::Signature(sig));
            }
            InterfaceElem::Embed(t) => k.one(Slot::Type, N::Type(t)),
        },
        N::CommentGroup(id) => {
            let group = arena.comment_groups[id];
            k.many(Slot::List, arena.comment_ids(group.comments), N::Comment);
        }
        N::Comment(_) | N::Name(_) => {}
    }
    k.out
}

fn stmt_children(k: &mut Kids<'_>, stmt: Stmt) {
    use NodeRef as N;
    match stmt {
        Stmt::Empty(_) => {}
        Stmt::Simple(s) => k.one(Slot::Stmt, N::SimpleStmt(s)),
        Stmt::Decl(d) => k.one(Slot::Decl, N::Decl(d)),
        Stmt::Labeled { label, stmt, .. } => {
            k.one(Slot::Label, N::Name(label));
            k.one(Slot::Stmt, N::Stmt(stmt));
        }
        Stmt::Go { call, .. } | Stmt::Defer { call, .. } => k.one(Slot::Call, N::Expr(call)),
        Stmt::Return { results, .. } => k.exprs(Slot::Results, results),
        Stmt::Branch(b) => k.opt(Slot::Label, b.label, N::Name),
        Stmt::Block(b) => k.stmts(Slot::List, b.stmts),
        Stmt::If {
            init,
            cond,
            then_block,
            else_stmt,
            ..
        } => {
            k.opt(Slot::Init, init, N::SimpleStmt);
            k.one(Slot::Cond, N::Expr(cond));
            k.stmts(Slot::Body, then_block.stmts);
            k.opt(Slot::Else, else_stmt, N::Stmt);
        }
        Stmt::For { kind, body, .. } => {
            match kind {
                ForKind::Infinite => {}
                ForKind::Cond(c) => k.one(Slot::Cond, N::Expr(c)),
                ForKind::Clause { init, cond, post } => {
                    k.opt(Slot::Init, init, N::SimpleStmt);
                    k.opt(Slot::Cond, cond, N::Expr);
                    k.opt(Slot::Post, post, N::SimpleStmt);
                }
                ForKind::Range { lhs, expr, .. } => {
                    k.range_lhs(lhs);
                    k.one(Slot::X, N::Expr(expr));
                }
            }
            k.stmts(Slot::Body, body.stmts);
        }
        Stmt::Switch {
            init, tag, clauses, ..
        } => {
            k.opt(Slot::Init, init, N::SimpleStmt);
            k.opt(Slot::Tag, tag, N::Expr);
            let arena = k.arena;
            k.many(Slot::Body, arena.switch_clause_ids(clauses), N::SwitchClause);
        }
        Stmt::TypeSwitch {
            init,
            guard,
            clauses,
            ..
        } => {
            k.opt(Slot::Init, init, N::SimpleStmt);
            k.opt(Slot::Name, guard.bind, N::Name);
            k.one(Slot::X, N::Expr(guard.expr));
            let arena = k.arena;
            k.many(Slot::Body, arena.switch_clause_ids(clauses), N::SwitchClause);
        }
        Stmt::Select { clauses, .. } => {
            let arena = k.arena;
            k.many(Slot::Body, arena.comm_clause_ids(clauses), N::CommClause);
        }
    }
}

fn expr_children(k: &mut Kids<'_>, expr: Expr) {
    use NodeRef as N;
    match expr {
        Expr::Ident(_) | Expr::BasicLit(_) => {}
        Expr::FuncLit { sig, body, .. } => {
            k.one(Slot::Type, N::Signature(sig));
            k.stmts(Slot::Body, body.stmts);
        }
        Expr::CompositeLit { typ, lit } => {
            k.one(Slot::Type, N::Type(typ));
            k.elements(Slot::Elts, lit);
        }
        Expr::Index { expr, args, .. } => {
            k.one(Slot::X, N::Expr(expr));
            k.expr_or_types(Slot::Index, args);
        }
        Expr::Paren { expr, .. } => k.one(Slot::X, N::Expr(expr)),
        Expr::Selector { expr, sel, .. } => {
            k.one(Slot::X, N::Expr(expr));
            k.one(Slot::Sel, N::Name(sel));
        }
        Expr::Slice {
            expr, lo, hi, max, ..
        } => {
            k.one(Slot::X, N::Expr(expr));
            k.opt(Slot::Low, lo, N::Expr);
            k.opt(Slot::High, hi, N::Expr);
            k.opt(Slot::Max, max, N::Expr);
        }
        Expr::TypeAssert { expr, typ, .. } => {
            k.one(Slot::X, N::Expr(expr));
            k.opt(Slot::Type, typ, N::Type);
        }
        Expr::Call { callee, args, .. } => {
            k.one(
                Slot::Fun,
                match callee {
                    CallCallee::Expr(e) => N::Expr(e),
                    CallCallee::Type(t) => N::Type(t),
                },
            );
            k.expr_or_types(Slot::Args, args);
        }
        Expr::Unary { expr, .. } => k.one(Slot::X, N::Expr(expr)),
        Expr::Binary { left, right, .. } => {
            k.one(Slot::X, N::Expr(left));
            k.one(Slot::Y, N::Expr(right));
        }
    }
}

fn type_children(k: &mut Kids<'_>, typ: Type) {
    use NodeRef as N;
    match typ {
        Type::Named {
            pkg, name, args, ..
        } => {
            k.opt(Slot::Pkg, pkg, N::Name);
            k.one(Slot::Name, N::Name(name));
            let arena = k.arena;
            k.many(Slot::Args, arena.types_list(args), N::Type);
        }
        Type::Pointer { elem, .. } | Type::Slice { elem, .. } | Type::Chan { elem, .. } => {
            k.one(Slot::Elt, N::Type(elem))
        }
        Type::Array { len, elem, .. } => {
            if let ArrayLen::Expr(e) = len {
                k.one(Slot::Len, N::Expr(e));
            }
            k.one(Slot::Elt, N::Type(elem));
        }
        Type::Map { key, value, .. } => {
            k.one(Slot::Key, N::Type(key));
            k.one(Slot::Value, N::Type(value));
        }
        Type::Struct { fields, .. } => k.fields(Slot::Fields, fields.fields),
        Type::Interface { elems, .. } => {
            for (i, id) in elems.ids().enumerate() {
                k.out.push((Slot::Methods, i as i32, N::InterfaceElem(id)));
            }
        }
        Type::Func { sig, .. } => k.one(Slot::Type, N::Signature(sig)),
        Type::Paren { typ, .. } => k.one(Slot::X, N::Type(typ)),
        Type::Union { terms } => {
            let arena = k.arena;
            k.many(Slot::Terms, arena.type_terms(terms), |t| N::Type(t.typ));
        }
    }
}

// =============================================================================
// Replacement
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StructuralError {
    #[error("{parent} has no field {slot}")]
    NoSuchField { parent: &'static str, slot: Slot },
    #[error("{parent}.{slot} is absent")]
    EmptySlot { parent: &'static str, slot: Slot },
    #[error("{parent}.{slot} is not a list")]
    NotAList { parent: &'static str, slot: Slot },
    #[error("{parent}.{slot} is a list and needs an index")]
    NeedsIndex { parent: &'static str, slot: Slot },
    #[error("index {index} out of range for {parent}.{slot}")]
    IndexOutOfRange {
        parent: &'static str,
        slot: Slot,
        index: i32,
    },
    #[error("cannot store {found} in {parent}.{slot}")]
    KindMismatch {
        parent: &'static str,
        slot: Slot,
        found: &'static str,
    },
}

enum Fail {
    NoSuchField,
    Empty,
    NotAList,
    NeedsIndex,
    OutOfRange,
}

/// Mutable view of one child position.
enum SlotMut<'a> {
    Expr(&'a mut ExprId),
    Type(&'a mut TypeId),
    Stmt(&'a mut StmtId),
    Simple(&'a mut SimpleStmtId),
    Decl(&'a mut DeclId),
    TopDecl(&'a mut TopLevelDecl),
    Spec(&'a mut Spec),
    Signature(&'a mut SignatureId),
    Field(&'a mut FieldId),
    TypeParams(&'a mut TypeParamsId),
    TypeParamDecl(&'a mut TypeParamDeclId),
    SwitchClause(&'a mut SwitchClauseId),
    CommClause(&'a mut CommClauseId),
    Element(&'a mut KeyedElement),
    InterfaceElem(&'a mut InterfaceElem),
    CommentGroup(&'a mut CommentGroupId),
    Comment(&'a mut CommentId),
    Name(&'a mut IdentName),
    ExprOrType(&'a mut ExprOrType),
    Callee(&'a mut CallCallee),
    TypeCase(&'a mut TypeCaseElem),
}

fn one<T>(index: i32, x: &mut T) -> Result<&mut T, Fail> {
    if index < 0 {
        Ok(x)
    } else {
        Err(Fail::NotAList)
    }
}

fn opt<T>(index: i32, x: &mut Option<T>) -> Result<&mut T, Fail> {
    if index >= 0 {
        return Err(Fail::NotAList);
    }
    x.as_mut().ok_or(Fail::Empty)
}

fn nth<T>(index: i32, list: &mut [T]) -> Result<&mut T, Fail> {
    if index < 0 {
        return Err(Fail::NeedsIndex);
    }
    list.get_mut(index as usize).ok_or(Fail::OutOfRange)
}

/// Replaces the child of `parent` at `(slot, index)` with `new`.
///
/// Element-valued slots (specs, composite-literal elements, interface
/// elements) receive a copy of the element `new` refers to.
pub fn replace_field(
    arena: &mut AstArena,
    file: &mut SourceFile,
    parent: NodeRef,
    slot: Slot,
    index: i32,
    new: NodeRef,
) -> Result<(), StructuralError> {
    let kind = parent.kind();
    // element-valued payloads must be read before the slot borrow
    let spec = match new {
        NodeRef::Spec(id) => Some(*arena.spec(id)),
        _ => None,
    };
    let element = match new {
        NodeRef::Element(id) => Some(*arena.element(id)),
        _ => None,
    };
    let iface = match new {
        NodeRef::InterfaceElem(id) => Some(*arena.interface_elem(id)),
        _ => None,
    };

    let target = slot_mut(arena, file, parent, slot, index).map_err(|f| match f {
        Fail::NoSuchField => StructuralError::NoSuchField { parent: kind, slot },
        Fail::Empty => StructuralError::EmptySlot { parent: kind, slot },
        Fail::NotAList => StructuralError::NotAList { parent: kind, slot },
        Fail::NeedsIndex => StructuralError::NeedsIndex { parent: kind, slot },
        Fail::OutOfRange => StructuralError::IndexOutOfRange {
            parent: kind,
            slot,
            index,
        },
    })?;

    use NodeRef as N;
    match (target, new) {
        (SlotMut::Expr(t), N::Expr(id)) => *t = id,
        (SlotMut::Type(t), N::Type(id)) => *t = id,
        (SlotMut::Stmt(t), N::Stmt(id)) => *t = id,
        (SlotMut::Simple(t), N::SimpleStmt(id)) => *t = id,
        (SlotMut::Decl(t), N::Decl(id)) => *t = id,
        (SlotMut::TopDecl(t), N::Decl(id)) => *t = TopLevelDecl::Decl(id),
        (SlotMut::TopDecl(t), N::Func(id)) => *t = TopLevelDecl::Func(id),
        (SlotMut::Signature(t), N::Signature(id)) => *t = id,
        (SlotMut::Field(t), N::Field(id)) => *t = id,
        (SlotMut::TypeParams(t), N::TypeParams(id)) => *t = id,
        (SlotMut::TypeParamDecl(t), N::TypeParamDecl(id)) => *t = id,
        (SlotMut::SwitchClause(t), N::SwitchClause(id)) => *t = id,
        (SlotMut::CommClause(t), N::CommClause(id)) => *t = id,
        (SlotMut::CommentGroup(t), N::CommentGroup(id)) => *t = id,
        (SlotMut::Comment(t), N::Comment(id)) => *t = id,
        (SlotMut::Name(t), N::Name(name)) => *t = name,
        (SlotMut::ExprOrType(t), N::Expr(id)) => *t = ExprOrType::Expr(id),
        (SlotMut::ExprOrType(t), N::Type(id)) => *t = ExprOrType::Type(id),
        (SlotMut::Callee(t), N::Expr(id)) => *t = CallCallee::Expr(id),
        (SlotMut::Callee(t), N::Type(id)) => *t = CallCallee::Type(id),
        (SlotMut::TypeCase(t), N::Type(id)) => *t = TypeCaseElem::Type(id),
        (SlotMut::Spec(t), N::Spec(_)) => *t = spec.unwrap_or(*t),
        (SlotMut::Element(t), N::Element(_)) => *t = element.unwrap_or(*t),
        (SlotMut::InterfaceElem(t), N::InterfaceElem(_)) => *t = iface.unwrap_or(*t),
        _ => {
            return Err(StructuralError::KindMismatch {
                parent: kind,
                slot,
                found: new.kind(),
            })
        }
    }
    Ok(())
}

fn slot_mut<'a>(
    arena: &'a mut AstArena,
    file: &'a mut SourceFile,
    parent: NodeRef,
    slot: Slot,
    index: i32,
) -> Result<SlotMut<'a>, Fail> {
    use NodeRef as N;
    match parent {
        N::File => match slot {
            Slot::Doc => opt(index, &mut file.doc).map(SlotMut::CommentGroup),
            Slot::Name => one(index, &mut file.name).map(SlotMut::Name),
            Slot::Decls => nth(index, arena.top_decls_mut(file.decls)).map(SlotMut::TopDecl),
            _ => Err(Fail::NoSuchField),
        },
        N::Decl(id) => {
            let specs = arena.decls[id].specs;
            match slot {
                Slot::Doc => opt(index, &mut arena.decls[id].doc).map(SlotMut::CommentGroup),
                Slot::Specs => nth(index, arena.specs_list_mut(specs)).map(SlotMut::Spec),
                _ => Err(Fail::NoSuchField),
            }
        }
        N::Spec(id) => spec_slot(arena, id, slot, index),
        N::Func(id) => {
            let body = arena.funcs[id].body;
            if slot == Slot::Body {
                let body = body.ok_or(Fail::Empty)?;
                return nth(index, arena.stmts_list_mut(body.stmts)).map(SlotMut::Stmt);
            }
            let func = &mut arena.funcs[id];
            match slot {
                Slot::Doc => opt(index, &mut func.doc).map(SlotMut::CommentGroup),
                Slot::RecvName => {
                    let recv = func.recv.as_mut().ok_or(Fail::Empty)?;
                    opt(index, &mut recv.name).map(SlotMut::Name)
                }
                Slot::Recv => {
                    let recv = func.recv.as_mut().ok_or(Fail::Empty)?;
                    one(index, &mut recv.typ).map(SlotMut::Type)
                }
                Slot::Name => one(index, &mut func.name).map(SlotMut::Name),
                Slot::TypeParams => opt(index, &mut func.type_params).map(SlotMut::TypeParams),
                Slot::Type => one(index, &mut func.signature).map(SlotMut::Signature),
                _ => Err(Fail::NoSuchField),
            }
        }
        N::Signature(id) => {
            let sig = arena.signatures[id];
            match (slot, sig.results) {
                (Slot::Params, _) => {
                    nth(index, arena.fields_list_mut(sig.params.fields)).map(SlotMut::Field)
                }
                (Slot::Results, Some(Results::Params(list))) => {
                    nth(index, arena.fields_list_mut(list.fields)).map(SlotMut::Field)
                }
                (Slot::Results, Some(Results::Type(_))) => {
                    match &mut arena.signatures[id].results {
                        Some(Results::Type(t)) => one(index, t).map(SlotMut::Type),
                        _ => Err(Fail::Empty),
                    }
                }
                (Slot::Results, None) => Err(Fail::Empty),
                _ => Err(Fail::NoSuchField),
            }
        }
        N::Field(id) => {
            let names = arena.fields[id].names;
            if slot == Slot::Names {
                return nth(index, arena.ident_names_mut(names)).map(SlotMut::Name);
            }
            let field = &mut arena.fields[id];
            match slot {
                Slot::Doc => opt(index, &mut field.doc).map(SlotMut::CommentGroup),
                Slot::Type => one(index, &mut field.typ).map(SlotMut::Type),
                Slot::Comment => opt(index, &mut field.comment).map(SlotMut::CommentGroup),
                _ => Err(Fail::NoSuchField),
            }
        }
        N::TypeParams(id) => {
            let params = arena.type_params[id].params;
            match slot {
                Slot::List => {
                    nth(index, arena.type_param_decl_ids_mut(params)).map(SlotMut::TypeParamDecl)
                }
                _ => Err(Fail::NoSuchField),
            }
        }
        N::TypeParamDecl(id) => {
            let names = arena.type_param_decls[id].names;
            match slot {
                Slot::Names => nth(index, arena.ident_names_mut(names)).map(SlotMut::Name),
                Slot::Constraint => {
                    one(index, &mut arena.type_param_decls[id].constraint).map(SlotMut::Type)
                }
                _ => Err(Fail::NoSuchField),
            }
        }
        N::Stmt(id) => stmt_slot(arena, id, slot, index),
        N::SimpleStmt(id) => simple_slot(arena, id, slot, index),
        N::SwitchClause(id) => {
            let (items, stmts) = match arena.switch_clauses[id] {
                SwitchClause::Expr { items, stmts, .. } => (Ok(items), stmts),
                SwitchClause::Type { items, stmts, .. } => (Err(items), stmts),
            };
            match (slot, items) {
                (Slot::List, Ok(items)) => {
                    nth(index, arena.exprs_list_mut(items)).map(SlotMut::Expr)
                }
                (Slot::List, Err(items)) => {
                    nth(index, arena.type_case_elems_mut(items)).map(SlotMut::TypeCase)
                }
                (Slot::Body, _) => nth(index, arena.stmts_list_mut(stmts)).map(SlotMut::Stmt),
                _ => Err(Fail::NoSuchField),
            }
        }
        N::CommClause(id) => comm_slot(arena, id, slot, index),
        N::Expr(id) => expr_slot(arena, id, slot, index),
        N::Element(id) => {
            let elem = *arena.element(id);
            match (slot, elem.key, elem.value) {
                (Slot::Key, Some(Key::Literal(lit)), _)
                | (Slot::Value, _, Element::Literal(lit)) => {
                    nth(index, arena.keyed_elems_list_mut(lit.elements)).map(SlotMut::Element)
                }
                (Slot::Key, None, _) => Err(Fail::Empty),
                (Slot::Key, Some(Key::Expr(_)), _) => match &mut arena.element_mut(id).key {
                    Some(Key::Expr(e)) => one(index, e).map(SlotMut::Expr),
                    _ => Err(Fail::Empty),
                },
                (Slot::Value, _, Element::Expr(_)) => match &mut arena.element_mut(id).value {
                    Element::Expr(e) => one(index, e).map(SlotMut::Expr),
                    Element::Literal(_) => Err(Fail::Empty),
                },
                _ => Err(Fail::NoSuchField),
            }
        }
        N::Type(id) => type_slot(arena, id, slot, index),
        N::InterfaceElem(id) => match (slot, arena.interface_elem_mut(id)) {
            (Slot::Name, InterfaceElem::Method { name, .. }) => one(index, name).map(SlotMut::Name),
            (Slot::Type, InterfaceElem::Method { sig, .. }) => {
                one(index, sig).map(SlotMut::Signature)
            }
            (Slot::Type, InterfaceElem::Embed(t)) => one(index, t).map(SlotMut::Type),
            _ => Err(Fail::NoSuchField),
        },
        N::CommentGroup(id) => {
            let comments = arena.comment_groups[id].comments;
            match slot {
                Slot::List => nth(index, arena.comment_ids_mut(comments)).map(SlotMut::Comment),
                _ => Err(Fail::NoSuchField),
            }
        }
        N::Comment(_) | N::Name(_) => Err(Fail::NoSuchField),
    }
}

fn spec_slot(
    arena: &mut AstArena,
    id: SpecId,
    slot: Slot,
    index: i32,
) -> Result<SlotMut<'_>, Fail> {
    match (*arena.spec(id), slot) {
        (Spec::Value(s), Slot::Names) => {
            return nth(index, arena.ident_names_mut(s.names)).map(SlotMut::Name)
        }
        (Spec::Value(s), Slot::Values) => {
            return nth(index, arena.exprs_list_mut(s.values)).map(SlotMut::Expr)
        }
        _ => {}
    }
    match (arena.spec_mut(id), slot) {
        (Spec::Import(s), Slot::Doc) => opt(index, &mut s.doc).map(SlotMut::CommentGroup),
        (Spec::Import(s), Slot::Comment) => opt(index, &mut s.comment).map(SlotMut::CommentGroup),
        (Spec::Import(s), Slot::Name) => match &mut s.name {
            Some(ImportName::Name(name)) => one(index, name).map(SlotMut::Name),
            _ => Err(Fail::Empty),
        },
        (Spec::Value(s), Slot::Doc) => opt(index, &mut s.doc).map(SlotMut::CommentGroup),
        (Spec::Value(s), Slot::Type) => opt(index, &mut s.typ).map(SlotMut::Type),
        (Spec::Value(s), Slot::Comment) => opt(index, &mut s.comment).map(SlotMut::CommentGroup),
        (Spec::Type(s), Slot::Doc) => opt(index, &mut s.doc).map(SlotMut::CommentGroup),
        (Spec::Type(s), Slot::Name) => one(index, &mut s.name).map(SlotMut::Name),
        (Spec::Type(s), Slot::TypeParams) => {
            opt(index, &mut s.type_params).map(SlotMut::TypeParams)
        }
        (Spec::Type(s), Slot::Type) => one(index, &mut s.typ).map(SlotMut::Type),
        (Spec::Type(s), Slot::Comment) => opt(index, &mut s.comment).map(SlotMut::CommentGroup),
        _ => Err(Fail::NoSuchField),
    }
}

fn stmt_slot(
    arena: &mut AstArena,
    id: StmtId,
    slot: Slot,
    index: i32,
) -> Result<SlotMut<'_>, Fail> {
    // list-valued fields live in the extras buffers
    let node = arena.stmts[id];
    let stmts = match (node, slot) {
        (Stmt::Block(b), Slot::List) => Some(b.stmts),
        (Stmt::If { then_block: b, .. }, Slot::Body) | (Stmt::For { body: b, .. }, Slot::Body) => {
            Some(b.stmts)
        }
        _ => None,
    };
    if let Some(list) = stmts {
        return nth(index, arena.stmts_list_mut(list)).map(SlotMut::Stmt);
    }
    match (node, slot) {
        (Stmt::Return { results, .. }, Slot::Results) => {
            return nth(index, arena.exprs_list_mut(results)).map(SlotMut::Expr)
        }
        (Stmt::Switch { clauses, .. }, Slot::Body)
        | (Stmt::TypeSwitch { clauses, .. }, Slot::Body) => {
            return nth(index, arena.switch_clause_ids_mut(clauses)).map(SlotMut::SwitchClause)
        }
        (Stmt::Select { clauses, .. }, Slot::Body) => {
            return nth(index, arena.comm_clause_ids_mut(clauses)).map(SlotMut::CommClause)
        }
        (
            Stmt::For {
                kind:
                    ForKind::Range {
                        lhs: Some(RangeLhs::Define { names, .. }),
                        ..
                    },
                ..
            },
            Slot::Names,
        ) => return nth(index, arena.ident_names_mut(names)).map(SlotMut::Name),
        (
            Stmt::For {
                kind:
                    ForKind::Range {
                        lhs: Some(RangeLhs::Assign { exprs, .. }),
                        ..
                    },
                ..
            },
            Slot::Lhs,
        ) => return nth(index, arena.exprs_list_mut(exprs)).map(SlotMut::Expr),
        _ => {}
    }

    match (&mut arena.stmts[id], slot) {
        (Stmt::Simple(s), Slot::Stmt) => one(index, s).map(SlotMut::Simple),
        (Stmt::Decl(d), Slot::Decl) => one(index, d).map(SlotMut::Decl),
        (Stmt::Labeled { label, .. }, Slot::Label) => one(index, label).map(SlotMut::Name),
        (Stmt::Labeled { stmt, .. }, Slot::Stmt) => one(index, stmt).map(SlotMut::Stmt),
        (Stmt::Go { call, .. }, Slot::Call) | (Stmt::Defer { call, .. }, Slot::Call) => {
            one(index, call).map(SlotMut::Expr)
        }
        (Stmt::Branch(b), Slot::Label) => opt(index, &mut b.label).map(SlotMut::Name),
        (Stmt::If { init, .. }, Slot::Init)
        | (Stmt::Switch { init, .. }, Slot::Init)
        | (Stmt::TypeSwitch { init, .. }, Slot::Init) => opt(index, init).map(SlotMut::Simple),
        (Stmt::If { cond, .. }, Slot::Cond) => one(index, cond).map(SlotMut::Expr),
        (Stmt::If { else_stmt, .. }, Slot::Else) => opt(index, else_stmt).map(SlotMut::Stmt),
        (Stmt::Switch { tag, .. }, Slot::Tag) => opt(index, tag).map(SlotMut::Expr),
        (Stmt::TypeSwitch { guard, .. }, Slot::Name) => {
            opt(index, &mut guard.bind).map(SlotMut::Name)
        }
        (Stmt::TypeSwitch { guard, .. }, Slot::X) => one(index, &mut guard.expr).map(SlotMut::Expr),
        (Stmt::For { kind, .. }, slot) => match (kind, slot) {
            (ForKind::Cond(c), Slot::Cond) => one(index, c).map(SlotMut::Expr),
            (ForKind::Clause { init, .. }, Slot::Init) => opt(index, init).map(SlotMut::Simple),
            (ForKind::Clause { cond, .. }, Slot::Cond) => opt(index, cond).map(SlotMut::Expr),
            (ForKind::Clause { post, .. }, Slot::Post) => opt(index, post).map(SlotMut::Simple),
            (ForKind::Range { expr, .. }, Slot::X) => one(index, expr).map(SlotMut::Expr),
            _ => Err(Fail::NoSuchField),
        },
        _ => Err(Fail::NoSuchField),
    }
}

fn simple_slot(
    arena: &mut AstArena,
    id: SimpleStmtId,
    slot: Slot,
    index: i32,
) -> Result<SlotMut<'_>, Fail> {
    match (arena.simple_stmts[id], slot) {
        (SimpleStmt::Assign { lhs, .. }, Slot::Lhs) => {
            return nth(index, arena.exprs_list_mut(lhs)).map(SlotMut::Expr)
        }
        (SimpleStmt::Assign { rhs, .. }, Slot::Rhs)
        | (SimpleStmt::ShortVarDecl { values: rhs, .. }, Slot::Rhs) => {
            return nth(index, arena.exprs_list_mut(rhs)).map(SlotMut::Expr)
        }
        (SimpleStmt::ShortVarDecl { names, .. }, Slot::Names) => {
            return nth(index, arena.ident_names_mut(names)).map(SlotMut::Name)
        }
        _ => {}
    }
    match (&mut arena.simple_stmts[id], slot) {
        (SimpleStmt::Expr(e), Slot::X) | (SimpleStmt::IncDec { expr: e, .. }, Slot::X) => {
            one(index, e).map(SlotMut::Expr)
        }
        (SimpleStmt::Send { chan, .. }, Slot::Chan) => one(index, chan).map(SlotMut::Expr),
        (SimpleStmt::Send { value, .. }, Slot::Value) => one(index, value).map(SlotMut::Expr),
        _ => Err(Fail::NoSuchField),
    }
}

fn comm_slot(
    arena: &mut AstArena,
    id: CommClauseId,
    slot: Slot,
    index: i32,
) -> Result<SlotMut<'_>, Fail> {
    match (arena.comm_clauses[id], slot) {
        (CommClause::Case { stmts, .. }, Slot::Body)
        | (CommClause::Default { stmts, .. }, Slot::Body) => {
            return nth(index, arena.stmts_list_mut(stmts)).map(SlotMut::Stmt)
        }
        (
            CommClause::Case {
                comm:
                    CommStmt::Recv {
                        lhs: Some(RangeLhs::Define { names, .. }),
                        ..
                    },
                ..
            },
            Slot::Names,
        ) => return nth(index, arena.ident_names_mut(names)).map(SlotMut::Name),
        (
            CommClause::Case {
                comm:
                    CommStmt::Recv {
                        lhs: Some(RangeLhs::Assign { exprs, .. }),
                        ..
                    },
                ..
            },
            Slot::Lhs,
        ) => return nth(index, arena.exprs_list_mut(exprs)).map(SlotMut::Expr),
        _ => {}
    }
    match (&mut arena.comm_clauses[id], slot) {
        (CommClause::Case { comm, .. }, slot) => match (comm, slot) {
            (CommStmt::Send { chan, .. }, Slot::Chan) => one(index, chan).map(SlotMut::Expr),
            (CommStmt::Send { value, .. }, Slot::Value) => one(index, value).map(SlotMut::Expr),
            (CommStmt::Recv { expr, .. }, Slot::X) => one(index, expr).map(SlotMut::Expr),
            _ => Err(Fail::NoSuchField),
        },
        _ => Err(Fail::NoSuchField),
    }
}

fn expr_slot(
    arena: &mut AstArena,
    id: ExprId,
    slot: Slot,
    index: i32,
) -> Result<SlotMut<'_>, Fail> {
    match (arena.exprs[id], slot) {
        (Expr::FuncLit { body, .. }, Slot::Body) => {
            return nth(index, arena.stmts_list_mut(body.stmts)).map(SlotMut::Stmt)
        }
        (Expr::CompositeLit { lit, .. }, Slot::Elts) => {
            return nth(index, arena.keyed_elems_list_mut(lit.elements)).map(SlotMut::Element)
        }
        (Expr::Index { args, .. }, Slot::Index) | (Expr::Call { args, .. }, Slot::Args) => {
            return nth(index, arena.expr_or_types_mut(args)).map(SlotMut::ExprOrType)
        }
        _ => {}
    }
    match (&mut arena.exprs[id], slot) {
        (Expr::FuncLit { sig, .. }, Slot::Type) => one(index, sig).map(SlotMut::Signature),
        (Expr::CompositeLit { typ, .. }, Slot::Type) => one(index, typ).map(SlotMut::Type),
        (Expr::Index { expr, .. }, Slot::X)
        | (Expr::Paren { expr, .. }, Slot::X)
        | (Expr::Selector { expr, .. }, Slot::X)
        | (Expr::Slice { expr, .. }, Slot::X)
        | (Expr::TypeAssert { expr, .. }, Slot::X)
        | (Expr::Unary { expr, .. }, Slot::X)
        | (Expr::Binary { left: expr, .. }, Slot::X) => one(index, expr).map(SlotMut::Expr),
        (Expr::Binary { right, .. }, Slot::Y) => one(index, right).map(SlotMut::Expr),
        (Expr::Selector { sel, .. }, Slot::Sel) => one(index, sel).map(SlotMut::Name),
        (Expr::Slice { lo, .. }, Slot::Low) => opt(index, lo).map(SlotMut::Expr),
        (Expr::Slice { hi, .. }, Slot::High) => opt(index, hi).map(SlotMut::Expr),
        (Expr::Slice { max, .. }, Slot::Max) => opt(index, max).map(SlotMut::Expr),
        (Expr::TypeAssert { typ, .. }, Slot::Type) => opt(index, typ).map(SlotMut::Type),
        (Expr::Call { callee, .. }, Slot::Fun) => one(index, callee).map(SlotMut::Callee),
        _ => Err(Fail::NoSuchField),
    }
}

fn type_slot(
    arena: &mut AstArena,
    id: TypeId,
    slot: Slot,
    index: i32,
) -> Result<SlotMut<'_>, Fail> {
    match (arena.types[id], slot) {
        (Type::Named { args, .. }, Slot::Args) => {
            return nth(index, arena.types_list_mut(args)).map(SlotMut::Type)
        }
        (Type::Struct { fields, .. }, Slot::Fields) => {
            return nth(index, arena.fields_list_mut(fields.fields)).map(SlotMut::Field)
        }
        (Type::Interface { elems, .. }, Slot::Methods) => {
            return nth(index, arena.interface_elems_mut(elems)).map(SlotMut::InterfaceElem)
        }
        (Type::Union { terms }, Slot::Terms) => {
            return nth(index, arena.type_terms_mut(terms)).map(|t| SlotMut::Type(&mut t.typ))
        }
        _ => {}
    }
    match (&mut arena.types[id], slot) {
        (Type::Named { pkg, .. }, Slot::Pkg) => opt(index, pkg).map(SlotMut::Name),
        (Type::Named { name, .. }, Slot::Name) => one(index, name).map(SlotMut::Name),
        (Type::Pointer { elem, .. }, Slot::Elt)
        | (Type::Slice { elem, .. }, Slot::Elt)
        | (Type::Chan { elem, .. }, Slot::Elt)
        | (Type::Array { elem, .. }, Slot::Elt) => one(index, elem).map(SlotMut::Type),
        (Type::Array { len, .. }, Slot::Len) => match len {
            ArrayLen::Expr(e) => one(index, e).map(SlotMut::Expr),
            ArrayLen::Ellipsis(_) => Err(Fail::Empty),
        },
        (Type::Map { key, .. }, Slot::Key) => one(index, key).map(SlotMut::Type),
        (Type::Map { value, .. }, Slot::Value) => one(index, value).map(SlotMut::Type),
        (Type::Func { sig, .. }, Slot::Type) => one(index, sig).map(SlotMut::Signature),
        (Type::Paren { typ, .. }, Slot::X) => one(index, typ).map(SlotMut::Type),
        _ => Err(Fail::NoSuchField),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_file;

    const SRC: &str = r#"package p

// T doc
type T struct {
	a, b int // trailing
}

func (t *T) M(x int) (int, error) {
	if y := x + 1; y > 0 {
		return y, nil
	} else {
		for i := range t.a {
			_ = i
		}
	}
	switch v := any(x).(type) {
	case int, nil:
		_ = v
	}
	s := []T{{a: 1}, {b: 2}}
	return len(s), nil
}
"#;

    fn all_nodes(pf: &ParsedFile) -> Vec<(Cursor, NodeRef)> {
        let mut out = Vec::new();
        visit_pre(&pf.arena, &pf.file, NodeRef::File, |_, at, node| {
            out.push((at, node));
            Visit::Continue
        });
        out
    }

    #[test]
    fn visits_in_source_order() {
        let pf = parse_file(SRC, "p.go").unwrap();
        let names: Vec<&str> = all_nodes(&pf)
            .into_iter()
            .filter_map(|(_, n)| match n {
                NodeRef::Name(name) => Some(pf.text(name.sym)),
                _ => None,
            })
            .collect();
        assert_eq!(&names[..5], &["p", "T", "a", "b", "int"]);
        assert!(names.contains(&"M"));
    }

    #[test]
    fn every_cursor_is_replaceable_by_its_own_node() {
        let mut pf = parse_file(SRC, "p.go").unwrap();
        for (at, node) in all_nodes(&pf) {
            let Some(parent) = at.parent else { continue };
            replace_field(&mut pf.arena, &mut pf.file, parent, at.slot, at.index, node)
                .unwrap_or_else(|e| panic!("{parent:?}.{}[{}]: {e}", at.slot, at.index));
        }
    }

    #[test]
    fn skip_children_and_stop() {
        let pf = parse_file(SRC, "p.go").unwrap();
        let mut funcs_entered = 0;
        let completed = visit_pre(&pf.arena, &pf.file, NodeRef::File, |_, _, node| match node {
            NodeRef::Func(_) => {
                funcs_entered += 1;
                Visit::SkipChildren
            }
            NodeRef::Stmt(_) => Visit::Stop,
            _ => Visit::Continue,
        });
        assert!(completed);
        assert_eq!(funcs_entered, 1);

        let mut seen = 0;
        let completed = visit_pre(&pf.arena, &pf.file, NodeRef::File, |_, _, node| {
            seen += 1;
            if matches!(node, NodeRef::Stmt(_)) {
                Visit::Stop
            } else {
                Visit::Continue
            }
        });
        assert!(!completed);
        assert!(seen < all_nodes(&pf).len());
    }

    #[test]
    fn post_stop_aborts() {
        let pf = parse_file(SRC, "p.go").unwrap();
        let mut posts = 0;
        let mut v = FnVisitor {
            pre: |_: &AstArena, _: Cursor, _: NodeRef| Visit::Continue,
            post: |_: &AstArena, _: Cursor, _: NodeRef| {
                posts += 1;
                Visit::Stop
            },
        };
        assert!(!visit(&pf.arena, &pf.file, NodeRef::File, &mut v));
        assert_eq!(posts, 1);
    }

    #[test]
    fn replace_errors() {
        let mut pf = parse_file(SRC, "p.go").unwrap();
        let TopLevelDecl::Decl(decl) = pf.arena.top_decls(pf.file.decls)[0] else {
            panic!("expected type decl");
        };
        let spec = NodeRef::Spec(pf.arena.decls[decl].specs.id(0));
        let Spec::Type(ts) = *pf.arena.spec(pf.arena.decls[decl].specs.id(0)) else {
            panic!("expected type spec");
        };
        let (arena, file) = (&mut pf.arena, &mut pf.file);

        let err = replace_field(arena, file, spec, Slot::Body, -1, NodeRef::Type(ts.typ));
        assert!(matches!(err, Err(StructuralError::NoSuchField { .. })));

        let err = replace_field(arena, file, spec, Slot::Type, 0, NodeRef::Type(ts.typ));
        assert!(matches!(err, Err(StructuralError::NotAList { .. })));

        let err = replace_field(arena, file, NodeRef::File, Slot::Decls, 99, NodeRef::Decl(decl));
        assert!(matches!(err, Err(StructuralError::IndexOutOfRange { index: 99, .. })));

        let err = replace_field(arena, file, spec, Slot::Type, -1, NodeRef::Decl(decl));
        assert!(matches!(err, Err(StructuralError::KindMismatch { found: "GenDecl", .. })));
    }

    #[test]
    fn replace_swaps_expression() {
        let mut pf = parse_file("package p\nvar x = a + b\n", "p.go").unwrap();
        let mut plus = None;
        visit_pre(&pf.arena, &pf.file, NodeRef::File, |a, _, node| {
            if let NodeRef::Expr(id) = node {
                if matches!(a.exprs[id], Expr::Binary { .. }) {
                    plus = Some(id);
                }
            }
            Visit::Continue
        });
        let plus = plus.unwrap();
        let Expr::Binary { right, .. } = pf.arena.exprs[plus] else {
            unreachable!()
        };
        replace_field(
            &mut pf.arena,
            &mut pf.file,
            NodeRef::Expr(plus),
            Slot::X,
            -1,
            NodeRef::Expr(right),
        )
        .unwrap();
        let Expr::Binary { left, right, .. } = pf.arena.exprs[plus] else {
            unreachable!()
        };
        assert_eq!(left, right);
    }
}
