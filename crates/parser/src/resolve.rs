//! Scope-aware name binding.
//!
//! Binds every identifier use to the declaration it denotes, keyed by the
//! position of the declaring identifier. Only syntax is consulted: package
//! scope first, then function and block scopes in Go's visibility order.
//! Identifiers naming imported packages, predeclared names, struct fields,
//! selectors and labels stay unbound.

use std::collections::HashMap;

use crate::ast::*;

/// Identity of a declaration: the start offset of its defining identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclKey(pub u32);

impl DeclKey {
    #[inline]
    pub const fn of(name: &IdentName) -> Self {
        DeclKey(name.pos.start)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    Type,
    Func,
    Var,
    Const,
    /// Anything declared inside a function, including its parameters.
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Binding {
    pub key: DeclKey,
    pub kind: BindingKind,
}

impl Binding {
    #[inline]
    pub const fn is_package_level(&self) -> bool {
        !matches!(self.kind, BindingKind::Local)
    }
}

/// Result of [`resolve`]: identifier position to binding.
///
/// Defining occurrences are recorded too, bound to themselves.
#[derive(Debug, Default)]
pub struct Bindings {
    by_pos: HashMap<u32, Binding>,
}

impl Bindings {
    /// Binding of the identifier occurrence starting at `pos`.
    #[inline]
    pub fn lookup(&self, pos: Span) -> Option<Binding> {
        if pos.is_none() {
            return None;
        }
        self.by_pos.get(&pos.start).copied()
    }

    #[inline]
    pub fn is_resolved(&self, pos: Span) -> bool {
        self.lookup(pos).is_some()
    }

    pub fn len(&self) -> usize {
        self.by_pos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_pos.is_empty()
    }
}

/// Binds a parsed file. Positions must be the parser's own.
pub fn resolve(arena: &AstArena, interner: &Interner, file: &SourceFile) -> Bindings {
    let mut r = Resolver {
        arena,
        blank: interner.get("_"),
        scopes: vec![HashMap::new()],
        out: Bindings::default(),
    };
    r.package(file);
    r.out
}

type Scope = HashMap<Symbol, Binding>;

struct Resolver<'a> {
    arena: &'a AstArena,
    blank: Option<Symbol>,
    scopes: Vec<Scope>,
    out: Bindings,
}

impl<'a> Resolver<'a> {
    fn push(&mut self) {
        self.scopes.push(Scope::new());
    }

    fn pop(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: IdentName, kind: BindingKind) {
        if Some(name.sym) == self.blank || name.pos.is_none() {
            return;
        }
        let binding = Binding {
            key: DeclKey::of(&name),
            kind,
        };
        self.out.by_pos.insert(name.pos.start, binding);
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.sym, binding);
        }
    }

    fn declare_list(&mut self, names: ListRef<IdentName>, kind: BindingKind) {
        for &name in self.arena.ident_names(names) {
            self.declare(name, kind);
        }
    }

    fn use_name(&mut self, name: IdentName) {
        if name.pos.is_none() {
            return;
        }
        let found = self
            .scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(&name.sym).copied());
        if let Some(binding) = found {
            self.out.by_pos.insert(name.pos.start, binding);
        }
    }

    fn package(&mut self, file: &SourceFile) {
        let decls = self.arena.top_decls(file.decls);
        for decl in decls {
            match *decl {
                TopLevelDecl::Decl(id) => {
                    let decl = self.arena.decls[id];
                    for spec in self.arena.specs_list(decl.specs) {
                        match spec {
                            Spec::Import(_) => {}
                            Spec::Type(s) => self.declare(s.name, BindingKind::Type),
                            Spec::Value(s) => {
                                let kind = match decl.kind {
                                    GenDeclKind::Const => BindingKind::Const,
                                    _ => BindingKind::Var,
                                };
                                self.declare_list(s.names, kind);
                            }
                        }
                    }
                }
                TopLevelDecl::Func(id) => {
                    let func = self.arena.funcs[id];
                    if func.recv.is_none() {
                        self.declare(func.name, BindingKind::Func);
                    }
                }
            }
        }

        for decl in decls {
            match *decl {
                TopLevelDecl::Decl(id) => {
                    for spec in self.arena.specs_list(self.arena.decls[id].specs) {
                        match spec {
                            Spec::Import(_) => {}
                            Spec::Type(s) => self.type_spec(s),
                            Spec::Value(s) => self.value_exprs(s),
                        }
                    }
                }
                TopLevelDecl::Func(id) => self.func(id),
            }
        }
    }

    fn type_spec(&mut self, s: &TypeSpec) {
        self.push();
        if let Some(tp) = s.type_params {
            self.type_params(tp);
        }
        self.typ(s.typ);
        self.pop();
    }

    fn value_exprs(&mut self, s: &ValueSpec) {
        if let Some(t) = s.typ {
            self.typ(t);
        }
        self.expr_list(s.values);
    }

    fn type_params(&mut self, id: TypeParamsId) {
        let tp = self.arena.type_params[id];
        for &decl in self.arena.type_param_decl_ids(tp.params) {
            let decl = self.arena.type_param_decls[decl];
            self.declare_list(decl.names, BindingKind::Local);
        }
        for &decl in self.arena.type_param_decl_ids(tp.params) {
            self.typ(self.arena.type_param_decls[decl].constraint);
        }
    }

    fn func(&mut self, id: FuncDeclId) {
        let func = self.arena.funcs[id];
        self.push();
        if let Some(recv) = func.recv {
            self.receiver_type_params(recv.typ);
            self.typ(recv.typ);
        }
        if let Some(tp) = func.type_params {
            self.type_params(tp);
        }
        self.signature_types(func.signature);
        if let Some(name) = func.recv.and_then(|r| r.name) {
            self.declare(name, BindingKind::Local);
        }
        self.signature_names(func.signature);
        if let Some(body) = func.body {
            self.stmt_list(body.stmts);
        }
        self.pop();
    }

    /// `func (l *List[T]) ...` declares `T`.
    fn receiver_type_params(&mut self, typ: TypeId) {
        let base = match self.arena.types[typ] {
            Type::Pointer { elem, .. } => elem,
            Type::Paren { typ, .. } => return self.receiver_type_params(typ),
            _ => typ,
        };
        if let Type::Named { args, .. } = self.arena.types[base] {
            for &arg in self.arena.types_list(args) {
                if let Type::Named {
                    pkg: None, name, ..
                } = self.arena.types[arg]
                {
                    self.declare(name, BindingKind::Local);
                }
            }
        }
    }

    fn field_list_types(&mut self, list: &FieldList) {
        for &f in self.arena.fields_list(list.fields) {
            self.typ(self.arena.fields[f].typ);
        }
    }

    fn field_list_names(&mut self, list: &FieldList) {
        for &f in self.arena.fields_list(list.fields) {
            self.declare_list(self.arena.fields[f].names, BindingKind::Local);
        }
    }

    fn signature_types(&mut self, id: SignatureId) {
        let sig = self.arena.signatures[id];
        self.field_list_types(&sig.params);
        match sig.results {
            Some(Results::Params(list)) => self.field_list_types(&list),
            Some(Results::Type(t)) => self.typ(t),
            None => {}
        }
    }

    fn signature_names(&mut self, id: SignatureId) {
        let sig = self.arena.signatures[id];
        self.field_list_names(&sig.params);
        if let Some(Results::Params(list)) = sig.results {
            self.field_list_names(&list);
        }
    }

    fn local_decl(&mut self, id: DeclId) {
        let decl = self.arena.decls[id];
        for spec in self.arena.specs_list(decl.specs) {
            match spec {
                Spec::Import(_) => {}
                Spec::Type(s) => {
                    self.declare(s.name, BindingKind::Local);
                    self.type_spec(s);
                }
                Spec::Value(s) => {
                    self.value_exprs(s);
                    self.declare_list(s.names, BindingKind::Local);
                }
            }
        }
    }

    fn block(&mut self, block: &Block) {
        self.push();
        self.stmt_list(block.stmts);
        self.pop();
    }

    fn stmt_list(&mut self, list: ListRef<StmtId>) {
        for &s in self.arena.stmts_list(list) {
            self.stmt(s);
        }
    }

    fn stmt(&mut self, id: StmtId) {
        match self.arena.stmts[id] {
            Stmt::Empty(_) | Stmt::Branch(_) => {}
            Stmt::Simple(s) => self.simple(s),
            Stmt::Decl(d) => self.local_decl(d),
            Stmt::Labeled { stmt, .. } => self.stmt(stmt),
            Stmt::Go { call, .. } | Stmt::Defer { call, .. } => self.expr(call),
            Stmt::Return { results, .. } => self.expr_list(results),
            Stmt::Block(b) => self.block(&b),
            Stmt::If {
                init,
                cond,
                then_block,
                else_stmt,
                ..
            } => {
                self.push();
                if let Some(init) = init {
                    self.simple(init);
                }
                self.expr(cond);
                self.block(&then_block);
                if let Some(els) = else_stmt {
                    self.stmt(els);
                }
                self.pop();
            }
            Stmt::For { kind, body, .. } => {
                self.push();
                match kind {
                    ForKind::Infinite => {}
                    ForKind::Cond(c) => self.expr(c),
                    ForKind::Clause { init, cond, post } => {
                        if let Some(init) = init {
                            self.simple(init);
                        }
                        if let Some(cond) = cond {
                            self.expr(cond);
                        }
                        if let Some(post) = post {
                            self.simple(post);
                        }
                    }
                    ForKind::Range { lhs, expr, .. } => {
                        self.expr(expr);
                        self.range_lhs(lhs);
                    }
                }
                self.block(&body);
                self.pop();
            }
            Stmt::Switch {
                init, tag, clauses, ..
            } => {
                self.push();
                if let Some(init) = init {
                    self.simple(init);
                }
                if let Some(tag) = tag {
                    self.expr(tag);
                }
                self.switch_clauses(clauses, None);
                self.pop();
            }
            Stmt::TypeSwitch {
                init,
                guard,
                clauses,
                ..
            } => {
                self.push();
                if let Some(init) = init {
                    self.simple(init);
                }
                self.expr(guard.expr);
                self.switch_clauses(clauses, guard.bind);
                self.pop();
            }
            Stmt::Select { clauses, .. } => {
                for &c in self.arena.comm_clause_ids(clauses) {
                    self.push();
                    match self.arena.comm_clauses[c] {
                        CommClause::Case { comm, stmts, .. } => {
                            match comm {
                                CommStmt::Send { chan, value, .. } => {
                                    self.expr(chan);
                                    self.expr(value);
                                }
                                CommStmt::Recv { lhs, expr } => {
                                    self.expr(expr);
                                    self.range_lhs(lhs);
                                }
                            }
                            self.stmt_list(stmts);
                        }
                        CommClause::Default { stmts, .. } => self.stmt_list(stmts),
                    }
                    self.pop();
                }
            }
        }
    }

    fn range_lhs(&mut self, lhs: Option<RangeLhs>) {
        match lhs {
            Some(RangeLhs::Define { names, .. }) => self.define(names),
            Some(RangeLhs::Assign { exprs, .. }) => self.expr_list(exprs),
            None => {}
        }
    }

    /// `:=` redeclares names already in the innermost scope.
    fn define(&mut self, names: ListRef<IdentName>) {
        for &name in self.arena.ident_names(names) {
            let existing = self
                .scopes
                .last()
                .and_then(|scope| scope.get(&name.sym).copied());
            match existing {
                Some(binding) if !name.pos.is_none() => {
                    self.out.by_pos.insert(name.pos.start, binding);
                }
                _ => self.declare(name, BindingKind::Local),
            }
        }
    }

    fn switch_clauses(&mut self, clauses: ListRef<SwitchClauseId>, bind: Option<IdentName>) {
        for &c in self.arena.switch_clause_ids(clauses) {
            self.push();
            match self.arena.switch_clauses[c] {
                SwitchClause::Expr { items, stmts, .. } => {
                    self.expr_list(items);
                    self.stmt_list(stmts);
                }
                SwitchClause::Type { items, stmts, .. } => {
                    for item in self.arena.type_case_elems(items) {
                        if let TypeCaseElem::Type(t) = *item {
                            self.typ(t);
                        }
                    }
                    if let Some(bind) = bind {
                        self.declare(bind, BindingKind::Local);
                    }
                    self.stmt_list(stmts);
                }
            }
            self.pop();
        }
    }

    fn simple(&mut self, id: SimpleStmtId) {
        match self.arena.simple_stmts[id] {
            SimpleStmt::Expr(e) => self.expr(e),
            SimpleStmt::Send { chan, value, .. } => {
                self.expr(chan);
                self.expr(value);
            }
            SimpleStmt::IncDec { expr, .. } => self.expr(expr),
            SimpleStmt::Assign { lhs, rhs, .. } => {
                self.expr_list(lhs);
                self.expr_list(rhs);
            }
            SimpleStmt::ShortVarDecl { names, values, .. } => {
                self.expr_list(values);
                self.define(names);
            }
        }
    }

    fn expr_list(&mut self, list: ListRef<ExprId>) {
        for &e in self.arena.exprs_list(list) {
            self.expr(e);
        }
    }

    fn expr_or_types(&mut self, list: ListRef<ExprOrType>) {
        for item in self.arena.expr_or_types(list) {
            match *item {
                ExprOrType::Expr(e) => self.expr(e),
                ExprOrType::Type(t) => self.typ(t),
            }
        }
    }

    fn literal(&mut self, lit: &LiteralValue) {
        for elem in self.arena.keyed_elems_list(lit.elements) {
            match elem.key {
                Some(Key::Expr(e)) => self.expr(e),
                Some(Key::Literal(l)) => self.literal(&l),
                None => {}
            }
            match elem.value {
                Element::Expr(e) => self.expr(e),
                Element::Literal(l) => self.literal(&l),
            }
        }
    }

    fn expr(&mut self, id: ExprId) {
        match self.arena.exprs[id] {
            Expr::Ident(name) => self.use_name(name),
            Expr::BasicLit(_) => {}
            Expr::FuncLit { sig, body, .. } => {
                self.push();
                self.signature_types(sig);
                self.signature_names(sig);
                self.stmt_list(body.stmts);
                self.pop();
            }
            Expr::CompositeLit { typ, lit } => {
                self.typ(typ);
                self.literal(&lit);
            }
            Expr::Index { expr, args, .. } => {
                self.expr(expr);
                self.expr_or_types(args);
            }
            Expr::Paren { expr, .. }
            | Expr::Selector { expr, .. }
            | Expr::Unary { expr, .. } => self.expr(expr),
            Expr::Slice {
                expr, lo, hi, max, ..
            } => {
                self.expr(expr);
                for e in [lo, hi, max].into_iter().flatten() {
                    self.expr(e);
                }
            }
            Expr::TypeAssert { expr, typ, .. } => {
                self.expr(expr);
                if let Some(t) = typ {
                    self.typ(t);
                }
            }
            Expr::Call { callee, args, .. } => {
                match callee {
                    CallCallee::Expr(e) => self.expr(e),
                    CallCallee::Type(t) => self.typ(t),
                }
                self.expr_or_types(args);
            }
            Expr::Binary { left, right, .. } => {
                self.expr(left);
                self.expr(right);
            }
        }
    }

    fn typ(&mut self, id: TypeId) {
        match self.arena.types[id] {
            Type::Named {
                pkg, name, args, ..
            } => {
                if pkg.is_none() {
                    self.use_name(name);
                }
                for &t in self.arena.types_list(args) {
                    self.typ(t);
                }
            }
            Type::Pointer { elem, .. }
            | Type::Slice { elem, .. }
            | Type::Chan { elem, .. } => self.typ(elem),
            Type::Array { len, elem, .. } => {
                if let ArrayLen::Expr(e) = len {
                    self.expr(e);
                }
                self.typ(elem);
            }
            Type::Map { key, value, .. } => {
                self.typ(key);
                self.typ(value);
            }
            Type::Struct { fields, .. } => self.field_list_types(&fields),
            Type::Interface { elems, .. } => {
                for elem in self.arena.interface_elems(elems) {
                    match *elem {
                        InterfaceElem::Method { sig, .. } => self.signature_types(sig),
                        InterfaceElem::Embed(t) => self.typ(t),
                    }
                }
            }
            Type::Func { sig, .. } => self.signature_types(sig),
            Type::Paren { typ, .. } => self.typ(typ),
            Type::Union { terms } => {
                for term in self.arena.type_terms(terms) {
                    self.typ(term.typ);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_file;

    /// Byte offset of the `nth` occurrence of `needle` as a whole word.
    fn at(src: &str, needle: &str, nth: usize) -> Span {
        let mut found = src.match_indices(needle).filter(|(i, _)| {
            let before = src[..*i].chars().next_back();
            let after = src[i + needle.len()..].chars().next();
            let word = |c: Option<char>| c.is_some_and(|c| c.is_alphanumeric() || c == '_');
            !word(before) && !word(after)
        });
        let (i, _) = found.nth(nth).unwrap();
        Span::new(i, i + needle.len())
    }

    fn bind(src: &str) -> Bindings {
        let pf = parse_file(src, "t.go").unwrap();
        resolve(&pf.arena, &pf.interner, &pf.file)
    }

    #[test]
    fn package_names_resolve_regardless_of_order() {
        let src = "package p\nfunc f() T { return g() }\nfunc g() T { var t T; return t }\ntype T int\n";
        let b = bind(src);
        let def = at(src, "T", 3);
        assert_eq!(b.lookup(def).unwrap().kind, BindingKind::Type);
        for i in 0..3 {
            assert_eq!(b.lookup(at(src, "T", i)).unwrap().key, DeclKey(def.start));
        }
        let g = b.lookup(at(src, "g", 0)).unwrap();
        assert_eq!(g.kind, BindingKind::Func);
        assert_eq!(g.key, DeclKey(at(src, "g", 1).start));
    }

    #[test]
    fn locals_shadow_package_names() {
        let src = "package p\ntype T int\nfunc f(T string) { _ = T }\nfunc g() { type T struct{}; var x T; _ = x }\n";
        let b = bind(src);
        let param = b.lookup(at(src, "T", 2)).unwrap();
        assert_eq!(param.kind, BindingKind::Local);
        assert_eq!(param.key, DeclKey(at(src, "T", 1).start));
        let local = b.lookup(at(src, "T", 4)).unwrap();
        assert_eq!(local.key, DeclKey(at(src, "T", 3).start));
    }

    #[test]
    fn locals_are_visible_after_their_declaration() {
        let src = "package p\nvar x int\nfunc f() { y := x; x := y; _ = x }\n";
        let b = bind(src);
        assert_eq!(b.lookup(at(src, "x", 1)).unwrap().kind, BindingKind::Var);
        let local = b.lookup(at(src, "x", 3)).unwrap();
        assert_eq!(local.key, DeclKey(at(src, "x", 2).start));
    }

    #[test]
    fn selectors_fields_and_packages_stay_unbound() {
        let src = "package p\nimport \"os\"\ntype T struct{ ID int }\nfunc f(t T) { t.ID = 1; _ = os.Args; _ = T{ID: 2} }\n";
        let b = bind(src);
        assert!(!b.is_resolved(at(src, "ID", 1)));
        assert!(!b.is_resolved(at(src, "ID", 2)));
        assert!(!b.is_resolved(at(src, "os", 1)));
        assert!(b.is_resolved(at(src, "T", 2)));
    }

    #[test]
    fn methods_are_not_package_names() {
        let src = "package p\ntype T int\nfunc (T) M() {}\nfunc f() { M() }\n";
        let b = bind(src);
        assert!(!b.is_resolved(at(src, "M", 1)));
        assert!(b.is_resolved(at(src, "T", 1)));
    }

    #[test]
    fn type_switch_binding_and_range_vars() {
        let src = "package p\nfunc f(v any, xs []int) { switch w := v.(type) { case int: _ = w }; for i, x := range xs { _ = i + x } }\n";
        let b = bind(src);
        let w = b.lookup(at(src, "w", 1)).unwrap();
        assert_eq!(w.key, DeclKey(at(src, "w", 0).start));
        let x = b.lookup(at(src, "x", 1)).unwrap();
        assert_eq!(x.key, DeclKey(at(src, "x", 0).start));
        let xs = b.lookup(at(src, "xs", 1)).unwrap();
        assert_eq!(xs.key, DeclKey(at(src, "xs", 0).start));
    }

    #[test]
    fn generic_receiver_declares_its_parameters() {
        let src = "package p\ntype List[T any] []T\nfunc (l List[T]) First() T { return l[0] }\n";
        let b = bind(src);
        let ret = b.lookup(at(src, "T", 3)).unwrap();
        assert_eq!(ret.kind, BindingKind::Local);
        assert_eq!(ret.key, DeclKey(at(src, "T", 2).start));
    }
}
