//! Position passes over a whole tree.
//!
//! Specialized output is assembled from declarations picked out of several
//! places, plus synthesized nodes that never had a position. Before printing,
//! positions are either cleared (the printer then chooses a canonical layout)
//! or reassigned as one increasing synthetic stream.

use crate::ast::*;

/// Resets every position in a node to [`Span::NONE`].
///
/// Derived for AST types by `#[derive(ClearSpans)]`. `Option<Span>` fields
/// keep their `Some`: presence of an optional token is syntax, not layout.
pub trait ClearSpans {
    fn clear_spans(&mut self);
}

impl ClearSpans for Span {
    #[inline]
    fn clear_spans(&mut self) {
        *self = Span::NONE;
    }
}

impl<T: ClearSpans> ClearSpans for Option<T> {
    #[inline]
    fn clear_spans(&mut self) {
        if let Some(x) = self {
            x.clear_spans();
        }
    }
}

impl<T> ClearSpans for Id<T> {
    #[inline]
    fn clear_spans(&mut self) {}
}

impl<T> ClearSpans for ListRef<T> {
    #[inline]
    fn clear_spans(&mut self) {}
}

macro_rules! no_spans {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ClearSpans for $ty {
                #[inline]
                fn clear_spans(&mut self) {}
            }
        )*
    };
}

no_spans! {
    Symbol,
    bool,
    CommentKind,
    GenDeclKind,
    BasicLitKind,
    ChanDir,
    BranchKind,
    UnaryOp,
    BinaryOp,
    AssignOp,
    IncDecOp,
}

fn sweep<T: ClearSpans>(arena: &mut SpannedArena<T>) {
    for node in arena.nodes_mut() {
        node.clear_spans();
    }
    arena.clear_spans();
}

fn sweep_buf<T: ClearSpans>(buf: &mut [T]) {
    for x in buf {
        x.clear_spans();
    }
}

/// Zeroes every position in the arena and the file.
///
/// A declaration group keeps its parentheses only when it holds more than one
/// spec. Running this twice is the same as running it once.
pub fn clear_positions(arena: &mut AstArena, file: &mut SourceFile) {
    file.clear_spans();

    sweep(&mut arena.decls);
    sweep(&mut arena.stmts);
    sweep(&mut arena.simple_stmts);
    sweep(&mut arena.exprs);
    sweep(&mut arena.types);
    sweep(&mut arena.signatures);
    sweep(&mut arena.funcs);
    sweep(&mut arena.fields);
    sweep(&mut arena.switch_clauses);
    sweep(&mut arena.comm_clauses);
    sweep(&mut arena.type_params);
    sweep(&mut arena.type_param_decls);
    sweep(&mut arena.comments);
    sweep(&mut arena.comment_groups);

    let extras = &mut arena.extras;
    sweep_buf(&mut extras.ident_names);
    sweep_buf(&mut extras.specs);
    sweep_buf(&mut extras.keyed_elems);
    sweep_buf(&mut extras.type_case_elems);
    sweep_buf(&mut extras.type_terms);
    sweep_buf(&mut extras.interface_elems);

    for decl in arena.decls.nodes_mut() {
        let grouped = decl.specs.len() > 1;
        decl.l_paren = grouped.then_some(Span::NONE);
        decl.r_paren = grouped.then_some(Span::NONE);
    }
}

/// Lays the file out as one synthetic token stream.
///
/// Each token gets `[pos, pos + len)` and the next one starts a byte later,
/// so offsets strictly increase in source order and every position is valid.
/// Node spans cover their first through last token.
pub fn assign_positions(arena: &mut AstArena, interner: &Interner, file: &mut SourceFile) {
    let mut p = Positioner {
        arena,
        interner,
        pos: 1,
        last_end: 1,
    };
    p.file(file);
}

struct Positioner<'a> {
    arena: &'a mut AstArena,
    interner: &'a Interner,
    pos: u32,
    last_end: u32,
}

impl Positioner<'_> {
    fn tok(&mut self, len: usize) -> Span {
        let span = Span {
            start: self.pos,
            end: self.pos + len as u32,
        };
        self.last_end = span.end;
        self.pos = span.end + 1;
        span
    }

    fn kw(&mut self, text: &str) -> Span {
        self.tok(text.len())
    }

    fn since(&self, start: u32) -> Span {
        Span {
            start,
            end: self.last_end.max(start),
        }
    }

    fn name(&mut self, name: &mut IdentName) {
        name.pos = self.tok(self.interner.resolve(name.sym).len());
    }

    fn names(&mut self, list: ListRef<IdentName>) {
        for i in 0..list.len() as usize {
            if i > 0 {
                self.kw(",");
            }
            let mut name = self.arena.ident_names(list)[i];
            self.name(&mut name);
            self.arena.ident_names_mut(list)[i] = name;
        }
    }

    fn doc(&mut self, doc: Option<CommentGroupId>) {
        let Some(id) = doc else { return };
        let start = self.pos;
        let comments = self.arena.comment_groups[id].comments;
        for i in 0..comments.len() as usize {
            let c = self.arena.comment_ids(comments)[i];
            let len = self.interner.resolve(self.arena.comments[c].text).len();
            let span = self.tok(len);
            self.arena.comments.set_span(c, span);
        }
        let span = self.since(start);
        self.arena.comment_groups.set_span(id, span);
    }

    fn string(&mut self, lit: &mut StringLit) {
        lit.pos = self.tok(self.interner.resolve(lit.value).len());
    }

    fn file(&mut self, file: &mut SourceFile) {
        self.doc(file.doc);
        file.package_pos = self.kw("package");
        self.name(&mut file.name);
        self.kw(";");
        for i in 0..file.decls.len() as usize {
            match self.arena.top_decls(file.decls)[i] {
                TopLevelDecl::Decl(id) => self.gen_decl(id),
                TopLevelDecl::Func(id) => self.func(id),
            }
            self.kw(";");
        }
    }

    fn gen_decl(&mut self, id: DeclId) {
        let start = self.pos;
        let mut decl = self.arena.decls[id];
        self.doc(decl.doc);
        decl.kw_pos = self.kw(decl.kind.keyword());
        let grouped = decl.l_paren.is_some() || decl.specs.len() > 1;
        if grouped {
            decl.l_paren = Some(self.kw("("));
        }
        for spec in decl.specs.ids() {
            self.spec(spec);
            if grouped {
                self.kw(";");
            }
        }
        if grouped {
            decl.r_paren = Some(self.kw(")"));
        }
        self.arena.decls[id] = decl;
        let span = self.since(start);
        self.arena.decls.set_span(id, span);
    }

    fn spec(&mut self, id: SpecId) {
        let mut spec = *self.arena.spec(id);
        match &mut spec {
            Spec::Import(s) => {
                self.doc(s.doc);
                match &mut s.name {
                    Some(ImportName::Dot(pos)) => *pos = self.kw("."),
                    Some(ImportName::Blank(pos)) => *pos = self.kw("_"),
                    Some(ImportName::Name(name)) => self.name(name),
                    None => {}
                }
                self.string(&mut s.path);
                self.doc(s.comment);
            }
            Spec::Value(s) => {
                self.doc(s.doc);
                self.names(s.names);
                if let Some(t) = s.typ {
                    self.typ(t);
                }
                if !s.values.is_empty() {
                    s.assign_pos = Some(self.kw("="));
                    self.expr_list(s.values);
                }
                self.doc(s.comment);
            }
            Spec::Type(s) => {
                self.doc(s.doc);
                self.name(&mut s.name);
                if let Some(tp) = s.type_params {
                    self.type_params(tp);
                }
                if s.assign_pos.is_some() {
                    s.assign_pos = Some(self.kw("="));
                }
                self.typ(s.typ);
                self.doc(s.comment);
            }
        }
        *self.arena.spec_mut(id) = spec;
    }

    fn func(&mut self, id: FuncDeclId) {
        let start = self.pos;
        let mut func = self.arena.funcs[id];
        self.doc(func.doc);
        func.func_pos = self.kw("func");
        if let Some(recv) = &mut func.recv {
            recv.l_paren = self.kw("(");
            if let Some(name) = &mut recv.name {
                self.name(name);
            }
            self.typ(recv.typ);
            recv.r_paren = self.kw(")");
        }
        self.name(&mut func.name);
        if let Some(tp) = func.type_params {
            self.type_params(tp);
        }
        self.signature(func.signature);
        if let Some(body) = &mut func.body {
            self.block(body);
        }
        self.arena.funcs[id] = func;
        let span = self.since(start);
        self.arena.funcs.set_span(id, span);
    }

    fn type_params(&mut self, id: TypeParamsId) {
        let start = self.pos;
        let mut tp = self.arena.type_params[id];
        tp.l_brack = self.kw("[");
        for i in 0..tp.params.len() as usize {
            if i > 0 {
                self.kw(",");
            }
            let decl_id = self.arena.type_param_decl_ids(tp.params)[i];
            let decl_start = self.pos;
            let decl = self.arena.type_param_decls[decl_id];
            self.names(decl.names);
            self.typ(decl.constraint);
            let span = self.since(decl_start);
            self.arena.type_param_decls.set_span(decl_id, span);
        }
        tp.r_brack = self.kw("]");
        self.arena.type_params[id] = tp;
        let span = self.since(start);
        self.arena.type_params.set_span(id, span);
    }

    fn signature(&mut self, id: SignatureId) {
        let start = self.pos;
        let mut sig = self.arena.signatures[id];
        self.field_list(&mut sig.params, "(", ")", ",");
        match &mut sig.results {
            Some(Results::Params(list)) => self.field_list(list, "(", ")", ","),
            Some(Results::Type(t)) => self.typ(*t),
            None => {}
        }
        self.arena.signatures[id] = sig;
        let span = self.since(start);
        self.arena.signatures.set_span(id, span);
    }

    fn field_list(&mut self, list: &mut FieldList, open: &str, close: &str, sep: &str) {
        list.open = self.kw(open);
        for i in 0..list.fields.len() as usize {
            if i > 0 {
                self.kw(sep);
            }
            let id = self.arena.fields_list(list.fields)[i];
            self.field(id);
        }
        list.close = self.kw(close);
    }

    fn field(&mut self, id: FieldId) {
        let start = self.pos;
        let mut field = self.arena.fields[id];
        self.doc(field.doc);
        self.names(field.names);
        if field.ellipsis_pos.is_some() {
            field.ellipsis_pos = Some(self.kw("..."));
        }
        self.typ(field.typ);
        if let Some(tag) = &mut field.tag {
            self.string(tag);
        }
        self.doc(field.comment);
        self.arena.fields[id] = field;
        let span = self.since(start);
        self.arena.fields.set_span(id, span);
    }

    fn block(&mut self, block: &mut Block) {
        block.l_brace = self.kw("{");
        self.stmt_list(block.stmts);
        block.r_brace = self.kw("}");
    }

    fn stmt_list(&mut self, list: ListRef<StmtId>) {
        for i in 0..list.len() as usize {
            let id = self.arena.stmts_list(list)[i];
            self.stmt(id);
            self.kw(";");
        }
    }

    fn expr_list(&mut self, list: ListRef<ExprId>) {
        for i in 0..list.len() as usize {
            if i > 0 {
                self.kw(",");
            }
            let id = self.arena.exprs_list(list)[i];
            self.expr(id);
        }
    }

    fn range_lhs(&mut self, lhs: &mut Option<RangeLhs>) {
        match lhs {
            Some(RangeLhs::Define { names, op_pos }) => {
                self.names(*names);
                *op_pos = self.kw(":=");
            }
            Some(RangeLhs::Assign { exprs, op_pos }) => {
                self.expr_list(*exprs);
                *op_pos = self.kw("=");
            }
            None => {}
        }
    }

    fn stmt(&mut self, id: StmtId) {
        let start = self.pos;
        let mut stmt = self.arena.stmts[id];
        match &mut stmt {
            Stmt::Empty(span) => *span = self.tok(0),
            Stmt::Simple(s) => self.simple(*s),
            Stmt::Decl(d) => self.gen_decl(*d),
            Stmt::Labeled {
                label,
                colon_pos,
                stmt,
            } => {
                self.name(label);
                *colon_pos = self.kw(":");
                self.stmt(*stmt);
            }
            Stmt::Go { go_pos, call } => {
                *go_pos = self.kw("go");
                self.expr(*call);
            }
            Stmt::Defer { defer_pos, call } => {
                *defer_pos = self.kw("defer");
                self.expr(*call);
            }
            Stmt::Return {
                return_pos,
                results,
            } => {
                *return_pos = self.kw("return");
                self.expr_list(*results);
            }
            Stmt::Branch(b) => {
                b.pos = self.kw(b.kind.keyword());
                if let Some(label) = &mut b.label {
                    self.name(label);
                }
            }
            Stmt::Block(b) => self.block(b),
            Stmt::If {
                if_pos,
                init,
                cond,
                then_block,
                else_stmt,
            } => {
                *if_pos = self.kw("if");
                if let Some(init) = init {
                    self.simple(*init);
                    self.kw(";");
                }
                self.expr(*cond);
                self.block(then_block);
                if let Some(els) = else_stmt {
                    self.kw("else");
                    self.stmt(*els);
                }
            }
            Stmt::For {
                for_pos,
                kind,
                body,
            } => {
                *for_pos = self.kw("for");
                match kind {
                    ForKind::Infinite => {}
                    ForKind::Cond(c) => self.expr(*c),
                    ForKind::Clause { init, cond, post } => {
                        if let Some(init) = init {
                            self.simple(*init);
                        }
                        self.kw(";");
                        if let Some(cond) = cond {
                            self.expr(*cond);
                        }
                        self.kw(";");
                        if let Some(post) = post {
                            self.simple(*post);
                        }
                    }
                    ForKind::Range {
                        lhs,
                        range_pos,
                        expr,
                    } => {
                        self.range_lhs(lhs);
                        *range_pos = self.kw("range");
                        self.expr(*expr);
                    }
                }
                self.block(body);
            }
            Stmt::Switch {
                switch_pos,
                init,
                tag,
                l_brace,
                clauses,
                r_brace,
            } => {
                *switch_pos = self.kw("switch");
                if let Some(init) = init {
                    self.simple(*init);
                    self.kw(";");
                }
                if let Some(tag) = tag {
                    self.expr(*tag);
                }
                *l_brace = self.kw("{");
                self.switch_clauses(*clauses);
                *r_brace = self.kw("}");
            }
            Stmt::TypeSwitch {
                switch_pos,
                init,
                guard,
                l_brace,
                clauses,
                r_brace,
            } => {
                *switch_pos = self.kw("switch");
                if let Some(init) = init {
                    self.simple(*init);
                    self.kw(";");
                }
                if let Some(bind) = &mut guard.bind {
                    self.name(bind);
                    guard.define_pos = Some(self.kw(":="));
                }
                self.expr(guard.expr);
                guard.dot_pos = self.kw(".");
                guard.l_paren = self.kw("(");
                self.kw("type");
                guard.r_paren = self.kw(")");
                *l_brace = self.kw("{");
                self.switch_clauses(*clauses);
                *r_brace = self.kw("}");
            }
            Stmt::Select {
                select_pos,
                l_brace,
                clauses,
                r_brace,
            } => {
                *select_pos = self.kw("select");
                *l_brace = self.kw("{");
                for i in 0..clauses.len() as usize {
                    let c = self.arena.comm_clause_ids(*clauses)[i];
                    self.comm_clause(c);
                }
                *r_brace = self.kw("}");
            }
        }
        self.arena.stmts[id] = stmt;
        let span = self.since(start);
        self.arena.stmts.set_span(id, span);
    }

    fn switch_clauses(&mut self, clauses: ListRef<SwitchClauseId>) {
        for i in 0..clauses.len() as usize {
            let id = self.arena.switch_clause_ids(clauses)[i];
            let start = self.pos;
            let mut clause = self.arena.switch_clauses[id];
            match &mut clause {
                SwitchClause::Expr {
                    case_pos,
                    items,
                    colon_pos,
                    stmts,
                } => {
                    *case_pos = self.kw(if items.is_empty() { "default" } else { "case" });
                    self.expr_list(*items);
                    *colon_pos = self.kw(":");
                    self.stmt_list(*stmts);
                }
                SwitchClause::Type {
                    case_pos,
                    items,
                    colon_pos,
                    stmts,
                } => {
                    *case_pos = self.kw(if items.is_empty() { "default" } else { "case" });
                    for j in 0..items.len() as usize {
                        if j > 0 {
                            self.kw(",");
                        }
                        let mut item = self.arena.type_case_elems(*items)[j];
                        match &mut item {
                            TypeCaseElem::Type(t) => self.typ(*t),
                            TypeCaseElem::Nil(pos) => *pos = self.kw("nil"),
                        }
                        self.arena.type_case_elems_mut(*items)[j] = item;
                    }
                    *colon_pos = self.kw(":");
                    self.stmt_list(*stmts);
                }
            }
            self.arena.switch_clauses[id] = clause;
            let span = self.since(start);
            self.arena.switch_clauses.set_span(id, span);
        }
    }

    fn comm_clause(&mut self, id: CommClauseId) {
        let start = self.pos;
        let mut clause = self.arena.comm_clauses[id];
        match &mut clause {
            CommClause::Case {
                case_pos,
                comm,
                colon_pos,
                stmts,
            } => {
                *case_pos = self.kw("case");
                match comm {
                    CommStmt::Send {
                        chan,
                        arrow_pos,
                        value,
                    } => {
                        self.expr(*chan);
                        *arrow_pos = self.kw("<-");
                        self.expr(*value);
                    }
                    CommStmt::Recv { lhs, expr } => {
                        self.range_lhs(lhs);
                        self.expr(*expr);
                    }
                }
                *colon_pos = self.kw(":");
                self.stmt_list(*stmts);
            }
            CommClause::Default {
                default_pos,
                colon_pos,
                stmts,
            } => {
                *default_pos = self.kw("default");
                *colon_pos = self.kw(":");
                self.stmt_list(*stmts);
            }
        }
        self.arena.comm_clauses[id] = clause;
        let span = self.since(start);
        self.arena.comm_clauses.set_span(id, span);
    }

    fn simple(&mut self, id: SimpleStmtId) {
        let start = self.pos;
        let mut stmt = self.arena.simple_stmts[id];
        match &mut stmt {
            SimpleStmt::Expr(e) => self.expr(*e),
            SimpleStmt::Send {
                chan,
                arrow_pos,
                value,
            } => {
                self.expr(*chan);
                *arrow_pos = self.kw("<-");
                self.expr(*value);
            }
            SimpleStmt::IncDec { expr, op, op_pos } => {
                self.expr(*expr);
                *op_pos = self.kw(op.as_str());
            }
            SimpleStmt::Assign {
                lhs,
                op,
                op_pos,
                rhs,
            } => {
                self.expr_list(*lhs);
                *op_pos = self.kw(op.as_str());
                self.expr_list(*rhs);
            }
            SimpleStmt::ShortVarDecl {
                names,
                op_pos,
                values,
            } => {
                self.names(*names);
                *op_pos = self.kw(":=");
                self.expr_list(*values);
            }
        }
        self.arena.simple_stmts[id] = stmt;
        let span = self.since(start);
        self.arena.simple_stmts.set_span(id, span);
    }

    fn expr_or_types(&mut self, list: ListRef<ExprOrType>) {
        for i in 0..list.len() as usize {
            if i > 0 {
                self.kw(",");
            }
            match self.arena.expr_or_types(list)[i] {
                ExprOrType::Expr(e) => self.expr(e),
                ExprOrType::Type(t) => self.typ(t),
            }
        }
    }

    fn literal(&mut self, lit: &mut LiteralValue) {
        lit.l_brace = self.kw("{");
        for i in 0..lit.elements.len() as usize {
            if i > 0 {
                self.kw(",");
            }
            let mut elem = self.arena.keyed_elems_list(lit.elements)[i];
            match &mut elem.key {
                Some(Key::Expr(e)) => self.expr(*e),
                Some(Key::Literal(l)) => self.literal(l),
                None => {}
            }
            if elem.key.is_some() {
                elem.colon_pos = Some(self.kw(":"));
            }
            match &mut elem.value {
                Element::Expr(e) => self.expr(*e),
                Element::Literal(l) => self.literal(l),
            }
            self.arena.keyed_elems_list_mut(lit.elements)[i] = elem;
        }
        lit.r_brace = self.kw("}");
    }

    fn expr(&mut self, id: ExprId) {
        let start = self.pos;
        let mut expr = self.arena.exprs[id];
        match &mut expr {
            Expr::Ident(name) => self.name(name),
            Expr::BasicLit(lit) => lit.pos = self.tok(self.interner.resolve(lit.value).len()),
            Expr::FuncLit {
                func_pos,
                sig,
                body,
            } => {
                *func_pos = self.kw("func");
                self.signature(*sig);
                self.block(body);
            }
            Expr::CompositeLit { typ, lit } => {
                self.typ(*typ);
                self.literal(lit);
            }
            Expr::Index {
                expr,
                l_brack,
                args,
                r_brack,
            } => {
                self.expr(*expr);
                *l_brack = self.kw("[");
                self.expr_or_types(*args);
                *r_brack = self.kw("]");
            }
            Expr::Paren {
                l_paren,
                expr,
                r_paren,
            } => {
                *l_paren = self.kw("(");
                self.expr(*expr);
                *r_paren = self.kw(")");
            }
            Expr::Selector { expr, dot_pos, sel } => {
                self.expr(*expr);
                *dot_pos = self.kw(".");
                self.name(sel);
            }
            Expr::Slice {
                expr,
                l_brack,
                lo,
                hi,
                max,
                r_brack,
            } => {
                self.expr(*expr);
                *l_brack = self.kw("[");
                if let Some(lo) = lo {
                    self.expr(*lo);
                }
                self.kw(":");
                if let Some(hi) = hi {
                    self.expr(*hi);
                }
                if let Some(max) = max {
                    self.kw(":");
                    self.expr(*max);
                }
                *r_brack = self.kw("]");
            }
            Expr::TypeAssert {
                expr,
                dot_pos,
                l_paren,
                typ,
                r_paren,
            } => {
                self.expr(*expr);
                *dot_pos = self.kw(".");
                *l_paren = self.kw("(");
                match typ {
                    Some(t) => self.typ(*t),
                    None => {
                        self.kw("type");
                    }
                }
                *r_paren = self.kw(")");
            }
            Expr::Call {
                callee,
                l_paren,
                args,
                ellipsis,
                r_paren,
            } => {
                match callee {
                    CallCallee::Expr(e) => self.expr(*e),
                    CallCallee::Type(t) => self.typ(*t),
                }
                *l_paren = self.kw("(");
                self.expr_or_types(*args);
                if ellipsis.is_some() {
                    *ellipsis = Some(self.kw("..."));
                }
                *r_paren = self.kw(")");
            }
            Expr::Unary { op, op_pos, expr } => {
                *op_pos = self.kw(op.as_str());
                self.expr(*expr);
            }
            Expr::Binary {
                left,
                op,
                op_pos,
                right,
            } => {
                self.expr(*left);
                *op_pos = self.kw(op.as_str());
                self.expr(*right);
            }
        }
        self.arena.exprs[id] = expr;
        let span = self.since(start);
        self.arena.exprs.set_span(id, span);
    }

    fn typ(&mut self, id: TypeId) {
        let start = self.pos;
        let mut typ = self.arena.types[id];
        match &mut typ {
            Type::Named {
                pkg,
                name,
                l_brack,
                args,
                r_brack,
            } => {
                if let Some(pkg) = pkg {
                    self.name(pkg);
                    self.kw(".");
                }
                self.name(name);
                if !args.is_empty() {
                    *l_brack = Some(self.kw("["));
                    for i in 0..args.len() as usize {
                        if i > 0 {
                            self.kw(",");
                        }
                        let t = self.arena.types_list(*args)[i];
                        self.typ(t);
                    }
                    *r_brack = Some(self.kw("]"));
                }
            }
            Type::Pointer { star_pos, elem } => {
                *star_pos = self.kw("*");
                self.typ(*elem);
            }
            Type::Array {
                l_brack,
                len,
                r_brack,
                elem,
            } => {
                *l_brack = self.kw("[");
                match len {
                    ArrayLen::Expr(e) => self.expr(*e),
                    ArrayLen::Ellipsis(pos) => *pos = self.kw("..."),
                }
                *r_brack = self.kw("]");
                self.typ(*elem);
            }
            Type::Slice {
                l_brack,
                r_brack,
                elem,
            } => {
                *l_brack = self.kw("[");
                *r_brack = self.kw("]");
                self.typ(*elem);
            }
            Type::Map {
                map_pos,
                l_brack,
                key,
                r_brack,
                value,
            } => {
                *map_pos = self.kw("map");
                *l_brack = self.kw("[");
                self.typ(*key);
                *r_brack = self.kw("]");
                self.typ(*value);
            }
            Type::Chan {
                dir,
                chan_pos,
                arrow_pos,
                elem,
            } => {
                if *dir == ChanDir::Recv {
                    *arrow_pos = Some(self.kw("<-"));
                }
                *chan_pos = self.kw("chan");
                if *dir == ChanDir::Send {
                    *arrow_pos = Some(self.kw("<-"));
                }
                self.typ(*elem);
            }
            Type::Struct { struct_pos, fields } => {
                *struct_pos = self.kw("struct");
                self.field_list(fields, "{", "}", ";");
            }
            Type::Interface {
                interface_pos,
                l_brace,
                elems,
                r_brace,
            } => {
                *interface_pos = self.kw("interface");
                *l_brace = self.kw("{");
                for i in 0..elems.len() as usize {
                    let mut elem = self.arena.interface_elems(*elems)[i];
                    match &mut elem {
                        InterfaceElem::Method { name, sig } => {
                            self.name(name);
                            self.signature(*sig);
                        }
                        InterfaceElem::Embed(t) => self.typ(*t),
                    }
                    self.arena.interface_elems_mut(*elems)[i] = elem;
                    self.kw(";");
                }
                *r_brace = self.kw("}");
            }
            Type::Func { func_pos, sig } => {
                *func_pos = self.kw("func");
                self.signature(*sig);
            }
            Type::Paren {
                l_paren,
                typ,
                r_paren,
            } => {
                *l_paren = self.kw("(");
                self.typ(*typ);
                *r_paren = self.kw(")");
            }
            Type::Union { terms } => {
                for i in 0..terms.len() as usize {
                    if i > 0 {
                        self.kw("|");
                    }
                    let mut term = self.arena.type_terms(*terms)[i];
                    if term.tilde.is_some() {
                        term.tilde = Some(self.kw("~"));
                    }
                    self.typ(term.typ);
                    self.arena.type_terms_mut(*terms)[i] = term;
                }
            }
        }
        self.arena.types[id] = typ;
        let span = self.since(start);
        self.arena.types.set_span(id, span);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_file;
    use crate::walk::{visit_pre, NodeRef, Visit};

    const SRC: &str = "package p

// Pair holds two values.
type (
	Pair struct {
		a, b int // both
	}
	Other = Pair
)

func (p *Pair) Sum(xs ...int) int {
	for i := range xs {
		p.a += xs[i] * 2
	}
	return p.a + p.b
}
";

    fn name_positions(pf: &ParsedFile) -> Vec<Span> {
        let mut out = Vec::new();
        visit_pre(&pf.arena, &pf.file, NodeRef::File, |a, _, node| {
            match node {
                NodeRef::Name(n) => out.push(n.pos),
                NodeRef::Expr(e) => {
                    if let Expr::Ident(n) = a.exprs[e] {
                        out.push(n.pos);
                    }
                }
                _ => {}
            }
            Visit::Continue
        });
        out
    }

    #[test]
    fn clearing_drops_every_position_and_keeps_syntax() {
        let mut pf = parse_file(SRC, "p.go").unwrap();
        clear_positions(&mut pf.arena, &mut pf.file);
        assert!(name_positions(&pf).iter().all(|s| s.is_none()));
        assert!(pf.file.package_pos.is_none());

        let TopLevelDecl::Func(f) = pf.arena.top_decls(pf.file.decls)[1] else {
            panic!("expected func");
        };
        let sig = pf.arena.signatures[pf.arena.funcs[f].signature];
        let param = pf.arena.fields[pf.arena.fields_list(sig.params.fields)[0]];
        assert_eq!(param.ellipsis_pos, Some(Span::NONE));
    }

    #[test]
    fn grouping_follows_spec_count() {
        let mut pf = parse_file(SRC, "p.go").unwrap();
        let TopLevelDecl::Decl(d) = pf.arena.top_decls(pf.file.decls)[0] else {
            panic!("expected decl");
        };
        clear_positions(&mut pf.arena, &mut pf.file);
        assert_eq!(pf.arena.decls[d].l_paren, Some(Span::NONE));

        let mut pf = parse_file("package p\n\ntype (\n\tA int\n)\n", "p.go").unwrap();
        let TopLevelDecl::Decl(d) = pf.arena.top_decls(pf.file.decls)[0] else {
            panic!("expected decl");
        };
        clear_positions(&mut pf.arena, &mut pf.file);
        assert_eq!(pf.arena.decls[d].l_paren, None);
        assert_eq!(pf.arena.decls[d].r_paren, None);
    }

    #[test]
    fn clearing_is_idempotent() {
        let mut once = parse_file(SRC, "p.go").unwrap();
        clear_positions(&mut once.arena, &mut once.file);
        let mut twice = parse_file(SRC, "p.go").unwrap();
        clear_positions(&mut twice.arena, &mut twice.file);
        clear_positions(&mut twice.arena, &mut twice.file);
        assert_eq!(once.file, twice.file);
        assert_eq!(once.arena.extras.specs, twice.arena.extras.specs);
        assert_eq!(once.arena.extras.ident_names, twice.arena.extras.ident_names);
        for i in 0..once.arena.exprs.len() {
            let id = ExprId::from_raw(i as u32);
            assert_eq!(once.arena.exprs[id], twice.arena.exprs[id]);
        }
    }

    #[test]
    fn assigned_positions_strictly_increase() {
        let mut pf = parse_file(SRC, "p.go").unwrap();
        clear_positions(&mut pf.arena, &mut pf.file);
        assign_positions(&mut pf.arena, &pf.interner, &mut pf.file);

        let names = name_positions(&pf);
        assert!(names.iter().all(|s| s.is_valid()));
        for pair in names.windows(2) {
            assert!(pair[0].end < pair[1].start, "{pair:?}");
        }
        assert!(pf.file.package_pos.start >= 1);
    }

    #[test]
    fn assigned_spans_cover_children() {
        let mut pf = parse_file("package p\nvar x = a + b*c\n", "p.go").unwrap();
        clear_positions(&mut pf.arena, &mut pf.file);
        assign_positions(&mut pf.arena, &pf.interner, &mut pf.file);
        for i in 0..pf.arena.exprs.len() {
            let id = ExprId::from_raw(i as u32);
            if let Expr::Binary { left, right, .. } = pf.arena.exprs[id] {
                let span = pf.arena.exprs.span(id);
                assert!(span.start <= pf.arena.exprs.span(left).start);
                assert!(span.end >= pf.arena.exprs.span(right).end);
            }
        }
    }
}
