//! gofmt-style printer.
//!
//! Layout decisions follow positions: with real positions the printer keeps
//! blank lines (at most one) and one-line bodies as written; with cleared
//! positions every brace-delimited body is expanded and composite literals
//! stay on one line. Without a [`LineIndex`], valid positions all count as
//! one line.
//!
//! Runs of single-line struct fields and grouped specs are column-aligned the
//! way `text/tabwriter` does it for gofmt: padding 1, empty columns dropped.

use thiserror::Error;

use crate::ast::*;
use crate::error::LineIndex;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PrintError {
    #[error("{kind} declaration without specs must be parenthesized")]
    EmptyDecl { kind: &'static str },
    #[error("{spec} spec inside a {kind} declaration")]
    SpecKind {
        spec: &'static str,
        kind: &'static str,
    },
}

type PResult<T = ()> = Result<T, PrintError>;

/// Renders a whole file. Pass the source's `lines` to keep its layout.
pub fn print_file(
    arena: &AstArena,
    interner: &Interner,
    file: &SourceFile,
    lines: Option<&LineIndex>,
) -> Result<String, PrintError> {
    let mut p = Printer {
        arena,
        interner,
        lines,
        out: String::new(),
        indent: 0,
        at_line_start: true,
    };
    p.file(file)?;
    Ok(p.out)
}

/// [`print_file`] with the file's own line table.
pub fn print_parsed(pf: &ParsedFile) -> Result<String, PrintError> {
    print_file(&pf.arena, &pf.interner, &pf.file, Some(&pf.lines))
}

const LOWEST_PREC: u8 = 0;
const UNARY_PREC: u8 = 6;
const HIGHEST_PREC: u8 = 7;

/// One line of an aligned section.
enum Row {
    /// Tab-separated cells; all but the last take part in alignment.
    Cells(Vec<String>),
    Raw(String),
    Blank,
}

struct Printer<'a> {
    arena: &'a AstArena,
    interner: &'a Interner,
    lines: Option<&'a LineIndex>,
    out: String,
    indent: usize,
    at_line_start: bool,
}

impl<'a> Printer<'a> {
    fn w(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        if self.at_line_start {
            for _ in 0..self.indent {
                self.out.push('\t');
            }
            self.at_line_start = false;
        }
        self.out.push_str(s);
    }

    fn nl(&mut self) {
        self.out.push('\n');
        self.at_line_start = true;
    }

    fn sym(&self, sym: Symbol) -> &'a str {
        self.interner.resolve(sym)
    }

    /// Output of `f`, rendered at the current indentation but not written.
    fn render(&mut self, f: impl FnOnce(&mut Self) -> PResult) -> PResult<String> {
        let saved = std::mem::take(&mut self.out);
        let saved_start = std::mem::replace(&mut self.at_line_start, false);
        let res = f(self);
        let text = std::mem::replace(&mut self.out, saved);
        self.at_line_start = saved_start;
        res.map(|()| text)
    }

    fn start_line(&self, span: Span) -> Option<u32> {
        span.is_valid()
            .then(|| self.lines.map_or(1, |l| l.line(span.start)))
    }

    fn end_line(&self, span: Span) -> Option<u32> {
        span.is_valid()
            .then(|| self.lines.map_or(1, |l| l.line(span.end.max(span.start + 1) - 1)))
    }

    fn same_line(&self, a: Span, b: Span) -> bool {
        match (self.start_line(a), self.start_line(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }

    /// Newlines between two constructs: the source distance clamped to
    /// `min..=2`, or `min` without positions.
    fn gap(&self, prev_end: Span, next_start: Span, min: u32) -> u32 {
        match (self.end_line(prev_end), self.start_line(next_start)) {
            (Some(a), Some(b)) => b.saturating_sub(a).clamp(min, 2),
            _ => min,
        }
    }

    // ---------------------------------------------------------------------
    // Files and declarations
    // ---------------------------------------------------------------------

    fn file(&mut self, file: &SourceFile) -> PResult {
        if let Some(doc) = file.doc {
            self.doc(doc);
        }
        self.w("package ");
        self.w(self.sym(file.name.sym));

        let mut prev: Option<(&'static str, Span)> = None;
        for &decl in self.arena.top_decls(file.decls) {
            let (class, start, end, has_doc) = self.decl_extent(decl);
            let newlines = match prev {
                None => 2,
                Some((prev_class, prev_end)) => {
                    let min = if prev_class != class || has_doc { 2 } else { 1 };
                    self.gap(prev_end, start, min)
                }
            };
            for _ in 0..newlines {
                self.nl();
            }
            match decl {
                TopLevelDecl::Decl(id) => self.gen_decl(id)?,
                TopLevelDecl::Func(id) => self.func_decl(id)?,
            }
            prev = Some((class, end));
        }
        self.nl();
        Ok(())
    }

    fn decl_extent(&self, decl: TopLevelDecl) -> (&'static str, Span, Span, bool) {
        let (class, span, doc) = match decl {
            TopLevelDecl::Decl(id) => {
                let d = self.arena.decls[id];
                (d.kind.keyword(), self.arena.decls.span(id), d.doc)
            }
            TopLevelDecl::Func(id) => ("func", self.arena.funcs.span(id), self.arena.funcs[id].doc),
        };
        let start = doc.map_or(span, |d| self.arena.comment_groups.span(d).to(span));
        (class, start, span, doc.is_some())
    }

    fn doc(&mut self, id: CommentGroupId) {
        let group = self.arena.comment_groups[id];
        for &c in self.arena.comment_ids(group.comments) {
            self.w(self.sym(self.arena.comments[c].text));
            self.nl();
        }
    }

    fn doc_rows(&self, id: CommentGroupId, rows: &mut Vec<Row>) {
        let group = self.arena.comment_groups[id];
        for &c in self.arena.comment_ids(group.comments) {
            rows.push(Row::Raw(self.sym(self.arena.comments[c].text).to_owned()));
        }
    }

    fn trailing_comment(&self, id: CommentGroupId) -> String {
        let group = self.arena.comment_groups[id];
        let texts: Vec<&str> = self
            .arena
            .comment_ids(group.comments)
            .iter()
            .map(|&c| self.sym(self.arena.comments[c].text))
            .collect();
        texts.join(" ")
    }

    fn gen_decl(&mut self, id: DeclId) -> PResult {
        let decl = self.arena.decls[id];
        if let Some(doc) = decl.doc {
            self.doc(doc);
        }
        let kind = decl.kind.keyword();
        self.w(kind);
        let specs = self.arena.specs_list(decl.specs);
        for spec in specs {
            self.check_spec(decl.kind, spec)?;
        }

        match specs {
            [] if decl.l_paren.is_none() => Err(PrintError::EmptyDecl { kind }),
            [spec] if decl.l_paren.is_none() => {
                self.w(" ");
                self.spec_inline(spec)
            }
            [] => {
                self.w(" ()");
                Ok(())
            }
            _ => {
                self.w(" (");
                self.nl();
                self.indent += 1;
                let keep_type = specs
                    .iter()
                    .any(|s| matches!(s, Spec::Value(v) if v.typ.is_some()));
                let mut rows = Vec::new();
                let mut prev_end = Span::NONE;
                for (i, spec) in specs.iter().enumerate() {
                    let (start, end) = self.spec_extent(spec);
                    if i > 0 && self.gap(prev_end, start, 1) > 1 {
                        rows.push(Row::Blank);
                    }
                    if let Some(doc) = spec.doc() {
                        self.doc_rows(doc, &mut rows);
                    }
                    rows.push(Row::Cells(self.spec_cells(spec, keep_type)?));
                    prev_end = end;
                }
                self.emit_rows(rows);
                self.indent -= 1;
                self.w(")");
                Ok(())
            }
        }
    }

    fn check_spec(&self, kind: GenDeclKind, spec: &Spec) -> PResult {
        let spec_name = match (spec, kind) {
            (Spec::Import(_), GenDeclKind::Import)
            | (Spec::Type(_), GenDeclKind::Type)
            | (Spec::Value(_), GenDeclKind::Const | GenDeclKind::Var) => return Ok(()),
            (Spec::Import(_), _) => "import",
            (Spec::Type(_), _) => "type",
            (Spec::Value(_), _) => "value",
        };
        Err(PrintError::SpecKind {
            spec: spec_name,
            kind: kind.keyword(),
        })
    }

    fn spec_extent(&self, spec: &Spec) -> (Span, Span) {
        let (first, last, doc, comment) = match spec {
            Spec::Import(s) => {
                let first = match s.name {
                    Some(ImportName::Dot(p) | ImportName::Blank(p)) => p,
                    Some(ImportName::Name(n)) => n.pos,
                    None => s.path.pos,
                };
                (first, s.path.pos, s.doc, s.comment)
            }
            Spec::Value(s) => {
                let first = self
                    .arena
                    .ident_names(s.names)
                    .first()
                    .map_or(Span::NONE, |n| n.pos);
                let last = match self.arena.exprs_list(s.values).last() {
                    Some(&e) => self.arena.exprs.span(e),
                    None => s.typ.map_or(first, |t| self.arena.types.span(t)),
                };
                (first, last, s.doc, s.comment)
            }
            Spec::Type(s) => (s.name.pos, self.arena.types.span(s.typ), s.doc, s.comment),
        };
        let start = doc.map_or(first, |d| self.arena.comment_groups.span(d).to(first));
        let end = comment.map_or(last, |c| last.to(self.arena.comment_groups.span(c)));
        (start, end)
    }

    fn spec_inline(&mut self, spec: &Spec) -> PResult {
        let cells = self.spec_cells(spec, false)?;
        let line = cells
            .iter()
            .filter(|c| !c.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ");
        self.w(&line);
        Ok(())
    }

    fn spec_cells(&mut self, spec: &Spec, keep_type: bool) -> PResult<Vec<String>> {
        let mut cells = Vec::new();
        let comment = match *spec {
            Spec::Import(s) => {
                let mut text = String::new();
                match s.name {
                    Some(ImportName::Dot(_)) => text.push_str(". "),
                    Some(ImportName::Blank(_)) => text.push_str("_ "),
                    Some(ImportName::Name(n)) => {
                        text.push_str(self.sym(n.sym));
                        text.push(' ');
                    }
                    None => {}
                }
                text.push_str(self.sym(s.path.value));
                cells.push(text);
                s.comment
            }
            Spec::Value(s) => {
                cells.push(self.render(|p| {
                    p.names(s.names);
                    Ok(())
                })?);
                let has_comment = s.comment.is_some();
                match s.typ {
                    Some(t) => cells.push(self.render(|p| p.typ(t))?),
                    None if keep_type || has_comment => cells.push(String::new()),
                    None => {}
                }
                if !s.values.is_empty() {
                    let values = self.render(|p| p.expr_list(s.values, 1))?;
                    cells.push(format!("= {values}"));
                } else if has_comment {
                    cells.push(String::new());
                }
                s.comment
            }
            Spec::Type(s) => {
                cells.push(self.render(|p| {
                    p.w(p.sym(s.name.sym));
                    match s.type_params {
                        Some(tp) => p.type_params(tp),
                        None => Ok(()),
                    }
                })?);
                let typ = self.render(|p| p.typ(s.typ))?;
                cells.push(match s.assign_pos {
                    Some(_) => format!("= {typ}"),
                    None => typ,
                });
                s.comment
            }
        };
        if let Some(c) = comment {
            cells.push(self.trailing_comment(c));
        }
        Ok(cells)
    }

    fn func_decl(&mut self, id: FuncDeclId) -> PResult {
        let func = self.arena.funcs[id];
        if let Some(doc) = func.doc {
            self.doc(doc);
        }
        self.w("func ");
        if let Some(recv) = func.recv {
            self.w("(");
            if let Some(name) = recv.name {
                self.w(self.sym(name.sym));
                self.w(" ");
            }
            self.typ(recv.typ)?;
            self.w(") ");
        }
        self.w(self.sym(func.name.sym));
        if let Some(tp) = func.type_params {
            self.type_params(tp)?;
        }
        self.signature(func.signature)?;
        if let Some(body) = func.body {
            self.w(" ");
            self.func_body(&body)?;
        }
        Ok(())
    }

    fn type_params(&mut self, id: TypeParamsId) -> PResult {
        let tp = self.arena.type_params[id];
        self.w("[");
        for (i, &decl) in self.arena.type_param_decl_ids(tp.params).iter().enumerate() {
            if i > 0 {
                self.w(", ");
            }
            let decl = self.arena.type_param_decls[decl];
            self.names(decl.names);
            self.w(" ");
            self.typ(decl.constraint)?;
        }
        self.w("]");
        Ok(())
    }

    fn names(&mut self, list: ListRef<IdentName>) {
        for (i, name) in self.arena.ident_names(list).iter().enumerate() {
            if i > 0 {
                self.w(", ");
            }
            self.w(self.sym(name.sym));
        }
    }

    fn signature(&mut self, id: SignatureId) -> PResult {
        let sig = self.arena.signatures[id];
        self.params(&sig.params)?;
        match sig.results {
            None => Ok(()),
            Some(Results::Type(t)) => {
                self.w(" ");
                self.typ(t)
            }
            Some(Results::Params(list)) => {
                let fields = self.arena.fields_list(list.fields);
                match fields {
                    [] => Ok(()),
                    [f] if self.arena.fields[*f].names.is_empty() => {
                        self.w(" ");
                        self.typ(self.arena.fields[*f].typ)
                    }
                    _ => {
                        self.w(" ");
                        self.params(&list)
                    }
                }
            }
        }
    }

    fn params(&mut self, list: &FieldList) -> PResult {
        self.w("(");
        for (i, &f) in self.arena.fields_list(list.fields).iter().enumerate() {
            if i > 0 {
                self.w(", ");
            }
            let field = self.arena.fields[f];
            if !field.names.is_empty() {
                self.names(field.names);
                self.w(" ");
            }
            if field.ellipsis_pos.is_some() {
                self.w("...");
            }
            self.typ(field.typ)?;
        }
        self.w(")");
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Aligned sections
    // ---------------------------------------------------------------------

    /// Writes rows at the current indentation, each ending in a newline.
    fn emit_rows(&mut self, rows: Vec<Row>) {
        let mut run: Vec<Vec<String>> = Vec::new();
        for row in rows {
            match row {
                Row::Cells(cells) if !cells.iter().any(|c| c.contains('\n')) => {
                    run.push(cells);
                    continue;
                }
                Row::Cells(cells) => {
                    self.flush_run(&mut run);
                    let text = cells
                        .iter()
                        .filter(|c| !c.is_empty())
                        .map(String::as_str)
                        .collect::<Vec<_>>()
                        .join(" ");
                    self.w(&text);
                    self.nl();
                }
                Row::Raw(text) => {
                    self.flush_run(&mut run);
                    self.w(&text);
                    self.nl();
                }
                Row::Blank => {
                    self.flush_run(&mut run);
                    self.nl();
                }
            }
        }
        self.flush_run(&mut run);
    }

    fn flush_run(&mut self, run: &mut Vec<Vec<String>>) {
        if run.is_empty() {
            return;
        }
        let widths = column_widths(run);
        for (cells, widths) in run.iter().zip(&widths) {
            let mut line = String::new();
            for (i, cell) in cells.iter().enumerate() {
                line.push_str(cell);
                if i + 1 < cells.len() {
                    let pad = widths[i].saturating_sub(cell.chars().count());
                    line.extend(std::iter::repeat(' ').take(pad));
                }
            }
            self.w(line.trim_end());
            self.nl();
        }
        run.clear();
    }

    // ---------------------------------------------------------------------
    // Statements
    // ---------------------------------------------------------------------

    /// Function bodies written on one line stay there when short.
    fn func_body(&mut self, block: &Block) -> PResult {
        let stmts = self.arena.stmts_list(block.stmts);
        if self.same_line(block.l_brace, block.r_brace) && stmts.len() <= 5 {
            let mut parts = Vec::new();
            for &s in stmts {
                if matches!(self.arena.stmts[s], Stmt::Empty(_)) {
                    continue;
                }
                parts.push(self.render(|p| p.stmt(s))?);
            }
            let body = parts.join("; ");
            if !body.contains('\n') && body.len() <= 100 {
                if body.is_empty() {
                    self.w("{}");
                } else {
                    self.w("{ ");
                    self.w(&body);
                    self.w(" }");
                }
                return Ok(());
            }
        }
        self.block(block)
    }

    fn block(&mut self, block: &Block) -> PResult {
        self.w("{");
        self.nl();
        self.indent += 1;
        self.stmt_list(block.stmts)?;
        self.indent -= 1;
        self.w("}");
        Ok(())
    }

    /// Statements, each on its own line and each followed by a newline.
    fn stmt_list(&mut self, list: ListRef<StmtId>) -> PResult {
        let mut prev: Option<Span> = None;
        for &s in self.arena.stmts_list(list) {
            if matches!(self.arena.stmts[s], Stmt::Empty(_)) {
                continue;
            }
            let span = self.arena.stmts.span(s);
            if let Some(prev) = prev {
                if self.gap(prev, span, 1) > 1 {
                    self.nl();
                }
            }
            self.stmt(s)?;
            self.nl();
            prev = Some(span);
        }
        Ok(())
    }

    fn stmt(&mut self, id: StmtId) -> PResult {
        match self.arena.stmts[id] {
            Stmt::Empty(_) => {}
            Stmt::Simple(s) => self.simple(s)?,
            Stmt::Decl(d) => self.gen_decl(d)?,
            Stmt::Labeled { label, stmt, .. } => {
                self.indent = self.indent.saturating_sub(1);
                self.w(self.sym(label.sym));
                self.w(":");
                self.indent += 1;
                if !matches!(self.arena.stmts[stmt], Stmt::Empty(_)) {
                    self.nl();
                    self.stmt(stmt)?;
                }
            }
            Stmt::Go { call, .. } => {
                self.w("go ");
                self.expr(call)?;
            }
            Stmt::Defer { call, .. } => {
                self.w("defer ");
                self.expr(call)?;
            }
            Stmt::Return { results, .. } => {
                self.w("return");
                if !results.is_empty() {
                    self.w(" ");
                    self.expr_list(results, 1)?;
                }
            }
            Stmt::Branch(b) => {
                self.w(b.kind.keyword());
                if let Some(label) = b.label {
                    self.w(" ");
                    self.w(self.sym(label.sym));
                }
            }
            Stmt::Block(b) => self.block(&b)?,
            Stmt::If {
                init,
                cond,
                then_block,
                else_stmt,
                ..
            } => {
                self.w("if ");
                if let Some(init) = init {
                    self.simple(init)?;
                    self.w("; ");
                }
                self.expr(cond)?;
                self.w(" ");
                self.block(&then_block)?;
                if let Some(els) = else_stmt {
                    self.w(" else ");
                    self.stmt(els)?;
                }
            }
            Stmt::For { kind, body, .. } => {
                self.w("for ");
                match kind {
                    ForKind::Infinite => {}
                    ForKind::Cond(c) => {
                        self.expr(c)?;
                        self.w(" ");
                    }
                    ForKind::Clause {
                        init: None,
                        cond: Some(c),
                        post: None,
                    } => {
                        self.expr(c)?;
                        self.w(" ");
                    }
                    ForKind::Clause { init, cond, post } => {
                        if let Some(init) = init {
                            self.simple(init)?;
                        }
                        self.w("; ");
                        if let Some(cond) = cond {
                            self.expr(cond)?;
                        }
                        self.w("; ");
                        if let Some(post) = post {
                            self.simple(post)?;
                            self.w(" ");
                        }
                    }
                    ForKind::Range { lhs, expr, .. } => {
                        self.range_lhs(lhs)?;
                        self.w("range ");
                        self.expr(expr)?;
                        self.w(" ");
                    }
                }
                self.block(&body)?;
            }
            Stmt::Switch {
                init, tag, clauses, ..
            } => {
                self.w("switch ");
                if let Some(init) = init {
                    self.simple(init)?;
                    self.w("; ");
                }
                if let Some(tag) = tag {
                    self.expr(tag)?;
                    self.w(" ");
                }
                self.switch_body(clauses)?;
            }
            Stmt::TypeSwitch {
                init,
                guard,
                clauses,
                ..
            } => {
                self.w("switch ");
                if let Some(init) = init {
                    self.simple(init)?;
                    self.w("; ");
                }
                if let Some(bind) = guard.bind {
                    self.w(self.sym(bind.sym));
                    self.w(" := ");
                }
                self.expr1(guard.expr, HIGHEST_PREC, 1)?;
                self.w(".(type) ");
                self.switch_body(clauses)?;
            }
            Stmt::Select { clauses, .. } => {
                self.w("select {");
                self.nl();
                for &c in self.arena.comm_clause_ids(clauses) {
                    match self.arena.comm_clauses[c] {
                        CommClause::Case { comm, stmts, .. } => {
                            self.w("case ");
                            match comm {
                                CommStmt::Send { chan, value, .. } => {
                                    self.expr(chan)?;
                                    self.w(" <- ");
                                    self.expr(value)?;
                                }
                                CommStmt::Recv { lhs, expr } => {
                                    self.range_lhs(lhs)?;
                                    self.expr(expr)?;
                                }
                            }
                            self.w(":");
                            self.clause_body(stmts)?;
                        }
                        CommClause::Default { stmts, .. } => {
                            self.w("default:");
                            self.clause_body(stmts)?;
                        }
                    }
                }
                self.w("}");
            }
        }
        Ok(())
    }

    fn switch_body(&mut self, clauses: ListRef<SwitchClauseId>) -> PResult {
        self.w("{");
        self.nl();
        for &c in self.arena.switch_clause_ids(clauses) {
            match self.arena.switch_clauses[c] {
                SwitchClause::Expr { items, stmts, .. } => {
                    if items.is_empty() {
                        self.w("default:");
                    } else {
                        self.w("case ");
                        self.expr_list(items, 1)?;
                        self.w(":");
                    }
                    self.clause_body(stmts)?;
                }
                SwitchClause::Type { items, stmts, .. } => {
                    if items.is_empty() {
                        self.w("default:");
                    } else {
                        self.w("case ");
                        for (i, item) in self.arena.type_case_elems(items).iter().enumerate() {
                            if i > 0 {
                                self.w(", ");
                            }
                            match *item {
                                TypeCaseElem::Type(t) => self.typ(t)?,
                                TypeCaseElem::Nil(_) => self.w("nil"),
                            }
                        }
                        self.w(":");
                    }
                    self.clause_body(stmts)?;
                }
            }
        }
        self.w("}");
        Ok(())
    }

    fn clause_body(&mut self, stmts: ListRef<StmtId>) -> PResult {
        self.nl();
        self.indent += 1;
        self.stmt_list(stmts)?;
        self.indent -= 1;
        Ok(())
    }

    fn range_lhs(&mut self, lhs: Option<RangeLhs>) -> PResult {
        match lhs {
            Some(RangeLhs::Define { names, .. }) => {
                self.names(names);
                self.w(" := ");
            }
            Some(RangeLhs::Assign { exprs, .. }) => {
                self.expr_list(exprs, 1)?;
                self.w(" = ");
            }
            None => {}
        }
        Ok(())
    }

    fn simple(&mut self, id: SimpleStmtId) -> PResult {
        match self.arena.simple_stmts[id] {
            SimpleStmt::Expr(e) => self.expr(e)?,
            SimpleStmt::Send { chan, value, .. } => {
                self.expr(chan)?;
                self.w(" <- ");
                self.expr(value)?;
            }
            SimpleStmt::IncDec { expr, op, .. } => {
                self.expr1(expr, HIGHEST_PREC, 1)?;
                self.w(op.as_str());
            }
            SimpleStmt::Assign { lhs, op, rhs, .. } => {
                let depth = if lhs.len() > 1 && rhs.len() > 1 { 2 } else { 1 };
                self.expr_list(lhs, depth)?;
                self.w(" ");
                self.w(op.as_str());
                self.w(" ");
                self.expr_list(rhs, depth)?;
            }
            SimpleStmt::ShortVarDecl { names, values, .. } => {
                let depth = if names.len() > 1 && values.len() > 1 { 2 } else { 1 };
                self.names(names);
                self.w(" := ");
                self.expr_list(values, depth)?;
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Expressions
    // ---------------------------------------------------------------------

    fn expr(&mut self, id: ExprId) -> PResult {
        self.expr1(id, LOWEST_PREC, 1)
    }

    fn expr_list(&mut self, list: ListRef<ExprId>, depth: i32) -> PResult {
        for (i, &e) in self.arena.exprs_list(list).iter().enumerate() {
            if i > 0 {
                self.w(", ");
            }
            self.expr1(e, LOWEST_PREC, depth)?;
        }
        Ok(())
    }

    fn expr_or_types(&mut self, list: ListRef<ExprOrType>, depth: i32) -> PResult {
        for (i, item) in self.arena.expr_or_types(list).iter().enumerate() {
            if i > 0 {
                self.w(", ");
            }
            match *item {
                ExprOrType::Expr(e) => self.expr1(e, LOWEST_PREC, depth)?,
                ExprOrType::Type(t) => self.typ(t)?,
            }
        }
        Ok(())
    }

    fn expr1(&mut self, id: ExprId, prec1: u8, depth: i32) -> PResult {
        match self.arena.exprs[id] {
            Expr::Ident(name) => self.w(self.sym(name.sym)),
            Expr::BasicLit(lit) => self.w(self.sym(lit.value)),
            Expr::FuncLit { sig, body, .. } => {
                self.w("func");
                self.signature(sig)?;
                self.w(" ");
                self.func_body(&body)?;
            }
            Expr::CompositeLit { typ, lit } => {
                self.typ(typ)?;
                self.literal(&lit)?;
            }
            Expr::Index { expr, args, .. } => {
                self.expr1(expr, HIGHEST_PREC, 1)?;
                self.w("[");
                self.expr_or_types(args, depth + 1)?;
                self.w("]");
            }
            Expr::Paren { expr, .. } => {
                self.w("(");
                self.expr1(expr, LOWEST_PREC, reduce_depth(depth))?;
                self.w(")");
            }
            Expr::Selector { expr, sel, .. } => {
                self.expr1(expr, HIGHEST_PREC, depth)?;
                self.w(".");
                self.w(self.sym(sel.sym));
            }
            Expr::Slice {
                expr, lo, hi, max, ..
            } => {
                self.expr1(expr, HIGHEST_PREC, 1)?;
                self.w("[");
                let mut indices = vec![lo, hi];
                if max.is_some() {
                    indices.push(max);
                }
                let needs_blanks = depth <= 1
                    && indices.iter().flatten().count() > 1
                    && indices.iter().flatten().any(|&e| self.is_binary(e));
                for (i, index) in indices.iter().enumerate() {
                    if i > 0 {
                        if indices[i - 1].is_some() && needs_blanks {
                            self.w(" ");
                        }
                        self.w(":");
                        if index.is_some() && needs_blanks {
                            self.w(" ");
                        }
                    }
                    if let Some(e) = *index {
                        self.expr1(e, LOWEST_PREC, depth + 1)?;
                    }
                }
                self.w("]");
            }
            Expr::TypeAssert { expr, typ, .. } => {
                self.expr1(expr, HIGHEST_PREC, depth)?;
                self.w(".(");
                match typ {
                    Some(t) => self.typ(t)?,
                    None => self.w("type"),
                }
                self.w(")");
            }
            Expr::Call {
                callee,
                args,
                ellipsis,
                ..
            } => {
                let depth = if args.len() > 1 { depth + 1 } else { depth };
                match callee {
                    CallCallee::Expr(e) => self.expr1(e, HIGHEST_PREC, depth)?,
                    CallCallee::Type(t) if matches!(self.arena.types[t], Type::Func { .. }) => {
                        self.w("(");
                        self.typ(t)?;
                        self.w(")");
                    }
                    CallCallee::Type(t) => self.typ(t)?,
                }
                self.w("(");
                self.expr_or_types(args, depth)?;
                if ellipsis.is_some() {
                    self.w("...");
                }
                self.w(")");
            }
            Expr::Unary { op, expr, .. } => {
                if UNARY_PREC < prec1 {
                    self.w("(");
                    self.expr(id)?;
                    self.w(")");
                } else {
                    self.w(op.as_str());
                    if let Expr::Unary { op: inner, .. } = self.arena.exprs[expr] {
                        if matches!(
                            (op, inner),
                            (UnaryOp::Minus, UnaryOp::Minus) | (UnaryOp::Plus, UnaryOp::Plus)
                        ) {
                            self.w(" ");
                        }
                    }
                    self.expr1(expr, UNARY_PREC, depth)?;
                }
            }
            Expr::Binary { .. } => {
                let depth = depth.max(1);
                let cutoff = self.cutoff(id, depth);
                self.binary(id, prec1, cutoff, depth)?;
            }
        }
        Ok(())
    }

    fn is_binary(&self, id: ExprId) -> bool {
        matches!(self.arena.exprs[id], Expr::Binary { .. })
    }

    fn binary(&mut self, id: ExprId, prec1: u8, cutoff: u8, depth: i32) -> PResult {
        let Expr::Binary {
            left, op, right, ..
        } = self.arena.exprs[id]
        else {
            return self.expr1(id, prec1, depth);
        };
        let prec = op.precedence();
        if prec < prec1 {
            self.w("(");
            self.expr1(id, LOWEST_PREC, reduce_depth(depth))?;
            self.w(")");
            return Ok(());
        }
        let blank = prec < cutoff;
        self.expr1(left, prec, depth + self.diff_prec(left, prec))?;
        if blank {
            self.w(" ");
        }
        self.w(op.as_str());
        if blank {
            self.w(" ");
        }
        self.expr1(right, prec + 1, depth + 1)
    }

    fn diff_prec(&self, id: ExprId, prec: u8) -> i32 {
        match self.arena.exprs[id] {
            Expr::Binary { op, .. } if op.precedence() == prec => 0,
            _ => 1,
        }
    }

    fn cutoff(&self, id: ExprId, depth: i32) -> u8 {
        let (has4, has5, max_problem) = self.walk_binary(id);
        if max_problem > 0 {
            return max_problem + 1;
        }
        match (has4 && has5, depth == 1) {
            (true, true) => 5,
            (true, false) => 4,
            (false, true) => 6,
            (false, false) => 4,
        }
    }

    fn walk_binary(&self, id: ExprId) -> (bool, bool, u8) {
        let Expr::Binary {
            left, op, right, ..
        } = self.arena.exprs[id]
        else {
            return (false, false, 0);
        };
        let prec = op.precedence();
        let mut has4 = prec == 4;
        let mut has5 = prec == 5;
        let mut max_problem = 0;

        if let Expr::Binary { op: l, .. } = self.arena.exprs[left] {
            if l.precedence() >= prec {
                let (h4, h5, mp) = self.walk_binary(left);
                has4 |= h4;
                has5 |= h5;
                max_problem = max_problem.max(mp);
            }
        }

        match self.arena.exprs[right] {
            Expr::Binary { op: r, .. } if r.precedence() > prec => {
                let (h4, h5, mp) = self.walk_binary(right);
                has4 |= h4;
                has5 |= h5;
                max_problem = max_problem.max(mp);
            }
            Expr::Unary { op: r, .. } => match (op.as_str(), r.as_str()) {
                ("/", "*") | ("&", "&") | ("&", "^") => max_problem = 5,
                ("+", "+") | ("-", "-") => max_problem = max_problem.max(4),
                _ => {}
            },
            _ => {}
        }
        (has4, has5, max_problem)
    }

    fn literal(&mut self, lit: &LiteralValue) -> PResult {
        let elems = self.arena.keyed_elems_list(lit.elements);
        if elems.is_empty() {
            self.w("{}");
            return Ok(());
        }
        let expanded = lit.l_brace.is_valid()
            && lit.r_brace.is_valid()
            && !self.same_line(lit.l_brace, lit.r_brace);
        if !expanded {
            self.w("{");
            for (i, elem) in elems.iter().enumerate() {
                if i > 0 {
                    self.w(", ");
                }
                self.keyed_element(elem)?;
            }
            self.w("}");
            return Ok(());
        }

        self.w("{");
        self.nl();
        self.indent += 1;
        let mut rows = Vec::new();
        for elem in elems {
            let mut cells = Vec::new();
            if let Some(key) = elem.key {
                cells.push(self.render(|p| {
                    p.key(key)?;
                    p.w(":");
                    Ok(())
                })?);
            }
            let mut value = self.render(|p| p.element(elem.value))?;
            value.push(',');
            cells.push(value);
            rows.push(Row::Cells(cells));
        }
        self.emit_rows(rows);
        self.indent -= 1;
        self.w("}");
        Ok(())
    }

    fn keyed_element(&mut self, elem: &KeyedElement) -> PResult {
        if let Some(key) = elem.key {
            self.key(key)?;
            self.w(": ");
        }
        self.element(elem.value)
    }

    fn key(&mut self, key: Key) -> PResult {
        match key {
            Key::Expr(e) => self.expr(e),
            Key::Literal(l) => self.literal(&l),
        }
    }

    fn element(&mut self, value: Element) -> PResult {
        match value {
            Element::Expr(e) => self.expr(e),
            Element::Literal(l) => self.literal(&l),
        }
    }

    // ---------------------------------------------------------------------
    // Types
    // ---------------------------------------------------------------------

    fn typ(&mut self, id: TypeId) -> PResult {
        match self.arena.types[id] {
            Type::Named {
                pkg, name, args, ..
            } => {
                if let Some(pkg) = pkg {
                    self.w(self.sym(pkg.sym));
                    self.w(".");
                }
                self.w(self.sym(name.sym));
                if !args.is_empty() {
                    self.w("[");
                    for (i, &t) in self.arena.types_list(args).iter().enumerate() {
                        if i > 0 {
                            self.w(", ");
                        }
                        self.typ(t)?;
                    }
                    self.w("]");
                }
            }
            Type::Pointer { elem, .. } => {
                self.w("*");
                self.typ(elem)?;
            }
            Type::Array { len, elem, .. } => {
                self.w("[");
                match len {
                    ArrayLen::Expr(e) => self.expr(e)?,
                    ArrayLen::Ellipsis(_) => self.w("..."),
                }
                self.w("]");
                self.typ(elem)?;
            }
            Type::Slice { elem, .. } => {
                self.w("[]");
                self.typ(elem)?;
            }
            Type::Map { key, value, .. } => {
                self.w("map[");
                self.typ(key)?;
                self.w("]");
                self.typ(value)?;
            }
            Type::Chan { dir, elem, .. } => {
                self.w(match dir {
                    ChanDir::Both => "chan ",
                    ChanDir::Send => "chan<- ",
                    ChanDir::Recv => "<-chan ",
                });
                self.typ(elem)?;
            }
            Type::Struct { fields, .. } => self.struct_type(&fields)?,
            Type::Interface {
                l_brace,
                elems,
                r_brace,
                ..
            } => self.interface_type(l_brace, elems, r_brace)?,
            Type::Func { sig, .. } => {
                self.w("func");
                self.signature(sig)?;
            }
            Type::Paren { typ, .. } => {
                self.w("(");
                self.typ(typ)?;
                self.w(")");
            }
            Type::Union { terms } => {
                for (i, term) in self.arena.type_terms(terms).iter().enumerate() {
                    if i > 0 {
                        self.w(" | ");
                    }
                    if term.tilde.is_some() {
                        self.w("~");
                    }
                    self.typ(term.typ)?;
                }
            }
        }
        Ok(())
    }

    fn field_has_comments(&self, f: FieldId) -> bool {
        let field = self.arena.fields[f];
        field.doc.is_some() || field.comment.is_some()
    }

    fn struct_type(&mut self, fields: &FieldList) -> PResult {
        let list = self.arena.fields_list(fields.fields);
        let has_comments = list.iter().any(|&f| self.field_has_comments(f));
        if !has_comments && self.same_line(fields.open, fields.close) {
            match list {
                [] => {
                    self.w("struct{}");
                    return Ok(());
                }
                [f] => {
                    let cells = self.field_cells(*f)?;
                    if !cells.iter().any(|c| c.contains('\n')) {
                        self.w("struct{ ");
                        self.w(&cells.join(" "));
                        self.w(" }");
                        return Ok(());
                    }
                }
                _ => {}
            }
        }

        self.w("struct {");
        self.nl();
        self.indent += 1;
        let mut rows = Vec::new();
        let mut prev_end: Option<Span> = None;
        for &f in list {
            let field = self.arena.fields[f];
            let span = self.arena.fields.span(f);
            let start = field
                .doc
                .map_or(span, |d| self.arena.comment_groups.span(d).to(span));
            if let Some(prev) = prev_end {
                if self.gap(prev, start, 1) > 1 {
                    rows.push(Row::Blank);
                }
            }
            if let Some(doc) = field.doc {
                self.doc_rows(doc, &mut rows);
            }
            rows.push(Row::Cells(self.field_cells(f)?));
            prev_end = Some(
                field
                    .comment
                    .map_or(span, |c| span.to(self.arena.comment_groups.span(c))),
            );
        }
        self.emit_rows(rows);
        self.indent -= 1;
        self.w("}");
        Ok(())
    }

    fn field_cells(&mut self, f: FieldId) -> PResult<Vec<String>> {
        let field = self.arena.fields[f];
        let mut cells = Vec::new();
        if !field.names.is_empty() {
            cells.push(self.render(|p| {
                p.names(field.names);
                Ok(())
            })?);
        }
        cells.push(self.render(|p| p.typ(field.typ))?);
        if let Some(tag) = field.tag {
            cells.push(self.sym(tag.value).to_owned());
        }
        if let Some(c) = field.comment {
            cells.push(self.trailing_comment(c));
        }
        Ok(cells)
    }

    fn interface_type(
        &mut self,
        l_brace: Span,
        elems: ListRef<InterfaceElem>,
        r_brace: Span,
    ) -> PResult {
        let list = self.arena.interface_elems(elems);
        if self.same_line(l_brace, r_brace) {
            match list {
                [] => {
                    self.w("interface{}");
                    return Ok(());
                }
                [elem] => {
                    let text = self.render(|p| p.interface_elem(elem))?;
                    if !text.contains('\n') {
                        self.w("interface{ ");
                        self.w(&text);
                        self.w(" }");
                        return Ok(());
                    }
                }
                _ => {}
            }
        }

        self.w("interface {");
        self.nl();
        self.indent += 1;
        for elem in list {
            self.interface_elem(elem)?;
            self.nl();
        }
        self.indent -= 1;
        self.w("}");
        Ok(())
    }

    fn interface_elem(&mut self, elem: &InterfaceElem) -> PResult {
        match *elem {
            InterfaceElem::Method { name, sig } => {
                self.w(self.sym(name.sym));
                self.signature(sig)
            }
            InterfaceElem::Embed(t) => self.typ(t),
        }
    }
}

fn reduce_depth(depth: i32) -> i32 {
    if depth > 1 {
        depth - 1
    } else {
        depth
    }
}

/// Cell widths for one run of rows, `text/tabwriter` style: a column block
/// is a maximal range of consecutive rows that have a terminated cell in
/// that column. Widths include one space of padding; all-empty columns
/// collapse to nothing.
fn column_widths(rows: &[Vec<String>]) -> Vec<Vec<usize>> {
    let mut widths: Vec<Vec<usize>> = rows
        .iter()
        .map(|r| vec![0; r.len().saturating_sub(1)])
        .collect();
    format_block(rows, &mut widths, 0, rows.len(), 0);
    widths
}

fn format_block(
    rows: &[Vec<String>],
    widths: &mut [Vec<usize>],
    from: usize,
    to: usize,
    col: usize,
) {
    let terminated = |r: &Vec<String>| r.len().saturating_sub(1) > col;
    let mut i = from;
    while i < to {
        if !terminated(&rows[i]) {
            i += 1;
            continue;
        }
        let start = i;
        let mut width = 0;
        while i < to && terminated(&rows[i]) {
            width = width.max(rows[i][col].chars().count());
            i += 1;
        }
        let padded = if width == 0 { 0 } else { width + 1 };
        for w in &mut widths[start..i] {
            w[col] = padded;
        }
        format_block(rows, widths, start, i, col + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_file;
    use crate::positions::clear_positions;

    fn roundtrip(src: &str) -> String {
        let pf = parse_file(src, "t.go").unwrap();
        print_parsed(&pf).unwrap()
    }

    fn cleared(src: &str) -> String {
        let mut pf = parse_file(src, "t.go").unwrap();
        clear_positions(&mut pf.arena, &mut pf.file);
        print_file(&pf.arena, &pf.interner, &pf.file, None).unwrap()
    }

    #[test]
    fn formatted_source_is_a_fixed_point() {
        let src = "package p

import (
	\"fmt\"
	\"os\"
)

// T is a thing.
type T struct {
	ID   int64
	Name string `json:\"name\"`
	x    []byte // raw
}

const (
	A   = 1
	Bee = 2
	C   = 3
)

var zero T

func (t *T) Get(id int64) (*T, error) {
	if t == nil {
		return nil, fmt.Errorf(\"nil %d\", id)
	}
	for i := 0; i < len(t.x); i++ {
		t.x[i] = byte(i*2 + 1)
	}

	switch v := any(t).(type) {
	case *T:
		_ = v
	default:
	}
	return t, nil
}

func Write() { fmt.Fprintln(os.Stdout, zero) }
";
        assert_eq!(roundtrip(src), src);
    }

    #[test]
    fn cleared_positions_expand_bodies() {
        let src = "package p\ntype D struct{}\nfunc (d *D) Empty() {}\nvar x = []int{1, 2}\n";
        assert_eq!(
            cleared(src),
            "package p\n\ntype D struct {\n}\n\nfunc (d *D) Empty() {\n}\n\nvar x = []int{1, 2}\n"
        );
    }

    #[test]
    fn declaration_spacing_follows_kind_and_docs() {
        let src = "package p\nfunc a() {}\nfunc b() {}\n// c does c.\nfunc c() {}\nvar v int\n";
        assert_eq!(
            cleared(src),
            "package p\n\nfunc a() {\n}\nfunc b() {\n}\n\n// c does c.\nfunc c() {\n}\n\nvar v int\n"
        );
    }

    #[test]
    fn binary_spacing_matches_gofmt() {
        let src = "package p\nvar a = x + y*z\nvar b = f(x+y, z)\nvar c = (x + y) * z\nvar d = x[i+1 : j]\n";
        assert_eq!(
            cleared(src),
            "package p\n\nvar a = x + y*z\nvar b = f(x+y, z)\nvar c = (x + y) * z\nvar d = x[i+1 : j]\n"
        );
    }

    #[test]
    fn single_spec_groups_lose_parentheses_after_clearing() {
        let src = "package p\ntype (\n\tA int\n)\nconst (\n\tX = 1\n\tYy = 2\n)\n";
        assert_eq!(
            cleared(src),
            "package p\n\ntype A int\n\nconst (\n\tX  = 1\n\tYy = 2\n)\n"
        );
    }

    #[test]
    fn expanded_literals_align_keys() {
        let src = "package p\n\nvar m = map[string]int{\n\t\"a\":   1,\n\t\"bcd\": 2,\n}\n";
        assert_eq!(roundtrip(src), src);
    }

    #[test]
    fn column_widths_follow_blocks() {
        let rows = vec![
            vec!["ID".to_owned(), "int".to_owned()],
            vec!["Name".to_owned(), "string".to_owned(), "// c".to_owned()],
        ];
        let widths = column_widths(&rows);
        assert_eq!(widths[0], vec![5]);
        assert_eq!(widths[1], vec![5, 7]);
    }

    #[test]
    fn mismatched_spec_is_an_error() {
        let mut pf = parse_file("package p\nvar x int\ntype T int\n", "t.go").unwrap();
        let decls = pf.arena.top_decls(pf.file.decls).to_vec();
        let (TopLevelDecl::Decl(var), TopLevelDecl::Decl(typ)) = (decls[0], decls[1]) else {
            panic!("expected two declarations");
        };
        let specs = pf.arena.decls[typ].specs;
        pf.arena.decls[var].specs = specs;
        let err = print_parsed(&pf).unwrap_err();
        assert_eq!(
            err,
            PrintError::SpecKind {
                spec: "type",
                kind: "var"
            }
        );
    }
}
