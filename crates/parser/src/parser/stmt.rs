use super::{PResult, Parser};
use crate::ast::{
    AssignOp, Block, BranchKind, BranchStmt, CommClause, CommStmt, Expr, ExprId, ForKind,
    IdentName, IncDecOp, RangeLhs, SimpleStmt, SimpleStmtId, Span, Stmt, StmtId, SwitchClause,
    TypeCaseElem, TypeSwitchGuard,
};
use crate::error::Diag;
use crate::lexer::Tok;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Basic,
    LabelOk,
    RangeOk,
}

enum Simple {
    Stmt(SimpleStmtId),
    Range {
        lhs: Option<RangeLhs>,
        range_pos: Span,
        expr: ExprId,
    },
    Label(IdentName, Span),
}

fn assign_op(tok: Tok<'_>) -> Option<AssignOp> {
    Some(match tok {
        Tok::Assign => AssignOp::Assign,
        Tok::AddAssign => AssignOp::AddAssign,
        Tok::SubAssign => AssignOp::SubAssign,
        Tok::MulAssign => AssignOp::MulAssign,
        Tok::DivAssign => AssignOp::DivAssign,
        Tok::ModAssign => AssignOp::RemAssign,
        Tok::AndAssign => AssignOp::AndAssign,
        Tok::OrAssign => AssignOp::OrAssign,
        Tok::XorAssign => AssignOp::XorAssign,
        Tok::ShlAssign => AssignOp::ShlAssign,
        Tok::ShrAssign => AssignOp::ShrAssign,
        Tok::AndNotAssign => AssignOp::AndNotAssign,
        _ => return None,
    })
}

impl<'src, 'l> Parser<'src, 'l> {
    pub(crate) fn block(&mut self) -> PResult<Block> {
        let l_brace = self.expect(Tok::LBrace)?;
        let stmts = self.stmt_list()?;
        let r_brace = self.expect(Tok::RBrace)?;
        Ok(Block {
            l_brace,
            stmts,
            r_brace,
        })
    }

    fn stmt_list(&mut self) -> PResult<crate::ast::ListRef<StmtId>> {
        self.nested(Self::stmt_list_inner)
    }

    fn stmt_list_inner(&mut self) -> PResult<crate::ast::ListRef<StmtId>> {
        let mut stmts = Vec::new();
        loop {
            match self.tok() {
                Tok::RBrace | Tok::KwCase | Tok::KwDefault | Tok::Eof => break,
                Tok::Semi => {
                    self.bump();
                }
                _ => {
                    stmts.push(self.stmt()?);
                    self.expect_semi()?;
                }
            }
        }
        Ok(self.arena.list_stmts(stmts))
    }

    fn stmt(&mut self) -> PResult<StmtId> {
        let start = self.start();
        let node = match self.tok() {
            Tok::KwConst | Tok::KwType | Tok::KwVar => Stmt::Decl(self.gen_decl()?),
            Tok::KwGo => Stmt::Go {
                go_pos: self.bump(),
                call: self.parse_expr()?,
            },
            Tok::KwDefer => Stmt::Defer {
                defer_pos: self.bump(),
                call: self.parse_expr()?,
            },
            Tok::KwReturn => {
                let return_pos = self.bump();
                let results = if self.at(Tok::Semi) || self.at(Tok::RBrace) {
                    Vec::new()
                } else {
                    self.expr_list()?
                };
                Stmt::Return {
                    return_pos,
                    results: self.arena.list_exprs(results),
                }
            }
            Tok::KwBreak | Tok::KwContinue | Tok::KwGoto | Tok::KwFallthrough => {
                let kind = match self.tok() {
                    Tok::KwBreak => BranchKind::Break,
                    Tok::KwContinue => BranchKind::Continue,
                    Tok::KwGoto => BranchKind::Goto,
                    _ => BranchKind::Fallthrough,
                };
                let pos = self.bump();
                let label = match (kind, self.tok()) {
                    (BranchKind::Fallthrough, _) => None,
                    (_, Tok::Ident(_)) => Some(self.ident()?),
                    _ => None,
                };
                Stmt::Branch(BranchStmt { kind, pos, label })
            }
            Tok::LBrace => Stmt::Block(self.block()?),
            Tok::KwIf => return self.if_stmt(),
            Tok::KwFor => self.for_stmt()?,
            Tok::KwSwitch => self.switch_stmt()?,
            Tok::KwSelect => self.select_stmt()?,
            _ => match self.simple_stmt(Mode::LabelOk)? {
                Simple::Stmt(id) => Stmt::Simple(id),
                Simple::Label(label, colon_pos) => {
                    let stmt = if self.at(Tok::RBrace) {
                        let at = self.start() as usize;
                        self.arena.stmts.alloc(Stmt::Empty(Span::empty_at(at)), Span::empty_at(at))
                    } else {
                        self.nested(Self::stmt)?
                    };
                    Stmt::Labeled {
                        label,
                        colon_pos,
                        stmt,
                    }
                }
                Simple::Range { range_pos, .. } => {
                    return Err(Diag::parse(range_pos, "unexpected range"))
                }
            },
        };
        Ok(self.arena.stmts.alloc(node, self.since(start)))
    }

    fn idents_of(&self, exprs: &[ExprId]) -> PResult<Vec<IdentName>> {
        exprs
            .iter()
            .map(|&e| match self.arena.exprs[e] {
                Expr::Ident(name) => Ok(name),
                _ => Err(Diag::parse(
                    self.arena.exprs.span(e),
                    "non-name on left side of :=",
                )),
            })
            .collect()
    }

    fn simple_stmt(&mut self, mode: Mode) -> PResult<Simple> {
        let start = self.start();
        if mode == Mode::RangeOk && self.at(Tok::KwRange) {
            let range_pos = self.bump();
            return Ok(Simple::Range {
                lhs: None,
                range_pos,
                expr: self.parse_expr()?,
            });
        }

        let lhs = self.expr_list()?;
        let node = match self.tok() {
            Tok::Define => {
                let op_pos = self.bump();
                if mode == Mode::RangeOk && self.at(Tok::KwRange) {
                    let names = self.idents_of(&lhs)?;
                    let range_pos = self.bump();
                    return Ok(Simple::Range {
                        lhs: Some(RangeLhs::Define {
                            names: self.arena.list_ident_names(names),
                            op_pos,
                        }),
                        range_pos,
                        expr: self.parse_expr()?,
                    });
                }
                let names = self.idents_of(&lhs)?;
                let values = self.expr_list()?;
                SimpleStmt::ShortVarDecl {
                    names: self.arena.list_ident_names(names),
                    op_pos,
                    values: self.arena.list_exprs(values),
                }
            }
            tok if assign_op(tok).is_some() => {
                let op = assign_op(tok).unwrap_or(AssignOp::Assign);
                let op_pos = self.bump();
                if mode == Mode::RangeOk && op == AssignOp::Assign && self.at(Tok::KwRange) {
                    let range_pos = self.bump();
                    return Ok(Simple::Range {
                        lhs: Some(RangeLhs::Assign {
                            exprs: self.arena.list_exprs(lhs),
                            op_pos,
                        }),
                        range_pos,
                        expr: self.parse_expr()?,
                    });
                }
                let rhs = self.expr_list()?;
                SimpleStmt::Assign {
                    lhs: self.arena.list_exprs(lhs),
                    op,
                    op_pos,
                    rhs: self.arena.list_exprs(rhs),
                }
            }
            Tok::Colon if mode == Mode::LabelOk && lhs.len() == 1 => {
                let Expr::Ident(label) = self.arena.exprs[lhs[0]] else {
                    return Err(self.unexpected("label"));
                };
                return Ok(Simple::Label(label, self.bump()));
            }
            Tok::Arrow if lhs.len() == 1 => {
                let arrow_pos = self.bump();
                SimpleStmt::Send {
                    chan: lhs[0],
                    arrow_pos,
                    value: self.parse_expr()?,
                }
            }
            Tok::Inc | Tok::Dec if lhs.len() == 1 => {
                let op = if self.at(Tok::Inc) {
                    IncDecOp::Inc
                } else {
                    IncDecOp::Dec
                };
                SimpleStmt::IncDec {
                    expr: lhs[0],
                    op,
                    op_pos: self.bump(),
                }
            }
            _ if lhs.len() == 1 => SimpleStmt::Expr(lhs[0]),
            _ => return Err(self.unexpected("':=' or '='")),
        };
        Ok(Simple::Stmt(self.arena.simple_stmts.alloc(node, self.since(start))))
    }

    fn simple_stmt_id(&mut self) -> PResult<SimpleStmtId> {
        match self.simple_stmt(Mode::Basic)? {
            Simple::Stmt(id) => Ok(id),
            _ => Err(self.unexpected("simple statement")),
        }
    }

    fn cond_of(&self, stmt: Option<SimpleStmtId>) -> PResult<ExprId> {
        let Some(id) = stmt else {
            return Err(self.unexpected("condition"));
        };
        match self.arena.simple_stmts[id] {
            SimpleStmt::Expr(e) => Ok(e),
            _ => Err(Diag::parse(
                self.arena.simple_stmts.span(id),
                "expected boolean expression",
            )),
        }
    }

    /// Header of `if` / `switch`: `[init;] x`, parsed with composite literals off.
    fn control_header(&mut self) -> PResult<(Option<SimpleStmtId>, Option<SimpleStmtId>)> {
        let saved = std::mem::replace(&mut self.expr_lev, -1);
        let header = self.control_header_inner();
        self.expr_lev = saved;
        header
    }

    fn control_header_inner(&mut self) -> PResult<(Option<SimpleStmtId>, Option<SimpleStmtId>)> {
        if self.at(Tok::LBrace) {
            return Ok((None, None));
        }
        let first = if self.at(Tok::Semi) {
            None
        } else {
            Some(self.simple_stmt_id()?)
        };
        if self.eat(Tok::Semi).is_none() {
            return Ok((None, first));
        }
        let second = if self.at(Tok::LBrace) {
            None
        } else {
            Some(self.simple_stmt_id()?)
        };
        Ok((first, second))
    }

    fn if_stmt(&mut self) -> PResult<StmtId> {
        let start = self.start();
        let if_pos = self.expect(Tok::KwIf)?;
        if self.at(Tok::LBrace) {
            return Err(Diag::parse(self.span(), "missing condition in if statement"));
        }
        let (init, cond) = self.control_header()?;
        let cond = self.cond_of(cond)?;
        let then_block = self.block()?;
        let else_stmt = if self.eat(Tok::KwElse).is_some() {
            match self.tok() {
                Tok::KwIf => Some(self.nested(Self::if_stmt)?),
                Tok::LBrace => {
                    let block_start = self.start();
                    let block = self.block()?;
                    Some(self.arena.stmts.alloc(Stmt::Block(block), self.since(block_start)))
                }
                _ => return Err(self.unexpected("if statement or block")),
            }
        } else {
            None
        };
        let node = Stmt::If {
            if_pos,
            init,
            cond,
            then_block,
            else_stmt,
        };
        Ok(self.arena.stmts.alloc(node, self.since(start)))
    }

    fn for_stmt(&mut self) -> PResult<Stmt> {
        let for_pos = self.bump();
        let saved = std::mem::replace(&mut self.expr_lev, -1);
        let kind = self.for_header();
        self.expr_lev = saved;
        let kind = kind?;
        let body = self.block()?;
        Ok(Stmt::For {
            for_pos,
            kind,
            body,
        })
    }

    fn for_header(&mut self) -> PResult<ForKind> {
        if self.at(Tok::LBrace) {
            return Ok(ForKind::Infinite);
        }
        let first = if self.at(Tok::Semi) {
            None
        } else {
            match self.simple_stmt(Mode::RangeOk)? {
                Simple::Range {
                    lhs,
                    range_pos,
                    expr,
                } => {
                    return Ok(ForKind::Range {
                        lhs,
                        range_pos,
                        expr,
                    })
                }
                Simple::Stmt(id) => Some(id),
                Simple::Label(_, colon) => return Err(Diag::parse(colon, "unexpected ':'")),
            }
        };
        if self.eat(Tok::Semi).is_none() {
            return Ok(ForKind::Cond(self.cond_of(first)?));
        }
        let cond = if self.at(Tok::Semi) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(Tok::Semi)?;
        let post = if self.at(Tok::LBrace) {
            None
        } else {
            Some(self.simple_stmt_id()?)
        };
        Ok(ForKind::Clause {
            init: first,
            cond,
            post,
        })
    }

    /// `x.(type)` or `v := x.(type)` as a switch tag.
    fn type_switch_guard(&self, tag: SimpleStmtId) -> Option<TypeSwitchGuard> {
        let assert = |e: ExprId| match self.arena.exprs[e] {
            Expr::TypeAssert {
                expr,
                dot_pos,
                l_paren,
                typ: None,
                r_paren,
            } => Some((expr, dot_pos, l_paren, r_paren)),
            _ => None,
        };
        let (bind, define_pos, (expr, dot_pos, l_paren, r_paren)) = match self.arena.simple_stmts[tag]
        {
            SimpleStmt::Expr(e) => (None, None, assert(e)?),
            SimpleStmt::ShortVarDecl {
                names,
                op_pos,
                values,
            } if names.len() == 1 && values.len() == 1 => {
                let name = self.arena.ident_names(names)[0];
                let value = self.arena.exprs_list(values)[0];
                (Some(name), Some(op_pos), assert(value)?)
            }
            _ => return None,
        };
        Some(TypeSwitchGuard {
            bind,
            define_pos,
            expr,
            dot_pos,
            l_paren,
            r_paren,
        })
    }

    fn switch_stmt(&mut self) -> PResult<Stmt> {
        let switch_pos = self.bump();
        let (init, tag) = self.control_header()?;
        let guard = tag.and_then(|t| self.type_switch_guard(t));

        let l_brace = self.expect(Tok::LBrace)?;
        let mut clauses = Vec::new();
        while self.at(Tok::KwCase) || self.at(Tok::KwDefault) {
            let start = self.start();
            let is_case = self.at(Tok::KwCase);
            let case_pos = self.bump();
            let clause = if guard.is_some() {
                let mut items = Vec::new();
                if is_case {
                    loop {
                        items.push(match self.tok() {
                            Tok::Ident("nil") => TypeCaseElem::Nil(self.bump()),
                            _ => TypeCaseElem::Type(self.parse_type()?),
                        });
                        if self.eat(Tok::Comma).is_none() {
                            break;
                        }
                    }
                }
                let colon_pos = self.expect(Tok::Colon)?;
                SwitchClause::Type {
                    case_pos,
                    items: self.arena.list_type_cases(items),
                    colon_pos,
                    stmts: self.stmt_list()?,
                }
            } else {
                let items = if is_case {
                    self.expr_list()?
                } else {
                    Vec::new()
                };
                let colon_pos = self.expect(Tok::Colon)?;
                SwitchClause::Expr {
                    case_pos,
                    items: self.arena.list_exprs(items),
                    colon_pos,
                    stmts: self.stmt_list()?,
                }
            };
            clauses.push(self.arena.switch_clauses.alloc(clause, self.since(start)));
        }
        let r_brace = self.expect(Tok::RBrace)?;
        let clauses = self.arena.list_switch_clause_ids(clauses);

        Ok(match guard {
            Some(guard) => Stmt::TypeSwitch {
                switch_pos,
                init,
                guard,
                l_brace,
                clauses,
                r_brace,
            },
            None => Stmt::Switch {
                switch_pos,
                init,
                tag: tag.map(|t| self.cond_of(Some(t))).transpose()?,
                l_brace,
                clauses,
                r_brace,
            },
        })
    }

    fn select_stmt(&mut self) -> PResult<Stmt> {
        let select_pos = self.bump();
        let l_brace = self.expect(Tok::LBrace)?;
        let mut clauses = Vec::new();
        while self.at(Tok::KwCase) || self.at(Tok::KwDefault) {
            let start = self.start();
            let clause = if self.at(Tok::KwDefault) {
                let default_pos = self.bump();
                let colon_pos = self.expect(Tok::Colon)?;
                CommClause::Default {
                    default_pos,
                    colon_pos,
                    stmts: self.stmt_list()?,
                }
            } else {
                let case_pos = self.bump();
                let comm = self.comm_stmt()?;
                let colon_pos = self.expect(Tok::Colon)?;
                CommClause::Case {
                    case_pos,
                    comm,
                    colon_pos,
                    stmts: self.stmt_list()?,
                }
            };
            clauses.push(self.arena.comm_clauses.alloc(clause, self.since(start)));
        }
        let r_brace = self.expect(Tok::RBrace)?;
        Ok(Stmt::Select {
            select_pos,
            l_brace,
            clauses: self.arena.list_comm_clause_ids(clauses),
            r_brace,
        })
    }

    fn comm_stmt(&mut self) -> PResult<CommStmt> {
        let id = self.simple_stmt_id()?;
        let span = self.arena.simple_stmts.span(id);
        let single = |list: &[ExprId]| match list {
            [e] => Ok(*e),
            _ => Err(Diag::parse(span, "select case must be a single receive")),
        };
        Ok(match self.arena.simple_stmts[id] {
            SimpleStmt::Send {
                chan,
                arrow_pos,
                value,
            } => CommStmt::Send {
                chan,
                arrow_pos,
                value,
            },
            SimpleStmt::Expr(expr) => CommStmt::Recv { lhs: None, expr },
            SimpleStmt::ShortVarDecl {
                names,
                op_pos,
                values,
            } => CommStmt::Recv {
                lhs: Some(RangeLhs::Define { names, op_pos }),
                expr: single(self.arena.exprs_list(values))?,
            },
            SimpleStmt::Assign {
                lhs,
                op: AssignOp::Assign,
                op_pos,
                rhs,
            } => CommStmt::Recv {
                lhs: Some(RangeLhs::Assign { exprs: lhs, op_pos }),
                expr: single(self.arena.exprs_list(rhs))?,
            },
            _ => return Err(Diag::parse(span, "select case must be receive or send")),
        })
    }
}
