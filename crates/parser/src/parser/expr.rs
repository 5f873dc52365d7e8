use super::{PResult, Parser};
use crate::ast::{
    BasicLit, BasicLitKind, BinaryOp, Block, CallCallee, ChanDir, Element, Expr, ExprId,
    ExprOrType, Key, KeyedElement, LiteralValue, StringLit, Type, TypeId, UnaryOp,
};
use crate::error::Diag;
use crate::lexer::Tok;
use crate::parser_support::expr_to_type;

/// Result of parsing something that may turn out to be a type.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Operand {
    Expr(ExprId),
    Type(TypeId),
}

fn binary_op(tok: Tok<'_>) -> Option<BinaryOp> {
    Some(match tok {
        Tok::LOr => BinaryOp::LOr,
        Tok::LAnd => BinaryOp::LAnd,
        Tok::EqEq => BinaryOp::Eq,
        Tok::NotEq => BinaryOp::NotEq,
        Tok::Lt => BinaryOp::Lt,
        Tok::Le => BinaryOp::LtEq,
        Tok::Gt => BinaryOp::Gt,
        Tok::Ge => BinaryOp::GtEq,
        Tok::Plus => BinaryOp::Add,
        Tok::Minus => BinaryOp::Sub,
        Tok::Pipe => BinaryOp::Or,
        Tok::Caret => BinaryOp::Xor,
        Tok::Star => BinaryOp::Mul,
        Tok::Slash => BinaryOp::Div,
        Tok::Percent => BinaryOp::Rem,
        Tok::Shl => BinaryOp::Shl,
        Tok::Shr => BinaryOp::Shr,
        Tok::Amp => BinaryOp::And,
        Tok::AndNot => BinaryOp::AndNot,
        _ => return None,
    })
}

impl<'src, 'l> Parser<'src, 'l> {
    pub(crate) fn parse_expr(&mut self) -> PResult<ExprId> {
        let x = self.binary_expr(1)?;
        self.operand_expr(x)
    }

    pub(crate) fn expr_list(&mut self) -> PResult<Vec<ExprId>> {
        let mut list = vec![self.parse_expr()?];
        while self.eat(Tok::Comma).is_some() {
            list.push(self.parse_expr()?);
        }
        Ok(list)
    }

    /// Call argument or index operand: `make([]T, n)`, `f[int]`.
    pub(crate) fn type_or_expr(&mut self) -> PResult<ExprOrType> {
        Ok(match self.binary_expr(1)? {
            Operand::Expr(e) => ExprOrType::Expr(e),
            Operand::Type(t) => ExprOrType::Type(t),
        })
    }

    fn operand_expr(&self, x: Operand) -> PResult<ExprId> {
        match x {
            Operand::Expr(e) => Ok(e),
            Operand::Type(t) => Err(Diag::parse(
                self.arena.types.span(t),
                "expected expression, found type",
            )),
        }
    }

    fn binary_expr(&mut self, prec1: u8) -> PResult<Operand> {
        let start = self.start();
        let mut x = self.unary_expr()?;
        while let Some(op) = binary_op(self.tok()) {
            if op.precedence() < prec1 {
                break;
            }
            let op_pos = self.bump();
            let left = self.operand_expr(x)?;
            let right = self.binary_expr(op.precedence() + 1)?;
            let right = self.operand_expr(right)?;
            let node = Expr::Binary {
                left,
                op,
                op_pos,
                right,
            };
            x = Operand::Expr(self.arena.exprs.alloc(node, self.since(start)));
        }
        Ok(x)
    }

    fn unary_expr(&mut self) -> PResult<Operand> {
        self.nested(Self::unary_expr_inner)
    }

    fn unary_expr_inner(&mut self) -> PResult<Operand> {
        let start = self.start();
        let op = match self.tok() {
            Tok::Plus => UnaryOp::Plus,
            Tok::Minus => UnaryOp::Minus,
            Tok::Bang => UnaryOp::Not,
            Tok::Caret => UnaryOp::Xor,
            Tok::Amp => UnaryOp::Addr,
            Tok::Star => UnaryOp::Deref,
            Tok::Arrow => UnaryOp::Recv,
            _ => return self.primary_expr(),
        };
        let op_pos = self.bump();

        if op == UnaryOp::Recv && self.at(Tok::KwChan) {
            // `<-chan T` in expression position, e.g. a conversion
            let chan_pos = self.bump();
            let elem = self.parse_type()?;
            let node = Type::Chan {
                dir: ChanDir::Recv,
                chan_pos,
                arrow_pos: Some(op_pos),
                elem,
            };
            let span = self.since(start);
            let chan = self.arena.types.alloc(node, span);
            return self.primary_suffixes(Operand::Type(chan), start);
        }

        let operand = self.unary_expr()?;
        let node = match (op, operand) {
            (UnaryOp::Deref, Operand::Type(elem)) => {
                let node = Type::Pointer {
                    star_pos: op_pos,
                    elem,
                };
                return Ok(Operand::Type(self.arena.types.alloc(node, self.since(start))));
            }
            (_, operand) => Expr::Unary {
                op,
                op_pos,
                expr: self.operand_expr(operand)?,
            },
        };
        Ok(Operand::Expr(self.arena.exprs.alloc(node, self.since(start))))
    }

    fn primary_expr(&mut self) -> PResult<Operand> {
        let start = self.start();
        let x = self.operand()?;
        self.primary_suffixes(x, start)
    }

    fn primary_suffixes(&mut self, mut x: Operand, start: u32) -> PResult<Operand> {
        loop {
            x = match self.tok() {
                Tok::Dot => self.selector_or_assert(x, start)?,
                Tok::LBrack => self.index_or_slice(x, start)?,
                Tok::LParen => self.call(x, start)?,
                Tok::LBrace if self.is_literal_type(x) => self.composite_lit(x, start)?,
                _ => return Ok(x),
            };
        }
    }

    fn operand(&mut self) -> PResult<Operand> {
        let start = self.start();
        let kind = match self.tok() {
            Tok::IntLit(_) => Some(BasicLitKind::Int),
            Tok::FloatLit(_) => Some(BasicLitKind::Float),
            Tok::ImagLit(_) => Some(BasicLitKind::Imag),
            Tok::RuneLit(_) => Some(BasicLitKind::Rune),
            Tok::StringLit(_) | Tok::RawStringLit(_) => Some(BasicLitKind::String),
            _ => None,
        };
        if let Some(kind) = kind {
            let lit = self.basic_lit(kind);
            return Ok(Operand::Expr(self.arena.exprs.alloc(Expr::BasicLit(lit), lit.pos)));
        }

        match self.tok() {
            Tok::Ident(_) => {
                let name = self.ident()?;
                Ok(Operand::Expr(self.arena.exprs.alloc(Expr::Ident(name), name.pos)))
            }
            Tok::LParen => {
                let l_paren = self.bump();
                self.expr_lev += 1;
                let inner = self.binary_expr(1)?;
                self.expr_lev -= 1;
                let r_paren = self.expect(Tok::RParen)?;
                let span = self.since(start);
                Ok(match inner {
                    Operand::Expr(expr) => Operand::Expr(self.arena.exprs.alloc(
                        Expr::Paren {
                            l_paren,
                            expr,
                            r_paren,
                        },
                        span,
                    )),
                    Operand::Type(typ) => Operand::Type(self.arena.types.alloc(
                        Type::Paren {
                            l_paren,
                            typ,
                            r_paren,
                        },
                        span,
                    )),
                })
            }
            Tok::KwFunc => {
                let func_pos = self.bump();
                let sig = self.signature()?;
                if self.at(Tok::LBrace) {
                    let body = self.func_body()?;
                    let node = Expr::FuncLit {
                        func_pos,
                        sig,
                        body,
                    };
                    Ok(Operand::Expr(self.arena.exprs.alloc(node, self.since(start))))
                } else {
                    let node = Type::Func { func_pos, sig };
                    Ok(Operand::Type(self.arena.types.alloc(node, self.since(start))))
                }
            }
            Tok::LBrack | Tok::KwMap | Tok::KwStruct | Tok::KwChan | Tok::KwInterface => {
                Ok(Operand::Type(self.parse_type()?))
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    pub(crate) fn basic_lit(&mut self, kind: BasicLitKind) -> BasicLit {
        let text = match self.tok() {
            Tok::IntLit(s)
            | Tok::FloatLit(s)
            | Tok::ImagLit(s)
            | Tok::RuneLit(s)
            | Tok::StringLit(s)
            | Tok::RawStringLit(s) => s,
            _ => "",
        };
        let value = self.interner.intern(text);
        let pos = self.bump();
        BasicLit { kind, value, pos }
    }

    pub(crate) fn string_lit(&mut self) -> PResult<StringLit> {
        match self.tok() {
            Tok::StringLit(s) | Tok::RawStringLit(s) => {
                let value = self.interner.intern(s);
                let pos = self.bump();
                Ok(StringLit { value, pos })
            }
            _ => Err(self.unexpected("string literal")),
        }
    }

    fn selector_or_assert(&mut self, x: Operand, start: u32) -> PResult<Operand> {
        let dot_pos = self.bump();
        let expr = self.operand_expr(x)?;
        let node = match self.tok() {
            Tok::Ident(_) => Expr::Selector {
                expr,
                dot_pos,
                sel: self.ident()?,
            },
            Tok::LParen => {
                let l_paren = self.bump();
                let typ = if self.eat(Tok::KwType).is_some() {
                    None
                } else {
                    Some(self.parse_type()?)
                };
                let r_paren = self.expect(Tok::RParen)?;
                Expr::TypeAssert {
                    expr,
                    dot_pos,
                    l_paren,
                    typ,
                    r_paren,
                }
            }
            _ => return Err(self.unexpected("selector or type assertion")),
        };
        Ok(Operand::Expr(self.arena.exprs.alloc(node, self.since(start))))
    }

    fn index_or_slice(&mut self, x: Operand, start: u32) -> PResult<Operand> {
        let expr = self.operand_expr(x)?;
        let l_brack = self.bump();
        self.expr_lev += 1;

        let first = if self.at(Tok::Colon) {
            None
        } else {
            Some(self.type_or_expr()?)
        };

        let node = if self.at(Tok::Colon) {
            let lo = match first {
                None => None,
                Some(ExprOrType::Expr(e)) => Some(e),
                Some(ExprOrType::Type(t)) => {
                    return Err(Diag::parse(self.arena.types.span(t), "expected slice index"))
                }
            };
            self.bump();
            let hi = if self.at(Tok::Colon) || self.at(Tok::RBrack) {
                None
            } else {
                Some(self.parse_expr()?)
            };
            let max = if self.eat(Tok::Colon).is_some() {
                Some(self.parse_expr()?)
            } else {
                None
            };
            self.expr_lev -= 1;
            let r_brack = self.expect(Tok::RBrack)?;
            Expr::Slice {
                expr,
                l_brack,
                lo,
                hi,
                max,
                r_brack,
            }
        } else {
            let mut args: Vec<ExprOrType> = first.into_iter().collect();
            while self.eat(Tok::Comma).is_some() && !self.at(Tok::RBrack) {
                args.push(self.type_or_expr()?);
            }
            self.expr_lev -= 1;
            let r_brack = self.expect(Tok::RBrack)?;
            Expr::Index {
                expr,
                l_brack,
                args: self.arena.list_expr_or_types(args),
                r_brack,
            }
        };
        Ok(Operand::Expr(self.arena.exprs.alloc(node, self.since(start))))
    }

    fn call(&mut self, x: Operand, start: u32) -> PResult<Operand> {
        let callee = match x {
            Operand::Expr(e) => CallCallee::Expr(e),
            Operand::Type(t) => CallCallee::Type(t),
        };
        let l_paren = self.bump();
        self.expr_lev += 1;
        let mut args = Vec::new();
        let mut ellipsis = None;
        while !self.at(Tok::RParen) {
            args.push(self.type_or_expr()?);
            if let Some(pos) = self.eat(Tok::Ellipsis) {
                ellipsis = Some(pos);
            }
            if self.eat(Tok::Comma).is_none() {
                break;
            }
        }
        self.expr_lev -= 1;
        let r_paren = self.expect(Tok::RParen)?;
        let node = Expr::Call {
            callee,
            l_paren,
            args: self.arena.list_expr_or_types(args),
            ellipsis,
            r_paren,
        };
        Ok(Operand::Expr(self.arena.exprs.alloc(node, self.since(start))))
    }

    /// Whether `{` after `x` opens a composite literal.
    fn is_literal_type(&self, x: Operand) -> bool {
        match x {
            Operand::Type(t) => matches!(
                self.arena.types[t],
                Type::Array { .. } | Type::Slice { .. } | Type::Map { .. } | Type::Struct { .. }
            ),
            Operand::Expr(e) => {
                self.expr_lev >= 0
                    && match self.arena.exprs[e] {
                        Expr::Ident(_) => true,
                        Expr::Selector { expr, .. } => {
                            matches!(self.arena.exprs[expr], Expr::Ident(_))
                        }
                        Expr::Index { .. } => true,
                        _ => false,
                    }
            }
        }
    }

    fn composite_lit(&mut self, x: Operand, start: u32) -> PResult<Operand> {
        let typ = match x {
            Operand::Type(t) => t,
            Operand::Expr(e) => expr_to_type(&mut self.arena, e).ok_or_else(|| {
                Diag::parse(self.arena.exprs.span(e), "invalid composite literal type")
            })?,
        };
        let lit = self.literal_value()?;
        let node = Expr::CompositeLit { typ, lit };
        Ok(Operand::Expr(self.arena.exprs.alloc(node, self.since(start))))
    }

    pub(crate) fn literal_value(&mut self) -> PResult<LiteralValue> {
        let l_brace = self.expect(Tok::LBrace)?;
        self.expr_lev += 1;
        let mut elements = Vec::new();
        while !self.at(Tok::RBrace) {
            let first = self.element()?;
            let elem = match self.eat(Tok::Colon) {
                Some(colon_pos) => KeyedElement {
                    key: Some(match first {
                        Element::Expr(e) => Key::Expr(e),
                        Element::Literal(l) => Key::Literal(l),
                    }),
                    colon_pos: Some(colon_pos),
                    value: self.element()?,
                },
                None => KeyedElement {
                    key: None,
                    colon_pos: None,
                    value: first,
                },
            };
            elements.push(elem);
            if self.eat(Tok::Comma).is_none() {
                break;
            }
        }
        self.expr_lev -= 1;
        let r_brace = self.expect(Tok::RBrace)?;
        Ok(LiteralValue {
            l_brace,
            elements: self.arena.list_keyed_elems(elements),
            r_brace,
        })
    }

    fn element(&mut self) -> PResult<Element> {
        if self.at(Tok::LBrace) {
            Ok(Element::Literal(self.nested(Self::literal_value)?))
        } else {
            Ok(Element::Expr(self.parse_expr()?))
        }
    }

    /// Function or function-literal body; composite literals are allowed again.
    pub(crate) fn func_body(&mut self) -> PResult<Block> {
        let saved = std::mem::replace(&mut self.expr_lev, 0);
        let body = self.block();
        self.expr_lev = saved;
        body
    }
}
