use super::{PResult, Parser};
use crate::ast::{
    ArrayLen, ChanDir, Field, FieldList, InterfaceElem, Results, Signature, SignatureId, Type,
    TypeId, TypeParamDecl, TypeParams, TypeParamsId, TypeTerm,
};
use crate::lexer::Tok;
use crate::parser_support::{resolve_param_list, ParamDecl};

impl<'src, 'l> Parser<'src, 'l> {
    pub(crate) fn parse_type(&mut self) -> PResult<TypeId> {
        self.nested(Self::parse_type_inner)
    }

    fn parse_type_inner(&mut self) -> PResult<TypeId> {
        let start = self.start();
        let node = match self.tok() {
            Tok::Ident(_) => return self.type_name(),
            Tok::Star => {
                let star_pos = self.bump();
                Type::Pointer {
                    star_pos,
                    elem: self.parse_type()?,
                }
            }
            Tok::LBrack => {
                let l_brack = self.bump();
                if self.at(Tok::RBrack) {
                    let r_brack = self.bump();
                    Type::Slice {
                        l_brack,
                        r_brack,
                        elem: self.parse_type()?,
                    }
                } else {
                    let len = if self.at(Tok::Ellipsis) && self.peek(1) == Tok::RBrack {
                        ArrayLen::Ellipsis(self.bump())
                    } else {
                        self.expr_lev += 1;
                        let len = self.parse_expr();
                        self.expr_lev -= 1;
                        ArrayLen::Expr(len?)
                    };
                    let r_brack = self.expect(Tok::RBrack)?;
                    Type::Array {
                        l_brack,
                        len,
                        r_brack,
                        elem: self.parse_type()?,
                    }
                }
            }
            Tok::KwMap => {
                let map_pos = self.bump();
                let l_brack = self.expect(Tok::LBrack)?;
                let key = self.parse_type()?;
                let r_brack = self.expect(Tok::RBrack)?;
                Type::Map {
                    map_pos,
                    l_brack,
                    key,
                    r_brack,
                    value: self.parse_type()?,
                }
            }
            Tok::KwChan => {
                let chan_pos = self.bump();
                let arrow_pos = self.eat(Tok::Arrow);
                Type::Chan {
                    dir: if arrow_pos.is_some() {
                        ChanDir::Send
                    } else {
                        ChanDir::Both
                    },
                    chan_pos,
                    arrow_pos,
                    elem: self.parse_type()?,
                }
            }
            Tok::Arrow => {
                let arrow_pos = self.bump();
                let chan_pos = self.expect(Tok::KwChan)?;
                Type::Chan {
                    dir: ChanDir::Recv,
                    chan_pos,
                    arrow_pos: Some(arrow_pos),
                    elem: self.parse_type()?,
                }
            }
            Tok::KwStruct => self.struct_type()?,
            Tok::KwInterface => self.interface_type()?,
            Tok::KwFunc => {
                let func_pos = self.bump();
                Type::Func {
                    func_pos,
                    sig: self.signature()?,
                }
            }
            Tok::LParen => {
                let l_paren = self.bump();
                let typ = self.parse_type()?;
                Type::Paren {
                    l_paren,
                    typ,
                    r_paren: self.expect(Tok::RParen)?,
                }
            }
            _ => return Err(self.unexpected("type")),
        };
        Ok(self.arena.types.alloc(node, self.since(start)))
    }

    /// `T`, `pkg.T`, optionally instantiated: `T[int]`.
    pub(crate) fn type_name(&mut self) -> PResult<TypeId> {
        let start = self.start();
        let first = self.ident()?;
        let (pkg, name) = if self.eat(Tok::Dot).is_some() {
            (Some(first), self.ident()?)
        } else {
            (None, first)
        };

        let (l_brack, args, r_brack) = if self.at(Tok::LBrack) {
            let l = self.bump();
            let mut args = vec![self.parse_type()?];
            while self.eat(Tok::Comma).is_some() && !self.at(Tok::RBrack) {
                args.push(self.parse_type()?);
            }
            let r = self.expect(Tok::RBrack)?;
            (Some(l), self.arena.list_types(args), Some(r))
        } else {
            (None, Default::default(), None)
        };

        let node = Type::Named {
            pkg,
            name,
            l_brack,
            args,
            r_brack,
        };
        Ok(self.arena.types.alloc(node, self.since(start)))
    }

    /// Type constraint or interface type element: `~int | string`.
    pub(crate) fn constraint(&mut self) -> PResult<TypeId> {
        let start = self.start();
        let mut terms = Vec::new();
        loop {
            let tilde = self.eat(Tok::Tilde);
            let typ = self.parse_type()?;
            terms.push(TypeTerm { tilde, typ });
            if self.eat(Tok::Pipe).is_none() {
                break;
            }
        }
        if let [TypeTerm { tilde: None, typ }] = terms[..] {
            return Ok(typ);
        }
        let terms = self.arena.list_type_terms(terms);
        Ok(self.arena.types.alloc(Type::Union { terms }, self.since(start)))
    }

    pub(crate) fn type_params(&mut self) -> PResult<TypeParamsId> {
        let start = self.start();
        let l_brack = self.expect(Tok::LBrack)?;
        let mut decls = Vec::new();
        while !self.at(Tok::RBrack) {
            let decl_start = self.start();
            let names = self.ident_list()?;
            let constraint = self.constraint()?;
            let names = self.arena.list_ident_names(names);
            let decl = TypeParamDecl { names, constraint };
            decls.push(self.arena.type_param_decls.alloc(decl, self.since(decl_start)));
            if self.eat(Tok::Comma).is_none() {
                break;
            }
        }
        let r_brack = self.expect(Tok::RBrack)?;
        let params = self.arena.list_type_param_decl_ids(decls);
        let node = TypeParams {
            l_brack,
            params,
            r_brack,
        };
        Ok(self.arena.type_params.alloc(node, self.since(start)))
    }

    pub(crate) fn signature(&mut self) -> PResult<SignatureId> {
        let start = self.start();
        let params = self.parameters()?;
        let results = match self.tok() {
            Tok::LParen => Some(Results::Params(self.parameters()?)),
            Tok::Ident(_)
            | Tok::LBrack
            | Tok::Star
            | Tok::KwStruct
            | Tok::KwMap
            | Tok::KwChan
            | Tok::KwFunc
            | Tok::KwInterface
            | Tok::Arrow => Some(Results::Type(self.parse_type()?)),
            _ => None,
        };
        let sig = Signature { params, results };
        Ok(self.arena.signatures.alloc(sig, self.since(start)))
    }

    pub(crate) fn parameters(&mut self) -> PResult<FieldList> {
        let open = self.expect(Tok::LParen)?;
        let mut params = Vec::new();
        while !self.at(Tok::RParen) {
            let start = self.start();
            let mut decl = ParamDecl {
                names: Vec::new(),
                ellipsis_pos: None,
                typ: None,
                span: Default::default(),
            };
            match (self.tok(), self.peek(1)) {
                (Tok::Ident(_), Tok::Comma | Tok::RParen) => decl.names.push(self.ident()?),
                (Tok::Ident(_), Tok::Dot) => decl.typ = Some(self.parse_type()?),
                (Tok::Ident(_), _) => {
                    decl.names.push(self.ident()?);
                    decl.ellipsis_pos = self.eat(Tok::Ellipsis);
                    decl.typ = Some(self.parse_type()?);
                }
                _ => {
                    decl.ellipsis_pos = self.eat(Tok::Ellipsis);
                    decl.typ = Some(self.parse_type()?);
                }
            }
            decl.span = self.since(start);
            params.push(decl);
            if self.eat(Tok::Comma).is_none() {
                break;
            }
        }
        let close = self.expect(Tok::RParen)?;
        let fields = resolve_param_list(&mut self.arena, params);
        Ok(FieldList {
            open,
            fields: self.arena.list_fields(fields),
            close,
        })
    }

    fn struct_type(&mut self) -> PResult<Type> {
        let struct_pos = self.bump();
        let open = self.expect(Tok::LBrace)?;
        let mut fields = Vec::new();
        while !self.at(Tok::RBrace) && !self.at(Tok::Eof) {
            fields.push(self.field_decl()?);
            self.expect_semi()?;
        }
        let close = self.expect(Tok::RBrace)?;
        Ok(Type::Struct {
            struct_pos,
            fields: FieldList {
                open,
                fields: self.arena.list_fields(fields),
                close,
            },
        })
    }

    fn field_decl(&mut self) -> PResult<crate::ast::FieldId> {
        let start = self.start();
        let doc = self.take_doc(start);
        let (names, typ) = match (self.tok(), self.peek(1)) {
            (
                Tok::Ident(_),
                Tok::Dot | Tok::Semi | Tok::RBrace | Tok::StringLit(_) | Tok::RawStringLit(_),
            ) => (Vec::new(), self.type_name()?),
            (Tok::Ident(_), _) => {
                let names = self.ident_list()?;
                (names, self.parse_type()?)
            }
            (Tok::Star, _) => (Vec::new(), self.parse_type()?),
            _ => return Err(self.unexpected("field name or embedded type")),
        };
        let tag = match self.tok() {
            Tok::StringLit(_) | Tok::RawStringLit(_) => Some(self.string_lit()?),
            _ => None,
        };
        let comment = self.take_line_comment(self.prev_end());
        let names = if names.is_empty() {
            Default::default()
        } else {
            self.arena.list_ident_names(names)
        };
        let field = Field {
            doc,
            names,
            ellipsis_pos: None,
            typ,
            tag,
            comment,
        };
        Ok(self.arena.fields.alloc(field, self.since(start)))
    }

    fn interface_type(&mut self) -> PResult<Type> {
        let interface_pos = self.bump();
        let l_brace = self.expect(Tok::LBrace)?;
        let mut elems = Vec::new();
        while !self.at(Tok::RBrace) && !self.at(Tok::Eof) {
            let elem = match (self.tok(), self.peek(1)) {
                (Tok::Ident(_), Tok::LParen) => {
                    let name = self.ident()?;
                    InterfaceElem::Method {
                        name,
                        sig: self.signature()?,
                    }
                }
                _ => InterfaceElem::Embed(self.constraint()?),
            };
            elems.push(elem);
            self.expect_semi()?;
        }
        let r_brace = self.expect(Tok::RBrace)?;
        Ok(Type::Interface {
            interface_pos,
            l_brace,
            elems: self.arena.list_interface_elems(elems),
            r_brace,
        })
    }
}
