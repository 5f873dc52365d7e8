use super::{PResult, Parser};
use crate::ast::{
    CommentGroupId, DeclId, FuncDecl, FuncDeclId, GenDecl, GenDeclKind, ImportName, ImportSpec,
    Receiver, Spec, TypeSpec, ValueSpec,
};
use crate::error::Diag;
use crate::lexer::Tok;

impl<'src, 'l> Parser<'src, 'l> {
    /// `import`, `const`, `type` or `var`, with or without parentheses.
    pub(crate) fn gen_decl(&mut self) -> PResult<DeclId> {
        let start = self.start();
        let doc = self.take_doc(start);
        let kind = match self.tok() {
            Tok::KwImport => GenDeclKind::Import,
            Tok::KwConst => GenDeclKind::Const,
            Tok::KwType => GenDeclKind::Type,
            Tok::KwVar => GenDeclKind::Var,
            _ => return Err(self.unexpected("declaration")),
        };
        let kw_pos = self.bump();

        let (l_paren, specs, r_paren) = match self.eat(Tok::LParen) {
            Some(l_paren) => {
                let mut specs = Vec::new();
                while !self.at(Tok::RParen) && !self.at(Tok::Eof) {
                    let doc = self.take_doc(self.start());
                    specs.push(self.spec(kind, doc)?);
                    self.expect_semi()?;
                }
                let r_paren = self.expect(Tok::RParen)?;
                (Some(l_paren), specs, Some(r_paren))
            }
            None => (None, vec![self.spec(kind, None)?], None),
        };

        let decl = GenDecl {
            doc,
            kw_pos,
            kind,
            l_paren,
            specs: self.arena.list_specs(specs),
            r_paren,
        };
        Ok(self.arena.decls.alloc(decl, self.since(start)))
    }

    fn spec(&mut self, kind: GenDeclKind, doc: Option<CommentGroupId>) -> PResult<Spec> {
        let spec = match kind {
            GenDeclKind::Import => {
                let name = match self.tok() {
                    Tok::Dot => Some(ImportName::Dot(self.bump())),
                    Tok::Ident("_") => Some(ImportName::Blank(self.bump())),
                    Tok::Ident(_) => Some(ImportName::Name(self.ident()?)),
                    _ => None,
                };
                let path = self.string_lit()?;
                Spec::Import(ImportSpec {
                    doc,
                    name,
                    path,
                    comment: None,
                })
            }
            GenDeclKind::Const | GenDeclKind::Var => {
                let names = self.ident_list()?;
                let typ = match self.tok() {
                    Tok::Assign | Tok::Semi | Tok::RParen => None,
                    _ => Some(self.parse_type()?),
                };
                let assign_pos = self.eat(Tok::Assign);
                let values = match assign_pos {
                    Some(_) => self.expr_list()?,
                    None => Vec::new(),
                };
                if kind == GenDeclKind::Var && typ.is_none() && values.is_empty() {
                    return Err(Diag::parse(self.span(), "missing variable type or initialization"));
                }
                Spec::Value(ValueSpec {
                    doc,
                    names: self.arena.list_ident_names(names),
                    typ,
                    assign_pos,
                    values: self.arena.list_exprs(values),
                    comment: None,
                })
            }
            GenDeclKind::Type => {
                let name = self.ident()?;
                let type_params = if self.starts_type_params() {
                    Some(self.type_params()?)
                } else {
                    None
                };
                let assign_pos = self.eat(Tok::Assign);
                let typ = self.parse_type()?;
                Spec::Type(TypeSpec {
                    doc,
                    name,
                    type_params,
                    assign_pos,
                    typ,
                    comment: None,
                })
            }
        };

        let comment = self.take_line_comment(self.prev_end());
        Ok(match spec {
            Spec::Import(s) => Spec::Import(ImportSpec { comment, ..s }),
            Spec::Value(s) => Spec::Value(ValueSpec { comment, ..s }),
            Spec::Type(s) => Spec::Type(TypeSpec { comment, ..s }),
        })
    }

    /// `type T[P any]` versus the array type in `type T [N]int`.
    fn starts_type_params(&self) -> bool {
        self.at(Tok::LBrack)
            && matches!(self.peek(1), Tok::Ident(_))
            && !matches!(self.peek(2), Tok::RBrack)
    }

    pub(crate) fn func_decl(&mut self) -> PResult<FuncDeclId> {
        let start = self.start();
        let doc = self.take_doc(start);
        let func_pos = self.expect(Tok::KwFunc)?;

        let recv = if self.at(Tok::LParen) {
            Some(self.receiver()?)
        } else {
            None
        };
        let name = self.ident()?;
        let type_params = if recv.is_none() && self.at(Tok::LBrack) {
            Some(self.type_params()?)
        } else {
            None
        };
        let signature = self.signature()?;
        let body = if self.at(Tok::LBrace) {
            Some(self.func_body()?)
        } else {
            None
        };

        let func = FuncDecl {
            doc,
            func_pos,
            recv,
            name,
            type_params,
            signature,
            body,
        };
        Ok(self.arena.funcs.alloc(func, self.since(start)))
    }

    fn receiver(&mut self) -> PResult<Receiver> {
        let list = self.parameters()?;
        let fields = self.arena.fields_list(list.fields);
        let [field] = fields else {
            return Err(Diag::parse(list.open.to(list.close), "method has multiple receivers"));
        };
        let field = self.arena.fields[*field];
        let name = self.arena.ident_names(field.names).first().copied();
        Ok(Receiver {
            l_paren: list.open,
            name,
            typ: field.typ,
            r_paren: list.close,
        })
    }
}
