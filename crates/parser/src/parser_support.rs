use crate::ast::{self, Span};

/// One comma-separated entry of a parameter list before grouping.
///
/// `typ == None` means the entry was a lone identifier whose role (name or
/// type) depends on the entries after it.
#[derive(Clone, Debug)]
pub struct ParamDecl {
    pub names: Vec<ast::IdentName>,
    pub ellipsis_pos: Option<Span>,
    pub typ: Option<ast::TypeId>,
    pub span: Span,
}

/// Groups `(a, b int, c string)` into fields; a list of bare identifiers
/// such as `(int, string)` is a list of unnamed parameter types.
pub fn resolve_param_list(arena: &mut ast::AstArena, params: Vec<ParamDecl>) -> Vec<ast::FieldId> {
    let mut out = Vec::new();
    let mut pending_names: Vec<ast::IdentName> = Vec::new();
    let mut pending_start: Option<u32> = None;

    for param in params {
        if let Some(typ) = param.typ {
            let mut names = std::mem::take(&mut pending_names);
            names.extend(param.names);

            let names = if names.is_empty() {
                ast::ListRef::EMPTY
            } else {
                arena.list_ident_names(names)
            };
            let start = pending_start.take().unwrap_or(param.span.start);
            let field = ast::Field {
                doc: None,
                names,
                ellipsis_pos: param.ellipsis_pos,
                typ,
                tag: None,
                comment: None,
            };
            out.push(arena.fields.alloc(
                field,
                Span {
                    start,
                    end: param.span.end,
                },
            ));
        } else {
            if pending_names.is_empty() {
                pending_start = Some(param.span.start);
            }
            pending_names.extend(param.names);
        }
    }

    for name in pending_names {
        let typ = named_type_from_ident(arena, None, name);
        let field = ast::Field {
            doc: None,
            names: ast::ListRef::EMPTY,
            ellipsis_pos: None,
            typ,
            tag: None,
            comment: None,
        };
        out.push(arena.fields.alloc(field, name.pos));
    }

    out
}

pub fn named_type_from_ident(
    arena: &mut ast::AstArena,
    pkg: Option<ast::IdentName>,
    name: ast::IdentName,
) -> ast::TypeId {
    let span = pkg.map_or(name.pos, |p| p.pos.to(name.pos));
    arena.types.alloc(
        ast::Type::Named {
            pkg,
            name,
            l_brack: None,
            args: ast::ListRef::EMPTY,
            r_brack: None,
        },
        span,
    )
}

/// Reinterprets an expression that was parsed before it was known to be a
/// type: `T`, `pkg.T`, `T[A, B]`, `*T`, `(T)`.
pub fn expr_to_type(arena: &mut ast::AstArena, expr: ast::ExprId) -> Option<ast::TypeId> {
    let span = arena.exprs.span(expr);
    let node = match arena.exprs[expr] {
        ast::Expr::Ident(name) => return Some(named_type_from_ident(arena, None, name)),
        ast::Expr::Selector { expr: base, sel, .. } => match arena.exprs[base] {
            ast::Expr::Ident(pkg) => return Some(named_type_from_ident(arena, Some(pkg), sel)),
            _ => return None,
        },
        ast::Expr::Index {
            expr: base,
            l_brack,
            args,
            r_brack,
        } => {
            let (pkg, name) = match arena.exprs[base] {
                ast::Expr::Ident(name) => (None, name),
                ast::Expr::Selector { expr: inner, sel, .. } => match arena.exprs[inner] {
                    ast::Expr::Ident(pkg) => (Some(pkg), sel),
                    _ => return None,
                },
                _ => return None,
            };
            let mut types = Vec::with_capacity(args.len() as usize);
            for i in 0..args.len() as usize {
                let arg = arena.expr_or_types(args)[i];
                types.push(match arg {
                    ast::ExprOrType::Type(t) => t,
                    ast::ExprOrType::Expr(e) => expr_to_type(arena, e)?,
                });
            }
            let args = arena.list_types(types);
            ast::Type::Named {
                pkg,
                name,
                l_brack: Some(l_brack),
                args,
                r_brack: Some(r_brack),
            }
        }
        ast::Expr::Unary {
            op: ast::UnaryOp::Deref,
            op_pos,
            expr: inner,
        } => ast::Type::Pointer {
            star_pos: op_pos,
            elem: expr_to_type(arena, inner)?,
        },
        ast::Expr::Paren {
            l_paren,
            expr: inner,
            r_paren,
        } => ast::Type::Paren {
            l_paren,
            typ: expr_to_type(arena, inner)?,
            r_paren,
        },
        _ => return None,
    };
    Some(arena.types.alloc(node, span))
}
