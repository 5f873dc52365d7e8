//! Recursive-descent parser producing the arena tree.
//!
//! The grammar follows the Go specification. Ambiguities are settled the way
//! `go/parser` settles them: composite literals are disabled in control
//! clause headers (`expr_lev < 0`), and a bracket after a type name in a type
//! declaration starts a type parameter list unless it holds a lone constant.

mod decl;
mod expr;
mod stmt;
mod types;

use crate::ast::{
    AstArena, Comment, CommentGroup, CommentGroupId, IdentName, Interner, ParsedFile, SourceFile,
    Span, TopLevelDecl,
};
use crate::error::{Diag, LineIndex, ParseFailure};
use crate::lexer::{Lexer, RawComment, Tok};

pub(crate) type PResult<T> = Result<T, Diag>;

/// Bound on nested expressions, types and blocks.
const MAX_NEST_LEV: u32 = 256;

/// Parses one Go source file.
///
/// The first syntax error stops the parse; lexical errors are reported
/// alongside it.
pub fn parse_file(src: &str, filename: &str) -> Result<ParsedFile, ParseFailure> {
    let lines = LineIndex::new(src);
    let mut lexer = Lexer::new(src);
    let mut toks: Vec<(usize, Tok<'_>, usize)> = lexer.by_ref().collect();
    toks.push((src.len(), Tok::Eof, src.len()));

    let lex_diags = lexer.take_diags();
    if !lex_diags.is_empty() {
        return Err(ParseFailure::new(filename, &lines, lex_diags));
    }

    let raw_comments = lexer.take_comments();
    let mut parser = Parser::new(src, toks, &lines);
    parser.build_comment_groups(&raw_comments);

    match parser.source_file() {
        Ok(file) => Ok(ParsedFile {
            arena: parser.arena,
            interner: parser.interner,
            file,
            lines,
        }),
        Err(diag) => Err(ParseFailure::new(filename, &lines, vec![diag])),
    }
}

/// A comment group plus what attachment needs to know about it.
#[derive(Debug, Clone, Copy)]
struct GroupInfo {
    id: CommentGroupId,
    start: u32,
    end: u32,
    first_line: u32,
    last_line: u32,
    /// Starts on a line after some token (`x := 1 // like this`).
    trailing: bool,
    used: bool,
}

pub(crate) struct Parser<'src, 'l> {
    src: &'src str,
    toks: Vec<(usize, Tok<'src>, usize)>,
    pos: usize,
    lines: &'l LineIndex,
    pub(crate) arena: AstArena,
    pub(crate) interner: Interner,
    groups: Vec<GroupInfo>,
    /// Below zero inside control clause headers, where `T {` opens a block.
    expr_lev: i32,
    nest_lev: u32,
}

impl<'src, 'l> Parser<'src, 'l> {
    fn new(src: &'src str, toks: Vec<(usize, Tok<'src>, usize)>, lines: &'l LineIndex) -> Self {
        Self {
            src,
            toks,
            pos: 0,
            lines,
            arena: AstArena::new(),
            interner: Interner::new(),
            groups: Vec::new(),
            expr_lev: 0,
            nest_lev: 0,
        }
    }

    // -------------------------------------------------------------------------
    // Token cursor
    // -------------------------------------------------------------------------

    #[inline]
    pub(crate) fn tok(&self) -> Tok<'src> {
        self.toks[self.pos].1
    }

    #[inline]
    pub(crate) fn peek(&self, n: usize) -> Tok<'src> {
        self.toks.get(self.pos + n).map_or(Tok::Eof, |t| t.1)
    }

    #[inline]
    pub(crate) fn span(&self) -> Span {
        let (s, _, e) = self.toks[self.pos];
        Span::new(s, e)
    }

    #[inline]
    pub(crate) fn start(&self) -> u32 {
        self.toks[self.pos].0 as u32
    }

    /// End offset of the last consumed token.
    #[inline]
    pub(crate) fn prev_end(&self) -> u32 {
        if self.pos == 0 {
            0
        } else {
            self.toks[self.pos - 1].2 as u32
        }
    }

    /// Span from `start` to the end of the last consumed token.
    #[inline]
    pub(crate) fn since(&self, start: u32) -> Span {
        Span {
            start,
            end: self.prev_end().max(start),
        }
    }

    pub(crate) fn bump(&mut self) -> Span {
        let span = self.span();
        if self.tok() != Tok::Eof {
            self.pos += 1;
        }
        span
    }

    #[inline]
    pub(crate) fn at(&self, t: Tok<'_>) -> bool {
        self.tok() == t
    }

    pub(crate) fn eat(&mut self, t: Tok<'_>) -> Option<Span> {
        if self.at(t) {
            Some(self.bump())
        } else {
            None
        }
    }

    pub(crate) fn expect(&mut self, t: Tok<'_>) -> PResult<Span> {
        if self.at(t) {
            Ok(self.bump())
        } else {
            Err(self.unexpected(&t.to_string()))
        }
    }

    /// Runs `f` one nesting level deeper, failing once the input nests
    /// past `MAX_NEST_LEV`.
    pub(crate) fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        if self.nest_lev >= MAX_NEST_LEV {
            return Err(Diag::parse(self.span(), "exceeded max nesting depth"));
        }
        self.nest_lev += 1;
        let res = f(self);
        self.nest_lev -= 1;
        res
    }

    pub(crate) fn unexpected(&self, expected: &str) -> Diag {
        Diag::parse(self.span(), format!("expected {expected}, found {}", self.tok()))
    }

    /// A statement or declaration ends here. Optional before `)` and `}`.
    pub(crate) fn expect_semi(&mut self) -> PResult<()> {
        match self.tok() {
            Tok::Semi => {
                self.bump();
                Ok(())
            }
            Tok::RParen | Tok::RBrace | Tok::Eof => Ok(()),
            _ => Err(self.unexpected("newline or ';'")),
        }
    }

    pub(crate) fn ident(&mut self) -> PResult<IdentName> {
        match self.tok() {
            Tok::Ident(name) => {
                let pos = self.bump();
                Ok(IdentName::new(self.interner.intern(name), pos))
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    pub(crate) fn ident_list(&mut self) -> PResult<Vec<IdentName>> {
        let mut names = vec![self.ident()?];
        while self.eat(Tok::Comma).is_some() {
            names.push(self.ident()?);
        }
        Ok(names)
    }

    // -------------------------------------------------------------------------
    // Comments
    // -------------------------------------------------------------------------

    /// Whether a real (non-inserted) token lies in `[from, to)`.
    fn token_between(&self, from: u32, to: u32) -> bool {
        let i = self.toks.partition_point(|t| (t.0 as u32) < from);
        self.toks[i..]
            .iter()
            .take_while(|t| (t.0 as u32) < to)
            .any(|t| t.2 > t.0 && t.1 != Tok::Eof)
    }

    /// Whether a real token ends on `line` at or before `offset`.
    fn token_before_on_line(&self, offset: u32, line: u32) -> bool {
        let i = self.toks.partition_point(|t| (t.2 as u32) <= offset);
        self.toks[..i]
            .iter()
            .rev()
            .find(|t| t.2 > t.0)
            .is_some_and(|t| self.lines.line(t.2 as u32 - 1) == line)
    }

    fn build_comment_groups(&mut self, raw: &[RawComment]) {
        let mut runs: Vec<Vec<RawComment>> = Vec::new();
        let mut prev: Option<(RawComment, bool)> = None;

        for &c in raw {
            let line = self.lines.line(c.span.start);
            let trailing = self.token_before_on_line(c.span.start, line);
            let joins = match prev {
                Some((p, p_trailing)) => {
                    let p_last = self.lines.line(p.span.end.saturating_sub(1));
                    let same_line = line == p_last;
                    !self.token_between(p.span.end, c.span.start)
                        && (same_line || (line == p_last + 1 && !p_trailing))
                }
                None => false,
            };
            match runs.last_mut() {
                Some(run) if joins => run.push(c),
                _ => runs.push(vec![c]),
            }
            // a group keeps the trailing flag of its first comment
            prev = Some((c, if joins { prev.is_some_and(|p| p.1) } else { trailing }));
        }

        for run in runs {
            let (Some(first), Some(last)) = (run.first().copied(), run.last().copied()) else {
                continue;
            };
            let mut ids = Vec::with_capacity(run.len());
            for c in &run {
                let text = &self.src[c.span.start as usize..c.span.end as usize];
                let text = self.interner.intern(text.trim_end_matches('\r'));
                ids.push(
                    self.arena
                        .comments
                        .alloc(Comment { kind: c.kind, text }, c.span),
                );
            }
            let comments = self.arena.list_comment_ids(ids);
            let span = first.span.to(last.span);
            let id = self.arena.comment_groups.alloc(CommentGroup { comments }, span);
            let first_line = self.lines.line(first.span.start);
            self.groups.push(GroupInfo {
                id,
                start: span.start,
                end: span.end,
                first_line,
                last_line: self.lines.line(span.end.saturating_sub(1)),
                trailing: self.token_before_on_line(first.span.start, first_line),
                used: false,
            });
        }
    }

    /// Doc comment for a node starting at `start`: the group ending on the line
    /// just above it with nothing in between.
    pub(crate) fn take_doc(&mut self, start: u32) -> Option<CommentGroupId> {
        let line = self.lines.line(start);
        let i = self.groups.partition_point(|g| g.end <= start);
        let g = *self.groups.get(i.checked_sub(1)?)?;
        if g.used || g.trailing || g.last_line + 1 != line || self.token_between(g.end, start) {
            return None;
        }
        self.groups[i - 1].used = true;
        Some(g.id)
    }

    /// Line comment trailing a node that ends at `end`.
    pub(crate) fn take_line_comment(&mut self, end: u32) -> Option<CommentGroupId> {
        let line = self.lines.line(end.saturating_sub(1));
        let i = self.groups.partition_point(|g| g.start < end);
        let g = *self.groups.get(i)?;
        if g.used || !g.trailing || g.first_line != line || self.token_between(end, g.start) {
            return None;
        }
        self.groups[i].used = true;
        Some(g.id)
    }

    // -------------------------------------------------------------------------
    // File
    // -------------------------------------------------------------------------

    fn source_file(&mut self) -> PResult<SourceFile> {
        let doc = self.take_doc(self.start());
        let package_pos = self.expect(Tok::KwPackage)?;
        let name = self.ident()?;
        self.expect_semi()?;

        let mut decls = Vec::new();
        while self.at(Tok::KwImport) {
            decls.push(TopLevelDecl::Decl(self.gen_decl()?));
            self.expect_semi()?;
        }
        while !self.at(Tok::Eof) {
            let decl = match self.tok() {
                Tok::KwConst | Tok::KwType | Tok::KwVar => TopLevelDecl::Decl(self.gen_decl()?),
                Tok::KwFunc => TopLevelDecl::Func(self.func_decl()?),
                Tok::KwImport => {
                    return Err(Diag::parse(
                        self.span(),
                        "imports must appear before other declarations",
                    ))
                }
                _ => return Err(self.unexpected("declaration")),
            };
            decls.push(decl);
            if !self.at(Tok::Eof) {
                self.expect_semi()?;
            }
        }

        let decls = self.arena.list_top_decls(decls);
        let groups: Vec<_> = self.groups.iter().map(|g| g.id).collect();
        let comments = self.arena.list_comment_group_ids(groups);
        Ok(SourceFile {
            doc,
            package_pos,
            name,
            decls,
            comments,
        })
    }
}
