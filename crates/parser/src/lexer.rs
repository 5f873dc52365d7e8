use crate::ast::{CommentKind, Span};
use crate::error::{Diag, LexError, LexErrorKind};
use logos::{Lexer as LogosLexer, Logos};
use std::ops::Range;

// =============================================================================
// 1. Scanners for tokens logos cannot express as a single regex
// =============================================================================

#[inline(always)]
fn first_newline_offset(s: &str) -> Option<usize> {
    memchr::memchr2(b'\n', b'\r', s.as_bytes())
}

#[inline]
fn lex_block_comment(lex: &mut LogosLexer<'_, RawTok>) -> Result<(), LexErrorKind> {
    let rem = lex.remainder().as_bytes();
    let mut search_start = 0;

    while let Some(star) = memchr::memchr(b'*', &rem[search_start..]) {
        let at = search_start + star;
        if rem.get(at + 1) == Some(&b'/') {
            lex.bump(at + 2);
            return Ok(());
        }
        search_start = at + 1;
    }

    lex.bump(rem.len());
    Err(LexErrorKind::UnterminatedComment)
}

/// Maximal munch over the rest of a numeric literal.
///
/// Only the shape is checked (prefix, digits, fraction, exponent, `i` suffix);
/// digit validity per base is left to the Go compiler.
fn lex_number(lex: &mut LogosLexer<'_, RawTok>) -> Result<(), LexErrorKind> {
    let head = lex.slice().as_bytes();
    let rem = lex.remainder().as_bytes();
    let mut i = 0;
    let mut hex = false;
    let mut exponent: &[u8] = b"eE";

    if head == b"0" {
        match rem.first() {
            Some(b'x' | b'X') => {
                hex = true;
                exponent = b"pP";
                i = 1;
            }
            Some(b'o' | b'O' | b'b' | b'B') => {
                exponent = b"";
                i = 1;
            }
            _ => {}
        }
    }

    let is_digit = |b: u8| b == b'_' || b.is_ascii_digit() || (hex && b.is_ascii_hexdigit());
    let munch = |mut i: usize| {
        while i < rem.len() && is_digit(rem[i]) {
            i += 1;
        }
        i
    };

    i = munch(i);
    if head[0] != b'.' && !exponent.is_empty() && rem.get(i) == Some(&b'.') {
        i = munch(i + 1);
    }

    if rem.get(i).is_some_and(|b| exponent.contains(b)) {
        let mut j = i + 1;
        if matches!(rem.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        if !rem.get(j).is_some_and(u8::is_ascii_digit) {
            lex.bump(j);
            return Err(LexErrorKind::InvalidNumber);
        }
        i = j;
        while i < rem.len() && (rem[i].is_ascii_digit() || rem[i] == b'_') {
            i += 1;
        }
    }

    if rem.get(i) == Some(&b'i') {
        i += 1;
    }
    lex.bump(i);
    Ok(())
}

fn unterminated_string(_: &mut LogosLexer<'_, RawTok>) -> Result<(), LexErrorKind> {
    Err(LexErrorKind::UnterminatedString)
}

fn number_token(slice: &str) -> Tok<'_> {
    let b = slice.as_bytes();
    if slice.ends_with('i') {
        return Tok::ImagLit(slice);
    }
    let is_float = match b {
        [b'0', b'x' | b'X', rest @ ..] => rest.iter().any(|c| matches!(c, b'.' | b'p' | b'P')),
        [b'0', b'o' | b'O' | b'b' | b'B', ..] => false,
        _ => b.iter().any(|c| matches!(c, b'.' | b'e' | b'E')),
    };
    if is_float {
        Tok::FloatLit(slice)
    } else {
        Tok::IntLit(slice)
    }
}

// =============================================================================
// 2. Raw token definition
// =============================================================================

#[repr(u8)]
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(error = LexErrorKind)]
#[logos(skip r"[ \t]+")]
#[rustfmt::skip]
enum RawTok {
    #[token("\u{FEFF}")] Bom,

    // Trivia
    #[regex(r"\r\n|\n|\r")] Newline,
    #[regex(r"//[^\n\r]*", allow_greedy = true)] LineComment,
    #[token("/*", lex_block_comment)] BlockComment,

    // Keywords (before Ident)
    #[token("break")] KwBreak,
    #[token("case")] KwCase,
    #[token("chan")] KwChan,
    #[token("const")] KwConst,
    #[token("continue")] KwContinue,
    #[token("default")] KwDefault,
    #[token("defer")] KwDefer,
    #[token("else")] KwElse,
    #[token("fallthrough")] KwFallthrough,
    #[token("for")] KwFor,
    #[token("func")] KwFunc,
    #[token("go")] KwGo,
    #[token("goto")] KwGoto,
    #[token("if")] KwIf,
    #[token("import")] KwImport,
    #[token("interface")] KwInterface,
    #[token("map")] KwMap,
    #[token("package")] KwPackage,
    #[token("range")] KwRange,
    #[token("return")] KwReturn,
    #[token("select")] KwSelect,
    #[token("struct")] KwStruct,
    #[token("switch")] KwSwitch,
    #[token("type")] KwType,
    #[token("var")] KwVar,

    #[regex(r"[_\p{L}][_\p{L}\p{Nd}]*")] Ident,

    #[regex(r"[0-9]|\.[0-9]", lex_number)] Number,

    #[regex(r"`[^`]*`")] RawString,
    #[regex(r"`[^`]*", unterminated_string, allow_greedy = true)] UnterminatedRaw,
    #[regex(r#""([^"\\\n\r]|\\.)*""#)] String,
    #[regex(r#""([^"\\\n\r]|\\.)*"#, unterminated_string, allow_greedy = true)] UnterminatedString,
    #[regex(r"'([^'\\\n\r]|\\.)+'")] Rune,

    // Operators
    #[token("...")] Ellipsis,
    #[token("<<=")] ShlAssign,
    #[token(">>=")] ShrAssign,
    #[token("&^=")] AndNotAssign,
    #[token("+=")] AddAssign,
    #[token("-=")] SubAssign,
    #[token("*=")] MulAssign,
    #[token("/=")] DivAssign,
    #[token("%=")] ModAssign,
    #[token("&=")] AndAssign,
    #[token("|=")] OrAssign,
    #[token("^=")] XorAssign,
    #[token("<<")] Shl,
    #[token(">>")] Shr,
    #[token("&^")] AndNot,
    #[token("&&")] LAnd,
    #[token("||")] LOr,
    #[token("==")] EqEq,
    #[token("!=")] NotEq,
    #[token("<=")] Le,
    #[token(">=")] Ge,
    #[token("++")] Inc,
    #[token("--")] Dec,
    #[token(":=")] Define,
    #[token("<-")] Arrow,
    #[token("=")] Assign,
    #[token("+")] Plus,
    #[token("-")] Minus,
    #[token("*")] Star,
    #[token("/")] Slash,
    #[token("%")] Percent,
    #[token("&")] Amp,
    #[token("|")] Pipe,
    #[token("^")] Caret,
    #[token("~")] Tilde,
    #[token("!")] Bang,
    #[token("<")] Lt,
    #[token(">")] Gt,

    // Delimiters
    #[token("(")] LParen,
    #[token(")")] RParen,
    #[token("[")] LBrack,
    #[token("]")] RBrack,
    #[token("{")] LBrace,
    #[token("}")] RBrace,
    #[token(",")] Comma,
    #[token(";")] Semi,
    #[token(":")] Colon,
    #[token(".")] Dot,

    // Catch-all (lowest priority)
    #[regex(r".", priority = 0)] Error,
}

impl RawTok {
    /// Tokens after which a newline ends the statement.
    #[inline(always)]
    const fn can_insert_semicolon(self) -> bool {
        matches!(
            self,
            Self::Ident
                | Self::Number
                | Self::Rune
                | Self::String
                | Self::RawString
                | Self::KwBreak
                | Self::KwContinue
                | Self::KwFallthrough
                | Self::KwReturn
                | Self::Inc
                | Self::Dec
                | Self::RParen
                | Self::RBrack
                | Self::RBrace
        )
    }

    fn to_token(self, slice: &str) -> Tok<'_> {
        macro_rules! simple_tok {
            ($($raw:ident => $tok:ident),* $(,)?) => {
                match self {
                    Self::Ident => Tok::Ident(slice),
                    Self::Number => number_token(slice),
                    Self::Rune => Tok::RuneLit(slice),
                    Self::String => Tok::StringLit(slice),
                    Self::RawString => Tok::RawStringLit(slice),
                    $(Self::$raw => Tok::$tok,)*
                    _ => Tok::Error,
                }
            };
        }

        #[rustfmt::skip]
        let tok = simple_tok! {
            KwBreak => KwBreak, KwCase => KwCase, KwChan => KwChan, KwConst => KwConst,
            KwContinue => KwContinue, KwDefault => KwDefault, KwDefer => KwDefer, KwElse => KwElse,
            KwFallthrough => KwFallthrough, KwFor => KwFor, KwFunc => KwFunc, KwGo => KwGo,
            KwGoto => KwGoto, KwIf => KwIf, KwImport => KwImport, KwInterface => KwInterface,
            KwMap => KwMap, KwPackage => KwPackage, KwRange => KwRange, KwReturn => KwReturn,
            KwSelect => KwSelect, KwStruct => KwStruct, KwSwitch => KwSwitch, KwType => KwType, KwVar => KwVar,

            Ellipsis => Ellipsis, ShlAssign => ShlAssign, ShrAssign => ShrAssign, AndNotAssign => AndNotAssign,
            AddAssign => AddAssign, SubAssign => SubAssign, MulAssign => MulAssign, DivAssign => DivAssign,
            ModAssign => ModAssign, AndAssign => AndAssign, OrAssign => OrAssign, XorAssign => XorAssign,
            Shl => Shl, Shr => Shr, AndNot => AndNot, LAnd => LAnd, LOr => LOr, EqEq => EqEq, NotEq => NotEq,
            Le => Le, Ge => Ge, Inc => Inc, Dec => Dec, Define => Define, Arrow => Arrow,
            Assign => Assign, Plus => Plus, Minus => Minus, Star => Star, Slash => Slash, Percent => Percent,
            Amp => Amp, Pipe => Pipe, Caret => Caret, Tilde => Tilde, Bang => Bang, Lt => Lt, Gt => Gt,

            LParen => LParen, RParen => RParen, LBrack => LBrack, RBrack => RBrack, LBrace => LBrace,
            RBrace => RBrace, Comma => Comma, Semi => Semi, Colon => Colon, Dot => Dot,
        };
        tok
    }
}

// =============================================================================
// 3. Public token definition (zero-copy)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tok<'input> {
    Ident(&'input str),
    IntLit(&'input str),
    FloatLit(&'input str),
    ImagLit(&'input str),
    RuneLit(&'input str),
    StringLit(&'input str),
    RawStringLit(&'input str),

    // Keywords
    KwBreak,
    KwCase,
    KwChan,
    KwConst,
    KwContinue,
    KwDefault,
    KwDefer,
    KwElse,
    KwFallthrough,
    KwFor,
    KwFunc,
    KwGo,
    KwGoto,
    KwIf,
    KwImport,
    KwInterface,
    KwMap,
    KwPackage,
    KwRange,
    KwReturn,
    KwSelect,
    KwStruct,
    KwSwitch,
    KwType,
    KwVar,

    // Operators / Delimiters
    Ellipsis,
    ShlAssign,
    ShrAssign,
    AndNotAssign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    AndAssign,
    OrAssign,
    XorAssign,
    Shl,
    Shr,
    AndNot,
    LAnd,
    LOr,
    EqEq,
    NotEq,
    Le,
    Ge,
    Inc,
    Dec,
    Define,
    Arrow,
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Amp,
    Pipe,
    Caret,
    Tilde,
    Bang,
    Lt,
    Gt,
    LParen,
    RParen,
    LBrack,
    RBrack,
    LBrace,
    RBrace,
    Comma,
    Semi,
    Colon,
    Dot,

    Error,
    Eof,
}

impl<'input> std::fmt::Display for Tok<'input> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tok::Ident(s) => write!(f, "identifier {s}"),
            Tok::IntLit(s)
            | Tok::FloatLit(s)
            | Tok::ImagLit(s)
            | Tok::RuneLit(s)
            | Tok::StringLit(s)
            | Tok::RawStringLit(s) => write!(f, "literal {s}"),
            Tok::Semi => f.write_str("newline or ';'"),
            Tok::Eof => f.write_str("EOF"),
            Tok::Error => f.write_str("invalid token"),
            other => match other.punct() {
                Some(text) => write!(f, "'{text}'"),
                None => write!(f, "{other:?}"),
            },
        }
    }
}

impl<'input> Tok<'input> {
    /// Source text of keyword, operator and delimiter tokens.
    #[rustfmt::skip]
    pub const fn punct(&self) -> Option<&'static str> {
        Some(match self {
            Tok::KwBreak => "break", Tok::KwCase => "case", Tok::KwChan => "chan",
            Tok::KwConst => "const", Tok::KwContinue => "continue", Tok::KwDefault => "default",
            Tok::KwDefer => "defer", Tok::KwElse => "else", Tok::KwFallthrough => "fallthrough",
            Tok::KwFor => "for", Tok::KwFunc => "func", Tok::KwGo => "go", Tok::KwGoto => "goto",
            Tok::KwIf => "if", Tok::KwImport => "import", Tok::KwInterface => "interface",
            Tok::KwMap => "map", Tok::KwPackage => "package", Tok::KwRange => "range",
            Tok::KwReturn => "return", Tok::KwSelect => "select", Tok::KwStruct => "struct",
            Tok::KwSwitch => "switch", Tok::KwType => "type", Tok::KwVar => "var",
            Tok::Ellipsis => "...", Tok::ShlAssign => "<<=", Tok::ShrAssign => ">>=",
            Tok::AndNotAssign => "&^=", Tok::AddAssign => "+=", Tok::SubAssign => "-=",
            Tok::MulAssign => "*=", Tok::DivAssign => "/=", Tok::ModAssign => "%=",
            Tok::AndAssign => "&=", Tok::OrAssign => "|=", Tok::XorAssign => "^=",
            Tok::Shl => "<<", Tok::Shr => ">>", Tok::AndNot => "&^", Tok::LAnd => "&&",
            Tok::LOr => "||", Tok::EqEq => "==", Tok::NotEq => "!=", Tok::Le => "<=",
            Tok::Ge => ">=", Tok::Inc => "++", Tok::Dec => "--", Tok::Define => ":=",
            Tok::Arrow => "<-", Tok::Assign => "=", Tok::Plus => "+", Tok::Minus => "-",
            Tok::Star => "*", Tok::Slash => "/", Tok::Percent => "%", Tok::Amp => "&",
            Tok::Pipe => "|", Tok::Caret => "^", Tok::Tilde => "~", Tok::Bang => "!",
            Tok::Lt => "<", Tok::Gt => ">", Tok::LParen => "(", Tok::RParen => ")",
            Tok::LBrack => "[", Tok::RBrack => "]", Tok::LBrace => "{", Tok::RBrace => "}",
            Tok::Comma => ",", Tok::Semi => ";", Tok::Colon => ":", Tok::Dot => ".",
            _ => return None,
        })
    }
}

/// A comment seen by the lexer, kept out of the token stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawComment {
    pub kind: CommentKind,
    pub span: Span,
}

// =============================================================================
// 4. Lexer wrapper: semicolon insertion, comment capture, diags
// =============================================================================

pub struct Lexer<'src> {
    logos: LogosLexer<'src, RawTok>,
    pending: Option<(usize, Tok<'src>, usize)>,
    diags: Vec<Diag>,
    comments: Vec<RawComment>,
    last_can_insert_semi: bool,
    src_len: usize,
    eof_done: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(input: &'src str) -> Self {
        Self {
            logos: RawTok::lexer(input),
            pending: None,
            diags: Vec::new(),
            comments: Vec::new(),
            last_can_insert_semi: false,
            src_len: input.len(),
            eof_done: false,
        }
    }

    pub fn take_diags(&mut self) -> Vec<Diag> {
        std::mem::take(&mut self.diags)
    }

    /// Comments seen so far, in source order.
    pub fn take_comments(&mut self) -> Vec<RawComment> {
        std::mem::take(&mut self.comments)
    }

    #[inline]
    fn push_lex_diag(&mut self, kind: LexErrorKind, span: Range<usize>) {
        let span = Span::new(span.start, span.end);
        self.diags.push(LexError { kind, span }.diag());
    }

    #[inline]
    fn emit_semi_at(&mut self, pos: usize) {
        self.pending = Some((pos, Tok::Semi, pos));
    }

    fn handle_trivia(&mut self, raw: RawTok, span: &Range<usize>, slice: &str) -> bool {
        match raw {
            RawTok::Newline => {
                if self.last_can_insert_semi {
                    self.last_can_insert_semi = false;
                    self.emit_semi_at(span.start);
                }
                true
            }
            RawTok::LineComment => {
                self.comments.push(RawComment {
                    kind: CommentKind::Line,
                    span: Span::new(span.start, span.end),
                });
                true
            }
            RawTok::BlockComment => {
                self.comments.push(RawComment {
                    kind: CommentKind::Block,
                    span: Span::new(span.start, span.end),
                });
                if self.last_can_insert_semi {
                    if let Some(off) = first_newline_offset(slice) {
                        self.last_can_insert_semi = false;
                        self.emit_semi_at(span.start + off);
                    }
                }
                true
            }
            _ => false,
        }
    }

    fn handle_eof(&mut self) {
        self.eof_done = true;
        if self.last_can_insert_semi {
            self.last_can_insert_semi = false;
            self.emit_semi_at(self.src_len);
        }
    }

    fn handle_error(&mut self, kind: LexErrorKind) -> (usize, Tok<'src>, usize) {
        let span = self.logos.span();
        self.push_lex_diag(kind, span.clone());
        self.last_can_insert_semi = false;
        (span.start, Tok::Error, span.end)
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = (usize, Tok<'src>, usize);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(tok) = self.pending.take() {
                return Some(tok);
            }
            if self.eof_done {
                return None;
            }

            let raw = match self.logos.next() {
                None => {
                    // a trailing ';' may still be pending
                    self.handle_eof();
                    continue;
                }
                Some(Err(kind)) => return Some(self.handle_error(kind)),
                Some(Ok(raw)) => raw,
            };

            let span = self.logos.span();
            let slice = self.logos.slice();

            if raw == RawTok::Bom {
                if span.start == 0 {
                    continue;
                }
                return Some(self.handle_error(LexErrorKind::InvalidToken));
            }
            if self.handle_trivia(raw, &span, slice) {
                continue;
            }
            if raw == RawTok::Error {
                return Some(self.handle_error(LexErrorKind::InvalidToken));
            }

            self.last_can_insert_semi = raw.can_insert_semicolon();
            return Some((span.start, raw.to_token(slice), span.end));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(src: &str) -> Vec<Tok<'_>> {
        Lexer::new(src).map(|(_, t, _)| t).collect()
    }

    #[test]
    fn classifies_numbers() {
        assert_eq!(
            toks("1 1.5 0x1p-2 1e9 2i 0b101 0o17 .5"),
            vec![
                Tok::IntLit("1"),
                Tok::FloatLit("1.5"),
                Tok::FloatLit("0x1p-2"),
                Tok::FloatLit("1e9"),
                Tok::ImagLit("2i"),
                Tok::IntLit("0b101"),
                Tok::IntLit("0o17"),
                Tok::FloatLit(".5"),
                Tok::Semi,
            ]
        );
    }

    #[test]
    fn hex_digits_are_not_exponents() {
        assert_eq!(toks("0xE5"), vec![Tok::IntLit("0xE5"), Tok::Semi]);
    }

    #[test]
    fn comments_are_captured_not_emitted() {
        let mut lx = Lexer::new("x // trailing\n/* block */ y");
        let out: Vec<_> = lx.by_ref().map(|(_, t, _)| t).collect();
        assert_eq!(out, vec![Tok::Ident("x"), Tok::Semi, Tok::Ident("y"), Tok::Semi]);
        let comments = lx.take_comments();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].kind, CommentKind::Line);
        assert_eq!(comments[0].span, Span::new(2, 13));
        assert_eq!(comments[1].kind, CommentKind::Block);
    }

    #[test]
    fn unterminated_string_is_reported() {
        let mut lx = Lexer::new("\"abc\nx");
        let out: Vec<_> = lx.by_ref().map(|(_, t, _)| t).collect();
        assert_eq!(out[0], Tok::Error);
        let diags = lx.take_diags();
        assert_eq!(diags[0].message, "unterminated string");
    }
}
