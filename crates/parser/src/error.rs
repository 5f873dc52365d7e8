use thiserror::Error;

use crate::ast::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagKind {
    Lex,
    Parse,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diag {
    pub kind: DiagKind,
    pub span: Span,
    pub message: String,
}

impl Diag {
    pub fn parse(span: Span, message: impl Into<String>) -> Self {
        Self {
            kind: DiagKind::Parse,
            span,
            message: message.into(),
        }
    }
}

/// A diagnostic resolved to a 1-based line and column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    pub line: u32,
    pub column: u32,
    pub diag: Diag,
}

/// Syntax errors for one file. Displays like `go vet`: `file:line:col: message`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{}", render(.filename, .errors))]
pub struct ParseFailure {
    pub filename: String,
    pub errors: Vec<Located>,
}

fn render(filename: &str, errors: &[Located]) -> String {
    errors
        .iter()
        .map(|e| format!("{filename}:{}:{}: {}", e.line, e.column, e.diag.message))
        .collect::<Vec<_>>()
        .join("\n")
}

impl ParseFailure {
    pub fn new(filename: &str, lines: &LineIndex, diags: Vec<Diag>) -> Self {
        let errors = diags
            .into_iter()
            .map(|diag| {
                let (line, column) = lines.line_col(diag.span.start);
                Located { line, column, diag }
            })
            .collect();
        Self {
            filename: filename.to_string(),
            errors,
        }
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Default)]
pub enum LexErrorKind {
    #[default]
    #[error("invalid token")]
    InvalidToken,
    #[error("invalid numeric literal")]
    InvalidNumber,
    #[error("unterminated string")]
    UnterminatedString,
    #[error("unterminated comment")]
    UnterminatedComment,
}

#[derive(Debug, Error, Clone, PartialEq, Eq, Default)]
#[error("{kind}: {span:?}")]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
}

impl LexError {
    #[inline]
    pub fn diag(&self) -> Diag {
        Diag {
            kind: DiagKind::Lex,
            span: self.span,
            message: self.kind.to_string(),
        }
    }
}

/// Byte offset to line lookup for one source text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineIndex {
    starts: Vec<u32>,
}

impl LineIndex {
    pub fn new(src: &str) -> Self {
        let mut starts = vec![0u32];
        starts.extend(memchr::memchr_iter(b'\n', src.as_bytes()).map(|i| i as u32 + 1));
        Self { starts }
    }

    /// 1-based line containing `offset`.
    pub fn line(&self, offset: u32) -> u32 {
        match self.starts.binary_search(&offset) {
            Ok(i) => i as u32 + 1,
            Err(i) => i as u32,
        }
    }

    /// 1-based line and byte column of `offset`.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        let line = self.line(offset);
        let start = self.starts[(line - 1) as usize];
        (line, offset - start + 1)
    }

    pub fn line_count(&self) -> usize {
        self.starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_lookup_is_one_based() {
        let idx = LineIndex::new("package a\n\nfunc f() {}\n");
        assert_eq!(idx.line(0), 1);
        assert_eq!(idx.line(9), 1);
        assert_eq!(idx.line(10), 2);
        assert_eq!(idx.line(11), 3);
        assert_eq!(idx.line_col(16), (3, 6));
    }

    #[test]
    fn failure_renders_each_error() {
        let src = "package a\nfunc (\n";
        let lines = LineIndex::new(src);
        let failure = ParseFailure::new(
            "a.go",
            &lines,
            vec![Diag::parse(Span::new(16, 17), "expected ')'")],
        );
        assert_eq!(failure.to_string(), "a.go:2:7: expected ')'");
    }
}
