//! Go 1.25 front end for source-to-source tools.
//!
//! - Lexer uses Logos and implements Go semicolon insertion; comments are
//!   surfaced as trivia and grouped.
//! - Parser is hand-written recursive descent over an arena AST.
//! - [`resolve`] binds identifiers to declarations, [`walk`] visits and
//!   rewrites the tree by parent slot, [`positions`] clears or synthesizes
//!   positions and [`printer`] renders gofmt-style text.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod parser_support;
pub mod positions;
pub mod printer;
pub mod resolve;
pub mod walk;

// Re-exports for convenience
pub use ast::{ParsedFile, Span};
pub use error::{LineIndex, ParseFailure};
pub use lexer::Lexer;
pub use parser::parse_file;
pub use printer::{print_file, print_parsed, PrintError};
pub use resolve::{resolve, Binding, BindingKind, Bindings, DeclKey};
