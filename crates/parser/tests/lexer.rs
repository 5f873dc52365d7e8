use go125_parser::ast::CommentKind;
use go125_parser::lexer::{Lexer, Tok};
use proptest::prelude::*;

/// Offsets of the semicolons the lexer inserted (zero-width ones).
fn inserted_semis(input: &str) -> Vec<usize> {
    Lexer::new(input)
        .filter(|(s, t, e)| matches!(t, Tok::Semi) && s == e)
        .map(|(s, _, _)| s)
        .collect()
}

#[test]
fn semis_after_line_final_tokens() {
    assert_eq!(inserted_semis("x\n"), vec![1]);
    assert_eq!(inserted_semis("f()\n"), vec![3]);
    assert_eq!(inserted_semis("a[0]\n"), vec![4]);
    assert_eq!(inserted_semis("}\n"), vec![1]);
    assert_eq!(inserted_semis("i++\n"), vec![3]);
    assert_eq!(inserted_semis("return\n"), vec![6]);
    assert_eq!(inserted_semis("break\ncontinue\nfallthrough\n"), vec![5, 14, 26]);
    assert_eq!(inserted_semis("\"s\"\n'r'\n1.5\n"), vec![3, 7, 11]);
}

#[test]
fn no_semis_after_operators_or_keywords() {
    assert!(inserted_semis("x +\ny").len() == 1);
    assert!(inserted_semis("if\n").is_empty());
    assert!(inserted_semis("func(\n").is_empty());
    assert!(inserted_semis("a,\n").is_empty());
}

#[test]
fn semi_at_eof_without_newline() {
    assert_eq!(inserted_semis("x"), vec![1]);
    assert!(inserted_semis("x;").is_empty());
}

#[test]
fn block_comment_spanning_lines_acts_as_newline() {
    assert_eq!(inserted_semis("x /* a\nb */ y"), vec![6, 13]);
    assert_eq!(inserted_semis("x /* a */ y"), vec![11]);
}

#[test]
fn line_comment_before_newline_keeps_the_semi() {
    let src = "return // done\nx";
    let mut lx = Lexer::new(src);
    let toks: Vec<_> = lx.by_ref().map(|(_, t, _)| t).collect();
    assert_eq!(
        toks,
        vec![Tok::KwReturn, Tok::Semi, Tok::Ident("x"), Tok::Semi]
    );
    let comments = lx.take_comments();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].kind, CommentKind::Line);
    assert_eq!(&src[comments[0].span.start as usize..comments[0].span.end as usize], "// done");
}

#[test]
fn carriage_returns_are_newlines() {
    assert_eq!(inserted_semis("x\r\ny\r\n"), vec![1, 4]);
}

#[test]
fn invalid_characters_are_diagnosed_and_skipped() {
    let mut lx = Lexer::new("a @ b");
    let toks: Vec<_> = lx.by_ref().map(|(_, t, _)| t).collect();
    assert_eq!(toks, vec![Tok::Ident("a"), Tok::Error, Tok::Ident("b"), Tok::Semi]);
    let diags = lx.take_diags();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].span.start, 2);
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn never_panics_and_progresses(s in ".*") {
        let mut last_real_end = 0usize;
        let mut max_end = 0usize;
        let max_steps = s.len().saturating_mul(4) + 64;

        for (steps, (start, tok, end)) in Lexer::new(&s).enumerate() {
            prop_assert!(start <= end && end <= s.len(), "bad span ({start},{end}) for {tok:?}");
            if matches!(tok, Tok::Semi) && start == end {
                prop_assert!(start >= max_end, "inserted semi behind progress at {start}");
            } else {
                prop_assert!(start >= last_real_end, "token moved backwards at {start}");
                last_real_end = end;
            }
            max_end = max_end.max(end);
            prop_assert!(steps <= max_steps, "possible hang after {steps} tokens");
        }
    }

    #[test]
    fn identifiers_lex_as_one_token(s in "[a-zA-Z_][a-zA-Z0-9_]{0,12}") {
        let toks: Vec<_> = Lexer::new(&s).map(|(_, t, _)| t).collect();
        let keyword = matches!(
            s.as_str(),
            "break" | "case" | "chan" | "const" | "continue" | "default" | "defer" | "else"
                | "fallthrough" | "for" | "func" | "go" | "goto" | "if" | "import"
                | "interface" | "map" | "package" | "range" | "return" | "select"
                | "struct" | "switch" | "type" | "var"
        );
        if !keyword {
            prop_assert_eq!(toks, vec![Tok::Ident(s.as_str()), Tok::Semi]);
        }
    }
}
