#![no_main]

use go125_parser::lexer::{Lexer, Tok};
use libfuzzer_sys::fuzz_target;

// Token spans stay in bounds and move forward; inserted semicolons are
// zero-width and never precede an earlier token's end.
fuzz_target!(|data: &[u8]| {
    let src = String::from_utf8_lossy(data);
    let mut lexer = Lexer::new(&src);

    let mut last_end = 0usize;
    let mut steps = 0usize;
    let max_steps = src.len().saturating_mul(4) + 64;

    for (start, tok, end) in lexer.by_ref() {
        assert!(start <= end && end <= src.len());
        if matches!(tok, Tok::Semi) && start == end {
            assert!(start >= last_end);
        } else {
            assert!(start >= last_end);
            last_end = end;
        }
        steps += 1;
        assert!(steps <= max_steps);
    }
    let _ = lexer.take_diags();
});
