#![no_main]

use go125_parser::{parse_file, print_parsed};
use goreify::{specialize, SpecializeOptions, TypeMapping};
use libfuzzer_sys::fuzz_target;

// Whatever parses prints to source that parses again, and specializing it
// either fails cleanly or yields source that parses.
fuzz_target!(|data: &[u8]| {
    let Ok(src) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(pf) = parse_file(src, "fuzz.go") else {
        return;
    };
    let Ok(printed) = print_parsed(&pf) else {
        return;
    };
    if let Err(e) = parse_file(&printed, "printed.go") {
        panic!("printed source does not parse: {e}\n{printed}");
    }

    let Ok(mapping) = "T=*(\"example.com/pkg\")pkg.Value,U=int64".parse::<TypeMapping>() else {
        return;
    };
    if let Ok(out) = specialize(src, "fuzz.go", &mapping, &SpecializeOptions::default()) {
        if let Err(e) = parse_file(&out, "out.go") {
            panic!("generated source does not parse: {e}\n{out}");
        }
    }
});
