//! Fuzz target: `json::parse`
//!
//! Arbitrary bytes into the tokenizer with a deliberately small arena.
//! Every token it reports must lie inside the input and link only to
//! earlier tokens.
//!
//! cargo fuzz run fuzz_json_tokenizer

#![no_main]

use barvis::json::{parse, JsonDocument, Token};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut tokens = [Token::EMPTY; 48];
    let Ok(n) = parse(data, &mut tokens) else {
        return;
    };
    assert!(n <= tokens.len());

    for (i, t) in tokens[..n].iter().enumerate() {
        let end = t.end.expect("closed token");
        assert!(t.start <= end && end <= data.len(), "token {} out of bounds", i);
        if let Some(p) = t.parent {
            assert!(p < i, "parent {} not before child {}", p, i);
        }
    }

    // Queries over a valid arena never panic.
    let doc = JsonDocument::new(data, &tokens[..n]);
    for i in 0..n {
        let _ = doc.text(i);
        let _ = doc.is_number(i);
        let _ = doc.as_integer(i);
        let _ = doc.children(i).count();
    }
    let _ = doc.value_of("type", 0);
});
