//! Property tests for the quantified invariants of spec.md §8 that apply
//! to the parser: the child-ordering invariant over the AST arena, and
//! "parsing never panics" over arbitrary well-formed-ish token streams.

use cqc_par::parse_translation_unit;
use cqc_util::FileId;
use proptest::prelude::*;

fn ident() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("a".to_string()),
        Just("b".to_string()),
        Just("n".to_string()),
        Just("tmp".to_string()),
    ]
}

fn small_fn_source() -> impl Strategy<Value = String> {
    (ident(), ident(), 0i64..1000).prop_map(|(fname, var, n)| {
        format!(
            "int {fname}(int {var}) {{ int r; r = {var} + {n}; while (r > 0) {{ r = r - 1; }} return r; }}"
        )
    })
}

proptest! {
    #[test]
    fn well_formed_functions_parse_and_preserve_child_ordering(src in small_fn_source()) {
        let tokens = cqc_lex::tokenize(&src, FileId::DUMMY).expect("lex failed");
        let ast = parse_translation_unit(&tokens).expect("parse failed");
        prop_assert!(ast.check_child_ordering());
    }

    #[test]
    fn arbitrary_token_streams_never_panic(src in "[\\x20-\\x7e\\n\\t]{0,200}") {
        if let Ok(tokens) = cqc_lex::tokenize(&src, FileId::DUMMY) {
            let _ = parse_translation_unit(&tokens);
        }
    }
}
