use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cqc_lex::tokenize;
use cqc_util::FileId;

fn synthetic_source(functions: usize) -> String {
    let mut src = String::new();
    for i in 0..functions {
        src.push_str(&format!(
            "int f{i}(int a, int b) {{ int t; t = a + b * 2; while (t < 100) {{ t = t + 1; }} return t; }}\n"
        ));
    }
    src
}

fn bench_lexer(c: &mut Criterion) {
    let small = synthetic_source(10);
    let large = synthetic_source(1000);

    c.bench_function("tokenize_small", |b| {
        b.iter(|| tokenize(black_box(&small), FileId::DUMMY).unwrap())
    });

    c.bench_function("tokenize_large", |b| {
        b.iter(|| tokenize(black_box(&large), FileId::DUMMY).unwrap())
    });
}

criterion_group!(benches, bench_lexer);
criterion_main!(benches);
