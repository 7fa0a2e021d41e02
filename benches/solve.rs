//! Benchmarks for resolution and full compilation.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use modelbook::compiler::ModelCompiler;
use modelbook::notebook::Notebook;

/// A chain of fragments, each taken from the previous one, so the resolver
/// needs one pass per link.
fn chain_source(len: usize) -> String {
    let mut src = String::from(
        "create Domain DoId { dataType: Long; }\n\
         create DtDefinition F0 { id f0Id { label: \"Id\"; domain: DoId; } }\n",
    );
    // declared in reverse so every pass resolves exactly one definition
    for i in (1..len).rev() {
        src.push_str(&format!(
            "create Fragment F{i} {{ from: F{prev}; }}\n",
            prev = i - 1
        ));
    }
    src
}

fn loaded(len: usize) -> ModelCompiler {
    let mut compiler = ModelCompiler::new();
    compiler
        .load_str("chain.mdl", &chain_source(len))
        .unwrap();
    compiler
}

fn bench_solve(c: &mut Criterion) {
    let compiler = loaded(200);
    let prior = Notebook::new();

    c.bench_function("solve_chain_200", |bench| {
        bench.iter(|| black_box(compiler.repository().solve(&prior).unwrap()))
    });
}

fn bench_compile(c: &mut Criterion) {
    let compiler = loaded(200);
    let prior = Notebook::new();

    c.bench_function("compile_chain_200", |bench| {
        bench.iter(|| black_box(compiler.compile(&prior).unwrap()))
    });
}

fn bench_load(c: &mut Criterion) {
    let src = chain_source(200);

    c.bench_function("load_chain_200", |bench| {
        bench.iter(|| {
            let mut compiler = ModelCompiler::new();
            compiler.load_str("chain.mdl", black_box(&src)).unwrap();
            black_box(compiler)
        })
    });
}

criterion_group!(benches, bench_solve, bench_compile, bench_load);
criterion_main!(benches);
