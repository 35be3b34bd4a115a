use criterion::{criterion_group, criterion_main, Criterion};
use simlc::frontend::{lexer, parse_source};
use std::hint::black_box;

const BARREL: &str = "\
class BarrelWithHole:
    data V, h: Real
    data A_bott, A_o, mu, q, g: Real param

    func dynamic():
        h := V / A_bott
        $V := q - mu*A_o*sqrt(2*g*h)

    func init():
        V := 0;
        A_bott := 1; A_o := 0.02; mu := 0.55;
        q := 0.05
        g := 9.81

process RunTest:
    data system: BarrelWithHole

    func dynamic():
        system.dynamic()

    func init():
        system.init()

compile RunTest
";

fn bench_pipeline(c: &mut Criterion) {
    c.bench_function("tokenize_barrel", |b| {
        b.iter(|| lexer::tokenize(black_box(BARREL)).unwrap())
    });
    c.bench_function("parse_barrel", |b| {
        b.iter(|| parse_source(black_box(BARREL), "barrel").unwrap())
    });
    c.bench_function("compile_barrel", |b| {
        b.iter(|| simlc::compile_str(black_box(BARREL), "barrel").unwrap())
    });
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
