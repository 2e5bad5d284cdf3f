//! Criterion benchmarks for policy queries.
//!
//! Benchmarks `select`, `select_observed`, `utilities`, `PolicyHandle::action`
//! and policy parsing across policy sizes from toy models to mid-size ones.

use ap_core::policy::{
    select, select_observed, utilities, AlphaVector, AlphaVectorSet, PolicyHandle,
};
use ap_core::Model;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

// ── Helpers ──────────────────────────────────────────────────────────

const SIZES: &[(&str, usize, usize)] = &[
    ("tiger", 16, 2),
    ("hallway", 300, 60),
    ("rocksample_5_5", 400, 801),
    ("tag", 1_000, 870),
];

fn synthetic_set(vectors: usize, states: usize, observable: Option<u32>) -> AlphaVectorSet {
    let vectors = (0..vectors)
        .map(|v| {
            let coefficients = (0..states)
                .map(|s| (((v * 7919 + s * 104_729) % 2_003) as f64 - 1_000.0) / 10.0)
                .collect();
            let vector = AlphaVector::new((v % 5) as u32, coefficients);
            match observable {
                Some(pools) => vector.observed(v as u32 % pools),
                None => vector,
            }
        })
        .collect();
    AlphaVectorSet::new(states, vectors).expect("synthetic set is well-formed")
}

fn peaked_belief(states: usize) -> Vec<f64> {
    let mut belief = vec![0.5 / states as f64; states];
    belief[states / 3] += 0.5;
    belief
}

fn policy_xml(set: &AlphaVectorSet) -> String {
    let mut xml = format!(
        "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<Policy version=\"0.1\" type=\"value\" model=\"bench.pomdp\">\n<AlphaVector vectorLength=\"{}\" numObsValue=\"1\" numVectors=\"{}\">\n",
        set.dimension(),
        set.len()
    );
    for v in set.iter() {
        let row: Vec<String> = v.coefficients.iter().map(|c| format!("{}", c)).collect();
        xml.push_str(&format!(
            "<Vector action=\"{}\" obsValue=\"0\">{}</Vector>\n",
            v.action,
            row.join(" ")
        ));
    }
    xml.push_str("</AlphaVector>\n</Policy>\n");
    xml
}

// ── Benchmarks ───────────────────────────────────────────────────────

fn bench_select(c: &mut Criterion) {
    let mut group = c.benchmark_group("policy/select");
    for &(name, vectors, states) in SIZES {
        let set = synthetic_set(vectors, states, None);
        let belief = peaked_belief(states);
        group.bench_with_input(BenchmarkId::new("select", name), &(set, belief), |b, (s, x)| {
            b.iter(|| black_box(select(black_box(s), black_box(x))));
        });
    }
    group.finish();
}

fn bench_select_observed(c: &mut Criterion) {
    let mut group = c.benchmark_group("policy/select_observed");
    for &(name, vectors, states) in SIZES {
        let set = synthetic_set(vectors, states, Some(4));
        let belief = peaked_belief(states);
        group.bench_with_input(
            BenchmarkId::new("select_observed", name),
            &(set, belief),
            |b, (s, x)| {
                b.iter(|| black_box(select_observed(black_box(s), black_box(x), 2)));
            },
        );
    }
    group.finish();
}

fn bench_utilities(c: &mut Criterion) {
    let mut group = c.benchmark_group("policy/utilities");
    for &(name, vectors, states) in SIZES {
        let set = synthetic_set(vectors, states, None);
        let belief = peaked_belief(states);
        group.bench_with_input(
            BenchmarkId::new("utilities", name),
            &(set, belief),
            |b, (s, x)| {
                b.iter(|| black_box(utilities(black_box(s), black_box(x))));
            },
        );
    }
    group.finish();
}

fn bench_handle(c: &mut Criterion) {
    let mut group = c.benchmark_group("policy/handle");
    let (name, vectors, states) = SIZES[2];
    let handle = PolicyHandle::from_set(Model::new("bench.pomdp"), synthetic_set(vectors, states, None));
    let belief = peaked_belief(states);
    group.bench_function(BenchmarkId::new("action", name), |b| {
        b.iter(|| black_box(handle.action(black_box(&belief))));
    });
    group.finish();
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("policy/parse");
    for &(name, vectors, states) in &SIZES[..3] {
        let xml = policy_xml(&synthetic_set(vectors, states, None));
        group.bench_with_input(BenchmarkId::new("from_xml_str", name), &xml, |b, text| {
            b.iter(|| black_box(AlphaVectorSet::from_xml_str(black_box(text))));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_select,
    bench_select_observed,
    bench_utilities,
    bench_handle,
    bench_parse
);
criterion_main!(benches);
