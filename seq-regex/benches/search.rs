//! cargo bench --bench search --features rayon
use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use seq_regex::{
    bootstrap::Bootstrap,
    sequence::{tuples, Tuple},
    CompiledPattern, Substitution, Substitutions,
};

const PATTERN: &str = "(?P<subj@0>/:ORG/) .{0,5} (?P<verb@1>/:VERB/) .{0,5} (?P<obj@0>/:PRODUCT/)";

fn sentence(i: usize) -> Vec<Tuple> {
    let company = ["Apple", "Google", "Samsung"][i % 3];
    let product = ["iPhone", "Pixel", "Galaxy"][i % 3];
    tuples([
        [company, "ORG"],
        ["has", "AUX"],
        ["finally", "ADV"],
        ["released", "VERB"],
        ["the", "DET"],
        ["new", "ADJ"],
        [product, "PRODUCT"],
        ["today", "NOUN"],
        [".", "PUNCT"],
    ])
}

pub fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("compile", |b| {
        b.iter(|| CompiledPattern::new(2, black_box(PATTERN)).unwrap())
    });

    let re = CompiledPattern::new(2, PATTERN).unwrap();
    let seq = sentence(0);
    assert!(re.search(&seq).unwrap().is_some());
    c.bench_function("search", |b| b.iter(|| re.search(black_box(&seq)).unwrap()));

    let long: Vec<Tuple> = (0..100).flat_map(sentence).collect();
    assert_eq!(re.findall(&long).unwrap().len(), 100);
    c.bench_function("findall_100", |b| {
        b.iter(|| re.findall(black_box(&long)).unwrap().len())
    });

    let negated = CompiledPattern::new(2, "/^the|a:DET/ /:ADJ/* /:PRODUCT/").unwrap();
    c.bench_function("findall_100_negated", |b| {
        b.iter(|| negated.findall(black_box(&long)).unwrap().len())
    });

    c.bench_function("prefilter_100", |b| {
        b.iter(|| re.is_useless_for(black_box(&long)))
    });

    let examples: Vec<Substitutions> = [("Apple", "iPhone"), ("Google", "Pixel")]
        .into_iter()
        .map(|(s, o)| {
            Substitutions::from([
                ("S".to_owned(), Substitution::from(s)),
                ("O".to_owned(), Substitution::from(o)),
            ])
        })
        .collect();
    let bootstrap = Bootstrap::builder()
        .ndim(2)
        .trigger("(?P<s@@>/S/) (?P<x@1>.{0,5}) (?P<o@@>/O/)")
        .substitutions(examples)
        .build()
        .unwrap();
    let corpus: Vec<Vec<Tuple>> = (0..1000).map(sentence).collect();
    c.bench_function("bootstrap_1000", |b| {
        b.iter(|| bootstrap.run(black_box(&corpus)).unwrap())
    });
    #[cfg(feature = "rayon")]
    c.bench_function("par_bootstrap_1000", |b| {
        b.iter(|| bootstrap.par_run(black_box(&corpus)).unwrap())
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
