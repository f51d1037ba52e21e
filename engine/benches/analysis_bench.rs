use criterion::{criterion_group, criterion_main, Criterion};
use engine::config::{ExperimentConfig, Strategy};
use engine::document::{Document, CONTENT, TITLE};
use engine::{Analyzer, Experiment};

const TEXT: &str = "an experimental study of the boundary layer transition on a flat plate at supersonic \
    speeds, with heat transfer measurements and the effect of leading edge bluntness on the wing's lift";

fn bench_analyzers(c: &mut Criterion) {
    for analyzer in [Analyzer::standard(), Analyzer::English, Analyzer::Synonym, Analyzer::ngram(3, 5).unwrap()] {
        c.bench_function(&format!("analyze_{}", analyzer.name()), |b| b.iter(|| analyzer.analyze(TEXT)));
    }
}

fn bench_rocchio(c: &mut Criterion) {
    let docs: Vec<Document> = (0..500)
        .map(|i| {
            Document::new(i.to_string())
                .with_field(TITLE, format!("report {i} on boundary layers"))
                .with_field(CONTENT, TEXT.repeat(1 + i % 3))
        })
        .collect();
    let experiment = Experiment::new(ExperimentConfig::for_strategy(Strategy::Rerank)).unwrap();
    let index = experiment.build_index(docs).unwrap();
    c.bench_function("rerank_rocchio_query", |b| {
        b.iter(|| experiment.run_query(&index, 1, "boundary layer transition at supersonic speeds"))
    });
}

criterion_group!(benches, bench_analyzers, bench_rocchio);
criterion_main!(benches);
