use bingo_fairness::{
    audit::FairnessAuditor,
    engine::{EntropyEngine, NullSink},
    source::{EngineConfig, FixedEntropySource},
};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

fn bench_engine(verification_enabled: bool) -> EntropyEngine {
    let config = EngineConfig {
        verification_enabled,
        log_results: false,
        game_id: Some("game-bench-0001".into()),
        ..EngineConfig::default()
    };
    EntropyEngine::with_parts(
        config,
        Box::new(FixedEntropySource::counting(251)),
        Box::new(NullSink),
    )
    .expect("valid bench config")
}

fn bench_generate_number(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_number");

    for verification in [true, false] {
        let name = if verification { "verified" } else { "unverified" };
        group.bench_function(name, |b| {
            b.iter_batched(
                || bench_engine(verification),
                |mut engine| {
                    for _ in 0..75 {
                        black_box(engine.generate_number());
                    }
                    engine
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_unique_card(c: &mut Criterion) {
    c.bench_function("generate_unique_set_90", |b| {
        b.iter_batched(
            || bench_engine(true),
            |mut engine| black_box(engine.generate_unique_set(90).expect("range holds 90")),
            BatchSize::SmallInput,
        )
    });
}

fn bench_fairness_report(c: &mut Criterion) {
    let mut engine = bench_engine(true);
    for _ in 0..75 {
        engine.generate_number();
    }

    c.bench_function("generate_fairness_report_75", |b| {
        b.iter(|| {
            let auditor = FairnessAuditor::with_defaults(black_box(&engine));
            black_box(auditor.generate_fairness_report())
        })
    });
}

criterion_group!(
    benches,
    bench_generate_number,
    bench_unique_card,
    bench_fairness_report
);
criterion_main!(benches);
