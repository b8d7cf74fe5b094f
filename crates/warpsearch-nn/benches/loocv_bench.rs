//! Criterion benchmarks for warpsearch-nn: LOOCV parameter search modes.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use warpsearch_distance::{Dtw, Erp, Msm};
use warpsearch_nn::{Dataset, LoocvMode, Measure, OneNearestNeighbour};

fn make_dataset(n_series: usize, len: usize) -> Dataset {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let values = (0..n_series)
        .map(|k| {
            let freq = 0.1 + (k % 3) as f64 * 0.05;
            (0..len)
                .map(|i| (i as f64 * freq).sin() + rng.gen_range(-0.2..0.2))
                .collect()
        })
        .collect();
    let labels = (0..n_series).map(|k| k % 3).collect();
    Dataset::new(values, labels).unwrap()
}

fn bench_modes<M: Measure>(c: &mut Criterion, name: &str) {
    let mut group = c.benchmark_group(name);
    group.sample_size(10);
    let train = make_dataset(20, 64);

    for mode in [LoocvMode::Naive, LoocvMode::LowerBound, LoocvMode::FastSearch] {
        group.bench_with_input(BenchmarkId::new(format!("{mode:?}"), train.len()), &train, |b, train| {
            b.iter(|| {
                let mut nn = OneNearestNeighbour::<M>::new().with_loocv(mode);
                nn.fit(train).unwrap()
            });
        });
    }

    group.finish();
}

fn bench_prediction(c: &mut Criterion) {
    let train = make_dataset(40, 128);
    let test = make_dataset(20, 128);
    let mut nn = OneNearestNeighbour::new().with_params(Dtw::with_window(12));
    nn.fit(&train).unwrap();
    let exact = nn.clone().with_lower_bound_prediction(false);

    let mut group = c.benchmark_group("dtw_evaluate");
    group.bench_function("lower_bound", |b| b.iter(|| nn.evaluate(&test).unwrap()));
    group.bench_function("exact", |b| b.iter(|| exact.evaluate(&test).unwrap()));
    group.finish();
}

fn bench_loocv(c: &mut Criterion) {
    bench_modes::<Dtw>(c, "dtw_loocv");
    bench_modes::<Erp>(c, "erp_loocv");
    bench_modes::<Msm>(c, "msm_loocv");
}

criterion_group!(benches, bench_loocv, bench_prediction);
criterion_main!(benches);
