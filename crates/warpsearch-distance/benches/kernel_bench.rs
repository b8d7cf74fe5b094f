//! Criterion benchmarks for warpsearch-distance: the seven kernels with and
//! without early abandoning.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use warpsearch_distance::{
    Dtw, ElasticDistance, Erp, Euclidean, Lcss, Msm, TimeSeries, Twe, Wdtw, Workspace,
};

fn make_sine_series(n: usize, offset: f64) -> TimeSeries {
    let values: Vec<f64> = (0..n).map(|i| (i as f64 * 0.1).sin() + offset).collect();
    TimeSeries::new(values).unwrap()
}

fn bench_measure<D: ElasticDistance>(c: &mut Criterion, name: &str, measure: D) {
    let mut group = c.benchmark_group(name);

    for len in [64usize, 256] {
        let a = make_sine_series(len, 0.0);
        let b = make_sine_series(len, 0.5);
        let mut ws = Workspace::with_capacity(len);
        let exact = measure.distance(a.as_view(), b.as_view());

        group.bench_with_input(BenchmarkId::new("exact", len), &len, |bencher, _| {
            bencher.iter(|| measure.distance_in(a.as_view(), b.as_view(), f64::INFINITY, &mut ws));
        });
        group.bench_with_input(BenchmarkId::new("abandon_half", len), &len, |bencher, _| {
            bencher.iter(|| measure.distance_in(a.as_view(), b.as_view(), exact * 0.5, &mut ws));
        });
        group.bench_with_input(BenchmarkId::new("ext", len), &len, |bencher, _| {
            bencher.iter(|| measure.distance_ext_in(a.as_view(), b.as_view(), &mut ws));
        });
    }

    group.finish();
}

fn bench_kernels(c: &mut Criterion) {
    bench_measure(c, "dtw_w10", Dtw::with_window(10));
    bench_measure(c, "erp", Erp::new(0.2, 10).unwrap());
    bench_measure(c, "lcss", Lcss::new(0.2, 10).unwrap());
    bench_measure(c, "msm", Msm::new(0.5).unwrap());
    bench_measure(c, "twe", Twe::new(0.001, 0.1).unwrap());
    bench_measure(c, "wdtw", Wdtw::new(0.1).unwrap());
    bench_measure(c, "euclidean", Euclidean);
}

criterion_group!(benches, bench_kernels);
criterion_main!(benches);
