//! Benchmarks for the Sharpe optimizer and covariance estimation.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tangency_risk::{
    PortfolioEvaluator, ReturnSeries, SharpeOptimizer, historical_var, sample_covariance,
};

fn random_returns(n_assets: usize, n_obs: usize) -> ReturnSeries {
    let mut rng = StdRng::seed_from_u64(17);
    let values = Array2::from_shape_fn((n_obs, n_assets), |(_, j)| {
        0.0004 * (j + 1) as f64 + 0.015 * rng.gen_range(-1.0..1.0)
    });
    let start = chrono::NaiveDate::from_ymd_opt(2015, 1, 1).expect("valid date");
    let dates = (0..n_obs)
        .map(|i| start + chrono::Duration::days(i as i64))
        .collect();
    let assets = (0..n_assets).map(|j| format!("S{j}")).collect();
    ReturnSeries::new(assets, dates, values).expect("valid series")
}

fn bench_optimizer(c: &mut Criterion) {
    let mut group = c.benchmark_group("maximize_sharpe");
    let evaluator = PortfolioEvaluator::default();
    let optimizer = SharpeOptimizer::default();

    for n_assets in [5, 20, 50] {
        let returns = random_returns(n_assets, 756);
        group.bench_with_input(BenchmarkId::from_parameter(n_assets), &returns, |b, r| {
            b.iter(|| optimizer.maximize_sharpe(black_box(r), &evaluator, 0.01))
        });
    }
    group.finish();
}

fn bench_moments(c: &mut Criterion) {
    let returns = random_returns(50, 756);
    c.bench_function("sample_covariance_50x756", |b| {
        b.iter(|| sample_covariance(black_box(returns.values())))
    });
    c.bench_function("historical_var_50x756", |b| {
        b.iter(|| historical_var(black_box(&returns), 0.05))
    });
}

criterion_group!(benches, bench_optimizer, bench_moments);
criterion_main!(benches);
