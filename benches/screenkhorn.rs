use criterion::{black_box, criterion_group, criterion_main, Criterion};

use ndarray::prelude::*;
use ndarray_stats::QuantileExt;
use rand::prelude::*;
use rand::rngs::StdRng;

use screenkhorn::prelude::*;
use screenkhorn::sinkhorn::sinkhorn_knopp;

/// Two gaussian point clouds and a normalized squared-euclidean cost.
fn benchmark_problem(n: usize) -> (Array1<f64>, Array1<f64>, Array2<f64>) {
    let mut rng = StdRng::seed_from_u64(42);

    let mut source = Array2::<f64>::zeros((n, 2));
    let mut target = Array2::<f64>::zeros((n, 2));
    for i in 0..n {
        source[(i, 0)] = rng.gen::<f64>();
        source[(i, 1)] = rng.gen::<f64>();
        target[(i, 0)] = 4.0 + rng.gen::<f64>();
        target[(i, 1)] = 4.0 + rng.gen::<f64>();
    }

    let weights = Array1::from_elem(n, 1. / n as f64);
    let mut cost = dist(&source, &target, SqEuclidean);
    cost = &cost / *cost.max().unwrap();

    (weights.clone(), weights, cost)
}

fn screenkhorn_benchmark(c: &mut Criterion) {
    let n = 64;
    let (a, b, cost) = benchmark_problem(n);
    let reg = 1.0;

    c.bench_function("screenkhorn half active", |bencher| {
        bencher.iter(|| {
            let plan = Screenkhorn::new(&a, &b, &cost, reg, n / 2, n / 2)
                .solve()
                .unwrap();
            black_box(plan);
        })
    });

    c.bench_function("screenkhorn full mode", |bencher| {
        bencher.iter(|| {
            let plan = Screenkhorn::new(&a, &b, &cost, reg, n, n).solve().unwrap();
            black_box(plan);
        })
    });

    c.bench_function("dense sinkhorn", |bencher| {
        bencher.iter(|| {
            let plan = sinkhorn_knopp(&a, &b, &cost, reg, None, None).unwrap();
            black_box(plan);
        })
    });
}

criterion_group!(benches, screenkhorn_benchmark);
criterion_main!(benches);
