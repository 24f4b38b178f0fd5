use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gridmdp::dynamic::{PolicyEvaluation, ValueIteration};
use gridmdp::grid::{GridLevel, GridParameters, Maze};

fn maze_level(size: usize) -> GridLevel {
    GridLevel::new(GridParameters {
        width: size,
        height: size,
        maze: true,
        maze_seed: Some(42),
        ..Default::default()
    })
    .unwrap()
}

fn bench_maze_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("maze_generation");
    for size in [8, 32, 128] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| Maze::generate(black_box(size), black_box(size), (0, 0), Some(7)).unwrap())
        });
    }
    group.finish();
}

fn bench_value_iteration(c: &mut Criterion) {
    let mut group = c.benchmark_group("value_iteration");
    for size in [8, 16, 32] {
        let level = maze_level(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &level, |b, level| {
            b.iter(|| {
                let mut solver = ValueIteration::new(level, 0.9).unwrap();
                black_box(solver.run_to_convergence(1000, 1e-3))
            })
        });
    }
    group.finish();
}

fn bench_policy_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("policy_evaluation");
    for size in [4, 8, 16] {
        let level = GridLevel::new(GridParameters {
            width: size,
            height: size,
            ..Default::default()
        })
        .unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(size), &level, |b, level| {
            b.iter(|| {
                let mut evaluation = PolicyEvaluation::new(level, 1.0).unwrap();
                black_box(evaluation.run_to_convergence(100, 1e-3).unwrap())
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_maze_generation,
    bench_value_iteration,
    bench_policy_evaluation
);
criterion_main!(benches);
