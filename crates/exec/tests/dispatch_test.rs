mod common;

use std::sync::Arc;

use common::{square_and_sum, Env};
use parskel_core::{Array, ExecConfig, ExecError, Ppt, PptConfig, Shape};
use parskel_exec::{FoldKind, FoldPlan, MetricsRecorder, SkeletonDispatcher, WorkPool};

fn ppt(large: usize) -> PptConfig {
    PptConfig {
        large: Ppt::new(large).unwrap(),
        small: Ppt::ONE,
    }
}

#[test]
fn map_squares_every_element() {
    let pool = WorkPool::new(4).unwrap();
    let dispatcher = SkeletonDispatcher::new(&pool, ppt(7));
    let env = Env::new((0..1000).collect(), 0);

    let out = dispatcher.map(&square_and_sum(), &env, &Shape::from([1000])).unwrap();

    let expected: Vec<i64> = (0..1000).map(|x| x * x).collect();
    assert_eq!(out.shape(), &Shape::from([1000]));
    assert_eq!(out.as_slice(), expected.as_slice());
}

#[test]
fn stencil2_multiplies_over_the_common_extent() {
    let pool = WorkPool::new(3).unwrap();
    let dispatcher = SkeletonDispatcher::new(&pool, ppt(2));
    let a = Array::from_vec(Shape::from([6]), vec![1, 2, 3, 4, 5, 6]).unwrap();
    let b = Array::from_vec(Shape::from([4]), vec![10, 10, 10, 10]).unwrap();
    let env = Env::new(Vec::new(), 0);

    let out = dispatcher.stencil2(&square_and_sum(), &env, &a, &b).unwrap();

    assert_eq!(out.as_slice(), &[10, 20, 30, 40]);
}

#[test]
fn fold_all_scenarios() {
    // 1 worker, inclusive: [1..5] -> 15
    let one = WorkPool::new(1).unwrap();
    let env = Env::new(vec![1, 2, 3, 4, 5], 0);
    let out = SkeletonDispatcher::new(&one, ppt(2))
        .fold_all(&square_and_sum(), &env, 5, FoldKind::Inclusive)
        .unwrap();
    assert_eq!(out.as_slice(), &[15]);

    // 4 workers, threshold 2: two-phase over 3 stripes, still 15
    let four = WorkPool::new(4).unwrap();
    let dispatcher = SkeletonDispatcher::new(&four, ppt(2));
    assert_eq!(
        dispatcher.plan_fold_all(5, FoldKind::Inclusive).unwrap(),
        FoldPlan::TwoPhaseParallel { len: 5, stripe: 2, steps: 3 }
    );
    let out = dispatcher
        .fold_all(&square_and_sum(), &env, 5, FoldKind::Inclusive)
        .unwrap();
    assert_eq!(out.as_slice(), &[15]);
}

#[test]
fn fold_all_of_empty_input() {
    let pool = WorkPool::new(2).unwrap();
    let dispatcher = SkeletonDispatcher::new(&pool, ppt(4));
    let env = Env::new(Vec::new(), 42);

    let seeded = dispatcher
        .fold_all(&square_and_sum(), &env, 0, FoldKind::Exclusive)
        .unwrap();
    assert_eq!(seeded.shape(), &Shape::scalar());
    assert_eq!(seeded.as_slice(), &[42]);

    let err = dispatcher
        .fold_all(&square_and_sum(), &env, 0, FoldKind::Inclusive)
        .unwrap_err();
    assert!(matches!(err, ExecError::Precondition(_)), "got {:?}", err);
}

#[test]
fn large_fold_matches_sequential_sum() {
    let pool = WorkPool::new(4).unwrap();
    let input: Vec<i64> = (0..250_000).map(|i| i % 13 - 6).collect();
    let expected: i64 = input.iter().sum::<i64>() + 3;
    let env = Env::new(input, 3);

    for large in [1, 100, 16_384, 1_000_000] {
        let out = SkeletonDispatcher::new(&pool, ppt(large))
            .fold_all(&square_and_sum(), &env, 250_000, FoldKind::Exclusive)
            .unwrap();
        assert_eq!(out.as_slice(), &[expected], "large_ppt = {}", large);
    }
}

#[test]
fn fold_rows_sums_each_row() {
    let pool = WorkPool::new(2).unwrap();
    let dispatcher = SkeletonDispatcher::new(&pool, ppt(1));
    let env = Env::new(vec![1, 2, 3, 4, 5, 6], 0);

    let out = dispatcher
        .fold_rows(&square_and_sum(), &env, &Shape::from([2, 3]), FoldKind::Inclusive)
        .unwrap();

    assert_eq!(out.shape(), &Shape::from([2]));
    assert_eq!(out.as_slice(), &[6, 15]);
}

#[test]
fn fold_rows_with_empty_rows_broadcasts_the_seed() {
    let pool = WorkPool::new(2).unwrap();
    let dispatcher = SkeletonDispatcher::new(&pool, ppt(1));
    let env = Env::new(Vec::new(), 9);

    let out = dispatcher
        .fold_rows(&square_and_sum(), &env, &Shape::from([4, 0]), FoldKind::Exclusive)
        .unwrap();

    assert_eq!(out.as_slice(), &[9, 9, 9, 9]);
}

#[test]
fn config_driven_dispatch_records_metrics() {
    let config = ExecConfig::from_toml_str(
        r#"
        workers = 3
        large_ppt = 8
        small_ppt = 2
        "#,
    )
    .unwrap();
    let pool = WorkPool::from_config(&config).unwrap();
    let recorder = Arc::new(MetricsRecorder::new());
    let dispatcher = SkeletonDispatcher::from_config(&pool, &config).with_instrument(recorder.clone());
    let env = Env::new((1..=100).collect(), 0);

    let out = dispatcher
        .fold_all(&square_and_sum(), &env, 100, FoldKind::Exclusive)
        .unwrap();
    assert_eq!(out.as_slice(), &[5050]);

    let snapshot = recorder.snapshot();
    assert_eq!(snapshot.dispatches_by_strategy.get("fold_all/two_phase"), Some(&1));
    assert_eq!(snapshot.failed_calls, 0);
    assert!(snapshot.total_calls() >= 2);
    assert!(snapshot.chunks_by_worker.keys().all(|&w| w < 3));
}
