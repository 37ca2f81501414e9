use std::time::Duration;

use predstat::construct::{Answer, Backend, Sample, TimedAnswer};
use predstat::interface::{analyse, analyse_partitions, merge_all, SharedAnalysis};
use predstat::{AnalysisConfig, PredDbAnalysis};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn partitions(count: usize, size: usize) -> Vec<Vec<Sample>> {
    let names = ["z3", "cvc5", "yices", "mathsat"];
    (0..count)
        .map(|p| {
            (0..size)
                .map(|i| {
                    let n = p * size + i;
                    names.iter().enumerate().fold(Sample::new(format!("pred-{}", n)), |sample, (b, name)| {
                        let answer = Answer::RAW[(n * 7 + b * 3) % Answer::RAW.len()];
                        let elapsed = Duration::from_nanos(((n * 13 + b * 31) % 97) as u64 + 1);
                        sample.with_result(Backend::new(*name), TimedAnswer::new(answer, elapsed))
                    })
                })
                .collect()
        })
        .collect()
}

#[test]
fn parallel_equals_sequential() {
    init_tracing();
    let parts = partitions(16, 40);
    let sequential = analyse(parts.iter().flatten().cloned());
    for workers in [1, 2, 4, 7] {
        let config = AnalysisConfig { workers, queue_depth: 3 };
        let parallel = analyse_partitions(parts.clone(), &config).expect("analysis");
        assert_eq!(parallel, sequential, "{} workers", workers);
    }
}

#[test]
fn partition_order_does_not_matter() {
    init_tracing();
    let mut parts = partitions(9, 25);
    let config = AnalysisConfig::new(3);
    let forward = analyse_partitions(parts.clone(), &config).expect("analysis");
    parts.reverse();
    let backward = analyse_partitions(parts, &config).expect("analysis");
    assert_eq!(forward, backward);
}

#[test]
fn lazy_partitions_are_consumed() {
    init_tracing();
    // partitions are produced on demand by the iterator
    let lazy = (0..5).map(|p| partitions(5, 10).swap_remove(p));
    let report = analyse_partitions(lazy, &AnalysisConfig::new(2)).expect("analysis");
    assert_eq!(report.get_pred_count(), 50);
}

#[test]
fn no_partitions_give_empty_report() {
    let report = analyse_partitions(Vec::<Vec<Sample>>::new(), &AnalysisConfig::new(4)).expect("analysis");
    assert_eq!(report, PredDbAnalysis::new());
}

#[test]
fn zero_workers_is_a_config_error() {
    let err = analyse_partitions(partitions(1, 1), &AnalysisConfig { workers: 0, queue_depth: 1 }).unwrap_err();
    assert!(matches!(err, predstat::PredstatError::Config(_)));
}

#[test]
fn tree_reduction_matches() {
    let parts = partitions(11, 20);
    let sequential = analyse(parts.iter().flatten().cloned());
    let reports: Vec<PredDbAnalysis> = parts.into_iter().map(analyse).collect();
    assert_eq!(merge_all(reports), sequential);
    assert_eq!(merge_all(Vec::<PredDbAnalysis>::new()), PredDbAnalysis::new());
}

#[test]
fn shared_accumulator_under_contention() {
    let parts = partitions(32, 10);
    let sequential = analyse(parts.iter().flatten().cloned());
    let shared = SharedAnalysis::new();
    std::thread::scope(|scope| {
        for chunk in parts.chunks(4) {
            let shared = shared.clone();
            scope.spawn(move || {
                for partition in chunk {
                    shared.merge(&analyse(partition.iter().cloned())).expect("merge");
                }
            });
        }
    });
    assert_eq!(shared.snapshot().expect("snapshot"), sequential);
    assert_eq!(shared.into_inner().expect("sole owner"), sequential);
}

#[test]
fn into_inner_requires_sole_owner() {
    let shared = SharedAnalysis::new();
    let other = shared.clone();
    assert!(shared.into_inner().is_err());
    assert!(other.into_inner().is_ok());
}

#[test]
fn panicking_workers_report_an_error() {
    init_tracing();
    // every odd partition panics halfway through, so several workers can die
    let corrupt = (0..6).map(|p| {
        (0..10).map(move |i| {
            if p % 2 == 1 && i == 5 {
                panic!("corrupt partition {}", p);
            }
            Sample::new(format!("pred-{}-{}", p, i))
                .with_result(Backend::new("z3"), TimedAnswer::new(Answer::Valid, Duration::from_nanos(1)))
        })
    });
    let err = analyse_partitions(corrupt, &AnalysisConfig { workers: 3, queue_depth: 1 }).unwrap_err();
    assert!(matches!(err, predstat::PredstatError::Worker(_)), "{:?}", err);
}
