//! Driver that turns partitions of samples into one report.
//!
//! Each partition is folded into its own [`PredDbAnalysis`] on a single
//! thread. Partitions share no state, so several workers can analyse them at
//! once and merge their results into a [`SharedAnalysis`]. Because merging is
//! associative and commutative, the final report does not depend on
//! partition order or on how the workers were scheduled.

use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::analysis::PredDbAnalysis;
use crate::config::AnalysisConfig;
use crate::construct::Sample;
use crate::error::{PredstatError, Result};

/// Folds one partition into a fresh report, sequentially.
pub fn analyse<I>(samples: I) -> PredDbAnalysis
where
    I: IntoIterator<Item = Sample>,
{
    let mut analysis = PredDbAnalysis::new();
    for sample in samples {
        analysis.add(&sample);
    }
    analysis
}

/// Accumulator that several workers can merge into at the same time.
///
/// Each merge holds the lock over the whole report for its full duration.
#[derive(Debug, Clone, Default)]
pub struct SharedAnalysis(Arc<Mutex<PredDbAnalysis>>);

impl SharedAnalysis {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn merge(&self, other: &PredDbAnalysis) -> Result<()> {
        let mut guard = self
            .0
            .lock()
            .map_err(|e| PredstatError::Lock(e.to_string()))?;
        guard.merge_with(other);
        Ok(())
    }
    /// A copy of the report as it stands.
    pub fn snapshot(&self) -> Result<PredDbAnalysis> {
        let guard = self
            .0
            .lock()
            .map_err(|e| PredstatError::Lock(e.to_string()))?;
        Ok(guard.clone())
    }
    /// The report, once no other handle is left.
    pub fn into_inner(self) -> Result<PredDbAnalysis> {
        let mutex = Arc::try_unwrap(self.0).map_err(|_| {
            PredstatError::Invariant("shared analysis still referenced".to_string())
        })?;
        mutex
            .into_inner()
            .map_err(|e| PredstatError::Lock(e.to_string()))
    }
}

/// Analyses every partition and reduces the partial reports into one.
///
/// Partitions are pulled lazily from `partitions` on the calling thread and
/// handed to `config.workers` threads through a queue bounded by
/// `config.queue_depth`. Each worker merges into one shared accumulator.
pub fn analyse_partitions<P, I>(partitions: P, config: &AnalysisConfig) -> Result<PredDbAnalysis>
where
    P: IntoIterator<Item = I>,
    I: IntoIterator<Item = Sample> + Send,
{
    let config = config.clone().validated()?;
    let started = Instant::now();
    if config.workers == 1 {
        let mut total = PredDbAnalysis::new();
        let mut count = 0usize;
        for partition in partitions {
            total.merge_with(&analyse(partition));
            count += 1;
        }
        info!(partitions = count, predicates = total.get_pred_count(), ms = started.elapsed().as_secs_f64() * 1000.0, "analysis complete");
        return Ok(total);
    }

    let shared = SharedAnalysis::new();
    let (tx, rx) = mpsc::sync_channel::<I>(config.queue_depth);
    let rx = Arc::new(Mutex::new(rx));
    let dispatched = std::thread::scope(|scope| -> Result<usize> {
        let handles: Vec<_> = (0..config.workers)
            .map(|worker| {
                let rx = Arc::clone(&rx);
                let shared = shared.clone();
                scope.spawn(move || run_worker(worker, &rx, &shared))
            })
            .collect();
        // only workers hold the receiver, so dispatch notices when they are all gone
        drop(rx);

        let mut dispatched = 0usize;
        for partition in partitions {
            if tx.send(partition).is_err() {
                warn!(dispatched, "all workers gone, stopping dispatch");
                break;
            }
            dispatched += 1;
        }
        // closing the queue lets idle workers finish
        drop(tx);

        // every handle is joined before any failure is reported
        let outcomes: Vec<Result<usize>> = handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .map_err(|_| PredstatError::Worker("worker thread panicked".to_string()))
                    .and_then(|outcome| outcome)
            })
            .collect();
        let mut analysed = 0usize;
        for outcome in outcomes {
            analysed += outcome?;
        }
        if analysed != dispatched {
            return Err(PredstatError::Invariant(format!(
                "dispatched {} partitions but analysed {}",
                dispatched, analysed
            )));
        }
        Ok(dispatched)
    })?;

    let total = shared.into_inner()?;
    info!(partitions = dispatched, workers = config.workers, predicates = total.get_pred_count(), ms = started.elapsed().as_secs_f64() * 1000.0, "analysis complete");
    Ok(total)
}

fn run_worker<I>(worker: usize, rx: &Mutex<Receiver<I>>, shared: &SharedAnalysis) -> Result<usize>
where
    I: IntoIterator<Item = Sample>,
{
    let mut analysed = 0usize;
    loop {
        // the receiver lock is released before the partition is analysed
        let next = rx
            .lock()
            .map_err(|e| PredstatError::Lock(e.to_string()))?
            .recv();
        let Ok(partition) = next else { break };
        let started = Instant::now();
        let partial = analyse(partition);
        debug!(worker, predicates = partial.get_pred_count(), ms = started.elapsed().as_secs_f64() * 1000.0, "partition analysed");
        shared.merge(&partial)?;
        analysed += 1;
    }
    Ok(analysed)
}

/// Reduces reports pairwise, tree-shaped, without any shared state.
pub fn merge_all<R>(reports: R) -> PredDbAnalysis
where
    R: IntoIterator<Item = PredDbAnalysis>,
{
    let mut level: Vec<PredDbAnalysis> = reports.into_iter().collect();
    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len().div_ceil(2));
        let mut reports = level.into_iter();
        while let Some(mut left) = reports.next() {
            if let Some(right) = reports.next() {
                left.merge_with(&right);
            }
            next.push(left);
        }
        level = next;
    }
    level.pop().unwrap_or_default()
}
