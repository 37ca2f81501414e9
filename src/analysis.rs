//! The aggregate report over a predicate database.
//!
//! A [`PredDbAnalysis`] consumes [`Sample`]s one at a time and keeps:
//! * the total number of predicates and a classification of their best answer,
//! * the predicates some backends judged valid and others invalid (contradictions),
//! * per answer, how often each combination of backends agreed on it,
//! * per answer and backend, the distribution of runtimes,
//! * per backend, the runtimes of everything it answered or at least finished,
//! * how often each backend was the fastest to produce a non-timeout, non-error answer.
//!
//! Reports only grow, and two reports over disjoint inputs merge into the
//! report of the combined input regardless of order.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, trace};

use crate::classification::{ClassLabelSet, ClassificationAnalysis};
use crate::construct::{Answer, Backend, OtherHasher, Sample};
use crate::regression::RegressionAnalysis;

pub type Runtimes = RegressionAnalysis<Duration>;

#[derive(Clone, Debug, Default)]
pub struct PredDbAnalysis {
    pred_count: u64,
    best_answers: ClassificationAnalysis<Answer>,
    // predicate text to the number of contradictory samples carrying it
    contradictions: HashMap<String, u64, OtherHasher>,
    backend_answers: HashMap<Answer, ClassificationAnalysis<Backend>, OtherHasher>,
    backends: HashSet<Backend, OtherHasher>,
    runtimes: HashMap<Answer, HashMap<Backend, Runtimes, OtherHasher>, OtherHasher>,
    answered_runtimes: HashMap<Backend, Runtimes, OtherHasher>,
    timed_runtimes: HashMap<Backend, Runtimes, OtherHasher>,
    fastest: ClassificationAnalysis<Backend>,
}

impl PredDbAnalysis {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------- adding -------------
    pub fn add(&mut self, sample: &Sample) {
        self.pred_count += 1;
        match Self::best_answer(sample) {
            Some(Answer::Valid) => self.best_answers.add_all([Answer::Valid, Answer::Solvable]),
            Some(Answer::Invalid) => self.best_answers.add_all([Answer::Invalid, Answer::Solvable]),
            Some(answer) => self.best_answers.add(answer),
            None => {
                debug!(predicate = sample.predicate(), "contradicting answers");
                *self.contradictions.entry(sample.predicate().to_owned()).or_insert(0) += 1;
            }
        }
        self.add_agreement(sample);
        self.add_runtimes(sample);
        self.add_fastest(sample);
    }

    /// Resolves the best answer of one sample, or `None` when one backend
    /// said valid and another invalid.
    fn best_answer(sample: &Sample) -> Option<Answer> {
        let mut best = Answer::Error;
        let mut valid = false;
        let mut invalid = false;
        for result in sample.results().values() {
            let answer = result.answer();
            match answer {
                Answer::Valid => valid = true,
                Answer::Invalid => invalid = true,
                _ => (),
            }
            if valid && invalid {
                return None;
            }
            if answer.precedence() > best.precedence() {
                best = answer;
            }
        }
        Some(best)
    }

    fn add_agreement(&mut self, sample: &Sample) {
        let mut clusters: BTreeMap<Answer, Vec<Backend>> = BTreeMap::new();
        for (backend, result) in sample.results() {
            let answer = result.answer();
            clusters.entry(answer).or_default().push(backend.clone());
            if answer.is_solvable() && answer != Answer::Solvable {
                clusters.entry(Answer::Solvable).or_default().push(backend.clone());
            }
        }
        for (answer, cluster) in clusters {
            self.backends.extend(cluster.iter().cloned());
            self.backend_answers
                .entry(answer)
                .or_default()
                .add_set(ClassLabelSet::new(cluster), 1);
        }
    }

    fn add_runtimes(&mut self, sample: &Sample) {
        for (backend, result) in sample.results() {
            let answer = result.answer();
            let elapsed = result.elapsed();
            self.runtime_mut(answer, backend).add(elapsed);
            if matches!(answer, Answer::Valid | Answer::Invalid) {
                self.runtime_mut(Answer::Solvable, backend).add(elapsed);
            }
            // timeouts pile up at the configured limit and are left out here
            if answer.is_solvable() || matches!(answer, Answer::Unknown | Answer::Error) {
                self.timed_runtimes.entry(backend.clone()).or_default().add(elapsed);
                if answer != Answer::Error {
                    self.answered_runtimes.entry(backend.clone()).or_default().add(elapsed);
                }
            }
        }
    }

    fn add_fastest(&mut self, sample: &Sample) {
        let mut fastest: Option<Duration> = None;
        let mut winners: Vec<Backend> = Vec::new();
        for (backend, result) in sample.results() {
            if matches!(result.answer(), Answer::Timeout | Answer::Error) {
                continue;
            }
            let elapsed = result.elapsed();
            match fastest {
                Some(best) if elapsed > best => (),
                Some(best) if elapsed == best => winners.push(backend.clone()),
                _ => {
                    fastest = Some(elapsed);
                    winners.clear();
                    winners.push(backend.clone());
                }
            }
        }
        if !winners.is_empty() {
            trace!(predicate = sample.predicate(), winners = winners.len(), "fastest");
            self.fastest.add_all(winners);
        }
    }

    fn runtime_mut(&mut self, answer: Answer, backend: &Backend) -> &mut Runtimes {
        self.runtimes
            .entry(answer)
            .or_default()
            .entry(backend.clone())
            .or_default()
    }

    // ------------- merging -------------
    /// Adds everything `other` has seen onto this report.
    ///
    /// Merging is additive: merging the same partition twice counts it twice.
    /// The receiver is borrowed exclusively for the whole merge; to reduce
    /// concurrently into one report, share it through
    /// [`crate::interface::SharedAnalysis`].
    pub fn merge_with(&mut self, other: &PredDbAnalysis) {
        self.pred_count += other.pred_count;
        self.best_answers.merge_with(&other.best_answers);
        for (predicate, count) in &other.contradictions {
            *self.contradictions.entry(predicate.clone()).or_insert(0) += count;
        }
        self.backends.extend(other.backends.iter().cloned());
        for (answer, classification) in &other.backend_answers {
            match self.backend_answers.entry(*answer) {
                Entry::Occupied(mut e) => e.get_mut().merge_with(classification),
                Entry::Vacant(e) => {
                    e.insert(classification.clone());
                }
            }
        }
        for (answer, per_backend) in &other.runtimes {
            match self.runtimes.entry(*answer) {
                Entry::Occupied(mut e) => Self::merge_runtimes(e.get_mut(), per_backend),
                Entry::Vacant(e) => {
                    e.insert(per_backend.clone());
                }
            }
        }
        Self::merge_runtimes(&mut self.answered_runtimes, &other.answered_runtimes);
        Self::merge_runtimes(&mut self.timed_runtimes, &other.timed_runtimes);
        self.fastest.merge_with(&other.fastest);
    }

    fn merge_runtimes(
        own: &mut HashMap<Backend, Runtimes, OtherHasher>,
        other: &HashMap<Backend, Runtimes, OtherHasher>,
    ) {
        for (backend, runtimes) in other {
            match own.entry(backend.clone()) {
                Entry::Occupied(mut e) => e.get_mut().merge_with(runtimes),
                Entry::Vacant(e) => {
                    e.insert(runtimes.clone());
                }
            }
        }
    }

    // ------------- reading -------------
    pub fn get_pred_count(&self) -> u64 {
        self.pred_count
    }
    /// Number of predicates whose best answer was `answer`. Contradictions
    /// count towards no answer.
    pub fn get_pred_count_with(&self, answer: Answer) -> u64 {
        self.best_answers.get_count(&[answer])
    }
    /// The distinct predicates that received contradictory answers.
    pub fn get_contradictions(&self) -> impl Iterator<Item = &str> {
        self.contradictions.keys().map(String::as_str)
    }
    /// Number of contradictory samples, counting a recurring predicate once
    /// per sample.
    pub fn get_contradiction_count(&self) -> u64 {
        self.contradictions.values().sum()
    }
    /// Number of predicates on which every one of `backends` answered `answer`.
    pub fn get_answer_count(&self, answer: Answer, backends: &[Backend]) -> u64 {
        self.backend_answers
            .get(&answer)
            .map_or(0, |classification| classification.get_count(backends))
    }
    pub fn get_fastest_answer_count(&self, backend: &Backend) -> u64 {
        self.fastest.get_count(std::slice::from_ref(backend))
    }
    /// Every backend seen so far, in order.
    pub fn get_backends(&self) -> Vec<&Backend> {
        let mut backends: Vec<&Backend> = self.backends.iter().collect();
        backends.sort();
        backends
    }
    pub fn get_best_answers(&self) -> &ClassificationAnalysis<Answer> {
        &self.best_answers
    }
    pub fn get_answer_classification(&self, answer: Answer) -> Option<&ClassificationAnalysis<Backend>> {
        self.backend_answers.get(&answer)
    }
    pub fn get_fastest(&self) -> &ClassificationAnalysis<Backend> {
        &self.fastest
    }
    pub fn get_runtime(&self, answer: Answer, backend: &Backend) -> Option<&Runtimes> {
        self.runtimes.get(&answer).and_then(|per_backend| per_backend.get(backend))
    }
    pub fn get_answered_runtime(&self, backend: &Backend) -> Option<&Runtimes> {
        self.answered_runtimes.get(backend)
    }
    pub fn get_timed_runtime(&self, backend: &Backend) -> Option<&Runtimes> {
        self.timed_runtimes.get(backend)
    }

    // runtime statistics per (answer, backend), in nanoseconds where averaged
    pub fn get_average_runtime(&self, answer: Answer, backend: &Backend) -> Option<f64> {
        self.get_runtime(answer, backend).and_then(Runtimes::get_average)
    }
    pub fn get_minimum_runtime(&self, answer: Answer, backend: &Backend) -> Option<Duration> {
        self.get_runtime(answer, backend).and_then(Runtimes::get_minimum)
    }
    pub fn get_maximum_runtime(&self, answer: Answer, backend: &Backend) -> Option<Duration> {
        self.get_runtime(answer, backend).and_then(Runtimes::get_maximum)
    }
    pub fn get_median_runtime(&self, answer: Answer, backend: &Backend) -> Option<f64> {
        self.get_runtime(answer, backend).and_then(Runtimes::get_median)
    }
    pub fn get_first_quartile_runtime(&self, answer: Answer, backend: &Backend) -> Option<f64> {
        self.get_runtime(answer, backend).and_then(Runtimes::get_first_quartile)
    }
    pub fn get_third_quartile_runtime(&self, answer: Answer, backend: &Backend) -> Option<f64> {
        self.get_runtime(answer, backend).and_then(Runtimes::get_third_quartile)
    }

    // runtimes of everything a backend answered (solvable or unknown)
    pub fn get_average_answered_runtime(&self, backend: &Backend) -> Option<f64> {
        self.get_answered_runtime(backend).and_then(Runtimes::get_average)
    }
    pub fn get_minimum_answered_runtime(&self, backend: &Backend) -> Option<Duration> {
        self.get_answered_runtime(backend).and_then(Runtimes::get_minimum)
    }
    pub fn get_maximum_answered_runtime(&self, backend: &Backend) -> Option<Duration> {
        self.get_answered_runtime(backend).and_then(Runtimes::get_maximum)
    }
    pub fn get_median_answered_runtime(&self, backend: &Backend) -> Option<f64> {
        self.get_answered_runtime(backend).and_then(Runtimes::get_median)
    }
    pub fn get_first_quartile_answered_runtime(&self, backend: &Backend) -> Option<f64> {
        self.get_answered_runtime(backend).and_then(Runtimes::get_first_quartile)
    }
    pub fn get_third_quartile_answered_runtime(&self, backend: &Backend) -> Option<f64> {
        self.get_answered_runtime(backend).and_then(Runtimes::get_third_quartile)
    }

    // runtimes of everything a backend finished, errors included
    pub fn get_average_timed_runtime(&self, backend: &Backend) -> Option<f64> {
        self.get_timed_runtime(backend).and_then(Runtimes::get_average)
    }
    pub fn get_minimum_timed_runtime(&self, backend: &Backend) -> Option<Duration> {
        self.get_timed_runtime(backend).and_then(Runtimes::get_minimum)
    }
    pub fn get_maximum_timed_runtime(&self, backend: &Backend) -> Option<Duration> {
        self.get_timed_runtime(backend).and_then(Runtimes::get_maximum)
    }
    pub fn get_median_timed_runtime(&self, backend: &Backend) -> Option<f64> {
        self.get_timed_runtime(backend).and_then(Runtimes::get_median)
    }
    pub fn get_first_quartile_timed_runtime(&self, backend: &Backend) -> Option<f64> {
        self.get_timed_runtime(backend).and_then(Runtimes::get_first_quartile)
    }
    pub fn get_third_quartile_timed_runtime(&self, backend: &Backend) -> Option<f64> {
        self.get_timed_runtime(backend).and_then(Runtimes::get_third_quartile)
    }

    /// A plain snapshot per backend, sorted by backend, for external formatters.
    pub fn summarize(&self) -> Vec<BackendSummary> {
        self.get_backends()
            .into_iter()
            .map(|backend| {
                let answers = Answer::ALL
                    .iter()
                    .map(|answer| (*answer, self.get_answer_count(*answer, std::slice::from_ref(backend))))
                    .filter(|(_, count)| *count > 0)
                    .collect();
                BackendSummary {
                    backend: backend.to_string(),
                    answers,
                    fastest: self.get_fastest_answer_count(backend),
                    answered: self.get_answered_runtime(backend).map(RuntimeSummary::from),
                    timed: self.get_timed_runtime(backend).map(RuntimeSummary::from),
                }
            })
            .collect()
    }
}

impl PartialEq for PredDbAnalysis {
    fn eq(&self, other: &Self) -> bool {
        self.pred_count == other.pred_count
            && self.best_answers == other.best_answers
            && self.contradictions == other.contradictions
            && self.backend_answers == other.backend_answers
            && self.backends == other.backends
            && self.runtimes == other.runtimes
            && self.answered_runtimes == other.answered_runtimes
            && self.timed_runtimes == other.timed_runtimes
            && self.fastest == other.fastest
    }
}

impl fmt::Display for PredDbAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} predicates", self.pred_count)?;
        for answer in Answer::ALL {
            write!(f, ", {} {}", self.get_pred_count_with(answer), answer)?;
        }
        writeln!(f, ", {} contradictions", self.get_contradiction_count())?;
        for summary in self.summarize() {
            write!(f, "{}: fastest {}", summary.backend, summary.fastest)?;
            for (answer, count) in &summary.answers {
                write!(f, ", {} {}", count, answer)?;
            }
            if let Some(answered) = &summary.answered {
                write!(f, ", answered median {}ns", answered.median)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

// ------------- Summaries -------------
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BackendSummary {
    pub backend: String,
    pub answers: BTreeMap<Answer, u64>,
    pub fastest: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answered: Option<RuntimeSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timed: Option<RuntimeSummary>,
}

/// Runtime statistics in nanoseconds.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RuntimeSummary {
    pub count: usize,
    pub minimum: u64,
    pub maximum: u64,
    pub average: f64,
    pub first_quartile: Option<f64>,
    pub median: f64,
    pub third_quartile: f64,
}

// durations beyond u64 nanoseconds (about 584 years) clamp to the maximum
fn saturating_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

impl From<&Runtimes> for RuntimeSummary {
    // only built from non-empty statistics
    fn from(runtimes: &Runtimes) -> Self {
        Self {
            count: runtimes.get_sample_count(),
            minimum: runtimes.get_minimum().map_or(0, saturating_nanos),
            maximum: runtimes.get_maximum().map_or(0, saturating_nanos),
            average: runtimes.get_average().unwrap_or(0.0),
            first_quartile: runtimes.get_first_quartile(),
            median: runtimes.get_median().unwrap_or(0.0),
            third_quartile: runtimes.get_third_quartile().unwrap_or(0.0),
        }
    }
}
