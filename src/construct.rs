// other structures use HashSet or HashMap with a fast hasher
use core::hash::BuildHasherDefault;
use seahash::SeaHasher;

use std::collections::BTreeMap;
use std::time::Duration;

// used to print out readable forms of a construct
use std::fmt;

use serde::{Deserialize, Serialize};

pub type OtherHasher = BuildHasherDefault<SeaHasher>;

// ------------- Answer -------------
/// The outcome of one backend attempting to decide one predicate.
///
/// `Solvable` is a grouping of `Valid` and `Invalid` used as a statistics key.
/// A backend never reports it as a raw outcome.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Answer {
    Valid,
    Invalid,
    Solvable,
    Unknown,
    Timeout,
    Error,
}

impl Answer {
    /// Every key the statistics may be indexed by, grouping included.
    pub const ALL: [Answer; 6] = [
        Answer::Valid,
        Answer::Invalid,
        Answer::Solvable,
        Answer::Unknown,
        Answer::Timeout,
        Answer::Error,
    ];
    /// The outcomes a backend can actually produce.
    pub const RAW: [Answer; 5] = [
        Answer::Valid,
        Answer::Invalid,
        Answer::Unknown,
        Answer::Timeout,
        Answer::Error,
    ];

    pub fn is_solvable(&self) -> bool {
        matches!(self, Answer::Valid | Answer::Invalid | Answer::Solvable)
    }
    /// Rank used when picking the best of several answers for one predicate:
    /// Error < Timeout < Unknown < Solvable < {Valid, Invalid}.
    pub fn precedence(&self) -> u8 {
        match self {
            Answer::Error => 0,
            Answer::Timeout => 1,
            Answer::Unknown => 2,
            Answer::Solvable => 3,
            Answer::Valid | Answer::Invalid => 4,
        }
    }
}
impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Answer::Valid => "VALID",
            Answer::Invalid => "INVALID",
            Answer::Solvable => "SOLVABLE",
            Answer::Unknown => "UNKNOWN",
            Answer::Timeout => "TIMEOUT",
            Answer::Error => "ERROR",
        };
        write!(f, "{}", name)
    }
}

// ------------- Backend -------------
/// Identity of one solving engine: a name plus its configuration options.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct Backend {
    name: String,
    #[serde(default)]
    options: BTreeMap<String, String>,
}

impl Backend {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: BTreeMap::new(),
        }
    }
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn options(&self) -> &BTreeMap<String, String> {
        &self.options
    }
}
impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.options.is_empty() {
            return write!(f, "{}", self.name);
        }
        let mut s = String::new();
        for (key, value) in &self.options {
            s += &format!("{}={},", key, value);
        }
        s.pop();
        write!(f, "{}[{}]", self.name, s)
    }
}

// ------------- TimedAnswer -------------
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct TimedAnswer {
    answer: Answer,
    elapsed: Duration,
    message: Option<String>,
}

impl TimedAnswer {
    pub fn new(answer: Answer, elapsed: Duration) -> Self {
        Self {
            answer,
            elapsed,
            message: None,
        }
    }
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
    pub fn answer(&self) -> Answer {
        self.answer
    }
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

// ------------- Sample -------------
/// One predicate together with the timed answer of every backend that was run on it.
/// A backend appears at most once, which the map enforces.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Sample {
    predicate: String,
    source: Option<String>,
    results: BTreeMap<Backend, TimedAnswer>,
}

impl Sample {
    pub fn new(predicate: impl Into<String>) -> Self {
        Self {
            predicate: predicate.into(),
            source: None,
            results: BTreeMap::new(),
        }
    }
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
    // A later result for the same backend replaces the earlier one.
    pub fn with_result(mut self, backend: Backend, result: TimedAnswer) -> Self {
        self.results.insert(backend, result);
        self
    }
    pub fn predicate(&self) -> &str {
        &self.predicate
    }
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }
    pub fn results(&self) -> &BTreeMap<Backend, TimedAnswer> {
        &self.results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_orders_answers() {
        assert!(Answer::Error.precedence() < Answer::Timeout.precedence());
        assert!(Answer::Timeout.precedence() < Answer::Unknown.precedence());
        assert!(Answer::Unknown.precedence() < Answer::Solvable.precedence());
        assert!(Answer::Solvable.precedence() < Answer::Valid.precedence());
        assert_eq!(Answer::Valid.precedence(), Answer::Invalid.precedence());
    }

    #[test]
    fn solvable_grouping() {
        let solvable: Vec<Answer> = Answer::RAW.iter().copied().filter(Answer::is_solvable).collect();
        assert_eq!(solvable, vec![Answer::Valid, Answer::Invalid]);
        assert!(!Answer::RAW.contains(&Answer::Solvable));
    }

    #[test]
    fn backend_display_includes_options() {
        let plain = Backend::new("z3");
        assert_eq!(plain.to_string(), "z3");
        let configured = Backend::new("cvc5").with_option("tlimit", "10").with_option("arith", "lia");
        assert_eq!(configured.to_string(), "cvc5[arith=lia,tlimit=10]");
        assert_ne!(plain, Backend::new("z3").with_option("tlimit", "10"));
    }

    #[test]
    fn sample_keeps_one_result_per_backend() {
        let z3 = Backend::new("z3");
        let sample = Sample::new("(> x 0)")
            .with_source("node-7")
            .with_result(z3.clone(), TimedAnswer::new(Answer::Timeout, Duration::from_secs(10)))
            .with_result(z3.clone(), TimedAnswer::new(Answer::Valid, Duration::from_nanos(40)));
        assert_eq!(sample.results().len(), 1);
        assert_eq!(sample.results()[&z3].answer(), Answer::Valid);
        assert_eq!(sample.source(), Some("node-7"));
    }
}
