use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::Hash;

use crate::construct::OtherHasher;

/// Anything that can be used as a class label.
pub trait Label: Clone + Eq + Ord + Hash {}
impl<T: Clone + Eq + Ord + Hash> Label for T {}

// ------------- ClassLabelSet -------------
/// A duplicate-free set of labels, usable as a map key.
///
/// Labels are kept sorted so that equality and hashing depend on content only,
/// never on the order the labels were given in.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ClassLabelSet<C: Label> {
    labels: Vec<C>,
}
impl<C: Label> ClassLabelSet<C> {
    pub fn new(mut labels: Vec<C>) -> Self {
        labels.sort_unstable();
        labels.dedup();
        Self { labels }
    }
    pub fn single(label: C) -> Self {
        Self { labels: vec![label] }
    }
    pub fn labels(&self) -> &[C] {
        &self.labels
    }
    pub fn len(&self) -> usize {
        self.labels.len()
    }
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
    pub fn contains(&self, label: &C) -> bool {
        self.labels.binary_search(label).is_ok()
    }
    pub fn is_superset_of(&self, other: &ClassLabelSet<C>) -> bool {
        other.labels.iter().all(|label| self.contains(label))
    }
}
impl<C: Label> FromIterator<C> for ClassLabelSet<C> {
    fn from_iter<I: IntoIterator<Item = C>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
impl<C: Label + fmt::Display> fmt::Display for ClassLabelSet<C> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut s = String::new();
        for label in &self.labels {
            s += &(label.to_string() + ",");
        }
        s.pop();
        write!(f, "{{{}}}", s)
    }
}

// ------------- ClassificationAnalysis -------------
/// Counts occurrences of (possibly multi-label) classifications.
///
/// Counting a single label sums over every stored label set containing it.
/// That lookup scans all stored sets, which is fine for the small label
/// universes this is used with (answers, combinations of backends), but it
/// is not meant to scale to large ones.
///
/// Merging needs exclusive access to the receiver; callers that merge
/// standalone instances from several threads must guard them with a lock.
#[derive(Clone, Debug)]
pub struct ClassificationAnalysis<C: Label> {
    counts: HashMap<ClassLabelSet<C>, u64, OtherHasher>,
}

impl<C: Label> ClassificationAnalysis<C> {
    pub fn new() -> Self {
        Self {
            counts: HashMap::default(),
        }
    }
    pub fn add(&mut self, label: C) {
        self.add_set(ClassLabelSet::single(label), 1);
    }
    /// Counts one observation of all the given labels together.
    pub fn add_all<I: IntoIterator<Item = C>>(&mut self, labels: I) {
        self.add_set(labels.into_iter().collect(), 1);
    }
    pub fn add_set(&mut self, labels: ClassLabelSet<C>, count: u64) {
        *self.counts.entry(labels).or_insert(0) += count;
    }
    /// Number of observations that carried every one of the given labels.
    pub fn get_count(&self, labels: &[C]) -> u64 {
        let query = ClassLabelSet::new(labels.to_vec());
        self.counts
            .iter()
            .filter(|(kept, _)| kept.is_superset_of(&query))
            .map(|(_, count)| *count)
            .sum()
    }
    /// Number of observations of exactly this label set.
    pub fn get_exact_count(&self, labels: &ClassLabelSet<C>) -> u64 {
        self.counts.get(labels).copied().unwrap_or(0)
    }
    pub fn get_seen_classes(&self) -> BTreeSet<C> {
        self.counts
            .keys()
            .flat_map(|set| set.labels().iter().cloned())
            .collect()
    }
    pub fn get_seen_multilabels(&self) -> impl Iterator<Item = &ClassLabelSet<C>> {
        self.counts.keys()
    }
    pub fn iter(&self) -> impl Iterator<Item = (&ClassLabelSet<C>, u64)> {
        self.counts.iter().map(|(set, count)| (set, *count))
    }
    /// Total number of observations, regardless of labels.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }
    pub fn len(&self) -> usize {
        self.counts.len()
    }
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
    pub fn merge_with(&mut self, other: &ClassificationAnalysis<C>) {
        for (set, count) in &other.counts {
            match self.counts.entry(set.clone()) {
                Entry::Occupied(mut e) => *e.get_mut() += count,
                Entry::Vacant(e) => {
                    e.insert(*count);
                }
            }
        }
    }
}
impl<C: Label> Default for ClassificationAnalysis<C> {
    fn default() -> Self {
        Self::new()
    }
}
impl<C: Label> PartialEq for ClassificationAnalysis<C> {
    fn eq(&self, other: &Self) -> bool {
        self.counts == other.counts
    }
}
impl<C: Label> Eq for ClassificationAnalysis<C> {}
