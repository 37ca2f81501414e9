use std::sync::OnceLock;

use crate::datatype::Numeric;

// ------------- RegressionAnalysis -------------
/// Streaming accumulator of numeric samples with order statistics.
///
/// Minimum, maximum and mean are maintained on every `add`. Median and
/// quartiles are computed from a sorted view that is rebuilt lazily the first
/// time it is asked for after a mutation.
///
/// Quartiles use a median-of-halves rule over the last index `L = n - 1`:
/// the third quartile is the median of `[L / 2, L]`, the first quartile the
/// median of `[0, L / 2]` when `L` is even and of `[0, L / 2 - 1]` when it is
/// odd. For an odd count both halves share the middle element; for an even
/// count the upper half reaches one element further down. Reports built
/// independently are compared against each other, so the index arithmetic
/// here must stay exactly as is.
#[derive(Clone, Debug)]
pub struct RegressionAnalysis<N: Numeric> {
    samples: Vec<N>,
    sorted: OnceLock<Vec<N>>,
    minimum: Option<N>,
    maximum: Option<N>,
    mean: f64,
}

impl<N: Numeric> RegressionAnalysis<N> {
    pub fn new() -> Self {
        Self {
            samples: Vec::new(),
            sorted: OnceLock::new(),
            minimum: None,
            maximum: None,
            mean: 0.0,
        }
    }
    pub fn add(&mut self, n: N) {
        self.samples.push(n);
        if self.minimum.is_none_or(|min| n < min) {
            self.minimum = Some(n);
        }
        if self.maximum.is_none_or(|max| n > max) {
            self.maximum = Some(n);
        }
        // count already includes n
        self.mean += (n.to_f64() - self.mean) / self.samples.len() as f64;
        self.sorted = OnceLock::new();
    }
    pub fn get_sample_count(&self) -> usize {
        self.samples.len()
    }
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
    pub fn get_minimum(&self) -> Option<N> {
        self.minimum
    }
    pub fn get_maximum(&self) -> Option<N> {
        self.maximum
    }
    pub fn get_average(&self) -> Option<f64> {
        if self.samples.is_empty() {
            None
        } else {
            Some(self.mean)
        }
    }
    pub fn get_median(&self) -> Option<f64> {
        let sorted = self.samples();
        Self::slice_median(sorted, 0, sorted.len() as isize - 1)
    }
    pub fn get_first_quartile(&self) -> Option<f64> {
        let sorted = self.samples();
        let last = sorted.len() as isize - 1;
        let hi = if last % 2 == 0 { last / 2 } else { last / 2 - 1 };
        Self::slice_median(sorted, 0, hi)
    }
    pub fn get_third_quartile(&self) -> Option<f64> {
        let sorted = self.samples();
        let last = sorted.len() as isize - 1;
        Self::slice_median(sorted, last / 2, last)
    }
    /// The samples in ascending order.
    pub fn samples(&self) -> &[N] {
        self.sorted.get_or_init(|| {
            let mut sorted = self.samples.clone();
            sorted.sort_unstable_by(|a, b| a.sort_cmp(b));
            sorted
        })
    }
    /// Adopts every sample of `other`: the bags are unioned, extremes combined
    /// and the means weighted by their sample counts.
    pub fn merge_with(&mut self, other: &RegressionAnalysis<N>) {
        if other.samples.is_empty() {
            return;
        }
        let own = self.samples.len() as f64;
        let theirs = other.samples.len() as f64;
        self.mean = (self.mean * own + other.mean * theirs) / (own + theirs);
        if let Some(min) = other.minimum {
            if self.minimum.is_none_or(|own_min| min < own_min) {
                self.minimum = Some(min);
            }
        }
        if let Some(max) = other.maximum {
            if self.maximum.is_none_or(|own_max| max > own_max) {
                self.maximum = Some(max);
            }
        }
        self.samples.extend_from_slice(&other.samples);
        self.sorted = OnceLock::new();
    }

    // median of the inclusive index range [lo, hi] of an already sorted slice
    fn slice_median(sorted: &[N], lo: isize, hi: isize) -> Option<f64> {
        let size = hi - lo + 1;
        if size <= 0 {
            return None;
        }
        let mid = (lo + size / 2) as usize;
        if size % 2 == 1 {
            Some(sorted[mid].to_f64())
        } else {
            Some((sorted[mid - 1].to_f64() + sorted[mid].to_f64()) / 2.0)
        }
    }
}
impl<N: Numeric> Default for RegressionAnalysis<N> {
    fn default() -> Self {
        Self::new()
    }
}
// Equal when the sample bags are equal as multisets. The mean is compared
// with a relative tolerance since merge order changes its rounding.
impl<N: Numeric> PartialEq for RegressionAnalysis<N> {
    fn eq(&self, other: &Self) -> bool {
        if self.samples.len() != other.samples.len()
            || self.minimum != other.minimum
            || self.maximum != other.maximum
        {
            return false;
        }
        let tolerance = 1e-9 * self.mean.abs().max(other.mean.abs()).max(1.0);
        (self.mean - other.mean).abs() <= tolerance
            && self
                .samples()
                .iter()
                .zip(other.samples())
                .all(|(a, b)| a.partial_cmp(b) == Some(std::cmp::Ordering::Equal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn of(values: &[i64]) -> RegressionAnalysis<i64> {
        let mut r = RegressionAnalysis::new();
        for v in values {
            r.add(*v);
        }
        r
    }

    #[test]
    fn empty_is_undefined() {
        let r = RegressionAnalysis::<f64>::new();
        assert_eq!(r.get_sample_count(), 0);
        assert_eq!(r.get_minimum(), None);
        assert_eq!(r.get_maximum(), None);
        assert_eq!(r.get_average(), None);
        assert_eq!(r.get_median(), None);
        assert_eq!(r.get_first_quartile(), None);
        assert_eq!(r.get_third_quartile(), None);
    }

    #[test]
    fn odd_count_quartiles() {
        let r = of(&[5, 3, 1, 4, 2]);
        assert_eq!(r.get_median(), Some(3.0));
        assert_eq!(r.get_first_quartile(), Some(2.0));
        assert_eq!(r.get_third_quartile(), Some(4.0));
        assert_eq!(r.get_minimum(), Some(1));
        assert_eq!(r.get_maximum(), Some(5));
        assert_eq!(r.get_average(), Some(3.0));
    }

    #[test]
    fn even_count_quartiles() {
        let r = of(&[4, 1, 3, 2]);
        assert_eq!(r.get_median(), Some(2.5));
        // lower half is the slice [0, 0]
        assert_eq!(r.get_first_quartile(), Some(1.0));
        // upper half is the slice [1, 3], i.e. median of [2, 3, 4]
        assert_eq!(r.get_third_quartile(), Some(3.0));
    }

    #[test]
    fn single_and_pair() {
        let one = of(&[7]);
        assert_eq!(one.get_median(), Some(7.0));
        assert_eq!(one.get_first_quartile(), Some(7.0));
        assert_eq!(one.get_third_quartile(), Some(7.0));
        let two = of(&[2, 8]);
        assert_eq!(two.get_median(), Some(5.0));
        // n = 2: lower half [0, -1] is empty, upper half is [0, 1]
        assert_eq!(two.get_first_quartile(), None);
        assert_eq!(two.get_third_quartile(), Some(5.0));
    }

    #[test]
    fn six_samples() {
        let r = of(&[1, 2, 3, 4, 5, 6]);
        assert_eq!(r.get_median(), Some(3.5));
        // [0, 1] -> 1.5, [2, 5] -> 4.5
        assert_eq!(r.get_first_quartile(), Some(1.5));
        assert_eq!(r.get_third_quartile(), Some(4.5));
    }

    #[test]
    fn resorts_after_mutation() {
        let mut r = of(&[10, 20, 30]);
        assert_eq!(r.get_median(), Some(20.0));
        r.add(0);
        r.add(1);
        assert_eq!(r.get_median(), Some(10.0));
        assert_eq!(r.samples(), &[0, 1, 10, 20, 30]);
    }

    #[test]
    fn running_mean_is_stable() {
        let mut r = RegressionAnalysis::new();
        for _ in 0..100_000 {
            r.add(1e9 + 0.5);
        }
        let avg = r.get_average().unwrap();
        assert!((avg - (1e9 + 0.5)).abs() < 1e-6);
    }

    #[test]
    fn merge_unions_samples() {
        let mut a = of(&[1, 2, 3]);
        let b = of(&[10, 4]);
        a.merge_with(&b);
        assert_eq!(a.get_sample_count(), 5);
        assert_eq!(a.get_minimum(), Some(1));
        assert_eq!(a.get_maximum(), Some(10));
        assert_eq!(a.get_average(), Some(4.0));
        assert_eq!(a.get_median(), Some(3.0));
        assert_eq!(a, of(&[4, 10, 3, 2, 1]));
    }

    #[test]
    fn merge_into_empty_adopts_other() {
        let mut a = RegressionAnalysis::new();
        let b = of(&[6, 2]);
        a.merge_with(&b);
        assert_eq!(a, b);
        a.merge_with(&RegressionAnalysis::new());
        assert_eq!(a, b);
    }

    #[test]
    fn durations() {
        let mut r = RegressionAnalysis::new();
        r.add(Duration::from_nanos(100));
        r.add(Duration::from_nanos(50));
        assert_eq!(r.get_minimum(), Some(Duration::from_nanos(50)));
        assert_eq!(r.get_average(), Some(75.0));
        assert_eq!(r.get_median(), Some(75.0));
    }

    #[test]
    fn nan_sorts_last_regardless_of_insertion() {
        for values in [[f64::NAN, 3.0, 1.0, 2.0], [3.0, 1.0, f64::NAN, 2.0], [3.0, 2.0, 1.0, f64::NAN]] {
            let mut r = RegressionAnalysis::new();
            for v in values {
                r.add(v);
            }
            let sorted = r.samples();
            assert_eq!(&sorted[..3], &[1.0, 2.0, 3.0], "{:?}", values);
            assert!(sorted[3].is_nan(), "{:?}", values);
            assert_eq!(r.get_median(), Some(2.5));
            assert_eq!(r.get_first_quartile(), Some(1.0));
        }
    }
}
