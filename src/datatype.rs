// used to print out readable forms of a data type
use std::fmt;
// used when ordering samples that only have a partial order
use std::cmp::Ordering;
// runtimes are kept as durations
use std::time::Duration;

/// A value that a [`crate::regression::RegressionAnalysis`] can accumulate.
///
/// Comparison happens on the value itself, while everything that divides
/// (mean, averaged medians) happens on its `f64` projection.
pub trait Numeric: Copy + PartialOrd + fmt::Debug + Send + Sync {
    const DATA_TYPE: &'static str;
    fn to_f64(self) -> f64;
    // instance callable with pre-made implementation
    fn data_type(&self) -> &'static str {
        Self::DATA_TYPE
    }
    // must be a total order; types with incomparable values override it
    fn sort_cmp(&self, other: &Self) -> Ordering {
        self.partial_cmp(other).unwrap_or(Ordering::Equal)
    }
}

macro_rules! numeric_primitive {
    ($($t:ty),*) => {
        $(
            impl Numeric for $t {
                const DATA_TYPE: &'static str = stringify!($t);
                fn to_f64(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

numeric_primitive!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

// IEEE 754 total order: NaN sorts after every number, -0.0 before 0.0
macro_rules! numeric_float {
    ($($t:ty),*) => {
        $(
            impl Numeric for $t {
                const DATA_TYPE: &'static str = stringify!($t);
                fn to_f64(self) -> f64 {
                    self as f64
                }
                fn sort_cmp(&self, other: &Self) -> Ordering {
                    self.total_cmp(other)
                }
            }
        )*
    };
}

numeric_float!(f32, f64);

impl Numeric for Duration {
    const DATA_TYPE: &'static str = "Duration";
    // nanosecond resolution
    fn to_f64(self) -> f64 {
        self.as_nanos() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_projects_to_nanoseconds() {
        assert_eq!(Duration::from_micros(3).to_f64(), 3000.0);
        assert_eq!(Duration::from_nanos(5).data_type(), "Duration");
    }

    #[test]
    fn floats_order_totally() {
        assert_eq!(f64::NAN.sort_cmp(&1.0), Ordering::Greater);
        assert_eq!(1.0f64.sort_cmp(&f64::NAN), Ordering::Less);
        assert_eq!(f64::NAN.sort_cmp(&f64::INFINITY), Ordering::Greater);
        assert_eq!(f32::NAN.sort_cmp(&f32::MAX), Ordering::Greater);
        assert_eq!(1.0f64.sort_cmp(&2.0), Ordering::Less);
        assert_eq!(3u8.sort_cmp(&3), Ordering::Equal);
    }
}
