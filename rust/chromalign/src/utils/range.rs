use std::fmt::Debug;
use thiserror::Error;

/// Finds the index range of elements in a slice sorted by `key_fn` whose keys
/// fall inside the closed range.
///
/// Works with floating point keys (`PartialOrd`), NaN keys are never inside
/// any range.
///
/// ```
/// use chromalign::utils::{binary_search_range_by_key, TupleRange};
///
/// let mzs = [100.0, 100.5, 101.0, 101.5, 102.0];
/// let range = TupleRange::try_new(100.4, 101.5).unwrap();
/// let idx = binary_search_range_by_key(&mzs, range, |x| *x);
/// assert_eq!(&mzs[idx], &[100.5, 101.0, 101.5]);
/// ```
pub fn binary_search_range_by_key<T, K, F>(
    slice: &[T],
    key_range: TupleRange<K>,
    key_fn: F,
) -> std::ops::Range<usize>
where
    F: Fn(&T) -> K,
    K: Copy + PartialOrd + Debug,
{
    let start_idx = slice.partition_point(|x| key_fn(x) < key_range.start());
    let end_idx =
        start_idx + slice[start_idx..].partition_point(|x| key_fn(x) <= key_range.end());

    start_idx..end_idx
}

/// Closed-closed range `[a, b]` with `a <= b`.
///
/// Used for m/z and retention time ranges. A degenerate range (`a == b`)
/// is valid, e.g. the m/z range of a scan with a single data point.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TupleRange<T: Copy + PartialOrd>(T, T);

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum TupleRangeError<T: Copy + PartialOrd + Debug> {
    #[error(
        "Expected the first element to be less than or equal to the second, got ({0:?}, {1:?})"
    )]
    ExpectedOrderedRange(T, T),
}

impl<T: Copy + PartialOrd + Debug> TupleRange<T> {
    pub fn try_new(left: T, right: T) -> Result<Self, TupleRangeError<T>> {
        // Also rejects NaN endpoints, since the comparison is false
        if left <= right {
            Ok(Self(left, right))
        } else {
            Err(TupleRangeError::ExpectedOrderedRange(left, right))
        }
    }

    /// Range holding a single value.
    pub fn point(x: T) -> Self {
        Self(x, x)
    }

    pub fn as_tuple(&self) -> (T, T) {
        (self.0, self.1)
    }

    pub fn contains(&self, x: T) -> bool {
        self.0 <= x && x <= self.1
    }

    pub fn start(&self) -> T {
        self.0
    }

    pub fn end(&self) -> T {
        self.1
    }

    /// Grows the range so it includes `x`.
    pub fn extend(&mut self, x: T) {
        if x < self.0 {
            self.0 = x;
        }
        if x > self.1 {
            self.1 = x;
        }
    }
}

impl TupleRange<f64> {
    /// Builds the range centered on `center`, `tol` to each side.
    pub fn around(center: f64, tol: f64) -> Self {
        let tol = tol.abs();
        Self(center - tol, center + tol)
    }

    pub fn span(&self) -> f64 {
        self.1 - self.0
    }
}

impl<T> TryFrom<(T, T)> for TupleRange<T>
where
    T: Copy + PartialOrd + Debug,
{
    type Error = TupleRangeError<T>;

    fn try_from(value: (T, T)) -> Result<Self, Self::Error> {
        TupleRange::try_new(value.0, value.1)
    }
}

/// Builds the smallest range covering all values, `None` for an empty input.
pub fn range_of(values: impl IntoIterator<Item = f64>) -> Option<TupleRange<f64>> {
    let mut values = values.into_iter();
    let mut out = TupleRange::point(values.next()?);
    for v in values {
        out.extend(v);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unordered_range_is_rejected() {
        assert!(TupleRange::try_new(2.0, 1.0).is_err());
        assert!(TupleRange::try_new(f64::NAN, 1.0).is_err());
        let r = TupleRange::try_new(1.0, 1.0).unwrap();
        assert_eq!(r.span(), 0.0);
    }

    #[test]
    fn test_range_error_message() {
        let err: Box<dyn std::error::Error> = Box::new(TupleRange::try_new(2, 1).unwrap_err());
        assert_eq!(
            err.to_string(),
            "Expected the first element to be less than or equal to the second, got (2, 1)"
        );
    }

    #[test]
    fn test_extend_and_range_of() {
        let r = range_of([3.0, 1.0, 2.5]).unwrap();
        assert_eq!(r.as_tuple(), (1.0, 3.0));
        assert!(range_of(std::iter::empty()).is_none());
    }

    #[test]
    fn test_slice_search_repeats() {
        let input = vec![1.0, 2.0, 3.0, 3.0, 3.0, 4.0, 5.0, 7.0, 7.0, 8.0];
        let range = TupleRange::try_new(3.0, 7.0).unwrap();
        let result = binary_search_range_by_key(&input, range, |&x| x);
        assert_eq!(result, 2..9);
        assert_eq!(&input[result], &[3.0, 3.0, 3.0, 4.0, 5.0, 7.0, 7.0]);
    }
}
