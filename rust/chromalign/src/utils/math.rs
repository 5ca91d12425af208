use super::range::TupleRange;

/// Quantile of a set of values.
///
/// Sorts a copy of the values and averages the two elements around the
/// fractional position `(n - 1) * q`. `q` is clamped to `[0, 1]`.
/// Empty input gives 0, which makes any threshold derived from it a no-op.
///
/// ```
/// use chromalign::utils::quantile;
///
/// assert_eq!(quantile(&[4.0, 1.0, 3.0, 2.0], 0.5), 2.5);
/// assert_eq!(quantile(&[4.0, 1.0, 3.0, 2.0], 0.0), 1.0);
/// assert_eq!(quantile(&[], 0.5), 0.0);
/// ```
pub fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable_by(|a, b| a.total_cmp(b));
    let q = q.clamp(0.0, 1.0);
    let pos = (sorted.len() - 1) as f64 * q;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    (sorted[lo] + sorted[hi]) / 2.0
}

/// Number of m/z bins of width `bin_size` needed to cover `range`.
/// Never less than one, so a degenerate range still gets a bin.
pub fn num_bins(range: TupleRange<f64>, bin_size: f64) -> usize {
    let n = (range.span() / bin_size).ceil();
    if n.is_finite() && n >= 1.0 {
        n as usize
    } else {
        1
    }
}

/// Bin index for a value, clamped to the valid bins.
pub fn bin_index(x: f64, range: TupleRange<f64>, bin_size: f64, n_bins: usize) -> usize {
    let bin = ((x - range.start()) / bin_size).floor();
    if bin.is_nan() || bin < 0.0 {
        0
    } else {
        (bin as usize).min(n_bins.saturating_sub(1))
    }
}

/// Max-intensity binning of one scan.
///
/// Each bin holds the largest intensity of the points that fall into it,
/// points outside of `range` are ignored. When `interpolate` is set,
/// empty bins that sit between two filled bins are linearly interpolated.
pub fn max_bin_values(
    mzs: &[f64],
    intensities: &[f64],
    range: TupleRange<f64>,
    bin_size: f64,
    n_bins: usize,
    interpolate: bool,
) -> Vec<f64> {
    let mut out = vec![0.0; n_bins];
    let mut filled = vec![false; n_bins];
    if n_bins == 0 {
        return out;
    }

    for (&mz, &intensity) in mzs.iter().zip(intensities.iter()) {
        if !range.contains(mz) {
            continue;
        }
        let idx = bin_index(mz, range, bin_size, n_bins);
        if !filled[idx] || intensity > out[idx] {
            out[idx] = intensity;
            filled[idx] = true;
        }
    }

    if interpolate {
        let mut last_filled: Option<usize> = None;
        for i in 0..n_bins {
            if !filled[i] {
                continue;
            }
            if let Some(prev) = last_filled {
                let gap = i - prev;
                if gap > 1 {
                    let (y0, y1) = (out[prev], out[i]);
                    for j in (prev + 1)..i {
                        let frac = (j - prev) as f64 / gap as f64;
                        out[j] = y0 + (y1 - y0) * frac;
                    }
                }
            }
            last_filled = Some(i);
        }
    }

    out
}

/// Trapezoidal integral of `ys` over `xs`.
pub fn trapezoid_area(xs: &[f64], ys: &[f64]) -> f64 {
    xs.windows(2)
        .zip(ys.windows(2))
        .map(|(x, y)| (x[1] - x[0]) * (y[0] + y[1]) / 2.0)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantile_interpolates_between_neighbours() {
        let vals = [10.0, 0.0, 5.0];
        assert_eq!(quantile(&vals, 1.0), 10.0);
        assert_eq!(quantile(&vals, 0.5), 5.0);
        // (3 - 1) * 0.25 = 0.5 -> mean of elements 0 and 1
        assert_eq!(quantile(&vals, 0.25), 2.5);
    }

    #[test]
    fn test_num_bins_degenerate_range() {
        let r = TupleRange::point(500.0);
        assert_eq!(num_bins(r, 1.0), 1);
        let r = TupleRange::try_new(100.0, 110.5).unwrap();
        assert_eq!(num_bins(r, 1.0), 11);
    }

    #[test]
    fn test_max_binning_and_interpolation() {
        let range = TupleRange::try_new(100.0, 104.0).unwrap();
        let mzs = [100.1, 100.2, 103.5];
        let ints = [5.0, 7.0, 3.0];
        let plain = max_bin_values(&mzs, &ints, range, 1.0, 4, false);
        assert_eq!(plain, vec![7.0, 0.0, 0.0, 3.0]);

        let interp = max_bin_values(&mzs, &ints, range, 1.0, 4, true);
        assert!((interp[1] - (7.0 - 4.0 / 3.0)).abs() < 1e-9);
        assert!((interp[2] - (7.0 - 8.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn test_trapezoid_area_triangle() {
        let xs = [0.0, 1.0, 2.0];
        let ys = [0.0, 10.0, 0.0];
        assert_eq!(trapezoid_area(&xs, &ys), 10.0);
        assert_eq!(trapezoid_area(&[1.0], &[5.0]), 0.0);
    }
}
