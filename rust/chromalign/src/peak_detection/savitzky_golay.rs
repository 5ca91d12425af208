use super::PeakFillingModel;
use crate::config::SavitzkyGolayConfig;
use crate::errors::ConfigurationError;
use crate::models::{
    Chromatogram,
    ChromatographicPeak,
    PeakBuilder,
    PeakSample,
    PeakStatus,
    ScanAxis,
};
use crate::utils::quantile;
use tracing::trace;

/// Savitzky-Golay smoothed second derivative coefficients.
/// Row `m` holds the weights for offsets `0..=m` of a `2m + 1` point window.
const SG_SECOND_DERIVATIVE: [&[f64]; 13] = [
    &[0.0],
    &[-1.0, 0.5],
    &[-0.143, -0.071, 0.143],
    &[-0.048, -0.036, 0.0, 0.060],
    &[-0.022, -0.018, -0.009, 0.008, 0.030],
    &[-0.012, -0.010, -0.007, -0.001, 0.007, 0.017],
    &[-0.007, -0.006, -0.005, -0.002, 0.001, 0.005, 0.011],
    &[-0.005, -0.004, -0.004, -0.002, -0.001, 0.002, 0.004, 0.007],
    &[
        -0.003, -0.003, -0.003, -0.002, -0.001, 0.000, 0.002, 0.003, 0.005,
    ],
    &[
        -0.002, -0.002, -0.002, -0.002, -0.001, 0.000, 0.000, 0.001, 0.003, 0.004,
    ],
    &[
        -0.002, -0.002, -0.001, -0.001, -0.001, -0.001, 0.000, 0.001, 0.001, 0.002, 0.003,
    ],
    &[
        -0.001, -0.001, -0.001, -0.001, -0.001, -0.001, 0.000, 0.000, 0.001, 0.001, 0.002, 0.002,
    ],
    &[
        -0.001, -0.001, -0.001, -0.001, -0.001, -0.001, 0.000, 0.000, 0.000, 0.001, 0.001, 0.001,
        0.002,
    ],
];

const MAX_HALF_WINDOW: usize = SG_SECOND_DERIVATIVE.len() - 1;

/// Smoothed second derivative of a trace.
///
/// The half window grows with the distance from the start of the trace up to
/// 12 points and shrinks again so it never reaches past the end.
pub fn second_derivative(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![0.0; n];
    for (k, slot) in out.iter_mut().enumerate() {
        let m = k.min(MAX_HALF_WINDOW).min(n - 1 - k);
        let coefs = SG_SECOND_DERIVATIVE[m];
        // Left to right over the window.
        for j in (k - m)..=(k + m) {
            *slot += values[j] * coefs[j.abs_diff(k)];
        }
    }
    out
}

/// Indices (on the scan axis) of one detected region.
#[derive(Debug, Clone, PartialEq, Default)]
struct Region {
    indices: Vec<usize>,
    /// Strongest negative derivative seen after the second crossing.
    apex: Option<usize>,
}

/// Zero crossing state machine over the second derivative.
///
/// A region opens when the derivative rises above the threshold, goes
/// through its negative lobe (the apex) and closes after the trailing
/// positive lobe. A rise back to positive after a negative lobe that passed
/// the threshold starts collecting an overlapped region in parallel, which
/// becomes the next region once the current one closes.
fn search_regions(present: &[bool], derivative: &[f64], threshold: f64) -> Vec<Region> {
    let mut out = Vec::new();
    let mut active_first = false;
    let mut active_second = false;
    let mut pass_threshold = false;
    let mut cross_zero = 0u32;

    let mut current: Vec<usize> = Vec::new();
    let mut overlapped: Vec<usize> = Vec::new();
    let mut seeded = false;
    let mut seen_apex = false;

    let mut min_derivative = 0.0;
    let mut apex_idx: Option<usize> = None;

    for i in 1..derivative.len() {
        let (prev, d) = (derivative[i - 1], derivative[i]);

        if d < min_derivative && cross_zero == 2 {
            min_derivative = d;
            apex_idx = Some(i);
        }

        let rises = prev < 0.0 && d > 0.0;
        if rises || (prev > 0.0 && d < 0.0) {
            if rises && cross_zero == 2 {
                if pass_threshold {
                    active_second = true;
                } else {
                    current.clear();
                    cross_zero = 0;
                    active_first = false;
                }
            }
            if cross_zero == 3 {
                active_first = false;
            }
            pass_threshold = false;
            if active_first || active_second {
                cross_zero = cross_zero.saturating_add(1);
            }
        }

        if d.abs() > threshold {
            pass_threshold = true;
            if d < 0.0 {
                seen_apex = true;
            }
            if cross_zero == 0 && d > 0.0 {
                active_first = true;
                cross_zero += 1;
                seen_apex = false;
                seeded = false;
            }
        }

        if active_first {
            if present[i] {
                current.push(i);
            } else if !current.is_empty() {
                active_first = false;
                cross_zero = 0;
            }
        }
        if active_second && present[i] {
            overlapped.push(i);
        }

        if !current.is_empty() && !active_first {
            // A seeded region only counts if it has an apex of its own.
            if !seeded || seen_apex {
                out.push(Region {
                    indices: std::mem::take(&mut current),
                    apex: apex_idx,
                });
            }
            current.clear();
            min_derivative = 0.0;
            apex_idx = None;

            if !overlapped.is_empty() && active_second && cross_zero >= 4 {
                current = std::mem::take(&mut overlapped);
                active_second = false;
                active_first = true;
                cross_zero = 2;
                pass_threshold = false;
                seeded = true;
                seen_apex = false;
            } else {
                overlapped.clear();
                active_second = false;
            }
        }
    }

    if !current.is_empty() && (!seeded || seen_apex) {
        out.push(Region {
            indices: current,
            apex: apex_idx,
        });
    }
    out
}

/// Peak detection on a single chromatogram using the zero crossings of its
/// smoothed second derivative.
#[derive(Debug, Clone)]
pub struct SavitzkyGolayDetector {
    config: SavitzkyGolayConfig,
    filling: Option<PeakFillingModel>,
}

impl SavitzkyGolayDetector {
    pub fn new(config: SavitzkyGolayConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        let filling = config.resolve_filling_model()?;
        Ok(Self { config, filling })
    }

    pub fn config(&self) -> &SavitzkyGolayConfig {
        &self.config
    }

    /// Detects the peaks of a chromatogram built over `axis`.
    ///
    /// Chromatograms whose average intensity is above half their maximum
    /// look like background and yield no peaks.
    #[cfg_attr(
        feature = "instrumentation",
        tracing::instrument(skip_all, level = "trace", fields(mz = chromatogram.mz()))
    )]
    pub fn detect(&self, chromatogram: &Chromatogram, axis: &ScanAxis) -> Vec<ChromatographicPeak> {
        let n = axis.len();
        if n == 0 {
            return Vec::new();
        }
        let trace = chromatogram.intensity_trace(n);
        let max = chromatogram.max_intensity();
        let avg = trace.iter().sum::<f64>() / n as f64;
        if max <= 0.0 || avg > max * 0.5 {
            trace!(
                "Skipping background chromatogram at m/z {:.4} (avg {:.1}, max {:.1})",
                chromatogram.mz(),
                avg,
                max
            );
            return Vec::new();
        }

        let derivative = second_derivative(&trace);
        let abs_derivative: Vec<f64> = derivative.iter().map(|d| d.abs()).collect();
        let threshold = quantile(&abs_derivative, self.config.derivative_threshold_quantile);
        let present: Vec<bool> = (0..n)
            .map(|i| chromatogram.point_at(i).is_some_and(|p| p.intensity > 0.0))
            .collect();

        search_regions(&present, &derivative, threshold)
            .into_iter()
            .filter_map(|region| self.build_peak(chromatogram, &region))
            .filter(|peak| {
                peak.duration() >= self.config.min_duration
                    && peak.height() >= self.config.min_height
            })
            .map(|peak| match self.filling {
                Some(model) => model.fill(&peak),
                None => peak,
            })
            .collect()
    }

    fn build_peak(&self, chromatogram: &Chromatogram, region: &Region) -> Option<ChromatographicPeak> {
        let mut builder = PeakBuilder::new(chromatogram.data_file().clone());
        for &i in region.indices.iter() {
            if let Some(p) = chromatogram.point_at(i) {
                builder.add_sample(PeakSample {
                    scan_number: p.scan_number,
                    mz: p.mz,
                    retention_time: p.retention_time,
                    intensity: p.intensity,
                });
            }
        }
        if self.filling.is_some() {
            let apex = region
                .apex
                .and_then(|i| chromatogram.point_at(i))
                .filter(|p| p.intensity > 0.0);
            if let Some(p) = apex {
                builder.set_apex_scan(p.scan_number);
            }
        }
        builder.finalize(PeakStatus::Detected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivative_of_line_is_zero_inside() {
        let line: Vec<f64> = (0..40).map(|i| 3.0 * i as f64 + 1.0).collect();
        let d = second_derivative(&line);
        assert_eq!(d.len(), 40);
        // Boundary points use a one point window.
        assert_eq!(d[0], 0.0);
        assert_eq!(d[39], 0.0);
        for x in d[1..39].iter() {
            // Rounded coefficients, so only approximately zero.
            assert!(x.abs() < 1.0, "{x}");
        }
    }

    #[test]
    fn test_derivative_is_negative_at_apex() {
        let trace: Vec<f64> = (0..60)
            .map(|i| 1000.0 * (-((i as f64 - 30.0).powi(2)) / 50.0).exp())
            .collect();
        let d = second_derivative(&trace);
        assert!(d[30] < 0.0);
        assert!(d[20] > 0.0);
        assert!(d[40] > 0.0);
    }

    #[test]
    fn test_flat_region_gives_nothing() {
        let present = vec![true; 20];
        let derivative = vec![0.0; 20];
        assert!(search_regions(&present, &derivative, 0.0).is_empty());
    }
}
