use crate::config::CentroidDetectorConfig;
use crate::errors::{
    ConfigurationError,
    Result,
};
use crate::matching::ScoreMatcher;
use crate::models::{
    ChromatographicPeak,
    DataPoint,
    PeakBuilder,
    PeakList,
    PeakListRow,
    PeakSample,
    PeakStatus,
};
use crate::task::TaskContext;
use crate::traits::ScanSource;
use crate::utils::math::{
    bin_index,
    max_bin_values,
    num_bins,
};
use crate::utils::{
    TupleRange,
    quantile,
};
use tracing::{
    debug,
    info,
    warn,
};

/// Per-bin intensity floors over the m/z range of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct BinThresholds {
    mz_range: TupleRange<f64>,
    bin_size: f64,
    thresholds: Vec<f64>,
}

impl BinThresholds {
    pub fn threshold_at(&self, mz: f64) -> f64 {
        let idx = bin_index(mz, self.mz_range, self.bin_size, self.thresholds.len());
        self.thresholds.get(idx).copied().unwrap_or(0.0)
    }

    pub fn num_bins(&self) -> usize {
        self.thresholds.len()
    }
}

/// Two pass peak detector on centroided data.
///
/// The first pass bins every MS1 scan by m/z and derives a noise floor per
/// bin from the quantile of its max-intensity trace. The second pass keeps
/// the data points above both the absolute noise level and their bin's floor,
/// and grows peaks by connecting them scan to scan.
#[derive(Debug, Clone)]
pub struct CentroidGrowthDetector {
    config: CentroidDetectorConfig,
}

impl CentroidGrowthDetector {
    pub fn new(config: CentroidDetectorConfig) -> std::result::Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CentroidDetectorConfig {
        &self.config
    }

    /// Score between the last sample of a growing peak and a candidate.
    /// `None` when the m/z or the relative intensity change is out of tolerance.
    fn score(&self, last: &PeakSample, candidate: &DataPoint) -> Option<f64> {
        let mz_diff = (last.mz - candidate.mz).abs();
        let max_int = last.intensity.max(candidate.intensity);
        let int_diff = if max_int > 0.0 {
            (last.intensity - candidate.intensity).abs() / max_int
        } else {
            0.0
        };
        if mz_diff > self.config.mz_tolerance || int_diff > self.config.intensity_tolerance {
            return None;
        }
        Some(mz_diff / self.config.mz_tolerance + int_diff / self.config.intensity_tolerance)
    }

    fn keep(&self, peak: &ChromatographicPeak) -> bool {
        peak.duration() >= self.config.min_duration && peak.height() >= self.config.min_height
    }

    /// First pass: the per-bin noise floors. All zeros when the quantile is 0.
    pub fn bin_thresholds(
        &self,
        source: &dyn ScanSource,
        mz_range: TupleRange<f64>,
        ctx: &TaskContext,
    ) -> Result<BinThresholds> {
        let scan_numbers = source.scan_numbers(1);
        let n_bins = num_bins(mz_range, self.config.bin_size);
        let q = self.config.chromatographic_threshold_quantile;
        let mut out = BinThresholds {
            mz_range,
            bin_size: self.config.bin_size,
            thresholds: vec![0.0; n_bins],
        };
        if q <= 0.0 {
            ctx.progress.inc(scan_numbers.len() as u64);
            return Ok(out);
        }

        let mut bin_traces = vec![Vec::with_capacity(scan_numbers.len()); n_bins];
        let mut mzs = Vec::new();
        let mut ints = Vec::new();
        for num in scan_numbers {
            ctx.check()?;
            let scan = source.scan(num)?;
            mzs.clear();
            ints.clear();
            for dp in scan.data_points() {
                mzs.push(dp.mz);
                ints.push(dp.intensity);
            }
            let binned = max_bin_values(&mzs, &ints, mz_range, self.config.bin_size, n_bins, true);
            for (trace, v) in bin_traces.iter_mut().zip(binned) {
                trace.push(v);
            }
            ctx.progress.inc(1);
        }
        for (slot, trace) in out.thresholds.iter_mut().zip(bin_traces.iter()) {
            *slot = quantile(trace, q);
        }
        debug!(
            "Lowest bin threshold: {:.2}",
            out.thresholds.iter().fold(f64::MAX, |acc, &x| acc.min(x))
        );
        Ok(out)
    }

    /// Detects the peaks of one run.
    pub fn detect(
        &self,
        source: &dyn ScanSource,
        ctx: &TaskContext,
    ) -> Result<Vec<ChromatographicPeak>> {
        let data_file = source.data_file().clone();
        let scan_numbers = source.scan_numbers(1);
        ctx.progress.init_total(2 * scan_numbers.len() as u64);

        let Some(mz_range) = source.data_mz_range(1) else {
            warn!("No MS1 data points in {}, no peaks detected", data_file);
            ctx.progress.finish();
            return Ok(Vec::new());
        };
        let thresholds = self.bin_thresholds(source, mz_range, ctx)?;

        let mut matcher = ScoreMatcher::new();
        let mut growing: Vec<PeakBuilder> = Vec::new();
        let mut candidates: Vec<DataPoint> = Vec::new();
        let mut out = Vec::new();

        for num in scan_numbers {
            ctx.check()?;
            let scan = source.scan(num)?;

            candidates.clear();
            candidates.extend(scan.data_points().iter().filter(|dp| {
                dp.intensity >= self.config.noise_level
                    && dp.intensity >= thresholds.threshold_at(dp.mz)
            }));

            let outcome = matcher.match_with(growing.len(), candidates.len(), |a, b| {
                let last = growing[a].last_sample()?;
                self.score(last, &candidates[b])
            });

            let to_sample = |dp: &DataPoint| PeakSample {
                scan_number: scan.scan_number(),
                mz: dp.mz,
                retention_time: scan.retention_time(),
                intensity: dp.intensity,
            };
            for &(a, b) in outcome.pairs.iter() {
                growing[a].add_sample(to_sample(&candidates[b]));
            }

            let mut still_growing = Vec::with_capacity(growing.len());
            for mut builder in growing.drain(..) {
                if builder.is_growing() {
                    builder.reset_growing();
                    still_growing.push(builder);
                } else if let Some(peak) = builder.finalize(PeakStatus::Detected) {
                    if self.keep(&peak) {
                        out.push(peak);
                    }
                }
            }
            growing = still_growing;

            for b in outcome.unmatched_b {
                let mut builder = PeakBuilder::new(data_file.clone());
                builder.add_sample(to_sample(&candidates[b]));
                builder.reset_growing();
                growing.push(builder);
            }
            ctx.progress.inc(1);
        }

        for builder in growing {
            if let Some(peak) = builder.finalize(PeakStatus::Detected) {
                if self.keep(&peak) {
                    out.push(peak);
                }
            }
        }

        info!(
            "Centroid detection found {} peaks in {} ({} m/z bins)",
            out.len(),
            data_file,
            thresholds.num_bins()
        );
        Ok(out)
    }

    /// Detects the peaks of one run and wraps them into a peak list named
    /// `"<file> <suffix>"`, one row per peak.
    pub fn detect_peak_list(&self, source: &dyn ScanSource, ctx: &TaskContext) -> Result<PeakList> {
        let peaks = self.detect(source, ctx)?;
        let data_file = source.data_file().clone();
        let mut list = PeakList::new(
            format!("{} {}", data_file, self.config.suffix),
            vec![data_file],
        );
        for (i, peak) in peaks.into_iter().enumerate() {
            list.add_row(PeakListRow::with_peak(i as u32 + 1, peak));
        }
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        RawDataFile,
        Scan,
    };
    use crate::traits::InMemoryScanSource;

    fn config() -> CentroidDetectorConfig {
        CentroidDetectorConfig {
            suffix: "centroid".to_string(),
            bin_size: 1.0,
            chromatographic_threshold_quantile: 0.0,
            noise_level: 5.0,
            mz_tolerance: 0.01,
            intensity_tolerance: 1.0,
            min_height: 50.0,
            min_duration: 0.3,
        }
    }

    fn source(traces: &[Vec<(f64, f64)>]) -> InMemoryScanSource {
        let scans = traces
            .iter()
            .enumerate()
            .map(|(i, pts)| {
                Scan::new(
                    i as u32 + 1,
                    i as f64 * 0.1,
                    pts.iter().map(|&(mz, int)| DataPoint::new(mz, int)).collect(),
                    true,
                )
            })
            .collect();
        InMemoryScanSource::new(RawDataFile::new("run"), scans)
    }

    #[test]
    fn test_noise_and_short_peaks_are_dropped() {
        let mut traces = Vec::new();
        for i in 0..10 {
            let mut pts = vec![(250.0, 100.0 + 10.0 * i as f64)];
            // Below the noise level everywhere
            pts.push((300.0, 2.0));
            // Two scans only, too short
            if i == 4 || i == 5 {
                pts.push((400.0, 500.0));
            }
            traces.push(pts);
        }
        let detector = CentroidGrowthDetector::new(config()).unwrap();
        let list = detector
            .detect_peak_list(&source(&traces), &TaskContext::detached())
            .unwrap();
        assert_eq!(list.name(), "run centroid");
        assert_eq!(list.num_rows(), 1);
        let peak = list.rows()[0].peaks().next().unwrap();
        assert!((peak.mz() - 250.0).abs() < 1e-9);
        assert!((peak.height() - 190.0).abs() < 1e-9);
    }

    #[test]
    fn test_bin_thresholds_follow_the_quantile() {
        let traces: Vec<Vec<(f64, f64)>> = (0..5)
            .map(|i| vec![(100.2, 10.0 * (i + 1) as f64), (102.5, 1000.0)])
            .collect();
        let mut conf = config();
        conf.chromatographic_threshold_quantile = 0.5;
        let detector = CentroidGrowthDetector::new(conf).unwrap();
        let src = source(&traces);
        let range = src.data_mz_range(1).unwrap();
        let thr = detector
            .bin_thresholds(&src, range, &TaskContext::detached())
            .unwrap();
        assert_eq!(thr.num_bins(), 3);
        assert!((thr.threshold_at(100.2) - 30.0).abs() < 1e-9);
        assert!((thr.threshold_at(102.5) - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_intensity_jump_splits_the_peak() {
        let ints = [100.0, 110.0, 120.0, 130.0, 2000.0, 2100.0, 2200.0, 2300.0];
        let traces: Vec<Vec<(f64, f64)>> = ints.iter().map(|&v| vec![(500.0, v)]).collect();
        let mut conf = config();
        conf.intensity_tolerance = 0.5;
        conf.min_duration = 0.2;
        let detector = CentroidGrowthDetector::new(conf).unwrap();
        let peaks = detector
            .detect(&source(&traces), &TaskContext::detached())
            .unwrap();
        assert_eq!(peaks.len(), 2);
    }
}
