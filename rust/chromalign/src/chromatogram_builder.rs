use crate::config::ChromatogramBuilderConfig;
use crate::errors::{
    ConfigurationError,
    Result,
};
use crate::matching::ScoreMatcher;
use crate::models::{
    Chromatogram,
    ChromatogramPoint,
    RawDataFile,
    Scan,
    ScanAxis,
};
use crate::task::TaskContext;
use crate::traits::ScanSource;
use crate::utils::quantile;
use std::borrow::Borrow;
use tracing::{
    debug,
    info,
    warn,
};

/// Chromatograms of one raw data file, with the scans they were built on.
#[derive(Debug, Clone)]
pub struct ChromatogramSet {
    pub data_file: RawDataFile,
    pub axis: ScanAxis,
    pub chromatograms: Vec<Chromatogram>,
}

/// Builds extracted ion chromatograms by connecting the data points of
/// consecutive scans.
///
/// Each scan is one matching round: every chromatogram competes for the
/// scan's data points within `mz_tolerance`, the closest pairs win.
/// Chromatograms that get nothing either close their current segment with
/// a zero intensity point, or lose the segment when it is shorter than
/// `min_duration`. Unclaimed data points start new chromatograms, which are
/// dropped if they never take a second point.
#[derive(Debug)]
pub struct ChromatogramBuilder {
    config: ChromatogramBuilderConfig,
    data_file: RawDataFile,
    axis: ScanAxis,
    chromatograms: Vec<Chromatogram>,
    matcher: ScoreMatcher,
}

impl ChromatogramBuilder {
    pub fn new(
        data_file: RawDataFile,
        config: ChromatogramBuilderConfig,
    ) -> std::result::Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self {
            config,
            data_file,
            axis: ScanAxis::default(),
            chromatograms: Vec::new(),
            matcher: ScoreMatcher::new(),
        })
    }

    /// Builds the chromatograms of a sequence of scans, in retention time order.
    pub fn build<S: Borrow<Scan>>(
        data_file: RawDataFile,
        scans: &[S],
        config: &ChromatogramBuilderConfig,
        ctx: &TaskContext,
    ) -> Result<ChromatogramSet> {
        let mut builder = Self::new(data_file, config.clone())?;
        if scans.is_empty() {
            warn!("No scans to build chromatograms from in {}", builder.data_file);
        }
        ctx.progress.init_total(scans.len() as u64);
        for scan in scans {
            ctx.check()?;
            builder.add_scan(scan.borrow());
            ctx.progress.inc(1);
        }
        Ok(builder.finish())
    }

    /// Builds the chromatograms of all MS1 scans of a source.
    pub fn build_from_source(
        source: &dyn ScanSource,
        config: &ChromatogramBuilderConfig,
        ctx: &TaskContext,
    ) -> Result<ChromatogramSet> {
        let mut builder = Self::new(source.data_file().clone(), config.clone())?;
        let scan_numbers = source.scan_numbers(1);
        if scan_numbers.is_empty() {
            warn!("No MS1 scans in {}", builder.data_file);
        }
        ctx.progress.init_total(scan_numbers.len() as u64);
        for num in scan_numbers {
            ctx.check()?;
            let scan = source.scan(num)?;
            builder.add_scan(&scan);
            ctx.progress.inc(1);
        }
        Ok(builder.finish())
    }

    #[cfg_attr(
        feature = "instrumentation",
        tracing::instrument(skip_all, level = "trace", fields(scan = scan.scan_number()))
    )]
    pub fn add_scan(&mut self, scan: &Scan) {
        let scan_index = self.axis.len();
        self.axis.push(scan.scan_number(), scan.retention_time());
        let data_points = scan.data_points();
        let mz_tolerance = self.config.mz_tolerance;

        let chromatograms = &self.chromatograms;
        let outcome = self
            .matcher
            .match_with(chromatograms.len(), data_points.len(), |a, b| {
                let diff = (chromatograms[a].mz() - data_points[b].mz).abs();
                (diff <= mz_tolerance).then_some(diff)
            });

        let to_point = |idx: usize| ChromatogramPoint {
            scan_index,
            scan_number: scan.scan_number(),
            retention_time: scan.retention_time(),
            mz: data_points[idx].mz,
            intensity: data_points[idx].intensity,
        };

        for &(a, b) in outcome.pairs.iter() {
            self.chromatograms[a].add_point(to_point(b));
        }

        let min_duration = self.config.min_duration;
        let mut keep = vec![true; self.chromatograms.len()];
        for (i, chrom) in self.chromatograms.iter_mut().enumerate() {
            if chrom.is_growing() {
                chrom.reset_growing();
                continue;
            }
            if chrom.last_point_is_zero() {
                continue;
            }
            if chrom.is_single_point() {
                keep[i] = false;
                continue;
            }
            if chrom.last_segment_duration() < min_duration {
                if chrom.has_previous_segments() {
                    chrom.remove_last_segment();
                } else {
                    keep[i] = false;
                }
                continue;
            }
            chrom.add_zero_point(scan_index, scan.scan_number(), scan.retention_time());
        }
        let mut keep_iter = keep.into_iter();
        self.chromatograms
            .retain(|_| keep_iter.next().unwrap_or(true));

        for b in outcome.unmatched_b {
            self.chromatograms
                .push(Chromatogram::new(self.data_file.clone(), to_point(b)));
        }
    }

    /// Applies the per-chromatogram intensity threshold and the final
    /// duration filter.
    pub fn finish(self) -> ChromatogramSet {
        let n_scans = self.axis.len();
        let q = self.config.intensity_threshold_quantile;
        let min_duration = self.config.min_duration;
        let n_started = self.chromatograms.len();

        let chromatograms: Vec<Chromatogram> = self
            .chromatograms
            .into_iter()
            .filter_map(|mut chrom| {
                let threshold = quantile(&chrom.intensity_trace(n_scans), q);
                if threshold > 0.0 {
                    chrom.retain_points(|p| p.intensity >= threshold);
                }
                if chrom.is_empty() || chrom.is_single_point() {
                    return None;
                }
                if chrom.last_segment_duration() < min_duration && !chrom.has_previous_segments()
                {
                    return None;
                }
                Some(chrom)
            })
            .collect();

        debug!(
            "{} of {} chromatograms survived the final filters",
            chromatograms.len(),
            n_started
        );
        info!(
            "Built {} chromatograms from {} scans of {}",
            chromatograms.len(),
            n_scans,
            self.data_file
        );
        ChromatogramSet {
            data_file: self.data_file,
            axis: self.axis,
            chromatograms,
        }
    }
}
