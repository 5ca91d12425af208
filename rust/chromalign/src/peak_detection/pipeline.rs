use super::{
    CentroidGrowthDetector,
    SavitzkyGolayDetector,
};
use crate::chromatogram_builder::{
    ChromatogramBuilder,
    ChromatogramSet,
};
use crate::config::{
    CentroidDetectorConfig,
    ThreeStepConfig,
};
use crate::errors::{
    ConfigurationError,
    Result,
};
use crate::models::{
    PeakList,
    PeakListRow,
};
use crate::task::TaskContext;
use crate::traits::ScanSource;
use rayon::prelude::*;
use tracing::info;

/// Chromatogram building, Savitzky-Golay detection and peak list assembly
/// for one raw data file.
#[derive(Debug, Clone)]
pub struct ThreeStepPeakPicker {
    config: ThreeStepConfig,
    detector: SavitzkyGolayDetector,
}

impl ThreeStepPeakPicker {
    pub fn new(config: ThreeStepConfig) -> std::result::Result<Self, ConfigurationError> {
        config.validate()?;
        let detector = SavitzkyGolayDetector::new(config.peaks.clone())?;
        Ok(Self { config, detector })
    }

    /// Runs the three steps on the MS1 scans of `source`.
    ///
    /// Progress counts one unit per scan while building and spreads another
    /// `scans` units over the chromatograms while detecting.
    #[cfg_attr(
        feature = "instrumentation",
        tracing::instrument(skip_all, level = "trace", fields(file = %source.data_file()))
    )]
    pub fn pick_peaks(&self, source: &dyn ScanSource, ctx: &TaskContext) -> Result<PeakList> {
        let n_scans = source.scan_numbers(1).len() as u64;
        ctx.progress.init_total(2 * n_scans);
        let set = ChromatogramBuilder::build_from_source(source, &self.config.chromatograms, ctx)?;
        self.detect_peaks(&set, n_scans, ctx)
    }

    /// Second and third step on already built chromatograms.
    pub fn detect_peaks(
        &self,
        set: &ChromatogramSet,
        progress_offset: u64,
        ctx: &TaskContext,
    ) -> Result<PeakList> {
        let mut list = PeakList::new(
            format!("{} {}", set.data_file, self.config.suffix),
            vec![set.data_file.clone()],
        );
        let n_chroms = set.chromatograms.len() as u64;
        let mut next_id = 1;
        for (k, chrom) in set.chromatograms.iter().enumerate() {
            ctx.check()?;
            for peak in self.detector.detect(chrom, &set.axis) {
                list.add_row(PeakListRow::with_peak(next_id, peak));
                next_id += 1;
            }
            ctx.progress
                .advance_to(progress_offset + (k as u64 + 1) * progress_offset / n_chroms);
        }
        ctx.progress.finish();
        info!(
            "Detected {} peaks in {} chromatograms of {}",
            list.num_rows(),
            n_chroms,
            set.data_file
        );
        Ok(list)
    }
}

/// Runs the three step picker on several files in parallel.
///
/// Every file gets its own state, the shared cancellation token stops all
/// of them. Progress counts finished files. Lists come back in input order.
pub fn pick_peaks_par<S: ScanSource>(
    sources: &[S],
    config: &ThreeStepConfig,
    ctx: &TaskContext,
) -> Result<Vec<PeakList>> {
    let picker = ThreeStepPeakPicker::new(config.clone())?;
    ctx.progress.init_total(sources.len() as u64);
    let out = sources
        .par_iter()
        .map(|source| {
            let res = picker.pick_peaks(source, &ctx.fork());
            ctx.progress.inc(1);
            res
        })
        .collect::<Result<Vec<_>>>()?;
    ctx.progress.finish();
    Ok(out)
}

/// Runs the centroid detector on several files in parallel.
pub fn detect_centroid_peaks_par<S: ScanSource>(
    sources: &[S],
    config: &CentroidDetectorConfig,
    ctx: &TaskContext,
) -> Result<Vec<PeakList>> {
    let detector = CentroidGrowthDetector::new(config.clone())?;
    ctx.progress.init_total(sources.len() as u64);
    let out = sources
        .par_iter()
        .map(|source| {
            let res = detector.detect_peak_list(source, &ctx.fork());
            ctx.progress.inc(1);
            res
        })
        .collect::<Result<Vec<_>>>()?;
    ctx.progress.finish();
    Ok(out)
}
