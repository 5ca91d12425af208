use crate::config::{
    LinearNormalizerConfig,
    NormalizationType,
    PeakMeasurement,
};
use crate::errors::{
    ConfigurationError,
    Result,
};
use crate::models::{
    ChromatographicPeak,
    PeakList,
    PeakListRow,
    RawDataFile,
};
use crate::task::TaskContext;
use crate::traits::ScanSource;
use std::collections::HashMap;
use tracing::{
    debug,
    info,
    warn,
};

/// Height of the tallest peak of a normalized list.
pub const NORMALIZATION_CEILING: f64 = 100_000.0;

/// Scales every file's peaks by one factor per file, then rescales the whole
/// list so its tallest peak sits at [`NORMALIZATION_CEILING`].
#[derive(Debug, Clone)]
pub struct LinearNormalizer {
    config: LinearNormalizerConfig,
}

impl LinearNormalizer {
    pub fn new(config: LinearNormalizerConfig) -> std::result::Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self { config })
    }

    fn measure(&self, peak: &ChromatographicPeak) -> f64 {
        match self.config.peak_measurement {
            PeakMeasurement::Height => peak.height(),
            PeakMeasurement::Area => peak.area(),
        }
    }

    /// Raw normalization factor of one file, before the ceiling rescale.
    fn file_factor(
        &self,
        peak_list: &PeakList,
        file: &RawDataFile,
        sources: &HashMap<&RawDataFile, &dyn ScanSource>,
    ) -> Result<f64> {
        let values = || {
            peak_list
                .rows()
                .iter()
                .filter_map(|r| r.peak(file))
                .map(|p| self.measure(p))
        };
        let factor = match self.config.normalization_type {
            NormalizationType::AverageIntensity => {
                let (sum, n) = values().fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
                sum / n as f64
            }
            NormalizationType::AverageSquaredIntensity => {
                let (sum, n) = values().fold((0.0, 0usize), |(s, n), v| (s + v * v, n + 1));
                sum / n as f64
            }
            NormalizationType::MaximumPeakHeight => values().fold(0.0, f64::max),
            NormalizationType::TotalRawSignal => {
                let source = sources.get(file).ok_or_else(|| {
                    ConfigurationError::MissingScanSource {
                        file: file.to_string(),
                    }
                })?;
                let mut total = 0.0;
                for num in source.scan_numbers(1) {
                    total += source.scan(num)?.total_ion_current();
                }
                total
            }
        };
        Ok(factor)
    }

    /// Normalizes `peak_list` into a new list named `"<list> <suffix>"`.
    ///
    /// `sources` are only read for [`NormalizationType::TotalRawSignal`], and
    /// then must hold one source per file of the list.
    pub fn normalize(
        &self,
        peak_list: &PeakList,
        sources: &[&dyn ScanSource],
        ctx: &TaskContext,
    ) -> Result<PeakList> {
        let sources: HashMap<&RawDataFile, &dyn ScanSource> =
            sources.iter().map(|&s| (s.data_file(), s)).collect();
        if self.config.normalization_type == NormalizationType::TotalRawSignal {
            if let Some(missing) = peak_list
                .data_files()
                .iter()
                .find(|f| !sources.contains_key(f))
            {
                return Err(ConfigurationError::MissingScanSource {
                    file: missing.to_string(),
                }
                .into());
            }
        }

        let files = peak_list.data_files();
        ctx.progress.init_total(files.len() as u64);

        let mut factors: HashMap<&RawDataFile, f64> = HashMap::with_capacity(files.len());
        let mut max_normalized_height: f64 = 0.0;
        for file in files {
            ctx.check()?;
            let mut factor = self.file_factor(peak_list, file, &sources)?;
            if !(factor.is_finite() && factor > 0.0) {
                warn!(
                    "Normalization factor for {} is {}, leaving its peaks unscaled",
                    file, factor
                );
                factor = 1.0;
            }
            debug!("Normalization factor for {}: {}", file, factor);
            for peak in peak_list.rows().iter().filter_map(|r| r.peak(file)) {
                max_normalized_height = max_normalized_height.max(peak.height() / factor);
            }
            factors.insert(file, factor);
        }

        let ceiling_scale = if max_normalized_height > 0.0 && max_normalized_height.is_finite() {
            NORMALIZATION_CEILING / max_normalized_height
        } else {
            1.0
        };

        let mut out = PeakList::new(
            format!("{} {}", peak_list.name(), self.config.suffix),
            files.to_vec(),
        );
        for row in peak_list.rows() {
            let mut new_row = PeakListRow::new(row.id());
            new_row.set_comment(row.comment());
            for identity in row.identities() {
                new_row.add_identity(identity.clone());
            }
            new_row.set_preferred_identity(row.preferred_identity().clone());
            for peak in row.peaks() {
                let factor = factors.get(peak.data_file()).copied().unwrap_or(1.0);
                new_row.add_peak(peak.scaled_down(factor / ceiling_scale));
            }
            out.add_row(new_row);
        }
        ctx.progress.inc(files.len() as u64);
        ctx.progress.finish();
        info!(
            "Normalized {} rows of {} across {} files",
            out.num_rows(),
            peak_list.name(),
            files.len()
        );
        Ok(out)
    }
}
