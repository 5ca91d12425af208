use crate::errors::ConfigurationError;
use crate::peak_detection::PeakFillingModel;
use serde::{
    Deserialize,
    Serialize,
};
use std::io::Read;

fn check_non_negative(name: &'static str, value: f64) -> Result<(), ConfigurationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigurationError::invalid(
            name,
            value,
            "expected a finite, non-negative number",
        ))
    }
}

fn check_positive(name: &'static str, value: f64) -> Result<(), ConfigurationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigurationError::invalid(
            name,
            value,
            "expected a finite, positive number",
        ))
    }
}

fn check_quantile(name: &'static str, value: f64) -> Result<(), ConfigurationError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigurationError::invalid(
            name,
            value,
            "expected a quantile in [0, 1]",
        ))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChromatogramBuilderConfig {
    pub mz_tolerance: f64,
    pub min_duration: f64,
    pub intensity_threshold_quantile: f64,
}

impl Default for ChromatogramBuilderConfig {
    fn default() -> Self {
        Self {
            mz_tolerance: 0.01,
            min_duration: 0.05,
            intensity_threshold_quantile: 0.0,
        }
    }
}

impl ChromatogramBuilderConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        check_non_negative("mz_tolerance", self.mz_tolerance)?;
        check_non_negative("min_duration", self.min_duration)?;
        check_quantile(
            "intensity_threshold_quantile",
            self.intensity_threshold_quantile,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CentroidDetectorConfig {
    pub suffix: String,
    pub bin_size: f64,
    pub chromatographic_threshold_quantile: f64,
    pub noise_level: f64,
    pub mz_tolerance: f64,
    /// Maximum relative intensity change between consecutive samples.
    pub intensity_tolerance: f64,
    pub min_height: f64,
    pub min_duration: f64,
}

impl Default for CentroidDetectorConfig {
    fn default() -> Self {
        Self {
            suffix: "chromatograms".to_string(),
            bin_size: 0.25,
            chromatographic_threshold_quantile: 0.0,
            noise_level: 10.0,
            mz_tolerance: 0.05,
            intensity_tolerance: 0.5,
            min_height: 100.0,
            min_duration: 0.05,
        }
    }
}

impl CentroidDetectorConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        check_positive("bin_size", self.bin_size)?;
        check_quantile(
            "chromatographic_threshold_quantile",
            self.chromatographic_threshold_quantile,
        )?;
        check_non_negative("noise_level", self.noise_level)?;
        check_positive("mz_tolerance", self.mz_tolerance)?;
        check_positive("intensity_tolerance", self.intensity_tolerance)?;
        check_non_negative("min_height", self.min_height)?;
        check_non_negative("min_duration", self.min_duration)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SavitzkyGolayConfig {
    pub min_height: f64,
    pub min_duration: f64,
    pub derivative_threshold_quantile: f64,
    pub filling_enabled: bool,
    /// Name of a [`PeakFillingModel`], matched case-insensitively.
    pub filling_model: String,
}

impl Default for SavitzkyGolayConfig {
    fn default() -> Self {
        Self {
            min_height: 100.0,
            min_duration: 0.05,
            derivative_threshold_quantile: 0.8,
            filling_enabled: false,
            filling_model: "gaussian".to_string(),
        }
    }
}

impl SavitzkyGolayConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        check_non_negative("min_height", self.min_height)?;
        check_non_negative("min_duration", self.min_duration)?;
        check_quantile(
            "derivative_threshold_quantile",
            self.derivative_threshold_quantile,
        )?;
        self.resolve_filling_model().map(|_| ())
    }

    /// The filling model to apply, `None` when filling is disabled.
    pub fn resolve_filling_model(&self) -> Result<Option<PeakFillingModel>, ConfigurationError> {
        // Unknown names are rejected even when filling is off.
        let model = PeakFillingModel::from_name(&self.filling_model)?;
        Ok(self.filling_enabled.then_some(model))
    }
}

/// Chromatogram building followed by Savitzky-Golay peak detection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ThreeStepConfig {
    pub suffix: String,
    pub chromatograms: ChromatogramBuilderConfig,
    pub peaks: SavitzkyGolayConfig,
}

impl Default for ThreeStepConfig {
    fn default() -> Self {
        Self {
            suffix: "peaklist".to_string(),
            chromatograms: ChromatogramBuilderConfig::default(),
            peaks: SavitzkyGolayConfig::default(),
        }
    }
}

impl ThreeStepConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.chromatograms.validate()?;
        self.peaks.validate()
    }
}

/// Retention time window used by the join aligner.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum RtTolerance {
    /// Same units as the retention times, applied to both sides.
    #[serde(rename = "absolute")]
    Absolute(f64),
    /// Fraction of the row's own retention time (0.05 is 5%).
    #[serde(rename = "relative")]
    Relative(f64),
}

impl RtTolerance {
    /// Half width of the window around `rt`.
    pub fn window(&self, rt: f64) -> f64 {
        match self {
            Self::Absolute(x) => *x,
            Self::Relative(x) => (rt * x).abs(),
        }
    }

    fn value(&self) -> f64 {
        match self {
            Self::Absolute(x) | Self::Relative(x) => *x,
        }
    }
}

impl Default for RtTolerance {
    fn default() -> Self {
        Self::Absolute(0.5)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct JoinAlignerConfig {
    pub peak_list_name: String,
    pub mz_tolerance: f64,
    pub mz_weight: f64,
    pub rt_tolerance: RtTolerance,
    pub rt_weight: f64,
    pub require_same_identity: bool,
    pub identity_weight: f64,
}

impl Default for JoinAlignerConfig {
    fn default() -> Self {
        Self {
            peak_list_name: "Aligned peak list".to_string(),
            mz_tolerance: 0.01,
            mz_weight: 1.0,
            rt_tolerance: RtTolerance::default(),
            rt_weight: 1.0,
            require_same_identity: false,
            identity_weight: 1.0,
        }
    }
}

impl JoinAlignerConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        check_non_negative("mz_tolerance", self.mz_tolerance)?;
        check_non_negative("mz_weight", self.mz_weight)?;
        check_non_negative("rt_tolerance", self.rt_tolerance.value())?;
        check_non_negative("rt_weight", self.rt_weight)?;
        check_non_negative("identity_weight", self.identity_weight)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DuplicateFilterConfig {
    pub suffix: String,
    pub mz_difference_max: f64,
    pub rt_difference_max: f64,
    pub require_same_identification: bool,
}

impl Default for DuplicateFilterConfig {
    fn default() -> Self {
        Self {
            suffix: "filtered".to_string(),
            mz_difference_max: 0.001,
            rt_difference_max: 0.1,
            require_same_identification: false,
        }
    }
}

impl DuplicateFilterConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        check_non_negative("mz_difference_max", self.mz_difference_max)?;
        check_non_negative("rt_difference_max", self.rt_difference_max)
    }
}

/// How the per-file normalization factor is computed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationType {
    #[default]
    AverageIntensity,
    AverageSquaredIntensity,
    MaximumPeakHeight,
    /// Total ion current summed over all MS1 scans of the file.
    TotalRawSignal,
}

/// Which peak value feeds the per-file factor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PeakMeasurement {
    #[default]
    Height,
    Area,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LinearNormalizerConfig {
    pub suffix: String,
    pub normalization_type: NormalizationType,
    pub peak_measurement: PeakMeasurement,
}

impl Default for LinearNormalizerConfig {
    fn default() -> Self {
        Self {
            suffix: "normalized".to_string(),
            normalization_type: NormalizationType::default(),
            peak_measurement: PeakMeasurement::default(),
        }
    }
}

impl LinearNormalizerConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        Ok(())
    }
}

/// Parameters for every stage, loadable from a single JSON document.
/// Missing sections fall back to their defaults.
///
/// ```
/// use chromalign::config::PipelineConfig;
///
/// let conf = PipelineConfig::from_json_str(r#"{"aligner": {"mz_tolerance": 0.02}}"#).unwrap();
/// assert_eq!(conf.aligner.mz_tolerance, 0.02);
/// assert_eq!(conf.aligner.rt_weight, 1.0);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct PipelineConfig {
    pub centroid: CentroidDetectorConfig,
    pub three_step: ThreeStepConfig,
    pub aligner: JoinAlignerConfig,
    pub duplicate_filter: DuplicateFilterConfig,
    pub normalizer: LinearNormalizerConfig,
}

impl PipelineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigurationError> {
        let out: Self = serde_json::from_str(json)?;
        out.validate()?;
        Ok(out)
    }

    pub fn from_reader(reader: impl Read) -> Result<Self, ConfigurationError> {
        let out: Self = serde_json::from_reader(reader)?;
        out.validate()?;
        Ok(out)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.centroid.validate()?;
        self.three_step.validate()?;
        self.aligner.validate()?;
        self.duplicate_filter.validate()?;
        self.normalizer.validate()
    }
}
