use crate::errors::ConfigurationError;
use crate::models::{
    ChromatographicPeak,
    PeakSample,
    PeakStatus,
};
use serde::{
    Deserialize,
    Serialize,
};

/// `2 * sqrt(2 * ln(2))`, ratio between the FWHM and sigma of a gaussian.
const FWHM_TO_SIGMA: f64 = 2.354_820_045_030_949;

/// Peak shapes used to reshape detected peaks when filling is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeakFillingModel {
    Gaussian,
    Triangle,
    /// Gaussian with independent widths on each side of the apex.
    BiGaussian,
}

impl PeakFillingModel {
    pub const ALL: [PeakFillingModel; 3] = [Self::Gaussian, Self::Triangle, Self::BiGaussian];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Gaussian => "gaussian",
            Self::Triangle => "triangle",
            Self::BiGaussian => "bi-gaussian",
        }
    }

    /// Case insensitive lookup, "bigaussian" is accepted as well.
    pub fn from_name(name: &str) -> Result<Self, ConfigurationError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "gaussian" => Ok(Self::Gaussian),
            "triangle" => Ok(Self::Triangle),
            "bi-gaussian" | "bigaussian" => Ok(Self::BiGaussian),
            _ => Err(ConfigurationError::UnknownPeakModel {
                name: name.to_string(),
            }),
        }
    }

    /// Model intensity at `dt` from the apex, given the half widths at half height.
    fn value_at(&self, height: f64, dt: f64, left_hw: f64, right_hw: f64) -> f64 {
        let hw = if dt < 0.0 { left_hw } else { right_hw };
        match self {
            Self::Gaussian => {
                let sigma = (left_hw + right_hw) / FWHM_TO_SIGMA;
                height * (-(dt * dt) / (2.0 * sigma * sigma)).exp()
            }
            Self::BiGaussian => {
                let sigma = 2.0 * hw / FWHM_TO_SIGMA;
                height * (-(dt * dt) / (2.0 * sigma * sigma)).exp()
            }
            Self::Triangle => (height * (1.0 - dt.abs() / (2.0 * hw))).max(0.0),
        }
    }

    /// Replaces the peak's sample intensities with the model curve anchored
    /// on the peak's apex. The result is marked [`PeakStatus::Estimated`].
    pub fn fill(&self, peak: &ChromatographicPeak) -> ChromatographicPeak {
        let samples = peak.samples();
        let height = peak.height();
        let apex_rt = peak.retention_time();
        let (left_hw, right_hw) = match half_widths(samples, apex_rt, height) {
            Some(x) => x,
            None => return peak.reshaped(samples.to_vec(), PeakStatus::Estimated),
        };

        let filled: Vec<PeakSample> = samples
            .iter()
            .map(|s| PeakSample {
                intensity: self.value_at(height, s.retention_time - apex_rt, left_hw, right_hw),
                ..*s
            })
            .collect();
        peak.reshaped(filled, PeakStatus::Estimated)
    }
}

/// Half widths at half height on each side of the apex, interpolated between
/// samples. Falls back to the other side when one side never drops below
/// half height, `None` when neither does.
fn half_widths(samples: &[PeakSample], apex_rt: f64, height: f64) -> Option<(f64, f64)> {
    let half = height / 2.0;
    let apex_idx = samples.iter().position(|s| s.retention_time >= apex_rt)?;

    let crossing = |inner: &PeakSample, outer: &PeakSample| -> f64 {
        let span = inner.intensity - outer.intensity;
        if span <= 0.0 {
            return outer.retention_time;
        }
        let frac = (inner.intensity - half) / span;
        inner.retention_time + frac * (outer.retention_time - inner.retention_time)
    };

    let left = (1..=apex_idx)
        .rev()
        .find(|&i| samples[i - 1].intensity <= half)
        .map(|i| apex_rt - crossing(&samples[i], &samples[i - 1]));
    let right = (apex_idx..samples.len().saturating_sub(1))
        .find(|&i| samples[i + 1].intensity <= half)
        .map(|i| crossing(&samples[i], &samples[i + 1]) - apex_rt);

    match (left, right) {
        (Some(l), Some(r)) if l > 0.0 && r > 0.0 => Some((l, r)),
        (Some(l), _) if l > 0.0 => Some((l, l)),
        (_, Some(r)) if r > 0.0 => Some((r, r)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        PeakBuilder,
        RawDataFile,
    };

    fn peak_from(intensities: impl Iterator<Item = (f64, f64)>) -> ChromatographicPeak {
        let mut b = PeakBuilder::new(RawDataFile::new("f"));
        for (i, (rt, int)) in intensities.enumerate() {
            b.add_sample(PeakSample {
                scan_number: i as u32 + 1,
                mz: 300.0,
                retention_time: rt,
                intensity: int,
            });
        }
        b.finalize(PeakStatus::Detected).unwrap()
    }

    #[test]
    fn test_names() {
        for model in PeakFillingModel::ALL {
            assert_eq!(PeakFillingModel::from_name(model.name()).unwrap(), model);
        }
        assert_eq!(
            PeakFillingModel::from_name("BiGaussian").unwrap(),
            PeakFillingModel::BiGaussian
        );
        assert!(matches!(
            PeakFillingModel::from_name("lorentzian"),
            Err(ConfigurationError::UnknownPeakModel { .. })
        ));
    }

    #[test]
    fn test_gaussian_fill_of_gaussian_is_close() {
        let sigma: f64 = 2.0;
        let peak = peak_from((0..41).map(|i| {
            let rt = i as f64 * 0.5;
            (rt, 1000.0 * (-(rt - 10.0).powi(2) / (2.0 * sigma * sigma)).exp())
        }));
        let filled = PeakFillingModel::Gaussian.fill(&peak);
        assert_eq!(filled.status(), PeakStatus::Estimated);
        assert_eq!(filled.height(), peak.height());
        for (a, b) in peak.samples().iter().zip(filled.samples()) {
            assert!((a.intensity - b.intensity).abs() < 5.0, "{a:?} vs {b:?}");
        }
        assert!((filled.area() - peak.area()).abs() / peak.area() < 0.01);
    }

    #[test]
    fn test_triangle_fill() {
        // Linear flanks reaching half height 2.0 away from the apex.
        let peak = peak_from((0..9).map(|i| {
            let rt = i as f64;
            (rt, (100.0 * (1.0 - (rt - 4.0).abs() / 4.0)).max(0.0))
        }));
        let filled = PeakFillingModel::Triangle.fill(&peak);
        for (a, b) in peak.samples().iter().zip(filled.samples()) {
            assert!((a.intensity - b.intensity).abs() < 1e-9);
        }
    }
}
