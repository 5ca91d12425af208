use super::RawDataFile;
use crate::utils::{
    TupleRange,
    trapezoid_area,
};
use serde::{
    Deserialize,
    Serialize,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeakStatus {
    Detected,
    Estimated,
    Filled,
}

/// One scan's contribution to a peak.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakSample {
    pub scan_number: u32,
    pub mz: f64,
    pub retention_time: f64,
    pub intensity: f64,
}

/// A finalized chromatographic peak. Immutable, build one with [`PeakBuilder`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChromatographicPeak {
    data_file: RawDataFile,
    samples: Vec<PeakSample>,
    mz: f64,
    retention_time: f64,
    height: f64,
    area: f64,
    representative_scan: u32,
    rt_range: TupleRange<f64>,
    mz_range: TupleRange<f64>,
    status: PeakStatus,
}

impl ChromatographicPeak {
    pub fn data_file(&self) -> &RawDataFile {
        &self.data_file
    }

    pub fn samples(&self) -> &[PeakSample] {
        &self.samples
    }

    pub fn mz(&self) -> f64 {
        self.mz
    }

    pub fn retention_time(&self) -> f64 {
        self.retention_time
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn area(&self) -> f64 {
        self.area
    }

    pub fn representative_scan(&self) -> u32 {
        self.representative_scan
    }

    pub fn rt_range(&self) -> TupleRange<f64> {
        self.rt_range
    }

    pub fn mz_range(&self) -> TupleRange<f64> {
        self.mz_range
    }

    pub fn duration(&self) -> f64 {
        self.rt_range.span()
    }

    pub fn status(&self) -> PeakStatus {
        self.status
    }

    /// Copy of this peak with height, area and sample intensities divided by `factor`.
    pub fn scaled_down(&self, factor: f64) -> Self {
        let mut out = self.clone();
        out.height /= factor;
        out.area /= factor;
        for s in out.samples.iter_mut() {
            s.intensity /= factor;
        }
        out
    }

    /// Copy of this peak with new samples and status, keeping the apex
    /// (height, retention time, m/z) of the original.
    pub(crate) fn reshaped(&self, samples: Vec<PeakSample>, status: PeakStatus) -> Self {
        let rts: Vec<f64> = samples.iter().map(|s| s.retention_time).collect();
        let ints: Vec<f64> = samples.iter().map(|s| s.intensity).collect();
        let area = trapezoid_area(&rts, &ints);
        let rt_range = crate::utils::range_of(rts.iter().copied()).unwrap_or(self.rt_range);
        Self {
            data_file: self.data_file.clone(),
            samples,
            mz: self.mz,
            retention_time: self.retention_time,
            height: self.height,
            area,
            representative_scan: self.representative_scan,
            rt_range,
            mz_range: self.mz_range,
            status,
        }
    }
}

/// A peak under construction.
///
/// Samples are appended scan by scan, the builder tracks the "growing" flag
/// used by the detectors for one matching round.
#[derive(Debug, Clone)]
pub struct PeakBuilder {
    data_file: RawDataFile,
    samples: Vec<PeakSample>,
    growing: bool,
    apex_override: Option<usize>,
}

impl PeakBuilder {
    pub fn new(data_file: RawDataFile) -> Self {
        Self {
            data_file,
            samples: Vec::new(),
            growing: false,
            apex_override: None,
        }
    }

    pub fn add_sample(&mut self, sample: PeakSample) {
        self.samples.push(sample);
        self.growing = true;
    }

    pub fn is_growing(&self) -> bool {
        self.growing
    }

    pub fn reset_growing(&mut self) {
        self.growing = false;
    }

    pub fn last_sample(&self) -> Option<&PeakSample> {
        self.samples.last()
    }

    pub fn samples(&self) -> &[PeakSample] {
        &self.samples
    }

    /// Uses the sample at `scan_number` as apex instead of the most intense one.
    pub fn set_apex_scan(&mut self, scan_number: u32) {
        self.apex_override = self
            .samples
            .iter()
            .position(|s| s.scan_number == scan_number);
    }

    /// Freezes the samples into a peak. Returns `None` when no samples were added.
    pub fn finalize(self, status: PeakStatus) -> Option<ChromatographicPeak> {
        let first = self.samples.first()?;
        let mut apex_idx = 0;
        let mut mz_range = TupleRange::point(first.mz);
        let mut rt_range = TupleRange::point(first.retention_time);
        let mut weighted = 0.0;
        let mut total = 0.0;
        for (i, s) in self.samples.iter().enumerate() {
            if s.intensity > self.samples[apex_idx].intensity {
                apex_idx = i;
            }
            mz_range.extend(s.mz);
            rt_range.extend(s.retention_time);
            weighted += s.mz * s.intensity;
            total += s.intensity;
        }
        let mz = if total > 0.0 {
            weighted / total
        } else {
            self.samples.iter().map(|s| s.mz).sum::<f64>() / self.samples.len() as f64
        };
        let apex = self.samples[self.apex_override.unwrap_or(apex_idx)];
        let rts: Vec<f64> = self.samples.iter().map(|s| s.retention_time).collect();
        let ints: Vec<f64> = self.samples.iter().map(|s| s.intensity).collect();

        Some(ChromatographicPeak {
            area: trapezoid_area(&rts, &ints),
            data_file: self.data_file,
            mz,
            retention_time: apex.retention_time,
            height: apex.intensity,
            representative_scan: apex.scan_number,
            rt_range,
            mz_range,
            status,
            samples: self.samples,
        })
    }
}
