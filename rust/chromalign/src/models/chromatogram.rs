use crate::utils::TupleRange;
use super::RawDataFile;
use std::ops::Range;

/// A connected mass peak of a chromatogram.
///
/// `scan_index` is the position of the scan inside the run's MS1 scan axis,
/// consecutive indices mean consecutive scans.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChromatogramPoint {
    pub scan_index: usize,
    pub scan_number: u32,
    pub retention_time: f64,
    pub mz: f64,
    pub intensity: f64,
}

/// Scan numbers and retention times of the MS1 scans a set of chromatograms
/// was built from, in acquisition order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScanAxis {
    pub scan_numbers: Vec<u32>,
    pub retention_times: Vec<f64>,
}

impl ScanAxis {
    pub fn push(&mut self, scan_number: u32, retention_time: f64) {
        debug_assert!(self.scan_numbers.last().is_none_or(|&x| x < scan_number));
        self.scan_numbers.push(scan_number);
        self.retention_times.push(retention_time);
    }

    pub fn len(&self) -> usize {
        self.scan_numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scan_numbers.is_empty()
    }
}

/// Extracted ion chromatogram.
///
/// Points are kept sorted by scan index. Zero intensity points are
/// synthetic separators appended when a track stops growing, runs of
/// non-zero points with consecutive scan indices form segments.
#[derive(Debug, Clone, PartialEq)]
pub struct Chromatogram {
    data_file: RawDataFile,
    mz: f64,
    weight_sum: f64,
    points: Vec<ChromatogramPoint>,
    growing: bool,
    last_segment: Option<Range<usize>>,
    n_segments: usize,
}

impl Chromatogram {
    /// Starts a chromatogram from its first point. It is not marked as
    /// growing, so it can take a point from the very next scan.
    pub fn new(data_file: RawDataFile, first: ChromatogramPoint) -> Self {
        let mut out = Self {
            data_file,
            mz: first.mz,
            weight_sum: 0.0,
            points: Vec::new(),
            growing: false,
            last_segment: None,
            n_segments: 0,
        };
        out.add_point(first);
        out.growing = false;
        out
    }

    /// Connects a point and marks the chromatogram as growing for this round.
    pub fn add_point(&mut self, point: ChromatogramPoint) {
        debug_assert!(
            self.points
                .last()
                .is_none_or(|p| p.scan_index < point.scan_index),
            "Points must be added in scan order"
        );
        if point.intensity > 0.0 {
            self.weight_sum += point.intensity;
            self.mz += (point.mz - self.mz) * (point.intensity / self.weight_sum);
            self.growing = true;
            self.extend_segments(&point);
        }
        self.points.push(point);
    }

    /// Segment bookkeeping for a non-zero point about to be pushed.
    fn extend_segments(&mut self, point: &ChromatogramPoint) {
        let idx = self.points.len();
        let continues = match (&self.last_segment, self.points.last()) {
            (Some(seg), Some(prev)) => {
                seg.end == idx && prev.scan_index + 1 == point.scan_index
            }
            _ => false,
        };
        if continues {
            if let Some(seg) = self.last_segment.as_mut() {
                seg.end = idx + 1;
            }
        } else {
            self.last_segment = Some(idx..idx + 1);
            self.n_segments += 1;
        }
    }

    /// Appends a zero intensity separator at `scan_index`.
    pub fn add_zero_point(&mut self, scan_index: usize, scan_number: u32, retention_time: f64) {
        self.points.push(ChromatogramPoint {
            scan_index,
            scan_number,
            retention_time,
            mz: self.mz,
            intensity: 0.0,
        });
    }

    pub fn data_file(&self) -> &RawDataFile {
        &self.data_file
    }

    /// Intensity weighted mean m/z of the connected points.
    pub fn mz(&self) -> f64 {
        self.mz
    }

    pub fn points(&self) -> &[ChromatogramPoint] {
        &self.points
    }

    pub fn is_growing(&self) -> bool {
        self.growing
    }

    pub fn reset_growing(&mut self) {
        self.growing = false;
    }

    pub fn last_point_is_zero(&self) -> bool {
        self.points.last().is_some_and(|p| p.intensity <= 0.0)
    }

    /// Connected point at a scan index, if any.
    pub fn point_at(&self, scan_index: usize) -> Option<&ChromatogramPoint> {
        self.points
            .binary_search_by_key(&scan_index, |p| p.scan_index)
            .ok()
            .map(|i| &self.points[i])
    }

    /// Index ranges (into [`Chromatogram::points`]) of the segments.
    pub fn segments(&self) -> Vec<Range<usize>> {
        let mut out = Vec::new();
        let mut start: Option<usize> = None;
        for (i, p) in self.points.iter().enumerate() {
            let breaks = match start {
                Some(_) => {
                    p.intensity <= 0.0 || self.points[i - 1].scan_index + 1 != p.scan_index
                }
                None => false,
            };
            if breaks {
                if let Some(s) = start.take() {
                    out.push(s..i);
                }
            }
            if start.is_none() && p.intensity > 0.0 {
                start = Some(i);
            }
        }
        if let Some(s) = start {
            out.push(s..self.points.len());
        }
        out
    }

    /// Retention time span of the most recent segment, 0 when there is none.
    pub fn last_segment_duration(&self) -> f64 {
        match &self.last_segment {
            Some(seg) => {
                self.points[seg.end - 1].retention_time - self.points[seg.start].retention_time
            }
            None => 0.0,
        }
    }

    pub fn has_previous_segments(&self) -> bool {
        self.n_segments > 1
    }

    /// True while the only connected point is the one the chromatogram
    /// was started from.
    pub fn is_single_point(&self) -> bool {
        self.n_segments == 1 && self.last_segment.as_ref().is_some_and(|seg| seg.len() == 1)
    }

    /// Drops the points of the most recent segment and anything after it.
    pub fn remove_last_segment(&mut self) {
        if let Some(seg) = self.last_segment.take() {
            self.points.truncate(seg.start);
            self.recompute_mz();
            self.recompute_segments();
        }
    }

    /// Keeps the points for which `f` returns true.
    pub fn retain_points(&mut self, f: impl FnMut(&ChromatogramPoint) -> bool) {
        self.points.retain(f);
        self.recompute_mz();
        self.recompute_segments();
    }

    /// True when no point with a non-zero intensity is left.
    pub fn is_empty(&self) -> bool {
        !self.points.iter().any(|p| p.intensity > 0.0)
    }

    pub fn rt_range(&self) -> Option<TupleRange<f64>> {
        crate::utils::range_of(
            self.points
                .iter()
                .filter(|p| p.intensity > 0.0)
                .map(|p| p.retention_time),
        )
    }

    pub fn max_intensity(&self) -> f64 {
        self.points.iter().fold(0.0f64, |acc, p| acc.max(p.intensity))
    }

    /// Intensities over the full scan axis, 0 where nothing is connected.
    pub fn intensity_trace(&self, n_scans: usize) -> Vec<f64> {
        let mut out = vec![0.0; n_scans];
        for p in self.points.iter() {
            if let Some(slot) = out.get_mut(p.scan_index) {
                *slot = p.intensity;
            }
        }
        out
    }

    fn recompute_segments(&mut self) {
        let segments = self.segments();
        self.n_segments = segments.len();
        self.last_segment = segments.last().cloned();
    }

    fn recompute_mz(&mut self) {
        let (num, den) = self
            .points
            .iter()
            .filter(|p| p.intensity > 0.0)
            .fold((0.0, 0.0), |(n, d), p| (n + p.mz * p.intensity, d + p.intensity));
        self.weight_sum = den;
        if den > 0.0 {
            self.mz = num / den;
        }
    }
}
