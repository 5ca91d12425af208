use super::DataPoint;
use crate::utils::{
    TupleRange,
    binary_search_range_by_key,
};
use serde::{
    Deserialize,
    Serialize,
};

/// One mass spectrum.
///
/// Data points are kept sorted by m/z. The base peak, m/z range and total
/// ion current are computed whenever the data points are (re)set, an empty
/// scan has an m/z range of `[0, 0]`, no base peak and a TIC of 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scan {
    scan_number: u32,
    ms_level: u8,
    retention_time: f64,
    parent_scan_number: u32,
    precursor_mz: f64,
    precursor_charge: u8,
    fragment_scan_numbers: Vec<u32>,
    centroided: bool,
    data_points: Vec<DataPoint>,

    // Derived
    base_peak: Option<DataPoint>,
    mz_range: TupleRange<f64>,
    total_ion_current: f64,
}

impl Scan {
    /// Creates an MS1 scan. Use [`Scan::with_precursor`] for MSn scans.
    pub fn new(
        scan_number: u32,
        retention_time: f64,
        data_points: Vec<DataPoint>,
        centroided: bool,
    ) -> Self {
        let mut out = Self {
            scan_number,
            ms_level: 1,
            retention_time,
            parent_scan_number: 0,
            precursor_mz: 0.0,
            precursor_charge: 0,
            fragment_scan_numbers: Vec::new(),
            centroided,
            data_points: Vec::new(),
            base_peak: None,
            mz_range: TupleRange::point(0.0),
            total_ion_current: 0.0,
        };
        out.set_data_points(data_points);
        out
    }

    /// Turns this scan into an MSn scan fragmenting `precursor_mz` from `parent_scan_number`.
    pub fn with_precursor(
        mut self,
        ms_level: u8,
        parent_scan_number: u32,
        precursor_mz: f64,
        precursor_charge: u8,
    ) -> Self {
        debug_assert!(ms_level == 1 || parent_scan_number > 0);
        self.ms_level = ms_level;
        self.parent_scan_number = parent_scan_number;
        self.precursor_mz = precursor_mz;
        self.precursor_charge = precursor_charge;
        self
    }

    pub fn with_fragment_scans(mut self, fragment_scan_numbers: Vec<u32>) -> Self {
        self.fragment_scan_numbers = fragment_scan_numbers;
        self
    }

    /// Replaces the data points and recomputes the derived values.
    pub fn set_data_points(&mut self, mut data_points: Vec<DataPoint>) {
        data_points.sort_by(|a, b| a.mz.total_cmp(&b.mz));

        self.base_peak = None;
        self.total_ion_current = 0.0;
        self.mz_range = match (data_points.first(), data_points.last()) {
            (Some(first), Some(last)) => TupleRange::try_new(first.mz, last.mz)
                .unwrap_or_else(|_| TupleRange::point(first.mz)),
            _ => TupleRange::point(0.0),
        };
        for dp in data_points.iter() {
            match self.base_peak {
                Some(bp) if bp.intensity >= dp.intensity => {}
                _ => self.base_peak = Some(*dp),
            }
            self.total_ion_current += dp.intensity;
        }
        self.data_points = data_points;
    }

    pub fn data_points(&self) -> &[DataPoint] {
        &self.data_points
    }

    /// Data points whose m/z falls inside `mz_range` (inclusive).
    pub fn data_points_in_range(&self, mz_range: TupleRange<f64>) -> &[DataPoint] {
        let idx = binary_search_range_by_key(&self.data_points, mz_range, |dp| dp.mz);
        &self.data_points[idx]
    }

    pub fn num_data_points(&self) -> usize {
        self.data_points.len()
    }

    pub fn scan_number(&self) -> u32 {
        self.scan_number
    }

    pub fn ms_level(&self) -> u8 {
        self.ms_level
    }

    pub fn retention_time(&self) -> f64 {
        self.retention_time
    }

    pub fn parent_scan_number(&self) -> u32 {
        self.parent_scan_number
    }

    pub fn precursor_mz(&self) -> f64 {
        self.precursor_mz
    }

    pub fn precursor_charge(&self) -> u8 {
        self.precursor_charge
    }

    pub fn fragment_scan_numbers(&self) -> &[u32] {
        &self.fragment_scan_numbers
    }

    pub fn is_centroided(&self) -> bool {
        self.centroided
    }

    pub fn base_peak(&self) -> Option<DataPoint> {
        self.base_peak
    }

    pub fn mz_range(&self) -> TupleRange<f64> {
        self.mz_range
    }

    pub fn total_ion_current(&self) -> f64 {
        self.total_ion_current
    }
}
