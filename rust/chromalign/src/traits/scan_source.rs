use crate::errors::DataAccessError;
use crate::models::{
    RawDataFile,
    Scan,
};
use crate::utils::TupleRange;
use std::sync::Arc;

/// Read access to the scans of one raw data file.
///
/// Implementations own the storage strategy (in memory, memory mapped,
/// a temporary scan store on disk ...), the detectors only read through
/// this trait. Scans are returned behind an [`Arc`] so repeated access to
/// the same scan does not copy its data points.
///
/// # Contract
///
/// - [`ScanSource::scan_numbers`] is sorted ascending, and the retention
///   times of the scans it lists are non-decreasing.
/// - A storage-backed implementation has to serialize access to its store
///   per file itself; different files are independent and can be read from
///   different threads.
pub trait ScanSource: Send + Sync {
    fn data_file(&self) -> &RawDataFile;

    /// Scan numbers at an MS level, in acquisition order.
    fn scan_numbers(&self, ms_level: u8) -> Vec<u32>;

    fn scan(&self, scan_number: u32) -> Result<Arc<Scan>, DataAccessError>;

    /// m/z range covered by the scans of an MS level, `None` if there are no
    /// data points at that level.
    fn data_mz_range(&self, ms_level: u8) -> Option<TupleRange<f64>> {
        let mut out: Option<TupleRange<f64>> = None;
        for num in self.scan_numbers(ms_level) {
            let Ok(scan) = self.scan(num) else {
                continue;
            };
            if scan.num_data_points() == 0 {
                continue;
            }
            let range = scan.mz_range();
            match out.as_mut() {
                Some(x) => {
                    x.extend(range.start());
                    x.extend(range.end());
                }
                None => out = Some(range),
            }
        }
        out
    }

    /// All scans of an MS level, in acquisition order.
    fn scans(&self, ms_level: u8) -> Result<Vec<Arc<Scan>>, DataAccessError> {
        self.scan_numbers(ms_level)
            .into_iter()
            .map(|n| self.scan(n))
            .collect()
    }
}

/// [`ScanSource`] holding every scan in memory.
#[derive(Debug, Clone)]
pub struct InMemoryScanSource {
    data_file: RawDataFile,
    scans: Vec<Arc<Scan>>,
}

impl InMemoryScanSource {
    /// Scans are sorted by scan number on construction.
    pub fn new(data_file: RawDataFile, scans: Vec<Scan>) -> Self {
        let mut scans: Vec<Arc<Scan>> = scans.into_iter().map(Arc::new).collect();
        scans.sort_by_key(|s| s.scan_number());
        Self { data_file, scans }
    }

    pub fn num_scans(&self) -> usize {
        self.scans.len()
    }
}

impl ScanSource for InMemoryScanSource {
    fn data_file(&self) -> &RawDataFile {
        &self.data_file
    }

    fn scan_numbers(&self, ms_level: u8) -> Vec<u32> {
        self.scans
            .iter()
            .filter(|s| s.ms_level() == ms_level)
            .map(|s| s.scan_number())
            .collect()
    }

    fn scan(&self, scan_number: u32) -> Result<Arc<Scan>, DataAccessError> {
        self.scans
            .binary_search_by_key(&scan_number, |s| s.scan_number())
            .map(|i| self.scans[i].clone())
            .map_err(|_| DataAccessError::ScanNotFound {
                file: self.data_file.to_string(),
                scan_number,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DataPoint;

    fn source() -> InMemoryScanSource {
        let scans = vec![
            Scan::new(3, 3.0, vec![DataPoint::new(150.0, 1.0)], true),
            Scan::new(1, 1.0, vec![DataPoint::new(100.0, 1.0)], true),
            Scan::new(2, 2.0, vec![DataPoint::new(300.0, 1.0)], true).with_precursor(
                2,
                1,
                300.0,
                2,
            ),
        ];
        InMemoryScanSource::new(RawDataFile::new("run1"), scans)
    }

    #[test]
    fn test_scan_numbers_by_level() {
        let src = source();
        assert_eq!(src.scan_numbers(1), vec![1, 3]);
        assert_eq!(src.scan_numbers(2), vec![2]);
        assert_eq!(src.data_mz_range(1).unwrap().as_tuple(), (100.0, 150.0));
        assert!(src.data_mz_range(3).is_none());
    }

    #[test]
    fn test_missing_scan() {
        let src = source();
        assert!(src.scan(2).is_ok());
        let err = src.scan(42).unwrap_err();
        assert!(matches!(
            err,
            DataAccessError::ScanNotFound { scan_number: 42, .. }
        ));
    }
}
