use serde::{
    Deserialize,
    Serialize,
};

/// A single (m/z, intensity) pair, usually a centroid from a scan.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DataPoint {
    pub mz: f64,
    pub intensity: f64,
}

impl DataPoint {
    pub fn new(mz: f64, intensity: f64) -> Self {
        debug_assert!(intensity >= 0.0, "Negative intensity {intensity} at m/z {mz}");
        Self { mz, intensity }
    }
}

impl From<(f64, f64)> for DataPoint {
    fn from(value: (f64, f64)) -> Self {
        Self::new(value.0, value.1)
    }
}
