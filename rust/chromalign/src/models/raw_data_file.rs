use serde::{
    Deserialize,
    Serialize,
};
use std::fmt::Display;
use std::sync::Arc;

/// Read-only handle to a raw data file (one LC/GC-MS run).
///
/// Cheap to clone, compared by name. Peaks and peak lists keep these as
/// back-references; the scan data itself is reached through a
/// [`crate::traits::ScanSource`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RawDataFile {
    name: Arc<str>,
}

impl RawDataFile {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Display for RawDataFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
