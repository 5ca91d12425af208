use super::{
    ChromatographicPeak,
    CompoundIdentity,
    RawDataFile,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::collections::BTreeMap;

/// One feature: at most one peak per raw data file plus its annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakListRow {
    id: u32,
    #[serde(with = "peaks_as_seq")]
    peaks: BTreeMap<RawDataFile, ChromatographicPeak>,
    identities: Vec<CompoundIdentity>,
    preferred_identity: CompoundIdentity,
    comment: String,
}

impl PeakListRow {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            peaks: BTreeMap::new(),
            identities: Vec::new(),
            preferred_identity: CompoundIdentity::Unknown,
            comment: String::new(),
        }
    }

    /// Row holding a single peak, keyed by the peak's own data file.
    pub fn with_peak(id: u32, peak: ChromatographicPeak) -> Self {
        let mut out = Self::new(id);
        out.add_peak(peak);
        out
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Sets the peak for the peak's data file, replacing any earlier one.
    pub fn add_peak(&mut self, peak: ChromatographicPeak) {
        self.peaks.insert(peak.data_file().clone(), peak);
    }

    pub fn peak(&self, file: &RawDataFile) -> Option<&ChromatographicPeak> {
        self.peaks.get(file)
    }

    pub fn peaks(&self) -> impl Iterator<Item = &ChromatographicPeak> {
        self.peaks.values()
    }

    pub fn num_peaks(&self) -> usize {
        self.peaks.len()
    }

    pub fn data_files(&self) -> impl Iterator<Item = &RawDataFile> {
        self.peaks.keys()
    }

    fn mean_of(&self, f: impl Fn(&ChromatographicPeak) -> f64) -> f64 {
        if self.peaks.is_empty() {
            return 0.0;
        }
        self.peaks.values().map(f).sum::<f64>() / self.peaks.len() as f64
    }

    pub fn average_mz(&self) -> f64 {
        self.mean_of(|p| p.mz())
    }

    pub fn average_rt(&self) -> f64 {
        self.mean_of(|p| p.retention_time())
    }

    pub fn average_height(&self) -> f64 {
        self.mean_of(|p| p.height())
    }

    pub fn average_area(&self) -> f64 {
        self.mean_of(|p| p.area())
    }

    pub fn identities(&self) -> &[CompoundIdentity] {
        &self.identities
    }

    /// Adds an identity unless one with the same name is already present.
    /// Returns whether it was added.
    pub fn add_identity(&mut self, identity: CompoundIdentity) -> bool {
        if identity.is_unknown() || self.has_identity_named(identity.name()) {
            return false;
        }
        self.identities.push(identity);
        true
    }

    fn has_identity_named(&self, name: Option<&str>) -> bool {
        name.is_some_and(|n| self.identities.iter().any(|i| i.name() == Some(n)))
    }

    /// True when either row has no identities, or both share at least one name.
    pub fn identities_compatible(&self, other: &PeakListRow) -> bool {
        if self.identities.is_empty() || other.identities.is_empty() {
            return true;
        }
        self.identities
            .iter()
            .any(|i| other.has_identity_named(i.name()))
    }

    pub fn preferred_identity(&self) -> &CompoundIdentity {
        &self.preferred_identity
    }

    pub fn set_preferred_identity(&mut self, identity: CompoundIdentity) {
        if !identity.is_unknown() {
            self.add_identity(identity.clone());
        }
        self.preferred_identity = identity;
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.comment = comment.into();
    }
}

/// Peaks are written as a plain list, the file key is read back from
/// each peak. JSON maps only take string keys.
mod peaks_as_seq {
    use super::{
        ChromatographicPeak,
        RawDataFile,
    };
    use serde::{
        Deserialize,
        Deserializer,
        Serializer,
    };
    use std::collections::BTreeMap;

    pub fn serialize<S>(
        peaks: &BTreeMap<RawDataFile, ChromatographicPeak>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(peaks.values())
    }

    pub fn deserialize<'de, D>(
        deserializer: D,
    ) -> Result<BTreeMap<RawDataFile, ChromatographicPeak>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let peaks = Vec::<ChromatographicPeak>::deserialize(deserializer)?;
        Ok(peaks
            .into_iter()
            .map(|peak| (peak.data_file().clone(), peak))
            .collect())
    }
}

/// Ordered rows plus the raw data files they span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakList {
    name: String,
    data_files: Vec<RawDataFile>,
    rows: Vec<PeakListRow>,
}

impl PeakList {
    pub fn new(name: impl Into<String>, data_files: Vec<RawDataFile>) -> Self {
        Self {
            name: name.into(),
            data_files,
            rows: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_files(&self) -> &[RawDataFile] {
        &self.data_files
    }

    pub fn rows(&self) -> &[PeakListRow] {
        &self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Appends a row. Files the row holds peaks for are added to the file set.
    pub fn add_row(&mut self, row: PeakListRow) {
        for file in row.data_files() {
            if !self.data_files.contains(file) {
                self.data_files.push(file.clone());
            }
        }
        self.rows.push(row);
    }
}
