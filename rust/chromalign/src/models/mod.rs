pub mod chromatogram;
pub mod data_point;
pub mod identity;
pub mod peak;
pub mod peak_list;
pub mod raw_data_file;
pub mod scan;

pub use chromatogram::{
    Chromatogram,
    ChromatogramPoint,
    ScanAxis,
};
pub use data_point::DataPoint;
pub use identity::{
    CompoundIdentity,
    CompoundInfo,
};
pub use peak::{
    ChromatographicPeak,
    PeakBuilder,
    PeakSample,
    PeakStatus,
};
pub use peak_list::{
    PeakList,
    PeakListRow,
};
pub use raw_data_file::RawDataFile;
pub use scan::Scan;
