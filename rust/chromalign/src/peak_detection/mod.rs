pub mod centroid;
pub mod filling;
pub mod pipeline;
pub mod savitzky_golay;

pub use centroid::{
    BinThresholds,
    CentroidGrowthDetector,
};
pub use filling::PeakFillingModel;
pub use pipeline::{
    ThreeStepPeakPicker,
    detect_centroid_peaks_par,
    pick_peaks_par,
};
pub use savitzky_golay::{
    SavitzkyGolayDetector,
    second_derivative,
};
