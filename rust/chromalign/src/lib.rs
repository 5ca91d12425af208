#![doc = include_str!("../README.md")]

// Re-export main structures
pub use crate::alignment::AlignmentEngine;
pub use crate::chromatogram_builder::{
    ChromatogramBuilder,
    ChromatogramSet,
};
pub use crate::config::PipelineConfig;
pub use crate::matching::{
    MatchOutcome,
    ScoreMatcher,
};
pub use crate::models::{
    Chromatogram,
    ChromatographicPeak,
    CompoundIdentity,
    DataPoint,
    PeakList,
    PeakListRow,
    PeakStatus,
    RawDataFile,
    Scan,
};
pub use crate::peak_detection::{
    CentroidGrowthDetector,
    PeakFillingModel,
    SavitzkyGolayDetector,
    ThreeStepPeakPicker,
};
pub use crate::postprocessing::{
    DuplicateRowFilter,
    LinearNormalizer,
};
pub use crate::task::{
    CancellationToken,
    ProgressTracker,
    TaskContext,
    TaskReport,
    TaskStatus,
};

// Re-export traits
pub use crate::traits::{
    InMemoryScanSource,
    ScanSource,
};

// Declare modules
pub mod alignment;
pub mod chromatogram_builder;
pub mod config;
pub mod errors;
pub mod matching;
pub mod models;
pub mod peak_detection;
pub mod postprocessing;
pub mod task;
pub mod traits;
pub mod utils;

// Re-export errors
pub use crate::errors::{
    ChromAlignError,
    ConfigurationError,
    DataAccessError,
};
