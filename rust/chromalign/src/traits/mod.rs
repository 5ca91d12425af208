pub mod scan_source;

pub use scan_source::{
    InMemoryScanSource,
    ScanSource,
};
