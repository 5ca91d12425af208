pub mod duplicate_filter;
pub mod normalization;

pub use duplicate_filter::DuplicateRowFilter;
pub use normalization::{
    LinearNormalizer,
    NORMALIZATION_CEILING,
};
