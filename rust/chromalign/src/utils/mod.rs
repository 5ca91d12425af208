pub mod math;
pub mod range;

pub use math::{
    quantile,
    trapezoid_area,
};
pub use range::{
    TupleRange,
    binary_search_range_by_key,
    range_of,
};
