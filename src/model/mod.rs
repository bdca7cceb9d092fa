//! Data models for region-of-interest analysis.

mod region;

pub use region::Region;
