pub mod summary;

pub use summary::{ExclusionCounts, VendorSummary, VendorSummaryRecord};
