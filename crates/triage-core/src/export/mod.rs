//! Export of the audit trail for compliance review and reporting.

mod compliance;
mod summary;

pub use compliance::*;
pub use summary::*;

/// Format version stamped on every export.
pub const EXPORT_FORMAT_VERSION: &str = "1.0";
