//! Utility modules
//!
//! This module contains utilities and helpers:
//! - Error types and result types
//! - Renumbering reports

pub mod error;
pub mod report;

// Re-export commonly used items
pub use error::{RenumberError, RenumberResult};
pub use report::RenumberReport;
