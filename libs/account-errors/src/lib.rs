//! Canonical error model for the Keystone account API
//!
//! This crate provides pure data types for API error handling, with no
//! dependencies on HTTP frameworks. It includes:
//! - The canonical error envelope (`ApiError`)
//! - The stable errno registry and per-condition constructors (`catalog`)
//! - Classification of failures caught at the HTTP boundary (`translate`)
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod catalog;
pub mod error;
pub mod translate;

// Re-export commonly used types
pub use catalog::DEFAULT_RETRY_AFTER_SECS;
pub use error::{ApiError, DEFAULT_INFO_URL};
pub use translate::{
    translate, BoundaryError, CapturedFailure, ErrorPayload, ValidationReport,
};
