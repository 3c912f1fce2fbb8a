//! Domain layer containing the extraction pipeline and its types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors)
//! - `taxonomy` - Category snapshots and their prompt rendering
//! - `extraction` - Temporal resolution, prompt assembly, parsing, validation
//! - `expense` - Records saved after a valid extraction

pub mod expense;
pub mod extraction;
pub mod foundation;
pub mod taxonomy;
