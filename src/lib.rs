//! Expense Extractor - natural-language expense capture
//!
//! Turns free-form text such as "20rs na padika" or "Lunch 250 at SpiceHub
//! yesterday" into a structured expense whose category and subcategory come
//! from a caller-defined taxonomy. A language model proposes the fields; the
//! validator has the final word.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
