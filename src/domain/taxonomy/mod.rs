//! Taxonomy module - categories and their prompt rendering.

mod formatter;
mod snapshot;

pub use formatter::{RenderedTaxonomy, TaxonomyFormatter, TaxonomySource};
pub use snapshot::{Category, TaxonomySnapshot};
