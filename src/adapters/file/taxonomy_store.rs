//! YAML taxonomy store
//!
//! Reads the taxonomy from a YAML file on every call, so edits to the file
//! take effect on the next extraction. Two layouts are accepted:
//!
//! ```yaml
//! Food: [Dining, Snacks]
//! Transport: [Bus, Taxi]
//! ```
//!
//! or a list of `{ name, subcategories }` entries.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::taxonomy::{Category, TaxonomySnapshot};
use crate::ports::TaxonomyStore;

/// Taxonomy read from a YAML file.
#[derive(Debug, Clone)]
pub struct YamlTaxonomyStore {
    path: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TaxonomyFile {
    List(Vec<Category>),
    Map(serde_yaml::Mapping),
}

impl YamlTaxonomyStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parses taxonomy YAML. An empty document yields an empty snapshot.
    pub fn parse(yaml: &str) -> Result<TaxonomySnapshot, DomainError> {
        if yaml.trim().is_empty() {
            return Ok(TaxonomySnapshot::new());
        }

        let file: TaxonomyFile = serde_yaml::from_str(yaml).map_err(|e| {
            DomainError::new(
                ErrorCode::TaxonomyUnavailable,
                format!("invalid taxonomy file: {}", e),
            )
        })?;

        match file {
            TaxonomyFile::List(categories) => Ok(TaxonomySnapshot::from_categories(categories)),
            TaxonomyFile::Map(mapping) => {
                let mut categories = Vec::with_capacity(mapping.len());
                for (name, subs) in mapping {
                    let name: String = serde_yaml::from_value(name).map_err(|e| {
                        DomainError::new(
                            ErrorCode::TaxonomyUnavailable,
                            format!("invalid category name: {}", e),
                        )
                    })?;
                    // `Category:` with no value means no subcategories.
                    let subs: Vec<String> = if subs.is_null() {
                        Vec::new()
                    } else {
                        serde_yaml::from_value(subs).map_err(|e| {
                            DomainError::new(
                                ErrorCode::TaxonomyUnavailable,
                                format!("invalid subcategories for '{}': {}", name, e),
                            )
                        })?
                    };
                    categories.push(Category::new(name, subs));
                }
                Ok(TaxonomySnapshot::from_categories(categories))
            }
        }
    }
}

#[async_trait]
impl TaxonomyStore for YamlTaxonomyStore {
    async fn get_taxonomy(&self) -> Result<TaxonomySnapshot, DomainError> {
        let yaml = fs::read_to_string(&self.path).await.map_err(|e| {
            DomainError::new(
                ErrorCode::TaxonomyUnavailable,
                format!("cannot read {}: {}", self.path.display(), e),
            )
        })?;

        Self::parse(&yaml)
    }
}
