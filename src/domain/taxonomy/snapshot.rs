//! TaxonomySnapshot - the caller-defined closed set of categories.
//!
//! A snapshot is read once per attempt and never refreshed mid-attempt, so a
//! validation decision always sees a single taxonomy version.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A category and its ordered subcategories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub subcategories: Vec<String>,
}

impl Category {
    /// Creates a category, dropping blank and duplicate subcategory names.
    pub fn new<I, S>(name: impl Into<String>, subcategories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut category = Self {
            name: name.into().trim().to_string(),
            subcategories: Vec::new(),
        };
        for sub in subcategories {
            category.push_subcategory(sub.into());
        }
        category
    }

    fn push_subcategory(&mut self, sub: String) {
        let sub = sub.trim();
        if sub.is_empty() || self.find_subcategory(sub).is_some() {
            return;
        }
        self.subcategories.push(sub.to_string());
    }

    /// Finds a subcategory by name, returning its canonical spelling.
    pub fn find_subcategory(&self, name: &str) -> Option<&str> {
        self.subcategories
            .iter()
            .find(|s| names_match(s, name))
            .map(String::as_str)
    }
}

/// Ordered set of categories, each with an ordered set of subcategories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxonomySnapshot {
    categories: Vec<Category>,
}

impl TaxonomySnapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a snapshot from categories, merging duplicates in first-seen order.
    pub fn from_categories(categories: impl IntoIterator<Item = Category>) -> Self {
        let mut snapshot = Self::new();
        for category in categories {
            snapshot.insert(category);
        }
        snapshot
    }

    /// Adds a category with its subcategories.
    pub fn with_category<I, S>(mut self, name: impl Into<String>, subcategories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(Category::new(name, subcategories));
        self
    }

    fn insert(&mut self, category: Category) {
        if category.name.is_empty() {
            return;
        }
        match self
            .categories
            .iter_mut()
            .find(|c| names_match(&c.name, &category.name))
        {
            Some(existing) => {
                for sub in category.subcategories {
                    existing.push_subcategory(sub);
                }
            }
            None => {
                let normalized = Category::new(category.name, category.subcategories);
                self.categories.push(normalized);
            }
        }
    }

    /// The fixed minimal taxonomy used when the store is empty or unreachable.
    pub fn minimal_default() -> Self {
        DEFAULT_TAXONOMY.clone()
    }

    /// Returns the categories in snapshot order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Returns true when the snapshot holds no categories.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Finds a category by name, case- and whitespace-insensitively.
    pub fn find_category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| names_match(&c.name, name))
    }

    /// Resolves a category/subcategory pair to its canonical spelling.
    pub fn find_pair(&self, category: &str, subcategory: &str) -> Option<(&str, &str)> {
        let found = self.find_category(category)?;
        let sub = found.find_subcategory(subcategory)?;
        Some((found.name.as_str(), sub))
    }

    /// Returns true if the exact (canonical) pair is present.
    pub fn contains_pair(&self, category: &str, subcategory: &str) -> bool {
        self.find_pair(category, subcategory)
            .is_some_and(|(c, s)| c == category && s == subcategory)
    }

    /// Short content fingerprint identifying this taxonomy version.
    pub fn version(&self) -> String {
        let mut hasher = Sha256::new();
        for category in &self.categories {
            hasher.update(category.name.as_bytes());
            hasher.update([0x1e]);
            for sub in &category.subcategories {
                hasher.update(sub.as_bytes());
                hasher.update([0x1f]);
            }
            hasher.update([0x1d]);
        }
        let digest = format!("{:x}", hasher.finalize());
        digest[..16].to_string()
    }
}

fn names_match(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

static DEFAULT_TAXONOMY: Lazy<TaxonomySnapshot> = Lazy::new(|| {
    TaxonomySnapshot::new()
        .with_category("Food", ["Groceries", "Dining", "Snacks"])
        .with_category("Transport", ["Bus", "Taxi", "Fuel"])
        .with_category("Bills", ["Electricity", "Water", "Internet"])
        .with_category("Other", ["Misc"])
});
