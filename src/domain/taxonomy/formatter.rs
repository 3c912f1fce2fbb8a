//! Renders a taxonomy snapshot into prompt-ready text.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::TaxonomySnapshot;

/// Where the taxonomy used for an attempt came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxonomySource {
    /// Supplied by the taxonomy store.
    Store,
    /// Substituted minimal default (store empty or unreachable).
    Default,
}

impl fmt::Display for TaxonomySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store => write!(f, "store"),
            Self::Default => write!(f, "default"),
        }
    }
}

/// The taxonomy an attempt will be validated against, plus its rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTaxonomy {
    pub snapshot: TaxonomySnapshot,
    pub source: TaxonomySource,
    pub text: String,
}

/// Deterministic taxonomy renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaxonomyFormatter;

impl TaxonomyFormatter {
    /// Chooses the effective taxonomy and renders it.
    ///
    /// An empty snapshot is replaced by the minimal default taxonomy.
    pub fn prepare(snapshot: TaxonomySnapshot) -> RenderedTaxonomy {
        let (snapshot, source) = if snapshot.is_empty() {
            (TaxonomySnapshot::minimal_default(), TaxonomySource::Default)
        } else {
            (snapshot, TaxonomySource::Store)
        };
        let text = Self::render(&snapshot);
        RenderedTaxonomy {
            snapshot,
            source,
            text,
        }
    }

    /// Renders categories in snapshot order with subcategories indented beneath.
    pub fn render(snapshot: &TaxonomySnapshot) -> String {
        let mut lines = Vec::new();
        for category in snapshot.categories() {
            lines.push(format!("- {}", category.name));
            if category.subcategories.is_empty() {
                lines.push("    (no subcategories)".to_string());
            }
            for sub in &category.subcategories {
                lines.push(format!("    - {}", sub));
            }
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_in_snapshot_order_with_indentation() {
        let snapshot = TaxonomySnapshot::new()
            .with_category("Transport", ["Bus", "Auto"])
            .with_category("Food", ["Snacks"]);

        let text = TaxonomyFormatter::render(&snapshot);
        assert_eq!(
            text,
            "- Transport\n    - Bus\n    - Auto\n- Food\n    - Snacks"
        );
    }

    #[test]
    fn marks_categories_without_subcategories() {
        let snapshot = TaxonomySnapshot::new().with_category("Gifts", Vec::<String>::new());
        assert_eq!(
            TaxonomyFormatter::render(&snapshot),
            "- Gifts\n    (no subcategories)"
        );
    }

    #[test]
    fn prepare_keeps_store_snapshot() {
        let snapshot = TaxonomySnapshot::new().with_category("Food", ["Dining"]);
        let rendered = TaxonomyFormatter::prepare(snapshot.clone());

        assert_eq!(rendered.source, TaxonomySource::Store);
        assert_eq!(rendered.snapshot, snapshot);
    }

    #[test]
    fn prepare_substitutes_default_for_empty_snapshot() {
        let rendered = TaxonomyFormatter::prepare(TaxonomySnapshot::new());

        assert_eq!(rendered.source, TaxonomySource::Default);
        assert_eq!(rendered.snapshot, TaxonomySnapshot::minimal_default());
        assert!(rendered.text.starts_with("- Food\n    - Groceries"));
        assert_eq!(rendered.source.to_string(), "default");
    }

    #[test]
    fn rendering_is_deterministic() {
        let snapshot = TaxonomySnapshot::minimal_default();
        assert_eq!(
            TaxonomyFormatter::render(&snapshot),
            TaxonomyFormatter::render(&snapshot.clone())
        );
    }
}
