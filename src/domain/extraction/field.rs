//! Names of the fields an extraction can report as missing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A field of an extraction result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionField {
    Amount,
    Category,
    Subcategory,
    Description,
    Datetime,
}

impl ExtractionField {
    /// Fields that must be present for a result to be valid, in reporting order.
    pub const REQUIRED: [ExtractionField; 4] = [
        ExtractionField::Amount,
        ExtractionField::Category,
        ExtractionField::Subcategory,
        ExtractionField::Description,
    ];

    /// Wire name of the field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Amount => "amount",
            Self::Category => "category",
            Self::Subcategory => "subcategory",
            Self::Description => "description",
            Self::Datetime => "datetime",
        }
    }
}

impl fmt::Display for ExtractionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtractionField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "amount" => Ok(Self::Amount),
            "category" => Ok(Self::Category),
            "subcategory" | "sub_category" => Ok(Self::Subcategory),
            "description" => Ok(Self::Description),
            "datetime" | "date" | "date_time" => Ok(Self::Datetime),
            other => Err(format!("unknown field '{}'", other)),
        }
    }
}
