//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for one logged extraction attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttemptLogId(Uuid);

impl AttemptLogId {
    /// Creates a new random AttemptLogId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an AttemptLogId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AttemptLogId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AttemptLogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AttemptLogId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Unique identifier for a persisted expense record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpenseId(Uuid);

impl ExpenseId {
    /// Creates a new random ExpenseId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an ExpenseId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ExpenseId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExpenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ExpenseId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attempt_log_ids_are_unique() {
        assert_ne!(AttemptLogId::new(), AttemptLogId::new());
    }

    #[test]
    fn attempt_log_id_parses_its_display_form() {
        let id = AttemptLogId::new();
        let parsed: AttemptLogId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn expense_id_rejects_garbage() {
        assert!("not-a-uuid".parse::<ExpenseId>().is_err());
    }

    #[test]
    fn expense_id_serializes_transparently() {
        let uuid = Uuid::new_v4();
        let json = serde_json::to_string(&ExpenseId::from_uuid(uuid)).unwrap();
        assert_eq!(json, format!("\"{}\"", uuid));
    }
}
