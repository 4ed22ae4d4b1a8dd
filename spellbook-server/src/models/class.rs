//! Class reference data

use serde::{Deserialize, Serialize};

pub type ClassId = i32;

/// Attributes of a single class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassAttributes {
    pub name: String,
}

/// Result of looking up one class.
///
/// The requested id is echoed back so concurrent lookups can be
/// correlated with the request that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassLookup {
    pub id: ClassId,
    pub attributes: Option<ClassAttributes>,
}

/// Class with its id embedded, `{"id": 1, "name": "Wizard"}`.
///
/// A class whose attributes could not be resolved serializes as `{"id": 1}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSummary {
    pub id: ClassId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl From<ClassLookup> for ClassSummary {
    fn from(lookup: ClassLookup) -> Self {
        Self {
            id: lookup.id,
            name: lookup.attributes.map(|a| a.name),
        }
    }
}

/// Filter on the level at which a class gains a spell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelBound {
    /// Spells gained at exactly this level
    Exactly(i32),
    /// Spells gained at this level or below
    UpTo(i32),
}

impl LevelBound {
    /// The level this bound compares against.
    pub fn level(self) -> i32 {
        match self {
            Self::Exactly(level) | Self::UpTo(level) => level,
        }
    }

    /// Whether an association at `level` passes this bound.
    pub fn admits(self, level: i32) -> bool {
        match self {
            Self::Exactly(bound) => level == bound,
            Self::UpTo(bound) => level <= bound,
        }
    }
}
