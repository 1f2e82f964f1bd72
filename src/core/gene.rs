use serde::{Deserialize, Serialize};

use crate::core::types::{GeneId, StrainId};

/// A named source organism or sample
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strain {
    pub id: StrainId,
    pub name: String,
}

/// One coding sequence from one strain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gene {
    pub id: GeneId,

    /// Sequence identifier, unique across all strains
    pub name: String,

    pub strain_id: StrainId,

    /// Sequence content, uppercase
    pub sequence: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A gene that has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGene {
    pub name: String,
    pub sequence: String,
    pub description: Option<String>,
}

impl NewGene {
    pub fn new(name: impl Into<String>, sequence: impl AsRef<str>) -> Self {
        Self {
            name: name.into(),
            sequence: normalize_sequence(sequence.as_ref()),
            description: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Sequences are compared case-insensitively and without whitespace
#[must_use]
pub fn normalize_sequence(sequence: &str) -> String {
    sequence
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}
