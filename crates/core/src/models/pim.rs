//! Structured product attributes extracted from the PIM export.

use serde::{Deserialize, Serialize};

/// Product details parsed from the PIM text blob.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PimAttributes {
    pub identifier: Option<String>,
    pub family: Option<String>,
    pub description: Option<String>,
    pub features: Vec<String>,
    pub materials: Vec<String>,
    pub care_instructions: Option<String>,
    pub specifications: Vec<Specification>,
}

/// A labelled attribute value ("Country of origin: PT").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specification {
    pub label: String,
    pub value: String,
}

impl PimAttributes {
    /// Whether nothing displayable was extracted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.features.is_empty()
            && self.materials.is_empty()
            && self.care_instructions.is_none()
            && self.specifications.is_empty()
    }
}
