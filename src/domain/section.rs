// Viewport section domain models
use serde::{Deserialize, Serialize};

/// Identifier of a named viewport region (`observability`, `rate`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionId(String);

impl SectionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SectionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl std::fmt::Display for SectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One visibility change for an observed section.
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionEntry {
    pub target: SectionId,
    pub is_intersecting: bool,
    pub intersection_ratio: f64,
}

impl IntersectionEntry {
    pub fn entering(target: impl Into<SectionId>) -> Self {
        Self {
            target: target.into(),
            is_intersecting: true,
            intersection_ratio: 1.0,
        }
    }

    pub fn leaving(target: impl Into<SectionId>) -> Self {
        Self {
            target: target.into(),
            is_intersecting: false,
            intersection_ratio: 0.0,
        }
    }
}
