//! Vehicle identity used for caching, hashing and segment lookup.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Immutable `(brand, model, fuel)` triple. Fields are stored trimmed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityKey {
    pub brand: String,
    pub model: String,
    pub fuel: String,
}

impl EntityKey {
    pub fn new(brand: impl AsRef<str>, model: impl AsRef<str>, fuel: impl AsRef<str>) -> Self {
        Self {
            brand: brand.as_ref().trim().to_string(),
            model: model.as_ref().trim().to_string(),
            fuel: fuel.as_ref().trim().to_string(),
        }
    }

    /// First whitespace token of the model name ("그랜저 IG" → "그랜저").
    pub fn base_model(&self) -> &str {
        self.model.split_whitespace().next().unwrap_or("")
    }

    /// Whether a release named `other` refers to this model: either the
    /// base model appears in it ("그랜저" in "디 올 뉴 그랜저") or it appears
    /// in the full model name ("그랜저" in "더 뉴 그랜저").
    pub fn matches_model(&self, other: &str) -> bool {
        let other = other.trim().to_lowercase();
        if other.is_empty() {
            return false;
        }
        let base = self.base_model().to_lowercase();
        (!base.is_empty() && other.contains(&base)) || self.model.to_lowercase().contains(&other)
    }

    /// Lowercased `brand model fuel`, the haystack for marker matching.
    pub fn haystack(&self) -> String {
        format!("{} {} {}", self.brand, self.model, self.fuel).to_lowercase()
    }
}

/// Stable string form `brand|model|fuel`; hashed by the entity adjustment.
impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}|{}", self.brand, self.model, self.fuel)
    }
}
