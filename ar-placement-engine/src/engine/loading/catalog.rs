use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// A single placeable model in the shop catalogue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEntry {
    pub name: String,
    pub file: String,
}

/// Shop catalogue as a Bevy asset. Mirrors the JSON structure exactly.
#[derive(Asset, Debug, Clone, Serialize, Deserialize, TypePath)]
pub struct ModelCatalog {
    pub models: Vec<ModelEntry>,
}

impl ModelCatalog {
    /// Look up a model by catalogue index.
    pub fn get(&self, index: usize) -> Option<&ModelEntry> {
        self.models.get(index)
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
