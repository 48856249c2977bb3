//! Properties describe the nature of an edge's relation.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: String,
    pub label: Option<String>,
    pub description: Option<String>,
}

impl Property {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), label: None, description: None }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
