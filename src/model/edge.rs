//! Edge (relation) between two vertices.

use serde::{Deserialize, Serialize};

/// A labeled relation between two vertex tokens.
///
/// Endpoints are referenced by token (a vertex id, or the label of an
/// id-less vertex), so an edge may point at a vertex that has not been
/// ingested yet. Such a dangling edge is legal and contributes no force.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    #[serde(rename = "sourceID")]
    pub source_id: String,
    #[serde(rename = "targetID")]
    pub target_id: String,
    #[serde(rename = "propertyID")]
    pub property_id: Option<String>,
    #[serde(rename = "groupID")]
    pub group_id: Option<String>,
    /// Number of statement groups on the source entity.
    pub group_size: u32,
    /// Position of this edge's group within the source entity.
    pub group_position: u32,
    /// Fallback descriptor when no property fits (dates).
    pub label: Option<String>,
}

impl Edge {
    pub fn new(source_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            property_id: None,
            group_id: None,
            group_size: 0,
            group_position: 0,
            label: None,
        }
    }

    pub fn with_property(mut self, property_id: impl Into<String>) -> Self {
        self.property_id = Some(property_id.into());
        self
    }

    pub fn with_group(mut self, group_id: impl Into<String>, size: u32, position: u32) -> Self {
        self.group_id = Some(group_id.into());
        self.group_size = size;
        self.group_position = position;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Dedup key: one edge per ordered (source, target) pair.
    pub fn same_endpoints(&self, other: &Edge) -> bool {
        self.source_id == other.source_id && self.target_id == other.target_id
    }

    /// True when `token` is this edge's source, target, property or label.
    pub fn references(&self, token: &str) -> bool {
        self.source_id == token
            || self.target_id == token
            || self.property_id.as_deref() == Some(token)
            || self.label.as_deref() == Some(token)
    }

    /// True when `token` is either endpoint.
    pub fn touches(&self, token: &str) -> bool {
        self.source_id == token || self.target_id == token
    }
}
