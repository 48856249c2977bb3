//! Vertex in the graph fragment.

use serde::{Deserialize, Serialize};
use super::Point3D;

/// Stable identity of a vertex.
///
/// A vertex is known by its id when it has one. Placeholders without an id
/// (unresolved search hits, date values) are known by their label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VertexKey {
    Id(String),
    Label(String),
}

impl VertexKey {
    pub fn as_str(&self) -> &str {
        match self {
            VertexKey::Id(s) | VertexKey::Label(s) => s,
        }
    }
}

impl std::fmt::Display for VertexKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VertexKey::Id(id) => write!(f, "id:{id}"),
            VertexKey::Label(label) => write!(f, "label:{label}"),
        }
    }
}

/// A vertex: one entity of the knowledge graph with a position in layout space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vertex {
    pub id: Option<String>,
    pub label: Option<String>,
    pub description: Option<String>,
    pub position: Point3D,
    /// Pinned: excluded from force application and position updates.
    pub locked: bool,
    pub fetched_edges: bool,
}

impl Vertex {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            label: Some(label.into()),
            description: None,
            position: Point3D::origin(),
            locked: false,
            fetched_edges: false,
        }
    }

    /// An id-less vertex identified by its label only.
    pub fn placeholder(label: impl Into<String>) -> Self {
        Self {
            id: None,
            label: Some(label.into()),
            description: None,
            position: Point3D::origin(),
            locked: false,
            fetched_edges: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_position(mut self, position: Point3D) -> Self {
        self.position = position;
        self
    }

    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }

    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn unlock(&mut self) {
        self.locked = false;
    }

    /// Id when present and non-empty, otherwise the label.
    ///
    /// `None` means the vertex violates the identity invariant and must not
    /// enter a Graphset.
    pub fn key(&self) -> Option<VertexKey> {
        match (non_empty(&self.id), non_empty(&self.label)) {
            (Some(id), _) => Some(VertexKey::Id(id.to_string())),
            (None, Some(label)) => Some(VertexKey::Label(label.to_string())),
            (None, None) => None,
        }
    }

    pub fn has_id(&self, id: &str) -> bool {
        non_empty(&self.id) == Some(id)
    }

    pub fn has_label(&self, label: &str) -> bool {
        non_empty(&self.label) == Some(label)
    }

    /// Matches `token` as either id or label.
    pub fn mentions(&self, token: &str) -> bool {
        self.has_id(token) || self.has_label(token)
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}
