//! JSON export of a laid-out Graphset for the client.
//!
//! ```text
//! Graphset ─snapshot()─▶ GraphsetSnapshot ─serde_json─▶ { vertices, edges, properties }
//! ```

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::graphset::Graphset;
use crate::model::*;
use crate::Result;

/// Serialized form of a Graphset. Collections keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphsetSnapshot {
    pub vertices: Vec<Vertex>,
    pub edges: Vec<Edge>,
    pub properties: Vec<Property>,
}

impl GraphsetSnapshot {
    /// Copy the Graphset's current contents.
    ///
    /// Each collection is read under its own lock, so a snapshot taken while
    /// writers are active may pair an edge with a vertex removed a moment later.
    pub fn of(graph: &Graphset) -> Self {
        Self {
            vertices: graph.vertices(),
            edges: graph.edges(),
            properties: graph.properties(),
        }
    }

    /// Rebuild a Graphset, applying the usual identity and dedup rules.
    pub fn into_graphset(self) -> Result<Graphset> {
        let graph = Graphset::new();
        for v in self.vertices {
            graph.add_vertex(v)?;
        }
        for p in self.properties {
            graph.add_property(p)?;
        }
        for e in self.edges {
            graph.add_edge(e)?;
        }
        Ok(graph)
    }
}

pub fn to_json_value(graph: &Graphset) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(GraphsetSnapshot::of(graph))?)
}

/// Write the Graphset as pretty-printed JSON followed by a newline.
pub fn export_json(graph: &Graphset, writer: &mut dyn Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, &GraphsetSnapshot::of(graph))?;
    writeln!(writer)?;
    Ok(())
}
