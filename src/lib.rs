//! # graphset3d: Knowledge-Graph Fragments in 3D Space
//!
//! An in-memory, concurrently mutable graph fragment (the [`Graphset`]) plus a
//! 3D force-directed layout engine ([`SpatialLayout`]) that positions its
//! vertices while the fragment keeps growing.
//!
//! ## Design Principles
//!
//! 1. **Shared store, cheap handles**: cloning a `Graphset` shares the collections
//! 2. **Plain DTOs**: `Vertex`, `Edge`, `Property`, `Point3D` cross every boundary
//! 3. **No lock across a pass**: the engine snapshots, computes, then commits
//! 4. **One error type**: every fallible operation returns [`Result`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use graphset3d::{Edge, Graphset, LayoutMetadata, Point3D, SpatialLayout, Vertex};
//!
//! # fn example() -> graphset3d::Result<()> {
//! let graph = Graphset::new();
//! graph.add_vertex(Vertex::new("Q42", "Douglas Adams").with_position(Point3D::origin()).locked())?;
//! graph.add_vertex(Vertex::new("Q5", "human"))?;
//! graph.add_edge(Edge::new("Q42", "Q5").with_property("P31"))?;
//!
//! let mut layout = SpatialLayout::new(graph.clone(), LayoutMetadata::new(800.0, 600.0).with_origin("Q42"));
//! let report = layout.run()?;
//! println!("{} iterations, {}", report.iterations, graph);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`model`] | Vertex / Edge / Property / Point3D / LayoutMetadata |
//! | [`graphset`] | Thread-safe vertex, edge and property collections |
//! | [`layout`] | Fruchterman–Reingold relaxation in three dimensions |
//! | [`request`] | Upstream entity-service seam and request orchestration |
//! | [`export`] | JSON serialization for the client |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod graphset;
pub mod layout;
pub mod request;
pub mod export;

// ============================================================================
// Re-exports
// ============================================================================

pub use model::{
    Point3D, Vertex, VertexKey, Edge, Property,
    Dimensions, LayoutMetadata,
};

pub use graphset::Graphset;
pub use layout::{LayoutConfig, LayoutReport, LayoutState, SpatialLayout};
pub use request::{ClientRequest, EntityDocument, EntitySource};
pub use export::{export_json, to_json_value, GraphsetSnapshot};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The layout diverged or was driven out of order.
    #[error("Layout fault in {operation}: {message}")]
    LayoutFault { message: String, operation: String },

    /// The upstream entity service could not be reached.
    #[error("Source unavailable in {operation}: {message}")]
    SourceUnavailable { message: String, operation: String },

    #[error("No matching results for query: {query}")]
    NoMatchingResults { query: String },

    #[error("Invalid entity: {0}")]
    InvalidEntity(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn layout_fault(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Error::LayoutFault { message: message.into(), operation: operation.into() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
