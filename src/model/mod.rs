//! # Graph Model
//!
//! Plain DTOs for one request's graph fragment: vertices, edges, properties,
//! the coordinate type they are laid out in, and the per-request layout
//! settings. Everything here serializes for the client.
//!
//! Design rule: no locking, no I/O, no layout state in this module.

pub mod point;
pub mod vertex;
pub mod edge;
pub mod property;
pub mod metadata;

pub use point::Point3D;
pub use vertex::{Vertex, VertexKey};
pub use edge::Edge;
pub use property::Property;
pub use metadata::{Dimensions, LayoutMetadata};
