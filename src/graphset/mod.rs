//! # Graphset
//!
//! The authoritative store for one request's graph fragment.
//! Vertices, edges and properties live in insertion-ordered `Vec`s, each
//! behind its own `RwLock`, shared through an `Arc` so the ingestion side and
//! the layout engine can hold the same Graphset.
//!
//! ## Semantics
//!
//! - **Dedup on insert**: the existence scan and the push happen under one
//!   write lock, so two racing `add_vertex` calls for the same id leave one
//!   vertex. Vertices dedup by id (or label when id-less), edges by
//!   `(source, target)`, properties by id.
//! - **No transactions**: every mutation is visible to the next read.
//!   Multi-collection operations (`remove_by_value`) are not atomic.
//! - **Generation counter**: every insertion or removal bumps `generation()`.
//!   Readers that scan across several lock acquisitions compare generations
//!   to detect that the structure changed under them.
//! - **Insertion order**: all scans and snapshots return entities in the
//!   order they were added, which keeps seeded layouts reproducible.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use hashbrown::HashSet;
use parking_lot::RwLock;

use crate::model::*;
use crate::{Error, Result};

// ============================================================================
// Graphset
// ============================================================================

/// Shared handle to one request's graph fragment. Cloning is cheap and
/// yields a handle to the same store.
#[derive(Debug, Clone, Default)]
pub struct Graphset {
    inner: Arc<GraphsetInner>,
}

#[derive(Debug, Default)]
struct GraphsetInner {
    vertices: RwLock<Vec<Vertex>>,
    edges: RwLock<Vec<Edge>>,
    properties: RwLock<Vec<Property>>,
    generation: AtomicU64,
}

/// What the layout engine needs to know about a vertex at the start of a pass.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexEntry {
    pub key: VertexKey,
    pub locked: bool,
    pub position: Point3D,
}

impl VertexEntry {
    pub fn from_vertex(v: &Vertex) -> Option<Self> {
        v.key().map(|key| Self { key, locked: v.locked, position: v.position })
    }
}

impl Graphset {
    pub fn new() -> Self {
        Self::default()
    }

    fn bump_generation(&self) {
        self.inner.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Structural-change counter. Changes on every insertion or removal,
    /// never on lock/unlock or position updates.
    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::Acquire)
    }

    // ========================================================================
    // Insertion
    // ========================================================================

    /// Insert `v` unless a vertex with the same identity already exists.
    ///
    /// Identity is `v.id` when present, otherwise `v.label`.
    /// Returns `Ok(true)` when inserted, `Ok(false)` on a duplicate.
    pub fn add_vertex(&self, v: Vertex) -> Result<bool> {
        let key = v.key().ok_or_else(|| {
            Error::InvalidEntity("vertex has neither an id nor a label".into())
        })?;

        let mut vertices = self.inner.vertices.write();
        let exists = vertices.iter().any(|existing| match &key {
            VertexKey::Id(id) => existing.has_id(id),
            VertexKey::Label(label) => existing.has_label(label),
        });
        if exists {
            return Ok(false);
        }
        vertices.push(v);
        self.bump_generation();
        Ok(true)
    }

    /// Insert `e` unless an edge with the same `(source, target)` exists.
    pub fn add_edge(&self, e: Edge) -> Result<bool> {
        if e.source_id.is_empty() || e.target_id.is_empty() {
            return Err(Error::InvalidEntity(format!(
                "edge endpoints must be non-empty (source: {:?}, target: {:?})",
                e.source_id, e.target_id
            )));
        }

        let mut edges = self.inner.edges.write();
        if edges.iter().any(|existing| existing.same_endpoints(&e)) {
            return Ok(false);
        }
        edges.push(e);
        self.bump_generation();
        Ok(true)
    }

    /// Insert `p` unless a property with the same id exists.
    pub fn add_property(&self, p: Property) -> Result<bool> {
        if p.id.is_empty() {
            return Err(Error::InvalidEntity("property id must be non-empty".into()));
        }

        let mut properties = self.inner.properties.write();
        if properties.iter().any(|existing| existing.id == p.id) {
            return Ok(false);
        }
        properties.push(p);
        self.bump_generation();
        Ok(true)
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    pub fn vertex_by_id(&self, id: &str) -> Option<Vertex> {
        self.inner.vertices.read().iter().find(|v| v.has_id(id)).cloned()
    }

    pub fn vertex_by_label(&self, label: &str) -> Option<Vertex> {
        self.inner.vertices.read().iter().find(|v| v.has_label(label)).cloned()
    }

    pub fn property_by_id(&self, id: &str) -> Option<Property> {
        self.inner.properties.read().iter().find(|p| p.id == id).cloned()
    }

    /// The pinned origin vertex of this request, if ingested.
    pub fn origin_vertex(&self, origin_id: &str) -> Option<Vertex> {
        self.vertex_by_id(origin_id)
    }

    /// Edges where `v` is the source or the target.
    pub fn incident_edges(&self, v: &Vertex) -> Vec<Edge> {
        let Some(key) = v.key() else { return Vec::new() };
        self.inner.edges.read()
            .iter()
            .filter(|e| e.touches(key.as_str()))
            .cloned()
            .collect()
    }

    /// Resolve both endpoints of `e`.
    ///
    /// Returns `None` when either endpoint is not (yet) in the graph: a
    /// dangling edge. Tokens resolve by vertex id first, then by the label of
    /// an id-less vertex.
    pub fn endpoints(&self, e: &Edge) -> Option<(Vertex, Vertex)> {
        let vertices = self.inner.vertices.read();
        let src = resolve(&vertices, &e.source_id)?;
        let tgt = resolve(&vertices, &e.target_id)?;
        Some((src.clone(), tgt.clone()))
    }

    // ========================================================================
    // Scan
    // ========================================================================

    pub fn vertices(&self) -> Vec<Vertex> {
        self.inner.vertices.read().clone()
    }

    pub fn edges(&self) -> Vec<Edge> {
        self.inner.edges.read().clone()
    }

    pub fn properties(&self) -> Vec<Property> {
        self.inner.properties.read().clone()
    }

    /// Key, pin state and stored position of every vertex, in insertion order.
    pub fn entries(&self) -> Vec<VertexEntry> {
        self.inner.vertices.read()
            .iter()
            .filter_map(VertexEntry::from_vertex)
            .collect()
    }

    pub fn vertex_count(&self) -> usize {
        self.inner.vertices.read().len()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edges.read().len()
    }

    pub fn property_count(&self) -> usize {
        self.inner.properties.read().len()
    }

    /// True when any one of the three collections is empty.
    pub fn is_empty(&self) -> bool {
        self.vertex_count() == 0 || self.edge_count() == 0 || self.property_count() == 0
    }

    /// True when no two vertices share a position.
    pub fn coordinates_unique(&self) -> bool {
        let vertices = self.inner.vertices.read();
        let mut seen = HashSet::with_capacity(vertices.len());
        vertices.iter().all(|v| {
            let p = v.position;
            seen.insert((p.x.to_bits(), p.y.to_bits(), p.z.to_bits()))
        })
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Purge every vertex, property and edge that references `token` as id
    /// or label. Returns how many entities were removed.
    pub fn remove_by_value(&self, token: &str) -> usize {
        if token.is_empty() {
            return 0;
        }

        let mut removed = 0;
        {
            let mut vertices = self.inner.vertices.write();
            let before = vertices.len();
            vertices.retain(|v| !v.mentions(token));
            removed += before - vertices.len();
        }
        {
            let mut properties = self.inner.properties.write();
            let before = properties.len();
            properties.retain(|p| p.id != token);
            removed += before - properties.len();
        }
        {
            let mut edges = self.inner.edges.write();
            let before = edges.len();
            edges.retain(|e| !e.references(token));
            removed += before - edges.len();
        }

        if removed > 0 {
            self.bump_generation();
        }
        removed
    }

    /// Clear the lock flag on every vertex except the one whose id is
    /// `except_id` (the pinned origin).
    pub fn unlock_all(&self, except_id: Option<&str>) {
        let mut vertices = self.inner.vertices.write();
        for v in vertices.iter_mut() {
            match except_id {
                Some(id) if v.has_id(id) => {}
                _ => v.unlock(),
            }
        }
    }

    /// Pin the vertex with id `id`. Returns false if no such vertex exists.
    pub fn lock_vertex(&self, id: &str) -> bool {
        let mut vertices = self.inner.vertices.write();
        match vertices.iter_mut().find(|v| v.has_id(id)) {
            Some(v) => {
                v.lock();
                true
            }
            None => false,
        }
    }

    /// Overwrite vertex positions in place under a single write lock.
    ///
    /// `position_of` is asked for every vertex; `None` leaves that vertex
    /// untouched. Returns how many positions were written.
    pub fn update_positions<F>(&self, mut position_of: F) -> usize
    where
        F: FnMut(&VertexKey) -> Option<Point3D>,
    {
        let mut vertices = self.inner.vertices.write();
        let mut written = 0;
        for v in vertices.iter_mut() {
            let Some(key) = v.key() else { continue };
            if let Some(p) = position_of(&key) {
                v.position = p;
                written += 1;
            }
        }
        written
    }
}

impl std::fmt::Display for Graphset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{ verts: {}, edges: {}, props: {} }}",
            self.vertex_count(),
            self.edge_count(),
            self.property_count()
        )
    }
}

fn resolve<'a>(vertices: &'a [Vertex], token: &str) -> Option<&'a Vertex> {
    vertices.iter()
        .find(|v| v.has_id(token))
        .or_else(|| vertices.iter().find(|v| v.key() == Some(VertexKey::Label(token.to_string()))))
}

// ============================================================================
// Tests
// ============================================================================
