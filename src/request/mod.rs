//! # Client Requests
//!
//! Orchestrates one client request against an upstream entity service:
//! search for candidates, or build an initial Graphset around a chosen
//! target and lay it out.
//!
//! The service itself stays outside the crate. [`EntitySource`] is the seam;
//! anything that can answer a search and fetch one entity by id plugs in.
//!
//! ```text
//! ClientRequest::new(query)
//!   ├─ search_results(source)          → Graphset of id-bearing hits
//!   └─ build_from_target(source, id)   → origin pinned at (0,0,0) → SpatialLayout::run
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::graphset::Graphset;
use crate::layout::{LayoutConfig, LayoutReport, SpatialLayout};
use crate::model::*;
use crate::{Error, Result};

// ============================================================================
// Upstream seam
// ============================================================================

/// One document returned by the upstream service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EntityDocument {
    /// A full entity record.
    Item {
        id: String,
        label: Option<String>,
        description: Option<String>,
    },
    /// A relation type.
    Property {
        id: String,
        label: Option<String>,
        description: Option<String>,
    },
    /// A search result. Hits without an id become label-keyed placeholders.
    SearchHit {
        id: Option<String>,
        label: String,
        description: Option<String>,
    },
}

impl EntityDocument {
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Item { id, .. } | Self::Property { id, .. } => Some(id),
            Self::SearchHit { id, .. } => id.as_deref(),
        }
    }
}

/// Upstream entity service.
///
/// Implementations report an unreachable service as
/// [`Error::SourceUnavailable`] and an empty match as
/// [`Error::NoMatchingResults`]; both pass through `ClientRequest` unchanged.
#[async_trait]
pub trait EntitySource: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<EntityDocument>>;

    async fn fetch_entity(&self, id: &str) -> Result<EntityDocument>;
}

// ============================================================================
// ClientRequest
// ============================================================================

/// State of one client request: the Graphset being built and its layout settings.
#[derive(Debug, Clone)]
pub struct ClientRequest {
    pub graph: Graphset,
    pub metadata: LayoutMetadata,
    layout_config: LayoutConfig,
}

impl ClientRequest {
    pub fn new(query: impl Into<String>) -> Self {
        let metadata = LayoutMetadata { query: Some(query.into()), ..LayoutMetadata::default() };
        Self { graph: Graphset::new(), metadata, layout_config: LayoutConfig::default() }
    }

    /// Replace the layout settings. The request's query is kept when the
    /// new metadata carries none.
    pub fn with_metadata(mut self, metadata: LayoutMetadata) -> Self {
        let query = self.metadata.query.take();
        self.metadata = metadata;
        if self.metadata.query.is_none() {
            self.metadata.query = query;
        }
        self
    }

    pub fn with_layout_config(mut self, config: LayoutConfig) -> Self {
        self.layout_config = config;
        self
    }

    pub fn query(&self) -> Option<&str> {
        self.metadata.query.as_deref()
    }

    /// Add a fetched document to the Graphset. Returns whether anything new
    /// was inserted.
    pub fn ingest(&self, doc: EntityDocument) -> Result<bool> {
        match doc {
            EntityDocument::Item { id, label, description } => self.graph.add_vertex(Vertex {
                id: Some(id),
                label,
                description,
                ..Vertex::placeholder("")
            }),
            EntityDocument::Property { id, label, description } => {
                self.graph.add_property(Property { id, label, description })
            }
            EntityDocument::SearchHit { id, label, description } => self.graph.add_vertex(Vertex {
                id,
                description,
                ..Vertex::placeholder(label)
            }),
        }
    }

    /// Fill the Graphset with the upstream's matches for this request's query.
    pub async fn search_results(&self, source: &dyn EntitySource) -> Result<usize> {
        let query = self.query().unwrap_or_default().to_string();
        let hits = source.search(&query).await?;
        if hits.is_empty() {
            return Err(Error::NoMatchingResults { query });
        }

        let mut added = 0;
        for hit in hits {
            if self.ingest(hit)? {
                added += 1;
            }
        }
        info!(query = %query, results = added, "search results collected");
        Ok(added)
    }

    /// Start a new Graphset around `target_id`: fetch the target, pin it at
    /// the origin, then lay the Graphset out.
    ///
    /// Related entities are not fetched; the new Graphset holds only the origin.
    pub async fn build_from_target(
        &mut self,
        source: &dyn EntitySource,
        target_id: &str,
    ) -> Result<LayoutReport> {
        let doc = source.fetch_entity(target_id).await?;
        let EntityDocument::Item { id, label, description } = doc else {
            return Err(Error::InvalidEntity(format!(
                "target {target_id} is not an item document"
            )));
        };
        debug!(origin = %id, "origin entity fetched");

        let origin = Vertex { id: Some(id), label, description, ..Vertex::placeholder("") }
            .with_position(Point3D::origin())
            .locked();
        let graph = Graphset::new();
        graph.add_vertex(origin)?;

        self.graph = graph;
        self.metadata.origin_id = Some(target_id.to_string());

        self.layout()
    }

    /// Run the layout over the current Graphset and write positions back.
    /// `metadata.dimensions` is updated to the rescaled space. When
    /// `metadata.origin_id` is set, that vertex is pinned at (0,0,0) and every
    /// other vertex is unlocked.
    pub fn layout(&mut self) -> Result<LayoutReport> {
        if let Some(origin) = self.metadata.origin_id.as_deref() {
            self.graph.unlock_all(Some(origin));
        }
        let mut engine = SpatialLayout::with_config(
            self.graph.clone(),
            self.metadata.clone(),
            self.layout_config.clone(),
        );
        let report = engine.run()?;
        self.metadata.dimensions = report.dimensions;
        Ok(report)
    }

    /// Remove every entity and edge that mentions `token`.
    pub fn exclude(&self, token: &str) -> usize {
        self.graph.remove_by_value(token)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<EntityDocument>);

    #[async_trait]
    impl EntitySource for Fixed {
        async fn search(&self, _query: &str) -> Result<Vec<EntityDocument>> {
            Ok(self.0.clone())
        }

        async fn fetch_entity(&self, id: &str) -> Result<EntityDocument> {
            self.0
                .iter()
                .find(|d| d.id() == Some(id))
                .cloned()
                .ok_or_else(|| Error::NoMatchingResults { query: id.into() })
        }
    }

    struct Offline;

    #[async_trait]
    impl EntitySource for Offline {
        async fn search(&self, _query: &str) -> Result<Vec<EntityDocument>> {
            Err(Error::SourceUnavailable { message: "timeout".into(), operation: "search".into() })
        }

        async fn fetch_entity(&self, _id: &str) -> Result<EntityDocument> {
            Err(Error::SourceUnavailable { message: "timeout".into(), operation: "fetch".into() })
        }
    }

    fn item(id: &str, label: &str) -> EntityDocument {
        EntityDocument::Item { id: id.into(), label: Some(label.into()), description: None }
    }

    #[test]
    fn test_ingest_maps_each_kind() {
        let req = ClientRequest::new("douglas");
        assert!(req.ingest(item("Q42", "Douglas Adams")).unwrap());
        assert!(req
            .ingest(EntityDocument::Property {
                id: "P31".into(),
                label: Some("instance of".into()),
                description: None,
            })
            .unwrap());
        assert!(req
            .ingest(EntityDocument::SearchHit { id: None, label: "1952".into(), description: None })
            .unwrap());

        assert_eq!(req.graph.vertex_count(), 2);
        assert_eq!(req.graph.property_count(), 1);
        assert!(req.graph.vertex_by_label("1952").unwrap().id.is_none());
        assert_eq!(req.graph.vertex_by_id("Q42").unwrap().label.as_deref(), Some("Douglas Adams"));
    }

    #[test]
    fn test_with_metadata_keeps_query() {
        let req = ClientRequest::new("douglas").with_metadata(LayoutMetadata::new(200.0, 100.0));
        assert_eq!(req.query(), Some("douglas"));
        assert_eq!(req.metadata.dimensions, Dimensions::new(200.0, 100.0));
    }

    #[tokio::test]
    async fn test_search_results() {
        let source = Fixed(vec![item("Q42", "Douglas Adams"), item("Q42", "duplicate")]);
        let req = ClientRequest::new("douglas");
        assert_eq!(req.search_results(&source).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_search_without_hits() {
        let req = ClientRequest::new("zzz");
        let err = req.search_results(&Fixed(vec![])).await.unwrap_err();
        assert!(matches!(err, Error::NoMatchingResults { query } if query == "zzz"));
    }

    #[tokio::test]
    async fn test_offline_source_propagates() {
        let req = ClientRequest::new("douglas");
        let err = req.search_results(&Offline).await.unwrap_err();
        assert!(matches!(err, Error::SourceUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_build_from_target_pins_origin() {
        let source = Fixed(vec![item("Q42", "Douglas Adams")]);
        let mut req = ClientRequest::new("douglas")
            .with_metadata(LayoutMetadata::new(100.0, 100.0))
            .with_layout_config(LayoutConfig::default().with_seed(1));

        let report = req.build_from_target(&source, "Q42").await.unwrap();
        let origin = req.graph.vertex_by_id("Q42").unwrap();

        assert!(origin.locked);
        assert_eq!(origin.position, Point3D::origin());
        assert_eq!(req.metadata.origin_id.as_deref(), Some("Q42"));
        assert_eq!(req.metadata.dimensions, report.dimensions);
    }

    #[tokio::test]
    async fn test_build_from_property_target_rejected() {
        let source = Fixed(vec![EntityDocument::Property {
            id: "P31".into(),
            label: None,
            description: None,
        }]);
        let mut req = ClientRequest::new("instance").with_metadata(LayoutMetadata::new(100.0, 100.0));
        let err = req.build_from_target(&source, "P31").await.unwrap_err();
        assert!(matches!(err, Error::InvalidEntity(_)));
    }

    #[tokio::test]
    async fn test_failed_build_keeps_search_results() {
        let source = Fixed(vec![item("Q42", "Douglas Adams")]);
        let mut req = ClientRequest::new("douglas").with_metadata(LayoutMetadata::new(100.0, 100.0));
        req.search_results(&source).await.unwrap();

        let err = req.build_from_target(&source, "Q404").await.unwrap_err();
        assert!(matches!(err, Error::NoMatchingResults { .. }));
        assert!(req.graph.vertex_by_id("Q42").is_some());
        assert!(req.metadata.origin_id.is_none());
    }

    #[test]
    fn test_layout_pins_origin_from_metadata() {
        let mut req = ClientRequest::new("q")
            .with_metadata(LayoutMetadata::new(100.0, 100.0).with_origin("Q1"))
            .with_layout_config(LayoutConfig::default().with_seed(7));
        req.ingest(item("Q1", "one")).unwrap();
        req.ingest(item("Q2", "two")).unwrap();
        req.graph.lock_vertex("Q2");
        req.graph.add_edge(Edge::new("Q1", "Q2")).unwrap();

        req.layout().unwrap();

        let origin = req.graph.vertex_by_id("Q1").unwrap();
        assert!(origin.locked);
        assert_eq!(origin.position, Point3D::origin());
        assert!(!req.graph.vertex_by_id("Q2").unwrap().locked);
    }

    #[test]
    fn test_exclude() {
        let req = ClientRequest::new("q");
        req.ingest(item("Q1", "one")).unwrap();
        req.ingest(item("Q2", "two")).unwrap();
        req.graph.add_edge(Edge::new("Q1", "Q2")).unwrap();

        assert_eq!(req.exclude("Q2"), 2);
        assert_eq!(req.graph.vertex_count(), 1);
        assert_eq!(req.graph.edge_count(), 0);
    }
}
