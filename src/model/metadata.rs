//! Per-request layout configuration.

use serde::{Deserialize, Serialize};

/// Width and height of the layout space. Depth is always `max(width, height)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn depth(&self) -> f64 {
        self.width.max(self.height)
    }

    /// Alias for `depth()`: the largest extent of the space.
    pub fn max_dim(&self) -> f64 {
        self.depth()
    }

    pub fn volume(&self) -> f64 {
        self.width * self.height * self.depth()
    }
}

/// Layout settings supplied with a request.
///
/// Deserializes from camelCase JSON; every field is optional on the wire and
/// falls back to its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutMetadata {
    pub dimensions: Dimensions,
    pub attraction_multiplier: f64,
    pub repulsion_multiplier: f64,
    /// Target number of nodes per unit volume after rescaling.
    pub target_layout_density: f64,
    #[serde(rename = "originID")]
    pub origin_id: Option<String>,
    pub query: Option<String>,
}

impl Default for LayoutMetadata {
    fn default() -> Self {
        Self {
            dimensions: Dimensions::default(),
            attraction_multiplier: 1.25,
            repulsion_multiplier: 0.4,
            target_layout_density: 1e-4,
            origin_id: None,
            query: None,
        }
    }
}

impl LayoutMetadata {
    pub fn new(width: f64, height: f64) -> Self {
        Self { dimensions: Dimensions::new(width, height), ..Self::default() }
    }

    pub fn with_origin(mut self, origin_id: impl Into<String>) -> Self {
        self.origin_id = Some(origin_id.into());
        self
    }

    pub fn with_multipliers(mut self, attraction: f64, repulsion: f64) -> Self {
        self.attraction_multiplier = attraction;
        self.repulsion_multiplier = repulsion;
        self
    }

    pub fn with_target_density(mut self, density: f64) -> Self {
        self.target_layout_density = density;
        self
    }
}
