//! The relaxation engine behind [`SpatialLayout`].

use hashbrown::HashMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::graphset::{Graphset, VertexEntry};
use crate::model::*;
use crate::{Error, Result};
use super::{LayoutConfig, LayoutReport, LayoutState};

/// One layout run over one Graphset.
///
/// The engine never writes to the Graphset until [`commit`](Self::commit);
/// all intermediate positions live in the engine's own `location` map.
pub struct SpatialLayout {
    graph: Graphset,
    metadata: LayoutMetadata,
    config: LayoutConfig,
    state: LayoutState,

    iteration: u32,
    temperature: f64,
    force_const: f64,
    attraction_const: f64,
    repulsion_const: f64,

    /// Current position per vertex, seeded on first access.
    location: HashMap<VertexKey, Point3D>,
    /// Displacement accumulated during the current iteration.
    offset: HashMap<VertexKey, Point3D>,
    rng: StdRng,
}

impl SpatialLayout {
    pub fn new(graph: Graphset, metadata: LayoutMetadata) -> Self {
        Self::with_config(graph, metadata, LayoutConfig::default())
    }

    pub fn with_config(graph: Graphset, metadata: LayoutMetadata, config: LayoutConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            graph,
            metadata,
            config,
            state: LayoutState::Uninitialized,
            iteration: 0,
            temperature: 0.0,
            force_const: 0.0,
            attraction_const: 0.0,
            repulsion_const: 0.0,
            location: HashMap::new(),
            offset: HashMap::new(),
            rng,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn state(&self) -> LayoutState { self.state }
    pub fn iteration(&self) -> u32 { self.iteration }
    pub fn temperature(&self) -> f64 { self.temperature }
    pub fn force_const(&self) -> f64 { self.force_const }
    pub fn attraction_const(&self) -> f64 { self.attraction_const }
    pub fn repulsion_const(&self) -> f64 { self.repulsion_const }
    pub fn config(&self) -> &LayoutConfig { &self.config }

    /// Request metadata, with dimensions rescaled once initialized.
    pub fn metadata(&self) -> &LayoutMetadata {
        &self.metadata
    }

    /// Cached location of `key`, without seeding it.
    pub fn location(&self, key: &VertexKey) -> Option<Point3D> {
        self.location.get(key).copied()
    }

    /// Current location of `v`, seeding it if the engine has not seen it yet.
    pub fn apply(&mut self, v: &Vertex) -> Option<Point3D> {
        self.entry_of(v).map(|entry| self.location_of(&entry))
    }

    /// Per-axis half-extents of the layout box: `(width, height, max(width, height))`.
    pub fn bounds(&self) -> Point3D {
        let dims = self.metadata.dimensions;
        Point3D::new(dims.width, dims.height, dims.depth())
    }

    // ========================================================================
    // Driver
    // ========================================================================

    /// Initialize, step until done, then write final positions into the Graphset.
    ///
    /// Any failure aborts the whole run as a single [`Error::LayoutFault`];
    /// the Graphset is left untouched.
    pub fn run(&mut self) -> Result<LayoutReport> {
        self.run_to_completion().map_err(|e| {
            warn!(error = %e, iteration = self.iteration, "layout run aborted");
            match e {
                fault @ Error::LayoutFault { .. } => fault,
                other => Error::layout_fault("SpatialLayout::run", other.to_string()),
            }
        })
    }

    fn run_to_completion(&mut self) -> Result<LayoutReport> {
        self.initialize_layout()?;
        while !self.done() {
            self.step()?;
        }
        self.commit();

        let report = self.report();
        info!(
            iterations = report.iterations,
            temperature = report.temperature,
            width = report.dimensions.width,
            height = report.dimensions.height,
            vertices = report.vertices,
            "layout complete"
        );
        Ok(report)
    }

    /// True once the iteration cap is exceeded or the layout has cooled below
    /// `1 / max(width, height)`. Always false before initialization.
    pub fn done(&self) -> bool {
        match self.state {
            LayoutState::Uninitialized => false,
            LayoutState::Done => true,
            LayoutState::Initialized | LayoutState::Stepping => {
                self.iteration > self.config.max_iterations
                    || self.temperature < 1.0 / self.metadata.dimensions.max_dim()
            }
        }
    }

    pub fn report(&self) -> LayoutReport {
        LayoutReport {
            iterations: self.iteration,
            temperature: self.temperature,
            dimensions: self.metadata.dimensions,
            repulsion_const: self.repulsion_const,
            attraction_const: self.attraction_const,
            vertices: self.graph.vertex_count(),
        }
    }

    // ========================================================================
    // Initialization
    // ========================================================================

    /// Compute simulation constants, rescale the space to the target density,
    /// and seed a position for every vertex currently in the graph.
    pub fn initialize_layout(&mut self) -> Result<()> {
        self.validate_metadata()?;
        self.initialize_constants();
        self.scale_dimensions_to_graph();

        self.location.clear();
        self.offset.clear();
        for entry in self.entries() {
            self.location_of(&entry);
        }

        self.state = LayoutState::Initialized;
        info!(
            vertices = self.location.len(),
            edges = self.graph.edge_count(),
            width = self.metadata.dimensions.width,
            height = self.metadata.dimensions.height,
            temperature = self.temperature,
            "layout initialized"
        );
        Ok(())
    }

    fn validate_metadata(&self) -> Result<()> {
        let meta = &self.metadata;
        let dims = meta.dimensions;
        let positive = |x: f64| x.is_finite() && x > 0.0;

        if !positive(dims.width) || !positive(dims.height) {
            return Err(Error::layout_fault(
                "SpatialLayout::initialize_layout",
                format!("dimensions must be positive, got {}x{}", dims.width, dims.height),
            ));
        }
        if !positive(meta.attraction_multiplier) || !positive(meta.repulsion_multiplier) {
            return Err(Error::layout_fault(
                "SpatialLayout::initialize_layout",
                format!(
                    "force multipliers must be positive (attraction {}, repulsion {})",
                    meta.attraction_multiplier, meta.repulsion_multiplier
                ),
            ));
        }
        if !positive(meta.target_layout_density) {
            return Err(Error::layout_fault(
                "SpatialLayout::initialize_layout",
                format!("target layout density must be positive, got {}", meta.target_layout_density),
            ));
        }
        Ok(())
    }

    fn vertex_count_floor(&self) -> f64 {
        self.graph.vertex_count().max(1) as f64
    }

    fn initialize_constants(&mut self) {
        let dims = self.metadata.dimensions;
        self.iteration = 0;
        self.temperature = dims.width / self.config.cooling_divisor;
        self.force_const = (dims.width * dims.height / self.vertex_count_floor()).sqrt();
        self.attraction_const = self.force_const * self.metadata.attraction_multiplier;
        self.repulsion_const = self.force_const * self.metadata.repulsion_multiplier;
    }

    /// Scale width and height so the node density approaches the target.
    /// Depth follows as `max(width, height)`.
    fn scale_dimensions_to_graph(&mut self) {
        let dims = self.metadata.dimensions;
        let footprint = self.config.node_footprint.powi(3);
        let density = self.vertex_count_floor() * footprint / dims.volume();
        let scale = (density / self.metadata.target_layout_density).cbrt();

        self.metadata.dimensions = Dimensions::new(
            (dims.width * scale).ceil(),
            (dims.height * scale).ceil(),
        );
        debug!(
            scale,
            width = self.metadata.dimensions.width,
            height = self.metadata.dimensions.height,
            "rescaled layout space"
        );
    }

    /// True when `key` names the request's origin vertex.
    fn is_origin(&self, key: &VertexKey) -> bool {
        match (key, self.metadata.origin_id.as_deref()) {
            (VertexKey::Id(id), Some(origin)) => id == origin,
            _ => false,
        }
    }

    /// The origin is always pinned at (0,0,0), whatever its stored state.
    fn pinned(&self, mut entry: VertexEntry) -> VertexEntry {
        if self.is_origin(&entry.key) {
            entry.locked = true;
            entry.position = Point3D::origin();
        }
        entry
    }

    fn entries(&self) -> Vec<VertexEntry> {
        self.graph.entries().into_iter().map(|e| self.pinned(e)).collect()
    }

    fn entry_of(&self, v: &Vertex) -> Option<VertexEntry> {
        VertexEntry::from_vertex(v).map(|e| self.pinned(e))
    }

    /// Cached location of `entry`, seeding it on first access: a pinned
    /// vertex keeps a copy of its stored position, anything else gets a
    /// uniform random point inside the layout box.
    fn location_of(&mut self, entry: &VertexEntry) -> Point3D {
        let bounds = self.bounds();
        let rng = &mut self.rng;
        *self.location.entry(entry.key.clone()).or_insert_with(|| {
            if entry.locked {
                entry.position
            } else {
                random_point(rng, &bounds)
            }
        })
    }

    // ========================================================================
    // Step
    // ========================================================================

    /// Advance the relaxation by one iteration.
    pub fn step(&mut self) -> Result<()> {
        match self.state {
            LayoutState::Uninitialized => {
                return Err(Error::layout_fault(
                    "SpatialLayout::step",
                    "step() called before initialize_layout()",
                ));
            }
            LayoutState::Done => return Ok(()),
            LayoutState::Initialized | LayoutState::Stepping => {}
        }

        self.iteration += 1;
        self.state = LayoutState::Stepping;

        let offsets = self.optimistic("repulsion", Self::scan_repulsion)?;
        self.offset = offsets.into_iter().collect();

        let deltas = self.optimistic("attraction", Self::scan_attraction)?;
        for (key, delta) in deltas {
            *self.offset.entry(key).or_default() += delta;
        }

        let positions = self.optimistic("position", Self::scan_positions)?;
        self.location.extend(positions);

        self.cool();
        if self.config.adjust_interval > 0 && self.iteration % self.config.adjust_interval == 0 {
            self.adjust_force_constants()?;
        }

        if self.done() {
            self.state = LayoutState::Done;
        }
        Ok(())
    }

    /// Run `scan` until it completes without the Graphset's structure
    /// changing underneath it. Scans only produce scratch results; the caller
    /// commits them.
    fn optimistic<T>(
        &mut self,
        pass: &'static str,
        mut scan: impl FnMut(&mut Self) -> Result<T>,
    ) -> Result<T> {
        loop {
            let generation = self.graph.generation();
            let scratch = scan(self)?;
            if self.graph.generation() == generation {
                return Ok(scratch);
            }
            debug!(pass, iteration = self.iteration, "graph changed mid-scan, restarting pass");
        }
    }

    /// Repulsion: each unlocked vertex is pushed away from every other vertex
    /// with magnitude `repulsion² / distance`.
    fn scan_repulsion(&mut self) -> Result<Vec<(VertexKey, Point3D)>> {
        let entries = self.entries();
        let k2 = self.repulsion_const * self.repulsion_const;
        let mut offsets = Vec::with_capacity(entries.len());

        for v1 in entries.iter().filter(|e| !e.locked) {
            let p1 = self.location_of(v1);
            let mut acc = Point3D::origin();

            for v2 in &entries {
                if v2.key == v1.key {
                    continue;
                }
                let p2 = self.location_of(v2);
                let dist = p1.distance(&p2).max(self.config.epsilon);
                let force = k2 / dist;
                if force.is_nan() {
                    return Err(Error::layout_fault(
                        "SpatialLayout::scan_repulsion",
                        format!("NaN repulsion force between {} and {}", v1.key, v2.key),
                    ));
                }
                acc += (p1 - p2) * (force / dist);
            }
            offsets.push((v1.key.clone(), acc));
        }
        Ok(offsets)
    }

    /// Attraction: the endpoints of every resolvable edge are pulled together
    /// with magnitude `distance² / attraction`. Dangling edges contribute
    /// nothing.
    fn scan_attraction(&mut self) -> Result<HashMap<VertexKey, Point3D>> {
        let edges = self.graph.edges();
        let mut deltas: HashMap<VertexKey, Point3D> = HashMap::new();

        for edge in &edges {
            let Some((src, tgt)) = self.graph.endpoints(edge) else { continue };
            let (Some(s), Some(t)) = (self.entry_of(&src), self.entry_of(&tgt)) else {
                continue;
            };
            if s.locked && t.locked {
                continue;
            }

            let p1 = self.location_of(&s);
            let p2 = self.location_of(&t);
            let dist = p1.distance(&p2).max(self.config.epsilon);
            let force = dist * dist / self.attraction_const;
            if force.is_nan() {
                return Err(Error::layout_fault(
                    "SpatialLayout::scan_attraction",
                    format!("NaN attraction force on edge {} -> {}", edge.source_id, edge.target_id),
                ));
            }
            let disp = (p1 - p2) * (force / dist);

            let src_scale = if t.locked { self.config.pinned_neighbor_scale } else { 1.0 };
            let tgt_scale = if s.locked { self.config.pinned_neighbor_scale } else { 1.0 };
            *deltas.entry(s.key).or_default() += disp * -src_scale;
            *deltas.entry(t.key).or_default() += disp * tgt_scale;
        }
        Ok(deltas)
    }

    /// Position update: move each unlocked vertex along its offset, by at most
    /// the temperature overall and `max_step` per axis, then clamp into the box.
    fn scan_positions(&mut self) -> Result<Vec<(VertexKey, Point3D)>> {
        let entries = self.entries();
        let bounds = self.bounds();
        let mut positions = Vec::with_capacity(entries.len());

        for v in entries.iter().filter(|e| !e.locked) {
            let offset = self.offset.get(&v.key).copied().unwrap_or_default();
            let location = self.location_of(v);

            let magnitude = offset.magnitude().max(self.config.epsilon);
            let disp = offset * (magnitude.min(self.temperature) / magnitude);
            if disp.has_nan() {
                return Err(Error::layout_fault(
                    "SpatialLayout::scan_positions",
                    format!("NaN displacement for {}", v.key),
                ));
            }

            let next = (location + disp.clamp_axes(self.config.max_step)).clamp_to_bounds(&bounds);
            positions.push((v.key.clone(), next));
        }
        Ok(positions)
    }

    /// Linear annealing.
    fn cool(&mut self) {
        self.temperature *= 1.0 - self.iteration as f64 / self.config.max_iterations as f64;
    }

    // ========================================================================
    // Force balancing
    // ========================================================================

    /// Nudge the constants by 10% toward whichever mean force is weaker.
    /// Skipped when either mean is undefined (no vertex pairs, no resolvable edges).
    fn adjust_force_constants(&mut self) -> Result<()> {
        let (repulsion, attraction) = self.optimistic("adjust", |layout| {
            Ok((layout.average_repulsion_force(), layout.average_attraction_force()))
        })?;

        let (Some(repulsion), Some(attraction)) = (repulsion, attraction) else {
            return Ok(());
        };

        if repulsion > attraction {
            self.repulsion_const *= 0.9;
            self.attraction_const *= 1.1;
        } else if attraction > repulsion {
            self.repulsion_const *= 1.1;
            self.attraction_const *= 0.9;
        }
        debug!(
            iteration = self.iteration,
            mean_repulsion = repulsion,
            mean_attraction = attraction,
            repulsion_const = self.repulsion_const,
            attraction_const = self.attraction_const,
            "rebalanced force constants"
        );
        Ok(())
    }

    fn average_repulsion_force(&mut self) -> Option<f64> {
        let entries = self.entries();
        let k2 = self.repulsion_const * self.repulsion_const;
        let mut total = 0.0;
        let mut count = 0usize;

        for v1 in &entries {
            let p1 = self.location_of(v1);
            for v2 in &entries {
                if v1.key == v2.key {
                    continue;
                }
                let p2 = self.location_of(v2);
                total += k2 / p1.distance(&p2).max(self.config.epsilon);
                count += 1;
            }
        }
        (count > 0).then(|| total / count as f64)
    }

    fn average_attraction_force(&mut self) -> Option<f64> {
        let mut total = 0.0;
        let mut count = 0usize;

        for edge in self.graph.edges() {
            let Some((src, tgt)) = self.graph.endpoints(&edge) else { continue };
            let (Some(s), Some(t)) = (self.entry_of(&src), self.entry_of(&tgt)) else {
                continue;
            };
            let p1 = self.location_of(&s);
            let p2 = self.location_of(&t);
            let dist = p1.distance(&p2);
            total += dist * dist / self.attraction_const;
            count += 1;
        }
        (count > 0).then(|| total / count as f64)
    }

    // ========================================================================
    // Commit
    // ========================================================================

    /// Write every vertex's cached location back onto the vertex itself and
    /// lock the origin. Vertices that arrived after the last step are seeded first.
    pub fn commit(&mut self) -> usize {
        for entry in self.entries() {
            self.location_of(&entry);
        }
        let location = &self.location;
        let written = self.graph.update_positions(|key| location.get(key).copied());
        if let Some(origin) = self.metadata.origin_id.as_deref() {
            self.graph.lock_vertex(origin);
        }
        written
    }
}

fn random_point<R: Rng>(rng: &mut R, bounds: &Point3D) -> Point3D {
    Point3D::new(
        rng.gen_range(-bounds.x..=bounds.x),
        rng.gen_range(-bounds.y..=bounds.y),
        rng.gen_range(-bounds.z..=bounds.z),
    )
}

// ============================================================================
// Tests
// ============================================================================
