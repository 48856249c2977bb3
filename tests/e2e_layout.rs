//! End-to-end tests for the 3D layout engine.
//!
//! Each test builds a Graphset, drives a `SpatialLayout` over it and checks
//! the positions written back: bounds, pinned immobility, finiteness,
//! termination and determinism.

use graphset3d::{
    Edge, Error, Graphset, LayoutConfig, LayoutMetadata, LayoutState, Point3D, SpatialLayout,
    Vertex, VertexKey,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

// ============================================================================
// Helpers
// ============================================================================

/// A pinned at the origin, B and C free; edges A-B and B-C.
fn abc() -> Graphset {
    let graph = Graphset::new();
    graph.add_vertex(Vertex::new("A", "alpha").with_position(Point3D::origin()).locked()).unwrap();
    graph.add_vertex(Vertex::new("B", "beta")).unwrap();
    graph.add_vertex(Vertex::new("C", "gamma")).unwrap();
    graph.add_edge(Edge::new("A", "B")).unwrap();
    graph.add_edge(Edge::new("B", "C")).unwrap();
    graph
}

fn engine(graph: &Graphset, seed: u64) -> SpatialLayout {
    SpatialLayout::with_config(
        graph.clone(),
        LayoutMetadata::new(100.0, 100.0).with_origin("A"),
        LayoutConfig::default().with_seed(seed),
    )
}

fn id(s: &str) -> VertexKey {
    VertexKey::Id(s.into())
}

fn within(p: &Point3D, bounds: &Point3D) -> bool {
    p.x.abs() <= bounds.x && p.y.abs() <= bounds.y && p.z.abs() <= bounds.z
}

// ============================================================================
// 1. One step over the pinned-origin triangle
// ============================================================================

#[test]
fn test_single_step_scenario() {
    let graph = abc();
    let mut layout = engine(&graph, 42);
    layout.initialize_layout().unwrap();

    let b_seed = layout.location(&id("B")).unwrap();
    let c_seed = layout.location(&id("C")).unwrap();
    assert!(layout.temperature() > 0.0);

    layout.step().unwrap();

    assert_eq!(layout.location(&id("A")).unwrap(), Point3D::origin());
    assert_ne!(layout.location(&id("B")).unwrap(), b_seed);
    assert_ne!(layout.location(&id("C")).unwrap(), c_seed);
}

// ============================================================================
// 2. Full run invariants
// ============================================================================

#[test]
fn test_run_respects_bounds_and_pins() {
    let graph = abc();
    let mut layout = engine(&graph, 3);
    let report = layout.run().unwrap();

    let bounds = layout.bounds();
    for v in graph.vertices() {
        assert!(v.position.is_finite(), "{:?}", v);
        assert!(within(&v.position, &bounds), "{:?} outside {:?}", v.position, bounds);
    }
    assert_eq!(graph.vertex_by_id("A").unwrap().position, Point3D::origin());
    assert_eq!(report.vertices, 3);
    assert_eq!(layout.state(), LayoutState::Done);
}

#[test]
fn test_done_within_iteration_cap() {
    let graph = abc();
    let mut layout = SpatialLayout::with_config(
        graph,
        LayoutMetadata::new(100.0, 100.0),
        LayoutConfig::default().with_seed(9).with_max_iterations(40),
    );
    layout.initialize_layout().unwrap();

    let mut calls = 0;
    while !layout.done() {
        layout.step().unwrap();
        calls += 1;
    }
    assert!(calls <= 41);

    // Stepping a finished engine changes nothing.
    let iteration = layout.iteration();
    layout.step().unwrap();
    assert_eq!(layout.iteration(), iteration);
}

#[test]
fn test_seeded_runs_are_deterministic() {
    let first = abc();
    let second = abc();
    engine(&first, 1234).run().unwrap();
    engine(&second, 1234).run().unwrap();

    assert_eq!(first.vertices(), second.vertices());
}

#[test]
fn test_different_seeds_diverge() {
    let first = abc();
    let second = abc();
    engine(&first, 1).run().unwrap();
    engine(&second, 2).run().unwrap();

    assert_ne!(
        first.vertex_by_id("B").unwrap().position,
        second.vertex_by_id("B").unwrap().position
    );
}

#[test]
fn test_origin_named_in_metadata_is_pinned() {
    let graph = Graphset::new();
    graph.add_vertex(Vertex::new("A", "alpha")).unwrap();
    graph.add_vertex(Vertex::new("B", "beta")).unwrap();
    graph.add_edge(Edge::new("A", "B")).unwrap();

    engine(&graph, 7).run().unwrap();

    let origin = graph.vertex_by_id("A").unwrap();
    assert!(origin.locked);
    assert_eq!(origin.position, Point3D::origin());
}

// ============================================================================
// 3. Dangling edges and placeholders
// ============================================================================

#[test]
fn test_dangling_edge_is_harmless() {
    let graph = abc();
    graph.add_edge(Edge::new("B", "Q404")).unwrap();

    let mut layout = engine(&graph, 5);
    layout.run().unwrap();
    assert!(graph.vertices().iter().all(|v| v.position.is_finite()));
}

#[test]
fn test_label_keyed_placeholder_is_laid_out() {
    let graph = abc();
    graph.add_vertex(Vertex::placeholder("1952")).unwrap();
    graph.add_edge(Edge::new("B", "1952").with_label("date of birth")).unwrap();

    let mut layout = engine(&graph, 5);
    layout.run().unwrap();

    let placeholder = graph.vertex_by_label("1952").unwrap();
    assert_eq!(layout.location(&VertexKey::Label("1952".into())), Some(placeholder.position));
}

// ============================================================================
// 4. Faults
// ============================================================================

#[test]
fn test_fault_leaves_positions_untouched() {
    let graph = abc();
    let before = graph.vertices();

    let mut layout = SpatialLayout::new(graph.clone(), LayoutMetadata::new(f64::NAN, 100.0));
    let err = layout.run().unwrap_err();

    assert!(matches!(err, Error::LayoutFault { .. }));
    assert_eq!(graph.vertices(), before);
}

// ============================================================================
// 5. Concurrent ingestion
// ============================================================================

#[test]
fn test_run_tolerates_concurrent_ingestion() {
    let graph = abc();

    std::thread::scope(|s| {
        let writer = graph.clone();
        s.spawn(move || {
            for i in 0..200 {
                writer.add_vertex(Vertex::new(format!("N{i}"), format!("node {i}"))).unwrap();
                writer.add_edge(Edge::new("B", format!("N{i}"))).unwrap();
            }
        });

        let mut layout = engine(&graph, 11);
        layout.run().unwrap();
    });

    assert_eq!(graph.vertex_count(), 203);
    assert_eq!(graph.vertex_by_id("A").unwrap().position, Point3D::origin());
    assert!(graph.vertices().iter().all(|v| v.position.is_finite()));
}

// ============================================================================
// 6. Properties over random graphs
// ============================================================================

fn random_graph(n: usize, edges: &[(usize, usize)]) -> Graphset {
    let graph = Graphset::new();
    graph.add_vertex(Vertex::new("V0", "root").locked()).unwrap();
    for i in 1..n {
        graph.add_vertex(Vertex::new(format!("V{i}"), format!("v{i}"))).unwrap();
    }
    for &(a, b) in edges {
        if a % n != b % n {
            graph.add_edge(Edge::new(format!("V{}", a % n), format!("V{}", b % n))).unwrap();
        }
    }
    graph
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_steps_stay_bounded_and_finite(
        n in 1usize..10,
        edges in prop::collection::vec((0usize..10, 0usize..10), 0..20),
        width in 10.0f64..500.0,
        height in 10.0f64..500.0,
        seed in any::<u64>(),
    ) {
        let graph = random_graph(n, &edges);
        let mut layout = SpatialLayout::with_config(
            graph.clone(),
            LayoutMetadata::new(width, height),
            LayoutConfig::default().with_seed(seed).with_max_iterations(60).with_adjust_interval(20),
        );
        layout.initialize_layout().unwrap();
        let bounds = layout.bounds();

        while !layout.done() {
            layout.step().unwrap();
            for v in graph.vertices() {
                let key = v.key().unwrap();
                let p = layout.location(&key).unwrap();
                prop_assert!(p.is_finite());
                prop_assert!(within(&p, &bounds));
                if v.locked {
                    prop_assert_eq!(p, v.position);
                }
            }
        }
    }
}
