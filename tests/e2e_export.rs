//! End-to-end tests for JSON export of a laid-out Graphset.

use graphset3d::{
    export_json, to_json_value, Edge, Graphset, GraphsetSnapshot, LayoutConfig, LayoutMetadata,
    Point3D, Property, SpatialLayout, Vertex,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn laid_out() -> Graphset {
    let graph = Graphset::new();
    graph.add_vertex(Vertex::new("Q42", "Douglas Adams").locked()).unwrap();
    graph.add_vertex(Vertex::new("Q5", "human").with_description("species")).unwrap();
    graph.add_property(Property::new("P31").with_label("instance of")).unwrap();
    graph.add_edge(Edge::new("Q42", "Q5").with_property("P31").with_group("P31", 4, 1)).unwrap();

    SpatialLayout::with_config(
        graph.clone(),
        LayoutMetadata::new(100.0, 100.0).with_origin("Q42"),
        LayoutConfig::default().with_seed(99),
    )
    .run()
    .unwrap();
    graph
}

#[test]
fn test_exported_document_matches_graph() {
    let graph = laid_out();
    let mut out = Vec::new();
    export_json(&graph, &mut out).unwrap();

    let snapshot: GraphsetSnapshot = serde_json::from_slice(&out).unwrap();
    let vertices = graph.vertices();
    assert_eq!(snapshot.vertices.len(), vertices.len());
    for (parsed, original) in snapshot.vertices.iter().zip(&vertices) {
        assert_eq!(parsed.id, original.id);
        assert_eq!(parsed.locked, original.locked);
        assert!(parsed.position.distance(&original.position) < 1e-9);
    }
    assert_eq!(snapshot.edges, graph.edges());
    assert_eq!(snapshot.properties, graph.properties());
}

#[test]
fn test_wire_field_names() {
    let graph = laid_out();
    let value = to_json_value(&graph).unwrap();

    assert_eq!(
        value["edges"][0],
        json!({
            "sourceID": "Q42",
            "targetID": "Q5",
            "propertyID": "P31",
            "groupID": "P31",
            "groupSize": 4,
            "groupPosition": 1,
            "label": null,
        })
    );
    assert_eq!(value["vertices"][0]["fetchedEdges"], json!(false));
    assert_eq!(value["vertices"][1]["description"], json!("species"));
}

#[test]
fn test_positions_survive_export() {
    let graph = laid_out();
    let rebuilt = GraphsetSnapshot::of(&graph).into_graphset().unwrap();

    assert_eq!(rebuilt.vertex_by_id("Q42").unwrap().position, Point3D::origin());
    assert_eq!(
        rebuilt.vertex_by_id("Q5").unwrap().position,
        graph.vertex_by_id("Q5").unwrap().position
    );
}
