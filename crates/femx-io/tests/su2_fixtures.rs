use femx_io::{IngestStatus, Ingestor, Severity, Su2MeshReader};
use femx_model::ElementKind;
use std::fs;
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("../../tests/fixtures/su2");
    path.push(name);
    path
}

#[test]
fn test_square_fixture() {
    let mesh = Su2MeshReader::new()
        .read(&fixture_path("square.su2"))
        .expect("Failed to read square mesh");

    assert_eq!(mesh.zones.len(), 1);
    assert_eq!(mesh.zones[0].dimension, 2);
    assert_eq!(mesh.zones[0].markers, vec!["lower", "upper"]);

    let canonical = &mesh.parsed.mesh;
    assert_eq!(canonical.node_count(), 9);
    assert_eq!(canonical.node(9), Some(&[1.0, 1.0, 0.0]));
    let quads = canonical.elements(ElementKind::Quad4);
    assert_eq!(quads.len(), 4);
    assert_eq!(quads[&1], vec![1, 2, 5, 4]);
    assert_eq!(quads[&4], vec![5, 6, 9, 8]);
    // Marker segments describe boundaries and are not mesh elements.
    assert!(canonical.seg2().is_empty());
    assert!(mesh.parsed.diagnostics.is_empty());
}

#[test]
fn test_two_zones_fixture() {
    let mesh = Su2MeshReader::new()
        .read(&fixture_path("two_zones.su2"))
        .expect("Failed to read two-zone mesh");

    assert_eq!(mesh.zones.len(), 2);
    assert_eq!(mesh.zones[1].index, 2);
    assert_eq!(mesh.zones[0].markers, vec!["base"]);
    assert!(mesh.zones[1].markers.is_empty());

    let canonical = &mesh.parsed.mesh;
    assert_eq!(canonical.node_count(), 15);
    assert_eq!(canonical.node(5), Some(&[2.0, 0.0, 0.0]));
    assert_eq!(canonical.node(15), Some(&[3.0, 1.0, 2.0]));
    assert_eq!(canonical.elements(ElementKind::Tetra4)[&1], vec![1, 2, 3, 4]);
    assert_eq!(
        canonical.elements(ElementKind::Hexa8)[&2],
        vec![5, 6, 7, 8, 9, 10, 11, 12]
    );
    assert_eq!(
        canonical.elements(ElementKind::Penta6)[&3],
        vec![9, 10, 11, 13, 14, 15]
    );
    assert!(canonical.dangling_references().is_empty());
}

#[test]
fn test_unknown_code_fixture() {
    let result = Ingestor::default().ingest(fixture_path("unknown_code.su2"));

    assert_eq!(result.status, IngestStatus::Complete);
    assert_eq!(result.mesh.elements(ElementKind::Tria3)[&1], vec![1, 2, 3]);
    assert_eq!(result.mesh.seg2()[&3], vec![3, 4]);
    assert_eq!(result.mesh.element_count(), 2);
    assert_eq!(result.diagnostics.warning_count(), 1);
    assert!(result.diagnostics.mentions(Severity::Warning, "999"));
}

#[test]
fn test_truncated_points_fixture() {
    let dir = tempfile::tempdir().expect("temp dir");
    let source = fs::read_to_string(fixture_path("square.su2")).expect("read square mesh");
    let truncated = source
        .split_once("0.5 1.0 7")
        .map(|(head, _)| head)
        .expect("split point table");
    let path = dir.path().join("cut.su2");
    fs::write(&path, truncated).expect("write truncated mesh");

    let result = Ingestor::default().ingest(&path);
    assert_eq!(result.status, IngestStatus::StructuralFailure);
    assert!(result.mesh.is_absent());
    assert!(result.results.is_empty());
    assert!(result.diagnostics.mentions(Severity::Error, "point records"));
}
