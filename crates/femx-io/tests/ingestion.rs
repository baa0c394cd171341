use femx_io::{
    IngestOptions, IngestStatus, Ingestor, Severity, Snapshot, SourceFormat, ingest,
    load_snapshot, save_snapshot,
};
use std::path::{Path, PathBuf};

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("../../tests/fixtures");
    path.push(name);
    path
}

const FIXTURES: [&str; 7] = [
    "elmer/two_lines",
    "elmer/cube",
    "elmer/unknown_code",
    "su2/square.su2",
    "su2/two_zones.su2",
    "frame3dd/portal.3dd",
    "frame3dd/portal_results.out",
];

#[test]
fn test_ingestion_is_repeatable_fixture() {
    let ingestor = Ingestor::default();
    for name in FIXTURES {
        let first = ingestor.ingest(fixture_path(name));
        let second = ingestor.ingest(fixture_path(name));
        assert_eq!(first, second, "{name} differs between runs");
    }
}

#[test]
fn test_every_fixture_is_consistent_fixture() {
    for name in FIXTURES {
        let result = ingest(fixture_path(name), IngestOptions::default());
        assert_eq!(result.status, IngestStatus::Complete, "{name}");
        assert!(
            result.mesh.dangling_references().is_empty(),
            "{name} has dangling references"
        );
        for set in &result.results {
            assert!(set.is_dense_over(result.mesh.node_count()), "{name}: {}", set.name);
        }
    }
}

#[test]
fn test_format_detection_fixture() {
    let ingestor = Ingestor::default();
    assert_eq!(
        ingestor.format_for(&fixture_path("elmer/cube")).ok(),
        Some(SourceFormat::Elmer)
    );
    assert_eq!(
        ingestor.format_for(&fixture_path("su2/square.su2")).ok(),
        Some(SourceFormat::Su2)
    );
    assert_eq!(
        ingestor.format_for(&fixture_path("frame3dd/portal.3dd")).ok(),
        Some(SourceFormat::Frame3dd)
    );
    assert!(ingestor.format_for(Path::new("model.inp")).is_err());

    let result = ingestor.ingest("model.inp");
    assert_eq!(result.status, IngestStatus::StructuralFailure);
    assert_eq!(result.format, None);
    assert!(result.diagnostics.mentions(Severity::Error, "model.inp"));
}

#[test]
fn test_forced_format_fixture() {
    let options = IngestOptions::default().with_format(SourceFormat::Su2);
    let result = Ingestor::new(options).ingest(fixture_path("frame3dd/portal.3dd"));
    assert_eq!(result.format, Some(SourceFormat::Su2));
    assert_eq!(result.status, IngestStatus::StructuralFailure);
}

#[test]
fn test_snapshot_export_fixture() {
    let dir = tempfile::tempdir().expect("temp dir");
    let result = Ingestor::default().ingest(fixture_path("frame3dd/portal_results.out"));
    let path = dir.path().join("portal.json");

    let snapshot = Snapshot::new(result.clone()).generated_at("2026-10-17T08:00:00Z");
    save_snapshot(&path, &snapshot).expect("Failed to save snapshot");
    let loaded = load_snapshot(&path).expect("Failed to load snapshot");

    assert_eq!(loaded.generated_at.as_deref(), Some("2026-10-17T08:00:00Z"));
    assert_eq!(loaded.result, result);
    assert_eq!(loaded.result.increments(), 3);
}
