//! Format detection and the single ingestion entry point.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use femx_model::{CanonicalMesh, ResultSet};
use serde::{Deserialize, Serialize};

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::elmer::ElmerMeshReader;
use crate::error::{IngestError, Result};
use crate::frame3dd::{Frame3ddReader, FrameMode};
use crate::mesh_builder::ParsedSource;
use crate::options::IngestOptions;
use crate::su2::Su2MeshReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Elmer,
    Frame3dd,
    Su2,
}

impl SourceFormat {
    pub const ALL: [SourceFormat; 3] = [
        SourceFormat::Elmer,
        SourceFormat::Frame3dd,
        SourceFormat::Su2,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SourceFormat::Elmer => "Elmer",
            SourceFormat::Frame3dd => "Frame3DD",
            SourceFormat::Su2 => "SU2",
        }
    }

    /// Guess the format from a path: a directory is an Elmer mesh, otherwise the
    /// extension decides.
    pub fn detect(path: &Path) -> Option<Self> {
        if path.is_dir() {
            return Some(SourceFormat::Elmer);
        }
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "su2" => Some(SourceFormat::Su2),
            "3dd" | "out" => Some(SourceFormat::Frame3dd),
            "header" | "nodes" | "elements" | "boundary" => Some(SourceFormat::Elmer),
            _ => None,
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SourceFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        SourceFormat::ALL
            .into_iter()
            .find(|format| format.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown format `{s}` (expected elmer, frame3dd or su2)"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestStatus {
    /// Mesh (and results, if any) read
    Complete,
    /// Source parsed but declared no nodes; results are dropped
    EmptyMesh,
    /// Source could not be parsed; mesh and results are empty
    StructuralFailure,
}

/// Everything one ingestion call produced. Owned by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionResult {
    pub source: PathBuf,
    pub format: Option<SourceFormat>,
    pub status: IngestStatus,
    pub mesh: CanonicalMesh,
    pub results: Vec<ResultSet>,
    pub inout_nodes: Vec<Vec<String>>,
    pub diagnostics: Diagnostics,
}

impl IngestionResult {
    fn failed(source: &Path, format: Option<SourceFormat>, err: &IngestError) -> Self {
        let mut diagnostic = Diagnostic::error("structure", err.detail()).in_file(err.path());
        if let Some(line) = err.line() {
            diagnostic = diagnostic.at_line(line);
        }
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(diagnostic);
        Self {
            source: source.to_path_buf(),
            format,
            status: IngestStatus::StructuralFailure,
            mesh: CanonicalMesh::new(),
            results: Vec::new(),
            inout_nodes: Vec::new(),
            diagnostics,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == IngestStatus::Complete
    }

    /// Number of result sets (load cases, eigenmodes, time steps).
    pub fn increments(&self) -> usize {
        self.results.len()
    }
}

/// Closed set of readers behind [`Ingestor`].
enum Reader {
    Elmer(ElmerMeshReader),
    Frame3dd(Frame3ddReader),
    Su2(Su2MeshReader),
}

impl Reader {
    fn for_format(format: SourceFormat, path: &Path, options: &IngestOptions) -> Self {
        match format {
            SourceFormat::Elmer => Reader::Elmer(ElmerMeshReader::new(options.elmer_mode)),
            SourceFormat::Frame3dd => {
                let mode = options
                    .frame_mode
                    .unwrap_or_else(|| FrameMode::for_path(path));
                Reader::Frame3dd(
                    Frame3ddReader::new(mode).with_companion_suffix(&options.companion_suffix),
                )
            }
            SourceFormat::Su2 => Reader::Su2(Su2MeshReader::new()),
        }
    }

    fn read(&self, path: &Path) -> Result<ParsedSource> {
        match self {
            Reader::Elmer(reader) => reader.read(path).map(|mesh| mesh.parsed),
            Reader::Frame3dd(reader) => reader.read(path).map(|model| model.parsed),
            Reader::Su2(reader) => reader.read(path).map(|mesh| mesh.parsed),
        }
    }
}

/// Reads a mesh source of any supported format into an [`IngestionResult`].
///
/// Each call owns all of its state; ingesting the same path twice gives equal
/// results.
#[derive(Debug, Clone, Default)]
pub struct Ingestor {
    options: IngestOptions,
}

impl Ingestor {
    pub fn new(options: IngestOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &IngestOptions {
        &self.options
    }

    /// Forced format from the options, or the one detected from `path`.
    pub fn format_for(&self, path: &Path) -> Result<SourceFormat> {
        self.options
            .format
            .or_else(|| SourceFormat::detect(path))
            .ok_or_else(|| IngestError::UnknownFormat(path.to_path_buf()))
    }

    /// Ingest `path`, propagating structural failures.
    pub fn parse(&self, path: impl AsRef<Path>) -> Result<IngestionResult> {
        let path = path.as_ref();
        let format = self.format_for(path)?;
        let span = tracing::info_span!("ingest", %format, file = %path.display());
        let _enter = span.enter();

        let parsed = Reader::for_format(format, path, &self.options).read(path)?;
        Ok(self.finish(path, format, parsed))
    }

    /// Ingest `path`. Never fails: structural failures come back as a result
    /// with [`IngestStatus::StructuralFailure`] and an error diagnostic.
    pub fn ingest(&self, path: impl AsRef<Path>) -> IngestionResult {
        let path = path.as_ref();
        match self.parse(path) {
            Ok(result) => result,
            Err(err) => IngestionResult::failed(path, self.format_for(path).ok(), &err),
        }
    }

    fn finish(&self, path: &Path, format: SourceFormat, parsed: ParsedSource) -> IngestionResult {
        let ParsedSource {
            mut mesh,
            mut results,
            inout_nodes,
            mut diagnostics,
        } = parsed;

        let status = if mesh.is_absent() {
            diagnostics.push(
                Diagnostic::error(
                    "mesh",
                    format!("no nodes found in {format} file {}", path.display()),
                )
                .in_file(path),
            );
            results.clear();
            IngestStatus::EmptyMesh
        } else {
            drop_dangling_elements(&mut mesh, &mut diagnostics, path);
            if self.options.validate_references {
                validate_result_ids(&mesh, &results, &mut diagnostics, path);
            }
            let summary = if results.is_empty() {
                "mesh only, no result sets".to_string()
            } else {
                format!("increments: {}", results.len())
            };
            diagnostics.push(Diagnostic::info("result", summary).in_file(path));
            IngestStatus::Complete
        };

        IngestionResult {
            source: path.to_path_buf(),
            format: Some(format),
            status,
            mesh,
            results,
            inout_nodes,
            diagnostics,
        }
    }
}

/// Ingest `path` with `options`.
pub fn ingest(path: impl AsRef<Path>, options: IngestOptions) -> IngestionResult {
    Ingestor::new(options).ingest(path)
}

/// Elements may only reference nodes of the node table; others are removed.
fn drop_dangling_elements(mesh: &mut CanonicalMesh, diagnostics: &mut Diagnostics, path: &Path) {
    for dangling in mesh.remove_dangling() {
        diagnostics.push(
            Diagnostic::warning(
                "mesh",
                format!(
                    "{:?} element {} references missing node {}; element dropped",
                    dangling.kind, dangling.element, dangling.node
                ),
            )
            .in_file(path),
        );
    }
}

fn validate_result_ids(
    mesh: &CanonicalMesh,
    results: &[ResultSet],
    diagnostics: &mut Diagnostics,
    path: &Path,
) {
    for set in results {
        let missing = set
            .displacements
            .keys()
            .filter(|node| mesh.node(**node).is_none())
            .count();
        if missing > 0 {
            diagnostics.push(
                Diagnostic::warning(
                    "result",
                    format!(
                        "result set {} has {missing} values for nodes missing from the mesh",
                        set.name
                    ),
                )
                .in_file(path),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Severity;
    use femx_model::ElementKind;
    use std::fs;

    #[test]
    fn detects_format_from_path() {
        assert_eq!(SourceFormat::detect(Path::new("wing.su2")), Some(SourceFormat::Su2));
        assert_eq!(SourceFormat::detect(Path::new("frame.3dd")), Some(SourceFormat::Frame3dd));
        assert_eq!(SourceFormat::detect(Path::new("frame.OUT")), Some(SourceFormat::Frame3dd));
        assert_eq!(
            SourceFormat::detect(Path::new("mesh/mesh.header")),
            Some(SourceFormat::Elmer)
        );
        assert_eq!(SourceFormat::detect(Path::new("notes.txt")), None);
        assert_eq!(SourceFormat::detect(Path::new("README")), None);

        let dir = tempfile::tempdir().expect("temp dir");
        assert_eq!(SourceFormat::detect(dir.path()), Some(SourceFormat::Elmer));
    }

    #[test]
    fn parses_format_names() {
        assert_eq!("su2".parse::<SourceFormat>(), Ok(SourceFormat::Su2));
        assert_eq!("FRAME3DD".parse::<SourceFormat>(), Ok(SourceFormat::Frame3dd));
        assert!("gmsh".parse::<SourceFormat>().is_err());
    }

    #[test]
    fn unknown_extension_is_structural_failure() {
        let result = Ingestor::default().ingest("model.stl");
        assert_eq!(result.status, IngestStatus::StructuralFailure);
        assert_eq!(result.format, None);
        assert_eq!(result.diagnostics.error_count(), 1);
        assert!(result.mesh.is_absent());
    }

    #[test]
    fn parse_propagates_missing_file() {
        let err = Ingestor::default()
            .parse("/no/such/grid.su2")
            .expect_err("missing file");
        assert!(matches!(err, IngestError::Io { .. }));
    }

    #[test]
    fn empty_mesh_is_reported() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("empty.su2");
        fs::write(&path, "NDIME= 3\nNELEM= 0\nNPOIN= 0\n").expect("write mesh");

        let result = Ingestor::default().ingest(&path);
        assert_eq!(result.status, IngestStatus::EmptyMesh);
        assert!(result.results.is_empty());
        assert!(result.diagnostics.mentions(Severity::Error, "no nodes found in SU2 file"));
    }

    #[test]
    fn dangling_elements_are_dropped() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("dangling.su2");
        fs::write(&path, "NDIME= 2\nNELEM= 2\n5 0 1 7\n3 0 1\nNPOIN= 2\n0 0\n1 0\n")
            .expect("write mesh");

        let result = Ingestor::default().ingest(&path);
        assert!(result.is_complete());
        assert!(result.mesh.elements(ElementKind::Tria3).is_empty());
        assert_eq!(result.mesh.seg2()[&2], vec![1, 2]);
        assert!(result.mesh.dangling_references().is_empty());
        assert!(result.diagnostics.mentions(Severity::Warning, "references missing node 8"));

        // Switching off result checks does not keep broken elements.
        let options = IngestOptions {
            validate_references: false,
            ..IngestOptions::default()
        };
        let result = Ingestor::new(options).ingest(&path);
        assert!(result.mesh.elements(ElementKind::Tria3).is_empty());
        assert_eq!(result.diagnostics.warning_count(), 1);
    }

    #[test]
    fn structural_failure_names_file_once() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("one.su2");
        fs::write(&path, "NDIME= 4\nNELEM= 0\nNPOIN= 0\n").expect("write mesh");

        let result = Ingestor::default().ingest(&path);
        assert_eq!(result.status, IngestStatus::StructuralFailure);
        let diagnostic = result.diagnostics.iter().next().expect("one diagnostic");
        assert_eq!(diagnostic.message, "unsupported dimension NDIME= 4");
        assert_eq!(diagnostic.file.as_deref(), Some(path.as_path()));
        assert_eq!(diagnostic.line, Some(1));
        assert_eq!(diagnostic.to_string().matches("one.su2").count(), 1);
    }

    #[test]
    fn forced_format_overrides_extension() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("grid.txt");
        fs::write(&path, "NDIME= 2\nNELEM= 0\nNPOIN= 1\n0 0\n").expect("write mesh");

        let result = ingest(&path, IngestOptions::default().with_format(SourceFormat::Su2));
        assert!(result.is_complete());
        assert_eq!(result.format, Some(SourceFormat::Su2));
        assert!(result.diagnostics.mentions(Severity::Info, "mesh only"));
    }
}
