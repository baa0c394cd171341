//! Accumulates nodes and classified element records into a canonical mesh.
//!
//! Readers feed records line by line. Recoverable problems (unknown codes,
//! duplicate ids, wrong node counts) become diagnostics and the record is
//! skipped; malformed fields inside a declared block propagate as errors.

use std::path::{Path, PathBuf};

use femx_model::{CanonicalMesh, ElementId, ElementKind, NodeId, Point3, ResultSet};
use femx_text::Record;

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::{InFile, Result};
use crate::registry::{Classification, CodeSpace, ElementTypeRegistry};

/// What one reader produced from one source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedSource {
    pub mesh: CanonicalMesh,
    pub results: Vec<ResultSet>,
    pub inout_nodes: Vec<Vec<String>>,
    pub diagnostics: Diagnostics,
}

/// Builds a [`ParsedSource`] for the file at `path`
pub struct MeshBuilder {
    path: PathBuf,
    source: ParsedSource,
}

impl MeshBuilder {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            source: ParsedSource::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Point diagnostics at another file of the same source (Elmer directories).
    pub fn set_path(&mut self, path: &Path) {
        self.path = path.to_path_buf();
    }

    pub fn mesh(&self) -> &CanonicalMesh {
        &self.source.mesh
    }

    pub fn add_node(&mut self, id: NodeId, point: Point3, line: usize) {
        if let Err(err) = self.source.mesh.add_node(id, point) {
            self.warn_at("node", err.to_string(), line);
        }
    }

    pub fn add_element(
        &mut self,
        kind: ElementKind,
        id: ElementId,
        nodes: Vec<NodeId>,
        line: usize,
    ) {
        if let Err(err) = self.source.mesh.add_element(kind, id, nodes) {
            self.warn_at("element", format!("{err}; record skipped"), line);
        }
    }

    /// Classify `code` and insert the record it describes.
    ///
    /// Returns the kind that was populated, if any.
    pub fn add_classified(
        &mut self,
        space: CodeSpace,
        code: i32,
        id: ElementId,
        record: &Record<'_>,
        node_start: NodeId,
    ) -> Result<Option<ElementKind>> {
        match ElementTypeRegistry::classify(code, space) {
            Classification::Mapped(entry) => {
                let nodes = entry.connectivity(record, node_start).in_file(&self.path)?;
                let before = self.source.mesh.elements(entry.kind).len();
                self.add_element(entry.kind, id, nodes, record.line());
                let inserted = self.source.mesh.elements(entry.kind).len() > before;
                Ok(inserted.then_some(entry.kind))
            }
            Classification::Ignored => {
                tracing::debug!(code, element = id, ?space, "element-type code ignored");
                Ok(None)
            }
            Classification::Unknown => {
                self.warn_at(
                    "element",
                    format!("unsupported element-type code {code}; record skipped"),
                    record.line(),
                );
                Ok(None)
            }
        }
    }

    pub fn push_result(&mut self, result: ResultSet) {
        self.source.results.push(result);
    }

    pub fn info(&mut self, category: &str, message: impl Into<String>) {
        let diagnostic = Diagnostic::info(category, message).in_file(&self.path);
        self.source.diagnostics.push(diagnostic);
    }

    pub fn warn(&mut self, category: &str, message: impl Into<String>) {
        let diagnostic = Diagnostic::warning(category, message).in_file(&self.path);
        self.source.diagnostics.push(diagnostic);
    }

    pub fn warn_at(&mut self, category: &str, message: impl Into<String>, line: usize) {
        let diagnostic = Diagnostic::warning(category, message)
            .in_file(&self.path)
            .at_line(line);
        self.source.diagnostics.push(diagnostic);
    }

    pub fn finish(self) -> ParsedSource {
        self.source
    }
}

/// Id for the `n`-th (1-based) record of a source.
pub(crate) fn sequence_id(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Severity;
    use femx_text::Line;

    #[test]
    fn unknown_code_warns_and_continues() {
        let mut builder = MeshBuilder::new(Path::new("grid.su2"));
        let record = Line::new(5, "999 0 1").record();
        let kind = builder
            .add_classified(CodeSpace::Su2, 999, 1, &record, 0)
            .expect("unknown code is recoverable");
        assert_eq!(kind, None);
        let parsed = builder.finish();
        assert_eq!(parsed.mesh.element_count(), 0);
        assert!(parsed
            .diagnostics
            .mentions(Severity::Warning, "unsupported element-type code 999"));
        let diagnostic = parsed.diagnostics.iter().next().expect("one diagnostic");
        assert_eq!(diagnostic.line, Some(5));
        assert_eq!(diagnostic.file.as_deref(), Some(Path::new("grid.su2")));
    }

    #[test]
    fn pyramid_record_is_skipped_with_warning() {
        let mut builder = MeshBuilder::new(Path::new("grid.su2"));
        let record = Line::new(8, "14 0 1 2 3 4 0").record();
        let kind = builder
            .add_classified(CodeSpace::Su2, 14, 1, &record, 0)
            .expect("fields parse");
        assert_eq!(kind, None);
        let parsed = builder.finish();
        assert!(parsed.mesh.elements(ElementKind::Tetra4).is_empty());
        assert_eq!(parsed.diagnostics.warning_count(), 1);
    }

    #[test]
    fn malformed_node_column_is_structural() {
        let mut builder = MeshBuilder::new(Path::new("grid.su2"));
        let record = Line::new(3, "5 0 x 2").record();
        let err = builder
            .add_classified(CodeSpace::Su2, 5, 1, &record, 0)
            .expect_err("bad node id");
        assert_eq!(err.line(), Some(3));
    }

    #[test]
    fn duplicate_node_keeps_first_coordinates() {
        let mut builder = MeshBuilder::new(Path::new("case.3dd"));
        builder.add_node(1, [0.0, 0.0, 0.0], 4);
        builder.add_node(1, [5.0, 0.0, 0.0], 5);
        let parsed = builder.finish();
        assert_eq!(parsed.mesh.node(1), Some(&[0.0, 0.0, 0.0]));
        assert!(parsed.diagnostics.mentions(Severity::Warning, "duplicate node id 1"));
    }
}
