//! Elmer mesh directory reader.
//!
//! An Elmer mesh is a directory holding `mesh.header`, `mesh.nodes`,
//! `mesh.elements` and `mesh.boundary`. The header's first line gives the node,
//! bulk element and boundary element counts; an optional census follows:
//!
//! ```text
//! 8 3 4        nodes, bulk elements, boundary elements
//! 2            number of element types
//! 808 3        type code, count
//! 404 4
//! ```
//!
//! Node lines are `id partition x y z`; node `k` of the file gets id `k + 1`.
//! Bulk element lines are `id body type n1 n2 ...`, boundary lines are
//! `id bc parent1 parent2 type n1 n2 ...`.

use std::path::{Path, PathBuf};

use femx_text::{LineStream, PERCENT_COMMENTS};
use serde::{Deserialize, Serialize};

use crate::error::{InFile, IngestError, Result, read_source};
use crate::mesh_builder::{MeshBuilder, ParsedSource, sequence_id};
use crate::registry::{Classification, CodeSpace, ElementTypeRegistry};

pub const HEADER_FILE: &str = "mesh.header";
pub const NODES_FILE: &str = "mesh.nodes";
pub const ELEMENTS_FILE: &str = "mesh.elements";
pub const BOUNDARY_FILE: &str = "mesh.boundary";

/// Which element file of the directory is read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElmerMode {
    /// `mesh.elements`
    #[default]
    Volume,
    /// `mesh.boundary`; volumetric codes are ignored
    Boundary,
}

impl ElmerMode {
    pub fn element_file(self) -> &'static str {
        match self {
            ElmerMode::Volume => ELEMENTS_FILE,
            ElmerMode::Boundary => BOUNDARY_FILE,
        }
    }

    fn code_space(self) -> CodeSpace {
        match self {
            ElmerMode::Volume => CodeSpace::ElmerBulk,
            ElmerMode::Boundary => CodeSpace::ElmerBoundary,
        }
    }

    /// 0-based column of the element-type code.
    fn type_column(self) -> usize {
        match self {
            ElmerMode::Volume => 2,
            ElmerMode::Boundary => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ElmerHeader {
    pub nodes: usize,
    pub elements: usize,
    pub boundary_elements: usize,
    /// `(type code, count)` pairs, empty when the header carries no census
    pub type_census: Vec<(i32, usize)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElmerMesh {
    pub header: ElmerHeader,
    pub parsed: ParsedSource,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ElmerMeshReader {
    mode: ElmerMode,
}

impl ElmerMeshReader {
    pub fn new(mode: ElmerMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ElmerMode {
        self.mode
    }

    /// Mesh directory for `path`: the path itself, or the directory of a file in it.
    pub fn mesh_dir(path: &Path) -> PathBuf {
        if path.is_dir() {
            return path.to_path_buf();
        }
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    pub fn read(&self, path: &Path) -> Result<ElmerMesh> {
        let dir = Self::mesh_dir(path);
        let header = read_source(&dir.join(HEADER_FILE))?;
        let nodes = read_source(&dir.join(NODES_FILE))?;
        let elements = read_source(&dir.join(self.mode.element_file()))?;
        self.parse(&dir, &header, &nodes, &elements)
    }

    /// Parse already loaded file contents; `dir` only names files in diagnostics.
    pub fn parse(
        &self,
        dir: &Path,
        header: &str,
        nodes: &str,
        elements: &str,
    ) -> Result<ElmerMesh> {
        let mut builder = MeshBuilder::new(&dir.join(HEADER_FILE));
        let header = self.read_header(header, &mut builder)?;

        builder.set_path(&dir.join(NODES_FILE));
        let path = builder.path().to_path_buf();
        let mut stream = LineStream::new(nodes, PERCENT_COMMENTS);
        for k in 0..header.nodes {
            let line = stream.expect_significant("node records").in_file(&path)?;
            let record = line.record();
            let point = [
                record.float(2).in_file(&path)?,
                record.float(3).in_file(&path)?,
                record.float(4).in_file(&path)?,
            ];
            builder.add_node(sequence_id(k + 1), point, line.number);
        }

        builder.set_path(&dir.join(self.mode.element_file()));
        let path = builder.path().to_path_buf();
        let declared = match self.mode {
            ElmerMode::Volume => header.elements,
            ElmerMode::Boundary => header.boundary_elements,
        };
        let space = self.mode.code_space();
        let mut stream = LineStream::new(elements, PERCENT_COMMENTS);
        for k in 0..declared {
            let line = stream.expect_significant("element records").in_file(&path)?;
            let record = line.record();
            let code = record.int(self.mode.type_column()).in_file(&path)?;
            builder.add_classified(space, code, sequence_id(k + 1), &record, 0)?;
        }

        tracing::debug!(
            nodes = builder.mesh().node_count(),
            elements = builder.mesh().element_count(),
            mode = ?self.mode,
            "elmer mesh read"
        );
        Ok(ElmerMesh {
            header,
            parsed: builder.finish(),
        })
    }

    fn read_header(&self, text: &str, builder: &mut MeshBuilder) -> Result<ElmerHeader> {
        let path = builder.path().to_path_buf();
        let mut stream = LineStream::new(text, PERCENT_COMMENTS);
        let counts = stream.expect_significant("header counts").in_file(&path)?;
        let record = counts.record();
        if record.len() < 3 {
            return Err(IngestError::invalid_header(
                &path,
                counts.number,
                format!(
                    "expected `nodes elements boundary-elements`, found `{}`",
                    counts.text
                ),
            ));
        }
        let mut header = ElmerHeader {
            nodes: record.count(0).in_file(&path)?,
            elements: record.count(1).in_file(&path)?,
            boundary_elements: record.count(2).in_file(&path)?,
            type_census: Vec::new(),
        };

        let Some(types_line) = stream.next_significant() else {
            return Ok(header);
        };
        let Ok(types) = types_line.record().count(0) else {
            builder.warn_at("header", "unreadable element-type census", types_line.number);
            return Ok(header);
        };
        for _ in 0..types {
            let Some(line) = stream.next_significant() else {
                let read = header.type_census.len();
                builder.warn(
                    "header",
                    format!("element-type census truncated after {read} entries"),
                );
                break;
            };
            let record = line.record();
            match (record.int(0), record.count(1)) {
                (Ok(code), Ok(count)) => header.type_census.push((code, count)),
                _ => builder.warn_at(
                    "header",
                    format!("unreadable census entry `{}`", line.text),
                    line.number,
                ),
            }
        }

        for (code, count) in &header.type_census {
            let bulk = ElementTypeRegistry::classify(*code, CodeSpace::ElmerBulk);
            let boundary = ElementTypeRegistry::classify(*code, CodeSpace::ElmerBoundary);
            if bulk == Classification::Unknown && boundary == Classification::Unknown {
                builder.warn(
                    "header",
                    format!(
                        "mesh declares {count} elements of unsupported element-type code {code}"
                    ),
                );
            }
        }
        let census_total: usize = header.type_census.iter().map(|(_, count)| count).sum();
        let declared_total = header.elements + header.boundary_elements;
        if !header.type_census.is_empty() && census_total != declared_total {
            builder.info(
                "header",
                format!(
                    "element-type census lists {census_total} elements, header declares {declared_total}"
                ),
            );
        }
        Ok(header)
    }
}
