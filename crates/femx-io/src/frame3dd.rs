//! Frame3DD reader: input cases (`.3dd`) and text reports (`.out`).
//!
//! Input cases are `#`-commented count-prefixed blocks: a title line, then the
//! node table, the reaction table and the member table.
//!
//! Reports have no comment syntax; sections are found by banner lines. The
//! node banner is followed two lines later by the model counts
//! (`12 NODES  12 FIXED NODES  21 FRAME ELEMENTS  2 LOAD CASES`), then the node
//! and member tables at fixed offsets. Displacement blocks start at a column
//! header line once an elastic or modal banner has been seen.

use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, Trim};
use femx_model::{ElementKind, ResultKind};
use femx_text::{HASH_COMMENTS, Line, LineCursor, LineStream};
use serde::{Deserialize, Serialize};

use crate::diagnostics::Diagnostic;
use crate::error::{InFile, Result, read_source};
use crate::mesh_builder::{MeshBuilder, ParsedSource};
use crate::results::{DisplacementBlock, ResultSetBuilder};

pub const NODE_BANNER: &str =
    "In 2D problems the Y-axis is vertical.  In 3D problems the Z-axis is vertical.";
pub const ELASTIC_BANNER: &str =
    "E L A S T I C   S T I F F N E S S   A N A L Y S I S   via  L D L'  decomposition";
pub const MODAL_BANNER: &str = "M O D A L   A N A L Y S I S   R E S U L T S";
pub const DISPLACEMENT_HEADER: &str =
    "Node    X-dsp       Y-dsp       Z-dsp       X-rot       Y-rot       Z-rot";

/// Default suffix of the inflow/outflow companion file.
pub const INOUT_SUFFIX: &str = "_inout_nodes.txt";

/// Lines from the node banner to the counts line.
const COUNTS_OFFSET: usize = 2;
/// Lines between the counts line and the first node record.
const NODE_TABLE_PREAMBLE: usize = 3;
/// Lines between the last node record and the first member record.
const MEMBER_TABLE_PREAMBLE: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameMode {
    /// Input case: mesh only
    Geometry,
    /// Analysis report: mesh and displacement results
    Results,
}

impl FrameMode {
    /// `.out` files are reports, everything else is read as an input case.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("out") => FrameMode::Results,
            _ => FrameMode::Geometry,
        }
    }
}

/// Model counts declared by the source.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FrameHeader {
    /// Title line of an input case
    pub title: Option<String>,
    pub nodes: usize,
    /// Nodes with reactions
    pub fixed_nodes: usize,
    pub members: usize,
    /// Declared load cases; reports only
    pub load_cases: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameModel {
    pub header: FrameHeader,
    pub parsed: ParsedSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReportState {
    Seeking,
    Elastic,
    Modal,
}

impl ReportState {
    fn advance(self, line: &Line<'_>) -> Self {
        if line.matches(MODAL_BANNER) {
            ReportState::Modal
        } else if line.matches(ELASTIC_BANNER) && self == ReportState::Seeking {
            ReportState::Elastic
        } else {
            self
        }
    }

    fn result_kind(self) -> Option<ResultKind> {
        match self {
            ReportState::Seeking => None,
            ReportState::Elastic => Some(ResultKind::Static),
            ReportState::Modal => Some(ResultKind::Modal),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Frame3ddReader {
    mode: FrameMode,
    companion_suffix: String,
}

impl Frame3ddReader {
    pub fn new(mode: FrameMode) -> Self {
        Self {
            mode,
            companion_suffix: INOUT_SUFFIX.to_string(),
        }
    }

    pub fn with_companion_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.companion_suffix = suffix.into();
        self
    }

    pub fn mode(&self) -> FrameMode {
        self.mode
    }

    /// `<path without extension><suffix>`
    pub fn companion_path(&self, path: &Path) -> PathBuf {
        let mut name = path.with_extension("").into_os_string();
        name.push(&self.companion_suffix);
        PathBuf::from(name)
    }

    pub fn read(&self, path: &Path) -> Result<FrameModel> {
        let text = read_source(path)?;
        let mut model = match self.mode {
            FrameMode::Geometry => self.parse_case(path, &text)?,
            FrameMode::Results => self.parse_report(path, &text)?,
        };
        self.attach_companion(path, &mut model.parsed);
        Ok(model)
    }

    /// Parse an input case.
    pub fn parse_case(&self, path: &Path, text: &str) -> Result<FrameModel> {
        let mut builder = MeshBuilder::new(path);
        let mut stream = LineStream::new(text, HASH_COMMENTS);
        let title = stream.next_raw().map(|line| line.text.to_string());

        let nodes = stream
            .expect_significant("node count")
            .in_file(path)?
            .record()
            .count(0)
            .in_file(path)?;
        for _ in 0..nodes {
            let line = stream.expect_significant("node records").in_file(path)?;
            let record = line.record();
            let id = record.int(0).in_file(path)?;
            let point = [
                record.float(1).in_file(path)?,
                record.float(2).in_file(path)?,
                record.float(3).in_file(path)?,
            ];
            builder.add_node(id, point, line.number);
        }

        let reactions = stream
            .expect_significant("reaction count")
            .in_file(path)?
            .record()
            .count(0)
            .in_file(path)?;
        for _ in 0..reactions {
            stream.expect_significant("reaction records").in_file(path)?;
        }

        let members = stream
            .expect_significant("member count")
            .in_file(path)?
            .record()
            .count(0)
            .in_file(path)?;
        for _ in 0..members {
            let line = stream.expect_significant("member records").in_file(path)?;
            let record = line.record();
            let id = record.int(0).in_file(path)?;
            let ends = vec![record.int(1).in_file(path)?, record.int(2).in_file(path)?];
            builder.add_element(ElementKind::Seg2, id, ends, line.number);
        }

        Ok(FrameModel {
            header: FrameHeader {
                title,
                nodes,
                fixed_nodes: reactions,
                members,
                load_cases: None,
            },
            parsed: builder.finish(),
        })
    }

    /// Parse an analysis report.
    pub fn parse_report(&self, path: &Path, text: &str) -> Result<FrameModel> {
        let mut builder = MeshBuilder::new(path);
        let lines = LineStream::new(text, HASH_COMMENTS).raw_lines();
        let mut header: Option<FrameHeader> = None;
        let mut results: Option<ResultSetBuilder> = None;
        let mut state = ReportState::Seeking;

        let mut index = 0;
        while index < lines.len() {
            let line = lines.get(index, "report").in_file(path)?;
            if line.matches(NODE_BANNER) {
                if header.is_some() {
                    builder.warn_at("structure", "repeated node table ignored", line.number);
                    index += 1;
                    continue;
                }
                let (parsed, next) = read_model_tables(&lines, index, &mut builder)?;
                results = Some(ResultSetBuilder::new(parsed.nodes));
                header = Some(parsed);
                index = next;
                continue;
            }

            state = state.advance(&line);
            if let Some(kind) = state.result_kind()
                && line.matches(DISPLACEMENT_HEADER)
            {
                match results.as_mut() {
                    Some(results) => {
                        let block = results.open_block(kind);
                        index = read_block(&lines, index + 1, block, results, &mut builder);
                        continue;
                    }
                    None => builder.warn_at(
                        "result",
                        "displacement block before the node table; block skipped",
                        line.number,
                    ),
                }
            }
            index += 1;
        }

        let header = header.unwrap_or_default();
        if let Some(results) = results {
            let elastic = results.count(ResultKind::Static);
            if let Some(load_cases) = header.load_cases
                && load_cases != elastic
            {
                builder.info(
                    "result",
                    format!(
                        "{load_cases} load cases declared, \
                         {elastic} elastic displacement blocks found"
                    ),
                );
            }
            for set in results.into_results() {
                builder.push_result(set);
            }
        }

        Ok(FrameModel {
            header,
            parsed: builder.finish(),
        })
    }

    fn attach_companion(&self, path: &Path, parsed: &mut ParsedSource) {
        let companion = self.companion_path(path);
        if companion.is_file() {
            match read_inout_nodes(&companion) {
                Ok(rows) => {
                    tracing::debug!(
                        rows = rows.len(),
                        file = %companion.display(),
                        "inout nodes read"
                    );
                    parsed.inout_nodes = rows;
                }
                Err(err) => {
                    let mut diagnostic = Diagnostic::warning(
                        "companion",
                        format!("cannot read companion file: {}", err.detail()),
                    )
                    .in_file(&companion);
                    if let Some(line) = err.line() {
                        diagnostic = diagnostic.at_line(line);
                    }
                    parsed.diagnostics.push(diagnostic);
                }
            }
            return;
        }

        parsed.diagnostics.push(
            Diagnostic::info("companion", "missing companion inflow/outflow file")
                .in_file(&companion),
        );
        if parsed.results.iter().any(|set| set.has_flow_data()) {
            parsed.diagnostics.push(
                Diagnostic::error(
                    "companion",
                    "results carry mass-flow or network-pressure data \
                     but no inout_nodes file was found",
                )
                .in_file(path),
            );
        }
    }
}

/// Rows of a comma-separated inout-nodes file, fields trimmed, blank lines dropped.
///
/// Rows may have different lengths; there is no header row.
pub fn read_inout_nodes(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)
        .in_file(path)?;
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.in_file(path)?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

/// Counts line, node table and member table below the node banner.
///
/// Returns the header and the index of the first line after the member table.
fn read_model_tables(
    lines: &LineCursor<'_>,
    banner: usize,
    builder: &mut MeshBuilder,
) -> Result<(FrameHeader, usize)> {
    let path = builder.path().to_path_buf();
    let counts = lines.get(banner + COUNTS_OFFSET, "model counts").in_file(&path)?;
    let record = counts.record();
    let header = FrameHeader {
        title: None,
        nodes: record.count(0).in_file(&path)?,
        fixed_nodes: record.count(2).in_file(&path)?,
        members: record.count(5).in_file(&path)?,
        load_cases: Some(record.count(8).in_file(&path)?),
    };

    let mut index = banner + COUNTS_OFFSET + 1 + NODE_TABLE_PREAMBLE;
    for _ in 0..header.nodes {
        let line = lines.get(index, "node table").in_file(&path)?;
        let record = line.record();
        let id = record.int(0).in_file(&path)?;
        let point = [
            record.float(1).in_file(&path)?,
            record.float(2).in_file(&path)?,
            record.float(3).in_file(&path)?,
        ];
        builder.add_node(id, point, line.number);
        index += 1;
    }

    index += MEMBER_TABLE_PREAMBLE;
    for _ in 0..header.members {
        let line = lines.get(index, "member table").in_file(&path)?;
        let record = line.record();
        let id = record.int(0).in_file(&path)?;
        let ends = vec![record.int(1).in_file(&path)?, record.int(2).in_file(&path)?];
        builder.add_element(ElementKind::Seg2, id, ends, line.number);
        index += 1;
    }
    Ok((header, index))
}

/// Read displacement rows starting at `start` into `block` and finish it.
///
/// Returns the index of the line that ended the block.
fn read_block(
    lines: &LineCursor<'_>,
    start: usize,
    mut block: DisplacementBlock,
    results: &mut ResultSetBuilder,
    builder: &mut MeshBuilder,
) -> usize {
    let mut index = start;
    for _ in 0..results.node_count() {
        let Ok(line) = lines.get(index, "displacements") else {
            break;
        };
        let numbered = line
            .first_token()
            .is_some_and(|token| token.bytes().all(|b| b.is_ascii_digit()));
        if !numbered {
            break;
        }
        index += 1;

        let record = line.record();
        let row = record.int(0).and_then(|node| {
            Ok((node, [record.float(1)?, record.float(2)?, record.float(3)?]))
        });
        match row {
            Ok((node, displacement)) if results.accepts(node) => {
                block.insert(node, displacement);
            }
            Ok((node, _)) => builder.warn_at(
                "result",
                format!(
                    "displacement for node {node} outside 1..={}; row skipped",
                    results.node_count()
                ),
                line.number,
            ),
            Err(err) => builder.warn_at("result", format!("{err}; row skipped"), line.number),
        }
    }

    let rows = block.len();
    let set = results.finish_block(block);
    tracing::debug!(name = %set.name, rows, "displacement block read");
    index
}
