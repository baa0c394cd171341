//! SU2 native mesh reader.
//!
//! ```text
//! NDIME= 2
//! NELEM= 2
//! 5 0 1 2 0          type code, 0-based node ids, element index
//! 5 0 2 3 1
//! NPOIN= 4
//! 0.0 0.0 0          x y [z] [index]
//! ...
//! NMARK= 1
//! MARKER_TAG= wall
//! MARKER_ELEMS= 1
//! 3 0 1
//! ```
//!
//! Multi-zone files start with `NZONE= n` (optionally after a leading `NDIME=`)
//! and prefix every zone with `IZONE= k`. Node and element ids of later zones
//! continue after those of earlier zones.

use std::path::Path;

use femx_text::{LineCursor, LineStream, PERCENT_COMMENTS};

use crate::error::{InFile, IngestError, Result, read_source};
use crate::mesh_builder::{MeshBuilder, ParsedSource, sequence_id};
use crate::registry::CodeSpace;

pub const NZONE: &str = "NZONE";
pub const IZONE: &str = "IZONE";
pub const NDIME: &str = "NDIME";
pub const NELEM: &str = "NELEM";
pub const NPOIN: &str = "NPOIN";
pub const NMARK: &str = "NMARK";
pub const MARKER_TAG: &str = "MARKER_TAG";
pub const MARKER_ELEMS: &str = "MARKER_ELEMS";

/// Declared sizes of one zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Su2Zone {
    /// Value of `IZONE=`, or 1 for single-zone files
    pub index: usize,
    pub dimension: usize,
    pub elements: usize,
    pub points: usize,
    /// Boundary marker tags; marker element records are not retained
    pub markers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Su2Mesh {
    pub zones: Vec<Su2Zone>,
    pub parsed: ParsedSource,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Su2MeshReader;

impl Su2MeshReader {
    pub fn new() -> Self {
        Self
    }

    pub fn read(&self, path: &Path) -> Result<Su2Mesh> {
        let text = read_source(path)?;
        self.parse(path, &text)
    }

    pub fn parse(&self, path: &Path, text: &str) -> Result<Su2Mesh> {
        let mut builder = MeshBuilder::new(path);
        let mut lines = LineStream::new(text, PERCENT_COMMENTS).significant_lines();
        let (zone_count, zoned) = read_zone_count(&mut lines, path)?;

        let mut zones = Vec::with_capacity(zone_count);
        let mut node_start = 0;
        let mut element_start = 0;
        for _ in 0..zone_count {
            let index = if zoned {
                seek_zone_header(&mut lines, &mut builder)?
            } else {
                1
            };
            let zone = read_zone(&mut lines, &mut builder, index, node_start, element_start)?;
            node_start += zone.points;
            element_start += zone.elements;
            zones.push(zone);
        }

        tracing::debug!(
            zones = zones.len(),
            nodes = builder.mesh().node_count(),
            elements = builder.mesh().element_count(),
            "su2 mesh read"
        );
        Ok(Su2Mesh {
            zones,
            parsed: builder.finish(),
        })
    }
}

/// Number of zones, and whether each zone opens with `IZONE=`.
///
/// Leaves the cursor before the first zone's leading line. Only files that
/// declare `NZONE=` carry zone headers, whatever the count.
fn read_zone_count(lines: &mut LineCursor<'_>, path: &Path) -> Result<(usize, bool)> {
    let first = lines.get(0, "mesh header").in_file(path)?;
    match first.keyword() {
        Some(NZONE) => {
            lines.seek(1);
            Ok((first.keyword_parse(NZONE).in_file(path)?, true))
        }
        Some(NDIME) => match lines.get(1, "zone count") {
            Ok(second) if second.keyword() == Some(NZONE) => {
                lines.seek(2);
                Ok((second.keyword_parse(NZONE).in_file(path)?, true))
            }
            _ => {
                lines.seek(0);
                Ok((1, false))
            }
        },
        _ => Err(IngestError::invalid_header(
            path,
            first.number,
            format!("expected `{NZONE}=` or `{NDIME}=`, found `{}`", first.text),
        )),
    }
}

/// Advance to the next `IZONE=` line, skipping anything before it.
fn seek_zone_header(lines: &mut LineCursor<'_>, builder: &mut MeshBuilder) -> Result<usize> {
    let path = builder.path().to_path_buf();
    loop {
        let line = lines.expect_next("zone header").in_file(&path)?;
        if line.keyword() == Some(IZONE) {
            return line.keyword_parse(IZONE).in_file(&path);
        }
        builder.warn_at(
            "structure",
            format!("skipped `{}` before `{IZONE}=`", line.text),
            line.number,
        );
    }
}

fn read_zone(
    lines: &mut LineCursor<'_>,
    builder: &mut MeshBuilder,
    index: usize,
    node_start: usize,
    element_start: usize,
) -> Result<Su2Zone> {
    let path = builder.path().to_path_buf();

    let line = lines.expect_next("zone dimension").in_file(&path)?;
    let dimension: usize = line.keyword_parse(NDIME).in_file(&path)?;
    if !(2..=3).contains(&dimension) {
        return Err(IngestError::invalid_header(
            &path,
            line.number,
            format!("unsupported dimension {NDIME}= {dimension}"),
        ));
    }

    let elements: usize = lines
        .expect_next("element count")
        .in_file(&path)?
        .keyword_parse(NELEM)
        .in_file(&path)?;
    let offset = sequence_id(node_start);
    for k in 0..elements {
        let line = lines.expect_next("element records").in_file(&path)?;
        let record = line.record();
        let code = record.int(0).in_file(&path)?;
        let id = sequence_id(element_start + k + 1);
        builder.add_classified(CodeSpace::Su2, code, id, &record, offset)?;
    }

    let points: usize = lines
        .expect_next("point count")
        .in_file(&path)?
        .keyword_parse(NPOIN)
        .in_file(&path)?;
    for k in 0..points {
        let line = lines.expect_next("point records").in_file(&path)?;
        let record = line.record();
        let z = if dimension == 2 {
            0.0
        } else {
            record.float(2).in_file(&path)?
        };
        let point = [
            record.float(0).in_file(&path)?,
            record.float(1).in_file(&path)?,
            z,
        ];
        builder.add_node(sequence_id(node_start + k + 1), point, line.number);
    }

    let markers = read_markers(lines, builder);
    Ok(Su2Zone {
        index,
        dimension,
        elements,
        points,
        markers,
    })
}

/// Optional marker section; problems here are warnings, never failures.
fn read_markers(lines: &mut LineCursor<'_>, builder: &mut MeshBuilder) -> Vec<String> {
    let mut tags = Vec::new();
    let Some(line) = lines.peek() else {
        return tags;
    };
    if line.keyword() != Some(NMARK) {
        return tags;
    }
    lines.next_line();
    let count: usize = match line.keyword_parse(NMARK) {
        Ok(count) => count,
        Err(err) => {
            builder.warn_at("marker", err.to_string(), line.number);
            return tags;
        }
    };

    let path = builder.path().to_path_buf();
    for _ in 0..count {
        let (tag, elements) = match read_marker_header(lines, &path) {
            Ok(marker) => marker,
            Err(err) => {
                builder.warn("marker", format!("marker section truncated: {err}"));
                break;
            }
        };
        if let Err(err) = lines.skip(elements, "marker element records") {
            builder.warn("marker", format!("marker `{tag}` truncated: {err}"));
            tags.push(tag);
            break;
        }
        tags.push(tag);
    }
    tags
}

/// `MARKER_TAG= name` and `MARKER_ELEMS= count` lines of one marker.
fn read_marker_header(lines: &mut LineCursor<'_>, path: &Path) -> Result<(String, usize)> {
    let tag = lines
        .expect_next("marker tag")
        .in_file(path)?
        .keyword_value(MARKER_TAG)
        .in_file(path)?
        .to_string();
    let elements = lines
        .expect_next("marker element count")
        .in_file(path)?
        .keyword_parse(MARKER_ELEMS)
        .in_file(path)?;
    Ok((tag, elements))
}
