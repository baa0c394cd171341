//! Element-type code tables.
//!
//! Every source format numbers its element types differently. The registry maps
//! a (code, code space) pair onto a canonical [`ElementKind`] together with the
//! record layout needed to pull the connectivity out of a line.

use femx_model::{ElementKind, NodeId};
use femx_text::{FieldError, Record};

/// Disjoint numbering schemes understood by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeSpace {
    /// Elmer `mesh.elements`: `id body type n1 n2 ...`
    ElmerBulk,
    /// Elmer `mesh.boundary`: `id bc parent1 parent2 type n1 n2 ...`
    ElmerBoundary,
    /// SU2 `NELEM` records: `type n1 n2 ... [index]`
    Su2,
}

/// Record layout of one mapped element-type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeEntry {
    pub kind: ElementKind,
    /// 0-based column of the first node id
    pub first_column: usize,
    /// Number of node columns read
    pub node_columns: usize,
    /// Added to every node id (1 for 0-based sources)
    pub base: NodeId,
}

impl CodeEntry {
    /// Node ids of `record`, shifted by `node_start + base`.
    pub fn connectivity(
        &self,
        record: &Record<'_>,
        node_start: NodeId,
    ) -> Result<Vec<NodeId>, FieldError> {
        (self.first_column..self.first_column + self.node_columns)
            .map(|column| Ok(record.int(column)? + node_start + self.base))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Mapped(CodeEntry),
    /// Known code whose records are consumed without producing an element
    Ignored,
    Unknown,
}

const fn entry(
    kind: ElementKind,
    first_column: usize,
    node_columns: usize,
    base: NodeId,
) -> Option<CodeEntry> {
    Some(CodeEntry {
        kind,
        first_column,
        node_columns,
        base,
    })
}

type CodeTable = &'static [(&'static [i32], Option<CodeEntry>)];

// Quadratic Elmer codes keep only their corner nodes.
const ELMER_BULK: CodeTable = &[
    (&[202, 203], entry(ElementKind::Seg2, 3, 2, 0)),
    (&[303, 306], entry(ElementKind::Tria3, 3, 3, 0)),
    (&[404, 408, 409], entry(ElementKind::Quad4, 3, 4, 0)),
    (&[504, 510], entry(ElementKind::Tetra4, 3, 4, 0)),
    (&[706, 715], entry(ElementKind::Penta6, 3, 6, 0)),
    (&[808, 820, 827], entry(ElementKind::Hexa8, 3, 8, 0)),
    (&[13], None),
    // Pyramid: five columns into the Tetra4 bucket; rejected by the node-count check.
    (&[14], entry(ElementKind::Tetra4, 1, 5, 1)),
];

const ELMER_BOUNDARY: CodeTable = &[
    (&[202, 203], entry(ElementKind::Seg2, 5, 2, 0)),
    (&[303, 306], entry(ElementKind::Tria3, 5, 3, 0)),
    (&[404, 408, 409], entry(ElementKind::Quad4, 5, 4, 0)),
    (&[504, 510, 706, 715, 808, 820, 827, 13, 14], None),
];

const SU2: CodeTable = &[
    (&[3], entry(ElementKind::Seg2, 1, 2, 1)),
    (&[5], entry(ElementKind::Tria3, 1, 3, 1)),
    (&[9], entry(ElementKind::Quad4, 1, 4, 1)),
    (&[10], entry(ElementKind::Tetra4, 1, 4, 1)),
    (&[12], entry(ElementKind::Hexa8, 1, 8, 1)),
    (&[13], entry(ElementKind::Penta6, 1, 6, 1)),
    (&[14], entry(ElementKind::Tetra4, 1, 5, 1)),
];

/// Stateless lookup over the per-format code tables.
pub struct ElementTypeRegistry;

impl ElementTypeRegistry {
    pub fn classify(code: i32, space: CodeSpace) -> Classification {
        let table = match space {
            CodeSpace::ElmerBulk => ELMER_BULK,
            CodeSpace::ElmerBoundary => ELMER_BOUNDARY,
            CodeSpace::Su2 => SU2,
        };
        table
            .iter()
            .find(|(codes, _)| codes.contains(&code))
            .map_or(Classification::Unknown, |(_, entry)| match entry {
                Some(entry) => Classification::Mapped(*entry),
                None => Classification::Ignored,
            })
    }

    pub fn node_count(kind: ElementKind) -> usize {
        kind.node_count()
    }
}
