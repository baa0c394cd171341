//! Node table and per-kind element connectivity.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Node number as written by the source format (0- or 1-based per source).
pub type NodeId = i32;
/// Element number, local to the source.
pub type ElementId = i32;
/// Cartesian coordinate `[x, y, z]`.
pub type Point3 = [f64; 3];

type Bucket = BTreeMap<ElementId, Vec<NodeId>>;

static EMPTY_BUCKET: Bucket = BTreeMap::new();

/// Canonical element shape, independent of any source type code
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    /// 2-node line
    Seg2,
    /// 3-node line
    Seg3,
    /// 3-node triangle
    Tria3,
    /// 6-node triangle
    Tria6,
    /// 4-node quadrilateral
    Quad4,
    /// 8-node quadrilateral
    Quad8,
    /// 4-node tetrahedron
    Tetra4,
    /// 10-node tetrahedron
    Tetra10,
    /// 8-node hexahedron
    Hexa8,
    /// 20-node hexahedron
    Hexa20,
    /// 6-node pentahedron (wedge)
    Penta6,
    /// 15-node pentahedron (wedge)
    Penta15,
}

impl ElementKind {
    /// Every kind, in the order downstream builders expect the buckets.
    pub const ALL: [ElementKind; 12] = [
        ElementKind::Seg2,
        ElementKind::Seg3,
        ElementKind::Tria3,
        ElementKind::Tria6,
        ElementKind::Quad4,
        ElementKind::Quad8,
        ElementKind::Tetra4,
        ElementKind::Tetra10,
        ElementKind::Hexa8,
        ElementKind::Hexa20,
        ElementKind::Penta6,
        ElementKind::Penta15,
    ];

    /// Number of nodes an element of this kind references
    pub fn node_count(self) -> usize {
        match self {
            ElementKind::Seg2 => 2,
            ElementKind::Seg3 => 3,
            ElementKind::Tria3 => 3,
            ElementKind::Tria6 => 6,
            ElementKind::Quad4 => 4,
            ElementKind::Quad8 => 8,
            ElementKind::Tetra4 => 4,
            ElementKind::Tetra10 => 10,
            ElementKind::Hexa8 => 8,
            ElementKind::Hexa20 => 20,
            ElementKind::Penta6 => 6,
            ElementKind::Penta15 => 15,
        }
    }

    /// Topological dimension (1 = line, 2 = surface, 3 = volume)
    pub fn dimension(self) -> u8 {
        match self {
            ElementKind::Seg2 | ElementKind::Seg3 => 1,
            ElementKind::Tria3 | ElementKind::Tria6 | ElementKind::Quad4 | ElementKind::Quad8 => 2,
            ElementKind::Tetra4
            | ElementKind::Tetra10
            | ElementKind::Hexa8
            | ElementKind::Hexa20
            | ElementKind::Penta6
            | ElementKind::Penta15 => 3,
        }
    }

    pub fn is_volumetric(self) -> bool {
        self.dimension() == 3
    }

    /// Lower-order member of the same family
    pub fn linear(self) -> ElementKind {
        match self {
            ElementKind::Seg2 | ElementKind::Seg3 => ElementKind::Seg2,
            ElementKind::Tria3 | ElementKind::Tria6 => ElementKind::Tria3,
            ElementKind::Quad4 | ElementKind::Quad8 => ElementKind::Quad4,
            ElementKind::Tetra4 | ElementKind::Tetra10 => ElementKind::Tetra4,
            ElementKind::Hexa8 | ElementKind::Hexa20 => ElementKind::Hexa8,
            ElementKind::Penta6 | ElementKind::Penta15 => ElementKind::Penta6,
        }
    }

    pub fn is_quadratic(self) -> bool {
        self.linear() != self
    }

    /// Bucket key used by host mesh builders (`Seg2Elem`, `Tetra10Elem`, ...).
    pub fn bucket_name(self) -> &'static str {
        match self {
            ElementKind::Seg2 => "Seg2Elem",
            ElementKind::Seg3 => "Seg3Elem",
            ElementKind::Tria3 => "Tria3Elem",
            ElementKind::Tria6 => "Tria6Elem",
            ElementKind::Quad4 => "Quad4Elem",
            ElementKind::Quad8 => "Quad8Elem",
            ElementKind::Tetra4 => "Tetra4Elem",
            ElementKind::Tetra10 => "Tetra10Elem",
            ElementKind::Hexa8 => "Hexa8Elem",
            ElementKind::Hexa20 => "Hexa20Elem",
            ElementKind::Penta6 => "Penta6Elem",
            ElementKind::Penta15 => "Penta15Elem",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeshError {
    #[error("duplicate node id {0}")]
    DuplicateNode(NodeId),

    #[error("{kind:?} element {element} has {actual} nodes but expected {expected}")]
    NodeCount {
        kind: ElementKind,
        element: ElementId,
        expected: usize,
        actual: usize,
    },

    #[error("duplicate {kind:?} element id {element}")]
    DuplicateElement { kind: ElementKind, element: ElementId },
}

/// An element that references a node missing from the node table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DanglingReference {
    pub kind: ElementKind,
    pub element: ElementId,
    pub node: NodeId,
}

/// Counts per element kind, for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct MeshStatistics {
    pub num_nodes: usize,
    pub num_elements: usize,
    pub per_kind: BTreeMap<ElementKind, usize>,
}

/// Normalized mesh: node table plus one connectivity mapping per element kind.
///
/// All twelve buckets are always reachable through [`CanonicalMesh::elements`],
/// even when a source never populates them. A mesh with no nodes is considered
/// absent, whatever elements it holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalMesh {
    nodes: BTreeMap<NodeId, Point3>,
    elements: BTreeMap<ElementKind, Bucket>,
}

impl Default for CanonicalMesh {
    fn default() -> Self {
        Self::new()
    }
}

impl CanonicalMesh {
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
            elements: ElementKind::ALL
                .into_iter()
                .map(|kind| (kind, Bucket::new()))
                .collect(),
        }
    }

    /// Insert a node; ids are unique and nodes never change once inserted.
    pub fn add_node(&mut self, id: NodeId, point: Point3) -> Result<(), MeshError> {
        if self.nodes.contains_key(&id) {
            return Err(MeshError::DuplicateNode(id));
        }
        self.nodes.insert(id, point);
        Ok(())
    }

    /// Insert an element after checking its node count against the kind.
    pub fn add_element(
        &mut self,
        kind: ElementKind,
        id: ElementId,
        nodes: Vec<NodeId>,
    ) -> Result<(), MeshError> {
        let expected = kind.node_count();
        if nodes.len() != expected {
            return Err(MeshError::NodeCount {
                kind,
                element: id,
                expected,
                actual: nodes.len(),
            });
        }
        let bucket = self.elements.entry(kind).or_default();
        if bucket.contains_key(&id) {
            return Err(MeshError::DuplicateElement { kind, element: id });
        }
        bucket.insert(id, nodes);
        Ok(())
    }

    pub fn nodes(&self) -> &BTreeMap<NodeId, Point3> {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&Point3> {
        self.nodes.get(&id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// True when the node table is empty ("no nodes found").
    pub fn is_absent(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn elements(&self, kind: ElementKind) -> &BTreeMap<ElementId, Vec<NodeId>> {
        self.elements.get(&kind).unwrap_or(&EMPTY_BUCKET)
    }

    pub fn seg2(&self) -> &BTreeMap<ElementId, Vec<NodeId>> {
        self.elements(ElementKind::Seg2)
    }

    pub fn element_count(&self) -> usize {
        self.elements.values().map(BTreeMap::len).sum()
    }

    /// Kinds with at least one element, in bucket order.
    pub fn populated_kinds(&self) -> Vec<ElementKind> {
        ElementKind::ALL
            .into_iter()
            .filter(|kind| !self.elements(*kind).is_empty())
            .collect()
    }

    /// Every (element, node) pair whose node is missing from the node table.
    pub fn dangling_references(&self) -> Vec<DanglingReference> {
        let mut dangling = Vec::new();
        for kind in ElementKind::ALL {
            for (element, nodes) in self.elements(kind) {
                for node in nodes {
                    if !self.nodes.contains_key(node) {
                        dangling.push(DanglingReference {
                            kind,
                            element: *element,
                            node: *node,
                        });
                    }
                }
            }
        }
        dangling
    }

    /// Drop every element that references a missing node.
    ///
    /// Returns the dangling references of the removed elements.
    pub fn remove_dangling(&mut self) -> Vec<DanglingReference> {
        let dangling = self.dangling_references();
        for reference in &dangling {
            if let Some(bucket) = self.elements.get_mut(&reference.kind) {
                bucket.remove(&reference.element);
            }
        }
        dangling
    }

    pub fn statistics(&self) -> MeshStatistics {
        MeshStatistics {
            num_nodes: self.nodes.len(),
            num_elements: self.element_count(),
            per_kind: ElementKind::ALL
                .into_iter()
                .map(|kind| (kind, self.elements(kind).len()))
                .filter(|(_, count)| *count > 0)
                .collect(),
        }
    }
}
