//! Canonical mesh and result model shared by every femx reader.
//!
//! Readers normalize their formats into a [`CanonicalMesh`] (a node table plus
//! one connectivity mapping per [`ElementKind`]) and an ordered list of
//! [`ResultSet`]s, one per load case, eigenmode or time step.

mod mesh;
mod results;

pub use mesh::{
    CanonicalMesh, DanglingReference, ElementId, ElementKind, MeshError, MeshStatistics, NodeId,
    Point3,
};
pub use results::{ResultKind, ResultSet};
