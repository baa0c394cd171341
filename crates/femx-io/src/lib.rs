//! Mesh and result ingestion for Elmer, Frame3DD and SU2 sources.
//!
//! This crate provides:
//! - **Elmer** mesh directories (`mesh.header`, `mesh.nodes`, `mesh.elements` /
//!   `mesh.boundary`), volume or boundary view
//! - **Frame3DD** input cases (`.3dd`) and analysis reports (`.out`) with
//!   elastic and modal displacement results
//! - **SU2** native meshes, single- and multi-zone
//! - An **element-type registry** mapping every format's type codes onto the
//!   canonical element kinds
//! - **Diagnostics** for recoverable problems, mirrored to `tracing`
//! - **JSON snapshots** of an ingestion
//!
//! Start with [`Ingestor`]:
//!
//! ```no_run
//! use femx_io::{IngestOptions, Ingestor};
//!
//! let result = Ingestor::new(IngestOptions::default()).ingest("wing.su2");
//! println!("{} nodes, {} result sets", result.mesh.node_count(), result.increments());
//! ```

mod diagnostics;
pub mod elmer;
mod error;
pub mod frame3dd;
mod ingest;
mod mesh_builder;
mod options;
pub mod registry;
mod results;
mod snapshot;
pub mod su2;

pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use elmer::{ElmerHeader, ElmerMesh, ElmerMeshReader, ElmerMode};
pub use error::{IngestError, Result};
pub use frame3dd::{Frame3ddReader, FrameHeader, FrameMode, FrameModel, read_inout_nodes};
pub use ingest::{IngestStatus, IngestionResult, Ingestor, SourceFormat, ingest};
pub use mesh_builder::ParsedSource;
pub use options::IngestOptions;
pub use registry::{Classification, CodeEntry, CodeSpace, ElementTypeRegistry};
pub use results::{DisplacementBlock, ResultSetBuilder};
pub use snapshot::{SNAPSHOT_SCHEMA_VERSION, Snapshot, load_snapshot, save_snapshot};
pub use su2::{Su2Mesh, Su2MeshReader, Su2Zone};
