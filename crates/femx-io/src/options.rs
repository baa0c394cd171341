//! Ingestion options.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::elmer::ElmerMode;
use crate::frame3dd::{FrameMode, INOUT_SUFFIX};
use crate::ingest::SourceFormat;

/// Options for one [`Ingestor`](crate::Ingestor).
///
/// Every field has a default, so a JSON file only needs the keys it changes:
///
/// ```json
/// { "elmer_mode": "boundary", "validate_references": false }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestOptions {
    /// Forced format; detected from the path when `None`
    pub format: Option<SourceFormat>,
    pub elmer_mode: ElmerMode,
    /// Forced Frame3DD mode; `.out` means results when `None`
    pub frame_mode: Option<FrameMode>,
    /// Suffix replacing the extension to locate the inout-nodes companion
    pub companion_suffix: String,
    /// Warn about result values for node ids missing from the node table
    pub validate_references: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            format: None,
            elmer_mode: ElmerMode::Volume,
            frame_mode: None,
            companion_suffix: INOUT_SUFFIX.to_string(),
            validate_references: true,
        }
    }
}

impl IngestOptions {
    pub fn with_format(mut self, format: SourceFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_elmer_mode(mut self, mode: ElmerMode) -> Self {
        self.elmer_mode = mode;
        self
    }

    pub fn with_frame_mode(mut self, mode: FrameMode) -> Self {
        self.frame_mode = Some(mode);
        self
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> io::Result<Self> {
        let bytes = fs::read(path)?;
        serde_json::from_slice(&bytes).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
    }
}
