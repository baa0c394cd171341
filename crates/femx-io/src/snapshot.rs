use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ingest::IngestionResult;

pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// JSON export of one ingestion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub schema_version: u32,
    /// RFC 3339 time the snapshot was written, when the writer records one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
    pub result: IngestionResult,
}

impl Snapshot {
    pub fn new(result: IngestionResult) -> Self {
        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            generated_at: None,
            result,
        }
    }

    pub fn generated_at(mut self, timestamp: impl Into<String>) -> Self {
        self.generated_at = Some(timestamp.into());
        self
    }
}

/// Write `snapshot` as pretty JSON, creating missing parent directories.
pub fn save_snapshot(path: impl AsRef<Path>, snapshot: &Snapshot) -> io::Result<()> {
    let path = path.as_ref();
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, snapshot)?;
    writer.flush()
}

/// Read a snapshot written by [`save_snapshot`] with the current schema version.
pub fn load_snapshot(path: impl AsRef<Path>) -> io::Result<Snapshot> {
    let bytes = fs::read(path)?;
    let snapshot: Snapshot = serde_json::from_slice(&bytes)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
    if snapshot.schema_version != SNAPSHOT_SCHEMA_VERSION {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "unsupported snapshot schema version {} (expected {SNAPSHOT_SCHEMA_VERSION})",
                snapshot.schema_version
            ),
        ));
    }
    Ok(snapshot)
}
