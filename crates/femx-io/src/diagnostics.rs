//! Diagnostic channel shared by every reader.
//!
//! Recoverable problems (unsupported element codes, missing companion files,
//! truncated optional sections) never abort ingestion. They are collected here
//! and each entry is also emitted as a `tracing` event when it is recorded.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Short area tag: "header", "element", "node", "result", "companion", ...
    pub category: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl Diagnostic {
    fn new(severity: Severity, category: &str, message: impl Into<String>) -> Self {
        Self {
            severity,
            category: category.to_string(),
            message: message.into(),
            file: None,
            line: None,
        }
    }

    pub fn info(category: &str, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, category, message)
    }

    pub fn warning(category: &str, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, category, message)
    }

    pub fn error(category: &str, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, category, message)
    }

    pub fn in_file(mut self, path: &Path) -> Self {
        self.file = Some(path.to_path_buf());
        self
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{severity} [{}]", self.category)?;
        match (&self.file, self.line) {
            (Some(file), Some(line)) => write!(f, " {}:{line}", file.display())?,
            (Some(file), None) => write!(f, " {}", file.display())?,
            (None, Some(line)) => write!(f, " line {line}")?,
            (None, None) => {}
        }
        write!(f, ": {}", self.message)
    }
}

/// Ordered list of diagnostics for one ingestion call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and emit it on the log.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        let file = diagnostic
            .file
            .as_deref()
            .map(|path| path.display().to_string())
            .unwrap_or_default();
        match diagnostic.severity {
            Severity::Info => tracing::info!(
                category = %diagnostic.category,
                file = %file,
                line = ?diagnostic.line,
                "{}",
                diagnostic.message
            ),
            Severity::Warning => tracing::warn!(
                category = %diagnostic.category,
                file = %file,
                line = ?diagnostic.line,
                "{}",
                diagnostic.message
            ),
            Severity::Error => tracing::error!(
                category = %diagnostic.category,
                file = %file,
                line = ?diagnostic.line,
                "{}",
                diagnostic.message
            ),
        }
        self.entries.push(diagnostic);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.entries
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    /// Whether any entry of `severity` mentions `needle`.
    pub fn mentions(&self, severity: Severity, needle: &str) -> bool {
        self.entries
            .iter()
            .any(|d| d.severity == severity && d.message.contains(needle))
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }
}
