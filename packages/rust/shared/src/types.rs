//! Core domain types for GitDocx runs and jobs.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Folder name used for files that sit directly at the top of a listing path.
pub const ROOT_FOLDER: &str = "Root";

/// Extensions rendered when the caller does not choose any.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".cpp", ".h", ".hpp", ".py", ".js"];

/// Current schema version for the run manifest format.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// TreeNode
// ---------------------------------------------------------------------------

/// Kind of an entry in a remote directory listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Dir,
    /// Symlinks, submodules and anything else the walk ignores.
    #[serde(other)]
    Other,
}

/// One entry of a remote directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Entry name (last path segment).
    pub name: String,
    /// Path relative to the repository root.
    pub path: String,
    /// API address for listing this entry.
    pub url: String,
    /// Raw content address; absent for directories.
    #[serde(default)]
    pub download_url: Option<String>,
}

impl TreeNode {
    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Dir
    }
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// How matched files are grouped into output documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layout {
    /// One document per immediate parent folder name.
    #[default]
    ByFolder,
    /// Every matched file in a single document.
    Single,
}

impl std::fmt::Display for Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Layout::ByFolder => write!(f, "by-folder"),
            Layout::Single => write!(f, "single"),
        }
    }
}

impl std::str::FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "by-folder" => Ok(Layout::ByFolder),
            "single" => Ok(Layout::Single),
            other => Err(format!(
                "unknown layout '{other}': expected 'by-folder' or 'single'"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Artifacts
// ---------------------------------------------------------------------------

/// A document written to disk at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedArtifact {
    /// Folder (or report title) the document aggregates.
    pub folder: String,
    /// File name inside the output directory.
    pub filename: String,
    /// Full path of the written document.
    pub path: PathBuf,
    /// SHA-256 of the written bytes.
    pub sha256: String,
    pub size_bytes: u64,
}

/// The `manifest.json` written next to the documents of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub schema_version: u32,
    /// Browser address the run was started from.
    pub source_url: String,
    pub generated_at: DateTime<Utc>,
    pub tool_version: String,
    pub extensions: Vec<String>,
    pub layout: Layout,
    pub artifacts: Vec<SavedArtifact>,
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for job identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub Uuid);

impl JobId {
    /// Generate a new time-sortable job identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Error,
}

impl JobStatus {
    /// `completed` and `error` never change once reached.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }
}

/// Point-in-time view of a tracked run's progress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub processed: usize,
    pub total: usize,
    pub current_file: String,
    pub detail_status: String,
}
