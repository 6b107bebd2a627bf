//! The document sink seam.

use std::path::Path;

use gitdocx_shared::Result;

use crate::document::FolderDocument;

/// Serializes a finished [`FolderDocument`] into a container file.
pub trait DocumentSink: Send + Sync {
    /// File extension (without the dot) of what [`DocumentSink::finalize`] writes.
    fn extension(&self) -> &str;

    /// Write `doc` to `path`, replacing any existing file.
    fn finalize(&self, doc: &FolderDocument, path: &Path) -> Result<()>;
}
