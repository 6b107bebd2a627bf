//! Per-folder document aggregation.
//!
//! Each matched file is routed to the document of its immediate parent
//! directory name. Documents are created lazily with a cover the first time a
//! folder shows up and are written out together once the walk is over.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Local};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

use gitdocx_crawler::FileEvent;
use gitdocx_render::{DocumentSink, FileSection, FolderDocument};
use gitdocx_shared::{GitDocxError, Layout, ROOT_FOLDER, Result, SavedArtifact};

/// Characters that cannot appear in an output file name.
const ILLEGAL_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Owns the folder name → document mapping for one run.
#[derive(Debug)]
pub struct FolderAggregator {
    source_url: String,
    layout: Layout,
    title: String,
    generated_at: DateTime<Local>,
    documents: HashMap<String, FolderDocument>,
    /// Folder names in the order they were first seen.
    order: Vec<String>,
}

impl FolderAggregator {
    /// `title` names the one document produced under [`Layout::Single`].
    pub fn new(source_url: impl Into<String>, layout: Layout, title: impl Into<String>) -> Self {
        Self::with_timestamp(source_url, layout, title, Local::now())
    }

    /// Like [`FolderAggregator::new`] with a fixed cover timestamp.
    pub fn with_timestamp(
        source_url: impl Into<String>,
        layout: Layout,
        title: impl Into<String>,
        generated_at: DateTime<Local>,
    ) -> Self {
        Self {
            source_url: source_url.into(),
            layout,
            title: title.into(),
            generated_at,
            documents: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Append `content` as a section of the file's folder document.
    ///
    /// Returns the folder name the file was routed to.
    pub fn route(&mut self, event: &FileEvent, content: String) -> String {
        let folder = match self.layout {
            Layout::ByFolder => folder_name_for_path(&event.node.path).to_string(),
            Layout::Single => self.title.clone(),
        };

        let doc = self.documents.entry(folder.clone()).or_insert_with(|| {
            debug!(%folder, "new folder document");
            self.order.push(folder.clone());
            FolderDocument::new(folder.clone(), &self.source_url, self.generated_at)
        });
        doc.push_section(FileSection {
            name: event.node.name.clone(),
            path: event.node.path.clone(),
            content,
        });

        folder
    }

    pub fn document(&self, folder: &str) -> Option<&FolderDocument> {
        self.documents.get(folder)
    }

    /// Documents in first-seen order.
    pub fn documents(&self) -> impl Iterator<Item = &FolderDocument> {
        self.order.iter().filter_map(|name| self.documents.get(name))
    }

    pub fn folder_count(&self) -> usize {
        self.order.len()
    }

    /// Total sections appended across every document.
    pub fn section_count(&self) -> usize {
        self.documents.values().map(FolderDocument::section_count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Write every document into `output_dir` as `<sanitized folder>.<ext>`.
    ///
    /// A document the sink fails on is logged and left out of the result;
    /// the others are still written. Sanitized names that collide overwrite
    /// each other and only the last one is reported.
    #[instrument(skip_all, fields(output_dir = %output_dir.display(), folders = self.order.len()))]
    pub fn save_all(&self, output_dir: &Path, sink: &dyn DocumentSink) -> Result<Vec<SavedArtifact>> {
        std::fs::create_dir_all(output_dir).map_err(|e| GitDocxError::io(output_dir, e))?;

        let mut artifacts: Vec<SavedArtifact> = Vec::with_capacity(self.order.len());

        for doc in self.documents() {
            let filename = format!("{}.{}", sanitize_folder_name(doc.name()), sink.extension());
            let path = output_dir.join(&filename);

            if let Err(e) = sink.finalize(doc, &path) {
                warn!(folder = %doc.name(), error = %e, "failed to write document, skipping");
                continue;
            }

            let bytes = match std::fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "written document is unreadable, skipping");
                    continue;
                }
            };

            artifacts.retain(|a| a.filename != filename);
            artifacts.push(SavedArtifact {
                folder: doc.name().to_string(),
                filename,
                path,
                sha256: sha256_hex(&bytes),
                size_bytes: bytes.len() as u64,
            });
        }

        info!(count = artifacts.len(), "documents saved");
        Ok(artifacts)
    }
}

/// Immediate parent directory name of a `/`-separated path, or [`ROOT_FOLDER`].
pub fn folder_name_for_path(path: &str) -> &str {
    let mut segments = path.rsplit('/').filter(|s| !s.is_empty());
    segments.next();
    segments.next().unwrap_or(ROOT_FOLDER)
}

/// Replace characters illegal in file names with `_` and trim whitespace.
pub fn sanitize_folder_name(name: &str) -> String {
    name.chars()
        .map(|c| if ILLEGAL_FILENAME_CHARS.contains(&c) { '_' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
