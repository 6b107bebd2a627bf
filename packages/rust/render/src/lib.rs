//! Document model and output sinks.
//!
//! - [`document`]: [`FolderDocument`], an ordered list of style-tagged [`Block`]s
//! - [`sink`]: the [`DocumentSink`] trait
//! - [`docx`]: [`DocxSink`], the `.docx` writer

pub mod document;
pub mod docx;
pub mod sink;

pub use document::{Block, CODE_SHADING, FileSection, FolderDocument, Shading, clean_text};
pub use docx::DocxSink;
pub use sink::DocumentSink;
