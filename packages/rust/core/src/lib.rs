//! Core pipeline orchestration and domain logic for GitDocx.
//!
//! This crate ties together the tree walk, content download, folder
//! aggregation and document output into the end-to-end `convert` workflow.

pub mod aggregator;
pub mod cancel;
pub mod pipeline;
pub mod progress;

pub use aggregator::{FolderAggregator, folder_name_for_path, sanitize_folder_name};
pub use cancel::CancelToken;
pub use pipeline::{
    ConvertConfig, ConvertResult, DEFAULT_TITLE, MANIFEST_FILE, RunMode, convert, convert_tracked,
    convert_with,
};
pub use progress::{ProgressReporter, ProgressTracker, SilentProgress, labels};
