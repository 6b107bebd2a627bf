//! Shared types, error model, and configuration for GitDocx.
//!
//! This crate is the foundation depended on by all other GitDocx crates.
//! It provides:
//! - [`GitDocxError`]: the unified error type
//! - Domain types ([`TreeNode`], [`SavedArtifact`], [`JobId`], [`JobStatus`])
//! - Configuration ([`AppConfig`], [`CrawlConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CrawlConfig, DefaultsConfig, GitHubConfig, ServerConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from, resolve_token,
    validate_config,
};
pub use error::{GitDocxError, Result};
pub use types::{
    CURRENT_SCHEMA_VERSION, DEFAULT_EXTENSIONS, JobId, JobStatus, Layout, NodeKind,
    ProgressSnapshot, ROOT_FOLDER, RunManifest, SavedArtifact, TreeNode,
};
