//! Remote tree access and traversal.
//!
//! This crate provides:
//! - [`address`]: browser address → contents-API listing target
//! - [`client`]: the [`ContentSource`] seam and its GitHub implementation
//! - [`natural`]: natural ordering keys for entry names
//! - [`walker`]: depth-first, natural-order walk emitting matching files

pub mod address;
pub mod client;
pub mod natural;
pub mod walker;

pub use address::{ListingTarget, RepoAddress, parse_address, translate};
pub use client::{ContentSource, GitHubClient, decode_listing};
pub use natural::{NaturalKey, natural_key, sort_natural};
pub use walker::{ExtensionFilter, FileEvent, Walk, WalkEvent, count_matching};
