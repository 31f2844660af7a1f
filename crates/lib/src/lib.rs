//! stepcache-lib: caching of pipeline step results
//!
//! This crate provides the pieces used to cache the outputs of one workflow step
//! for the next one:
//! - `PathMap`: ordered source/destination prefix rewrites
//! - `ResultManifest`: the containers and files a step produced
//! - `MetadataWriter`: sidecar files holding per-file and per-container metadata
//! - `CacheEngine`: verifies, copies and records, then writes the listing consumed
//!   by the workflow templating engine

pub mod cache;
pub mod consts;
pub mod manifest;
pub mod metadata;
pub mod observe;
pub mod path_map;
