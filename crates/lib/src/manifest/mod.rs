//! Results manifests left behind by a pipeline step.
//!
//! A step writes one or more `results.json` files describing the files it
//! produced, either loose or grouped into named containers. This module finds
//! those files and loads them into a single [`ResultManifest`].

mod reader;
mod types;

pub use reader::*;
pub use types::*;
