//! Output generation for extraction results.
//!
//! # Submodules
//!
//! - [`json`]: Serializes results to info JSON on stdout or in per-id files

pub mod json;
