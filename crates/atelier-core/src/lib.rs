//! # atelier-core
//!
//! Core types, traits, and upload validation for the atelier media backend.
//!
//! This crate provides the foundational data structures and trait
//! definitions that the other atelier crates depend on: the media catalog
//! entities, the error taxonomy, upload validation rules, content hashing,
//! and shared defaults.

pub mod content_hash;
pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;
pub mod validation;

// Re-export commonly used types at crate root
pub use content_hash::compute_content_hash;
pub use error::{Error, Result};
pub use models::{MediaAsset, MediaKind, MediaVariant, NewMediaAsset, VariantMap};
pub use traits::{ListMediaRequest, ListMediaResponse, MediaCatalog};
pub use validation::{
    file_extension, is_allowed_content_type, is_allowed_extension, sanitize_display_filename,
    validate_upload,
};
