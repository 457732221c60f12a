//! # SCK Common Library
//!
//! Shared code for the Stash curation kit:
//! - Catalog data model (performers, studios, tags, scenes)
//! - The `Catalog` capability trait and its query filters
//! - Configuration loading
//! - Common error type

pub mod catalog;
pub mod config;
pub mod error;
pub mod models;

pub use catalog::{ArtifactFilter, Catalog, RatingTarget, SceneFilter};
pub use error::{Error, Result};
pub use models::{Artifact, ArtifactKind, Gender, Performer, Scene, Studio, StudioRef, Tag, VideoFile};
