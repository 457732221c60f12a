//! Rating Engine
//!
//! Converts raw engagement counters into 0-100 scores:
//! - [`artifacts`]: performers, studios and tags, from the scenes they appear in
//! - [`scenes`]: scenes, from their already-rated studio, tags and performers
//! - [`write_back`]: throttled push of computed ratings to the catalog
//! - [`run`]: the full catalog pass (fetch, rate each population, rate scenes)
//!
//! Scores are always recomputed; nothing here is persisted between runs.

pub mod artifacts;
pub mod run;
pub mod scenes;
pub mod statistics;
pub mod write_back;

use std::cmp::Ordering;

pub use artifacts::{rate_artifact, rate_artifacts};
pub use run::{rate_catalog, CatalogRatings};
pub use scenes::{rate_scenes, SceneScorer};
pub use statistics::{divide, ArtifactAverages, SceneAverages};
pub use write_back::{RatingWriter, WriteBackSummary};

/// Outcome of scoring one entity
#[derive(Debug, Clone, PartialEq)]
pub struct RatingResult {
    /// Engagement used for tie-breaking (liked-scene total for artifacts)
    pub engagement: u64,
    /// Integer score in `[0, 100]`
    pub score: u8,
    /// Arithmetic expression with the concrete values used
    pub formula: String,
    /// The same expression with named terms
    pub explanation: &'static str,
}

/// An entity paired with its computed rating
#[derive(Debug, Clone, PartialEq)]
pub struct Rated<T> {
    pub base: T,
    pub rating: RatingResult,
}

impl<T> Rated<T> {
    pub fn new(base: T, rating: RatingResult) -> Self {
        Self { base, rating }
    }

    pub fn score(&self) -> u8 {
        self.rating.score
    }
}

/// Descending score, ties broken by descending engagement
///
/// Stable: entities equal on both keys keep their input order.
pub fn rank<T>(rated: &mut [Rated<T>]) {
    rated.sort_by(|a, b| compare_rank(&a.rating, &b.rating));
}

fn compare_rank(a: &RatingResult, b: &RatingResult) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| b.engagement.cmp(&a.engagement))
}

/// Floor a raw score and clamp it into `[0, 100]`
pub(crate) fn clamp_score(raw: f64) -> u8 {
    if !raw.is_finite() || raw <= 0.0 {
        return 0;
    }
    raw.floor().min(100.0) as u8
}
