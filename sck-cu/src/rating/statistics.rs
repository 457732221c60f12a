//! Population statistics used as normalization denominators
//!
//! All ratios are rounded to 4 decimal places so formula traces are
//! reproducible. Division by zero yields 0: an empty catalog is valid input.

use sck_common::Scene;

use super::Rated;

/// Divide and round to 4 decimal places, `0` when `b == 0`
pub fn divide(a: f64, b: f64) -> f64 {
    if b == 0.0 {
        return 0.0;
    }
    round4(a / b)
}

pub(crate) fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Sum of engagement counters across scenes
pub fn total_engagement<'a>(scenes: impl IntoIterator<Item = &'a Scene>) -> u64 {
    scenes.into_iter().map(|s| s.engagement as u64).sum()
}

/// Averages over one artifact kind and the scenes associated with it
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ArtifactAverages {
    pub avg_likes_per_artifact: f64,
    pub avg_scenes_per_artifact: f64,
}

impl ArtifactAverages {
    /// `avgLikesPerArtifact = totalEngagement(scenes) / count(artifacts)`,
    /// `avgScenesPerArtifact = count(scenes) / count(artifacts)`
    pub fn compute(artifact_count: usize, scenes: &[Scene]) -> Self {
        let artifacts = artifact_count as f64;
        Self {
            avg_likes_per_artifact: divide(total_engagement(scenes) as f64, artifacts),
            avg_scenes_per_artifact: divide(scenes.len() as f64, artifacts),
        }
    }
}

/// Averages needed to score scenes
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SceneAverages {
    pub avg_likes_per_liked_scene: f64,
    pub avg_studio_score: f64,
    pub avg_tag_score: f64,
    pub avg_performer_score: f64,
}

impl SceneAverages {
    pub fn compute<S, T, P>(
        scenes: &[Scene],
        studios: &[Rated<S>],
        tags: &[Rated<T>],
        performers: &[Rated<P>],
    ) -> Self {
        let liked: Vec<&Scene> = scenes.iter().filter(|s| s.is_liked()).collect();
        Self {
            avg_likes_per_liked_scene: divide(
                total_engagement(liked.iter().copied()) as f64,
                liked.len() as f64,
            ),
            avg_studio_score: average_score(studios),
            avg_tag_score: average_score(tags),
            avg_performer_score: average_score(performers),
        }
    }
}

/// Mean score of a rated population (0 when empty)
pub fn average_score<T>(rated: &[Rated<T>]) -> f64 {
    let total: u64 = rated.iter().map(|r| r.rating.score as u64).sum();
    divide(total as f64, rated.len() as f64)
}
