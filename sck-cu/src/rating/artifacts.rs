//! Artifact scoring (performers, studios, tags)
//!
//! **Formula:**
//! ```text
//! likedSceneRatio    = likedScenes / associatedScenes
//! oCountMultiplier   = likedEngagement / (avgLikesPerArtifact * 3)
//! sceneCountPenalty  = min(1, associatedScenes / (avgScenesPerArtifact * 2))
//! favoriteMultiplier = 1.1 if favorite else 1
//! score = floor(likedSceneRatio * oCountMultiplier * sceneCountPenalty * favoriteMultiplier * 100)
//! ```

use sck_common::models::Artifact;
use sck_common::Scene;
use tracing::info;

use super::statistics::{divide, total_engagement, ArtifactAverages};
use super::{clamp_score, rank, Rated, RatingResult};

const FAVORITE_MULTIPLIER: f64 = 1.1;

const ARTIFACT_EXPLANATION: &str =
    "likedSceneRatio * oCountMultiplier * sceneCountPenalty * favoriteMultiplier * 100";

/// Score one artifact against its population averages
pub fn rate_artifact<A: Artifact>(
    artifact: &A,
    scenes: &[Scene],
    averages: &ArtifactAverages,
) -> RatingResult {
    let associated: Vec<&Scene> = scenes
        .iter()
        .filter(|s| s.references(A::KIND, artifact.id()))
        .collect();
    let liked: Vec<&Scene> = associated.iter().copied().filter(|s| s.is_liked()).collect();
    let liked_engagement = total_engagement(liked.iter().copied());

    let liked_scene_ratio = divide(liked.len() as f64, associated.len() as f64);
    let o_count_multiplier = divide(
        liked_engagement as f64,
        averages.avg_likes_per_artifact * 3.0,
    );
    let scene_count_penalty = divide(
        associated.len() as f64,
        averages.avg_scenes_per_artifact * 2.0,
    )
    .min(1.0);
    let favorite_multiplier = if artifact.is_favorite() {
        FAVORITE_MULTIPLIER
    } else {
        1.0
    };

    let score = clamp_score(
        liked_scene_ratio * o_count_multiplier * scene_count_penalty * favorite_multiplier * 100.0,
    );

    RatingResult {
        engagement: liked_engagement,
        score,
        formula: format!(
            "{} * {} * {} * {} * 100",
            liked_scene_ratio, o_count_multiplier, scene_count_penalty, favorite_multiplier
        ),
        explanation: ARTIFACT_EXPLANATION,
    }
}

/// Rate every artifact of one kind and rank the result
///
/// `scenes` is the population for this kind (e.g. scenes that have a studio
/// when rating studios); averages are computed over it.
pub fn rate_artifacts<A: Artifact + Clone>(artifacts: &[A], scenes: &[Scene]) -> Vec<Rated<A>> {
    let averages = ArtifactAverages::compute(artifacts.len(), scenes);

    info!(
        kind = A::KIND.label(),
        artifacts = artifacts.len(),
        scenes = scenes.len(),
        avg_likes = averages.avg_likes_per_artifact,
        avg_scenes = averages.avg_scenes_per_artifact,
        "Rating {}s",
        A::KIND.label()
    );

    let mut rated: Vec<Rated<A>> = artifacts
        .iter()
        .map(|artifact| Rated::new(artifact.clone(), rate_artifact(artifact, scenes, &averages)))
        .collect();
    rank(&mut rated);
    rated
}
