//! Scene scoring
//!
//! A scene's score derives from the scores of the studio, tags and
//! performers it is linked to, boosted by its own engagement:
//!
//! ```text
//! averageArtifactScore = floor(mean(studioScore, tagScores..., performerScores...))
//! oCountMultiplier     = engagement / avgLikesPerLikedScene / 20 + 1
//! score                = min(100, floor(averageArtifactScore * oCountMultiplier))
//! ```
//!
//! A scene nobody engaged with has no behavioral signal, so it gets the
//! average tag score instead.

use std::collections::HashMap;

use sck_common::{Performer, Scene, Studio, Tag};
use tracing::info;

use super::statistics::{divide, round4, SceneAverages};
use super::{clamp_score, rank, Rated, RatingResult};

const SCENE_EXPLANATION: &str = "averageArtifactScore * oCountMultiplier";
const UNLIKED_EXPLANATION: &str = "No engagement so using avgTagScore";

/// Scores scenes against already-rated studios, tags and performers
pub struct SceneScorer {
    averages: SceneAverages,
    studio_scores: HashMap<String, u8>,
    tag_scores: HashMap<String, u8>,
    performer_scores: HashMap<String, u8>,
}

impl SceneScorer {
    /// Index the rated populations and compute averages over `scenes`
    pub fn new(
        scenes: &[Scene],
        studios: &[Rated<Studio>],
        tags: &[Rated<Tag>],
        performers: &[Rated<Performer>],
    ) -> Self {
        let averages = SceneAverages::compute(scenes, studios, tags, performers);
        Self::with_averages(averages, studios, tags, performers)
    }

    /// Use precomputed averages (lets callers pin the denominators)
    pub fn with_averages(
        averages: SceneAverages,
        studios: &[Rated<Studio>],
        tags: &[Rated<Tag>],
        performers: &[Rated<Performer>],
    ) -> Self {
        Self {
            averages,
            studio_scores: studios
                .iter()
                .map(|r| (r.base.id.clone(), r.rating.score))
                .collect(),
            tag_scores: tags
                .iter()
                .map(|r| (r.base.id.clone(), r.rating.score))
                .collect(),
            performer_scores: performers
                .iter()
                .map(|r| (r.base.id.clone(), r.rating.score))
                .collect(),
        }
    }

    pub fn averages(&self) -> &SceneAverages {
        &self.averages
    }

    /// Floored mean of the scene's associated artifact scores
    ///
    /// Each kind with no rated association contributes its population
    /// average instead, so under-tagged scenes are not dragged to zero.
    pub fn average_artifact_score(&self, scene: &Scene) -> u32 {
        let studio_score = scene
            .studio
            .as_ref()
            .and_then(|s| self.studio_scores.get(&s.id))
            .map(|&score| score as f64)
            .unwrap_or(self.averages.avg_studio_score);

        let tag_scores = scores_or_average(
            scene.tags.iter().map(|t| t.id.as_str()),
            &self.tag_scores,
            self.averages.avg_tag_score,
        );
        let performer_scores = scores_or_average(
            scene.performers.iter().map(|p| p.id.as_str()),
            &self.performer_scores,
            self.averages.avg_performer_score,
        );

        let mut all = Vec::with_capacity(1 + tag_scores.len() + performer_scores.len());
        all.push(studio_score);
        all.extend(tag_scores);
        all.extend(performer_scores);

        let mean = all.iter().sum::<f64>() / all.len() as f64;
        mean.floor().max(0.0) as u32
    }

    pub fn rate(&self, scene: &Scene) -> RatingResult {
        if scene.engagement == 0 {
            return RatingResult {
                engagement: 0,
                score: clamp_score(self.averages.avg_tag_score),
                formula: "avgTagScore".to_string(),
                explanation: UNLIKED_EXPLANATION,
            };
        }

        let average_artifact_score = self.average_artifact_score(scene);
        let o_count_multiplier = if self.averages.avg_likes_per_liked_scene > 0.0 {
            round4(scene.engagement as f64 / self.averages.avg_likes_per_liked_scene / 20.0 + 1.0)
        } else {
            1.0
        };

        RatingResult {
            engagement: scene.engagement as u64,
            score: clamp_score(average_artifact_score as f64 * o_count_multiplier),
            formula: format!("{} * {}", average_artifact_score, o_count_multiplier),
            explanation: SCENE_EXPLANATION,
        }
    }
}

fn scores_or_average<'a>(
    ids: impl Iterator<Item = &'a str>,
    index: &HashMap<String, u8>,
    average: f64,
) -> Vec<f64> {
    let scores: Vec<f64> = ids
        .filter_map(|id| index.get(id))
        .map(|&score| score as f64)
        .collect();
    if scores.is_empty() {
        vec![average]
    } else {
        scores
    }
}

/// Rate every scene and rank the result
pub fn rate_scenes(
    scenes: &[Scene],
    studios: &[Rated<Studio>],
    tags: &[Rated<Tag>],
    performers: &[Rated<Performer>],
) -> Vec<Rated<Scene>> {
    let scorer = SceneScorer::new(scenes, studios, tags, performers);
    let averages = scorer.averages();

    info!(
        scenes = scenes.len(),
        avg_studio_score = averages.avg_studio_score,
        avg_tag_score = averages.avg_tag_score,
        avg_performer_score = averages.avg_performer_score,
        avg_likes_per_liked_scene = averages.avg_likes_per_liked_scene,
        "Rating scenes"
    );

    let mut rated: Vec<Rated<Scene>> = scenes
        .iter()
        .map(|scene| Rated::new(scene.clone(), scorer.rate(scene)))
        .collect();
    rank(&mut rated);
    rated
}

/// Share of liked scenes, used in run summaries
pub fn liked_share(scenes: &[Scene]) -> f64 {
    let liked = scenes.iter().filter(|s| s.is_liked()).count();
    divide(liked as f64, scenes.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rated_tag(id: &str, score: u8) -> Rated<Tag> {
        Rated::new(
            Tag {
                id: id.to_string(),
                name: id.to_string(),
                favorite: false,
                engagement: 0,
                scene_count: 1,
            },
            RatingResult {
                engagement: 0,
                score,
                formula: String::new(),
                explanation: "",
            },
        )
    }

    fn scene(engagement: u32, tag_ids: &[&str]) -> Scene {
        Scene {
            id: "s".to_string(),
            title: None,
            date: None,
            details: None,
            rating: None,
            engagement,
            studio: None,
            tags: tag_ids.iter().map(|id| rated_tag(id, 0).base).collect(),
            performers: vec![],
            files: vec![],
        }
    }

    #[test]
    fn test_missing_associations_use_population_averages() {
        let averages = SceneAverages {
            avg_likes_per_liked_scene: 2.0,
            avg_studio_score: 30.0,
            avg_tag_score: 40.0,
            avg_performer_score: 50.0,
        };
        let scorer = SceneScorer::with_averages(averages, &[], &[], &[]);
        // mean(30, 40, 50) = 40
        assert_eq!(scorer.average_artifact_score(&scene(1, &[])), 40);
    }

    #[test]
    fn test_unrated_tags_fall_back_to_average() {
        let averages = SceneAverages {
            avg_likes_per_liked_scene: 2.0,
            avg_studio_score: 0.0,
            avg_tag_score: 60.0,
            avg_performer_score: 0.0,
        };
        let scorer = SceneScorer::with_averages(averages, &[], &[rated_tag("known", 90)], &[]);
        assert_eq!(scorer.average_artifact_score(&scene(1, &["unknown"])), 20);
        assert_eq!(scorer.average_artifact_score(&scene(1, &["known", "unknown"])), 30);
    }

    #[test]
    fn test_liked_scene_formula() {
        let averages = SceneAverages {
            avg_likes_per_liked_scene: 2.0,
            avg_studio_score: 60.0,
            avg_tag_score: 60.0,
            avg_performer_score: 60.0,
        };
        let scorer = SceneScorer::with_averages(averages, &[], &[], &[]);
        let rating = scorer.rate(&scene(4, &[]));
        // 4 / 2 / 20 + 1 = 1.1
        assert_eq!(rating.formula, "60 * 1.1");
        assert_eq!(rating.score, 66);
        assert_eq!(rating.engagement, 4);
    }

    #[test]
    fn test_unliked_scene_uses_avg_tag_score() {
        let averages = SceneAverages {
            avg_likes_per_liked_scene: 3.0,
            avg_studio_score: 90.0,
            avg_tag_score: 37.0,
            avg_performer_score: 90.0,
        };
        let scorer = SceneScorer::with_averages(averages, &[], &[], &[]);
        let rating = scorer.rate(&scene(0, &[]));
        assert_eq!(rating.score, 37);
        assert_eq!(rating.formula, "avgTagScore");
    }

    #[test]
    fn test_scene_score_capped_at_hundred() {
        let averages = SceneAverages {
            avg_likes_per_liked_scene: 1.0,
            avg_studio_score: 95.0,
            avg_tag_score: 95.0,
            avg_performer_score: 95.0,
        };
        let scorer = SceneScorer::with_averages(averages, &[], &[], &[]);
        assert_eq!(scorer.rate(&scene(40, &[])).score, 100);
    }
}
