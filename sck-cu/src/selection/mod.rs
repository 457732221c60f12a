//! Space-Constrained Selector
//!
//! Proposes extra scenes from "favorite-affine" pools (scenes linked to a
//! favorited performer, studio or tag, with positive engagement) that fit
//! a byte budget. When the whole pool fits it is returned as-is; otherwise
//! candidates are ranked by a custom score and packed greedily.
//!
//! The greedy pass never backtracks, so it can under-fill the budget.

pub mod copy_plan;

use std::collections::HashSet;

use sck_common::{
    ArtifactFilter, Catalog, Gender, Performer, Result, Scene, SceneFilter, Studio, Tag,
};
use tracing::{debug, info};

pub use copy_plan::{copy_scenes, plan_copy, CopyOutcome, CopyPlan, SMART_FILL_THRESHOLD};

/// Bonus for a scene whose studio is a favorite
pub const FAVORITE_STUDIO_BONUS: f64 = 5.0;
/// Bonus per favorited tag on a scene
pub const FAVORITE_TAG_BONUS: f64 = 5.0;

/// Favorited entities, by kind
#[derive(Debug, Clone, Default)]
pub struct Favorites {
    pub female_performers: Vec<Performer>,
    pub male_performers: Vec<Performer>,
    pub studios: Vec<Studio>,
    pub tags: Vec<Tag>,
}

impl Favorites {
    /// Fetch every performer, studio and tag and keep the favorited ones
    pub async fn load(catalog: &dyn Catalog) -> Result<Self> {
        let females = catalog
            .find_performers(&ArtifactFilter::all().with_gender(Gender::Female))
            .await?;
        let males = catalog
            .find_performers(&ArtifactFilter::all().with_gender(Gender::Male))
            .await?;
        let studios = catalog.find_studios(&ArtifactFilter::all()).await?;
        let tags = catalog.find_tags(&ArtifactFilter::all()).await?;

        let favorites = Self {
            female_performers: females.into_iter().filter(|p| p.favorite).collect(),
            male_performers: males.into_iter().filter(|p| p.favorite).collect(),
            studios: studios.into_iter().filter(|s| s.favorite).collect(),
            tags: tags.into_iter().filter(|t| t.favorite).collect(),
        };

        info!(
            female_performers = favorites.female_performers.len(),
            male_performers = favorites.male_performers.len(),
            studios = favorites.studios.len(),
            tags = favorites.tags.len(),
            "Favorites loaded"
        );
        Ok(favorites)
    }

    pub fn gender_weights(&self) -> GenderWeights {
        GenderWeights::from_counts(self.female_performers.len(), self.male_performers.len())
    }
}

/// Per-gender multipliers for favorited performer engagement
///
/// The gender with more favorites is scaled down to the ratio of the
/// other gender's count, so a lopsided favorites list does not dominate
/// the score through population size alone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenderWeights {
    pub female: f64,
    pub male: f64,
}

impl GenderWeights {
    pub fn from_counts(favorite_females: usize, favorite_males: usize) -> Self {
        Self {
            female: capped_ratio(favorite_females, favorite_males),
            male: capped_ratio(favorite_males, favorite_females),
        }
    }
}

/// `min(1, a / b)`, `1` when `b` is zero
fn capped_ratio(a: usize, b: usize) -> f64 {
    if b == 0 {
        return 1.0;
    }
    (a as f64 / b as f64).min(1.0)
}

/// Preference score used to rank fill candidates
///
/// `engagement + Σ(favorite performer engagement × gender weight)
///  + 5 if the studio is a favorite + 5 per favorited tag`
pub fn custom_score(scene: &Scene, weights: &GenderWeights) -> f64 {
    let performer_score: f64 = scene
        .performers
        .iter()
        .filter(|p| p.favorite)
        .map(|p| match p.gender {
            Some(Gender::Female) => p.engagement as f64 * weights.female,
            Some(Gender::Male) => p.engagement as f64 * weights.male,
            _ => 0.0,
        })
        .sum();

    let studio_score = match &scene.studio {
        Some(studio) if studio.favorite => FAVORITE_STUDIO_BONUS,
        _ => 0.0,
    };

    let tag_score = scene.tags.iter().filter(|t| t.favorite).count() as f64 * FAVORITE_TAG_BONUS;

    scene.engagement as f64 + performer_score + studio_score + tag_score
}

/// Scene paired with its custom score
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredScene {
    pub scene: Scene,
    pub score: f64,
}

/// Deduplicated candidate pool
#[derive(Debug, Clone, Default)]
pub struct CandidatePool {
    pub scenes: Vec<Scene>,
    /// Entries dropped as repeats or already selected
    pub duplicates: usize,
}

impl CandidatePool {
    /// Merge candidate lists in priority order
    ///
    /// The first occurrence of a scene id wins; scenes in `already_included`
    /// are removed.
    pub fn build(sources: Vec<Vec<Scene>>, already_included: &[Scene]) -> Self {
        let mut seen: HashSet<String> = already_included.iter().map(|s| s.id.clone()).collect();
        let mut scenes = Vec::new();
        let mut duplicates = 0;

        for scene in sources.into_iter().flatten() {
            if seen.insert(scene.id.clone()) {
                scenes.push(scene);
            } else {
                duplicates += 1;
            }
        }

        Self { scenes, duplicates }
    }

    /// Fetch favorite-affine scenes: performers, then studios, then tags
    pub async fn from_catalog(
        catalog: &dyn Catalog,
        favorites: &Favorites,
        already_included: &[Scene],
    ) -> Result<Self> {
        let by_performer = catalog
            .find_scenes(&SceneFilter::favorite_performers().liked())
            .await?;

        let studio_ids: Vec<String> = favorites.studios.iter().map(|s| s.id.clone()).collect();
        let by_studio = if studio_ids.is_empty() {
            Vec::new()
        } else {
            catalog
                .find_scenes(&SceneFilter::in_studios(studio_ids).liked())
                .await?
        };

        let tag_ids: Vec<String> = favorites.tags.iter().map(|t| t.id.clone()).collect();
        let by_tag = if tag_ids.is_empty() {
            Vec::new()
        } else {
            catalog
                .find_scenes(&SceneFilter::with_tags(tag_ids).liked())
                .await?
        };

        let pool = Self::build(vec![by_performer, by_studio, by_tag], already_included);
        info!(
            candidates = pool.scenes.len(),
            duplicates = pool.duplicates,
            "Candidate pool built"
        );
        Ok(pool)
    }

    pub fn total_size(&self) -> u64 {
        total_size(&self.scenes)
    }
}

/// Result of a fill proposal
#[derive(Debug, Clone, Default)]
pub struct FillSelection {
    /// Scenes proposed in addition to the caller's selection
    pub scenes: Vec<Scene>,
    /// Whether ranking was needed (pool larger than the budget)
    pub ranked: bool,
    pub pool_size: usize,
    pub pool_bytes: u64,
}

impl FillSelection {
    pub fn total_size(&self) -> u64 {
        total_size(&self.scenes)
    }
}

/// Total primary-file size of a list of scenes
pub fn total_size(scenes: &[Scene]) -> u64 {
    scenes.iter().map(|s| s.size()).sum()
}

/// Score and sort candidates, highest first (stable among equal scores)
pub fn rank_candidates(scenes: Vec<Scene>, weights: &GenderWeights) -> Vec<ScoredScene> {
    let mut scored: Vec<ScoredScene> = scenes
        .into_iter()
        .map(|scene| {
            let score = custom_score(&scene, weights);
            ScoredScene { scene, score }
        })
        .collect();
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored
}

/// Greedy packing: accept while `remaining - size > 0`
///
/// A scene that does not fit is skipped for good; later, smaller scenes can
/// still be accepted.
pub fn reduce_to_size(ranked: Vec<ScoredScene>, budget: u64) -> Vec<Scene> {
    let mut remaining = budget;
    let mut accepted = Vec::new();

    for candidate in ranked {
        let size = candidate.scene.size();
        if remaining > size {
            remaining -= size;
            accepted.push(candidate.scene);
        } else {
            debug!(
                scene = %candidate.scene.id,
                size = size,
                remaining = remaining,
                "Candidate does not fit"
            );
        }
    }

    accepted
}

/// Choose from an already-built pool
pub fn select_from_pool(pool: CandidatePool, budget: u64, weights: &GenderWeights) -> FillSelection {
    let pool_size = pool.scenes.len();
    let pool_bytes = pool.total_size();

    if pool_bytes <= budget {
        return FillSelection {
            scenes: pool.scenes,
            ranked: false,
            pool_size,
            pool_bytes,
        };
    }

    let ranked = rank_candidates(pool.scenes, weights);
    let scenes = reduce_to_size(ranked, budget);
    info!(
        selected = scenes.len(),
        pool = pool_size,
        budget = budget,
        "Pool exceeds budget, reduced by custom score"
    );

    FillSelection {
        scenes,
        ranked: true,
        pool_size,
        pool_bytes,
    }
}

/// Propose favorite-affine scenes filling `budget` bytes
pub async fn fill_space(
    catalog: &dyn Catalog,
    budget: u64,
    already_included: &[Scene],
) -> Result<FillSelection> {
    let favorites = Favorites::load(catalog).await?;
    let pool = CandidatePool::from_catalog(catalog, &favorites, already_included).await?;
    Ok(select_from_pool(pool, budget, &favorites.gender_weights()))
}
