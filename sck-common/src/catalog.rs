//! Catalog access capability
//!
//! The curation engine never reaches for a global connection. Every operation
//! receives something implementing [`Catalog`]: the GraphQL client in
//! production, an in-memory fake in tests.

use async_trait::async_trait;

use crate::models::{ArtifactKind, Gender, Performer, Scene, Studio, Tag};
use crate::Result;

/// Entity kinds whose rating can be written back to the catalog
///
/// Tags have no rating field on the server, so there is no variant for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RatingTarget {
    Performer,
    Studio,
    Scene,
}

impl RatingTarget {
    /// Write target for an artifact kind, `None` for tags
    pub fn for_artifact(kind: ArtifactKind) -> Option<Self> {
        match kind {
            ArtifactKind::Performer => Some(RatingTarget::Performer),
            ArtifactKind::Studio => Some(RatingTarget::Studio),
            ArtifactKind::Tag => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RatingTarget::Performer => "performer",
            RatingTarget::Studio => "studio",
            RatingTarget::Scene => "scene",
        }
    }
}

/// Query filter for performers, studios and tags
///
/// Thresholds are exclusive (`scene_count > min_scene_count`), matching the
/// catalog's `GREATER_THAN` modifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArtifactFilter {
    pub gender: Option<Gender>,
    pub scene_count_above: Option<u32>,
    pub engagement_above: Option<u32>,
    pub favorites_only: bool,
}

impl ArtifactFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = Some(gender);
        self
    }

    pub fn with_scenes(mut self) -> Self {
        self.scene_count_above = Some(0);
        self
    }

    pub fn scene_count_above(mut self, min: u32) -> Self {
        self.scene_count_above = Some(min);
        self
    }

    pub fn liked(mut self) -> Self {
        self.engagement_above = Some(0);
        self
    }

    /// In-memory evaluation of the filter
    pub fn matches(&self, gender: Option<Gender>, scene_count: u32, engagement: u32, favorite: bool) -> bool {
        if let Some(wanted) = self.gender {
            if gender != Some(wanted) {
                return false;
            }
        }
        if let Some(min) = self.scene_count_above {
            if scene_count <= min {
                return false;
            }
        }
        if let Some(min) = self.engagement_above {
            if engagement <= min {
                return false;
            }
        }
        !self.favorites_only || favorite
    }
}

/// Query filter for scenes
///
/// All populated criteria must hold (logical AND).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneFilter {
    /// Scene studio must be one of these ids
    pub studio_ids: Option<Vec<String>>,
    /// Scene must carry at least one of these tag ids
    pub tag_ids: Option<Vec<String>>,
    /// Scene must feature at least one favorited performer
    pub performer_favorite: bool,
    pub engagement_above: Option<u32>,
    pub has_studio: bool,
    pub has_title: bool,
    pub has_date: bool,
    pub has_details: bool,
    pub has_tags: bool,
    pub has_performers: bool,
    pub organized_only: bool,
}

impl SceneFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn in_studios(ids: Vec<String>) -> Self {
        Self {
            studio_ids: Some(ids),
            ..Self::default()
        }
    }

    pub fn with_tags(ids: Vec<String>) -> Self {
        Self {
            tag_ids: Some(ids),
            ..Self::default()
        }
    }

    pub fn favorite_performers() -> Self {
        Self {
            performer_favorite: true,
            ..Self::default()
        }
    }

    pub fn liked(mut self) -> Self {
        self.engagement_above = Some(0);
        self
    }

    /// In-memory evaluation of the filter
    ///
    /// The catalog has no notion of "organized" in this model, so
    /// `organized_only` is left to the server.
    pub fn matches(&self, scene: &Scene) -> bool {
        if let Some(ids) = &self.studio_ids {
            let in_studio = scene
                .studio
                .as_ref()
                .map(|s| ids.iter().any(|id| *id == s.id))
                .unwrap_or(false);
            if !in_studio {
                return false;
            }
        }
        if let Some(ids) = &self.tag_ids {
            if !scene.tags.iter().any(|t| ids.iter().any(|id| *id == t.id)) {
                return false;
            }
        }
        if self.performer_favorite && !scene.performers.iter().any(|p| p.favorite) {
            return false;
        }
        if let Some(min) = self.engagement_above {
            if scene.engagement <= min {
                return false;
            }
        }
        if self.has_studio && scene.studio.is_none() {
            return false;
        }
        if self.has_title && scene.title.as_deref().map(str::is_empty).unwrap_or(true) {
            return false;
        }
        if self.has_date && scene.date.as_deref().map(str::is_empty).unwrap_or(true) {
            return false;
        }
        if self.has_details && scene.details.as_deref().map(str::is_empty).unwrap_or(true) {
            return false;
        }
        if self.has_tags && scene.tags.is_empty() {
            return false;
        }
        if self.has_performers && scene.performers.is_empty() {
            return false;
        }
        true
    }
}

/// Query and mutation capability over the remote catalog
///
/// Every query returns a complete snapshot (no paging). Mutations succeed or
/// fail independently per item.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn find_scenes(&self, filter: &SceneFilter) -> Result<Vec<Scene>>;

    async fn find_performers(&self, filter: &ArtifactFilter) -> Result<Vec<Performer>>;

    async fn find_studios(&self, filter: &ArtifactFilter) -> Result<Vec<Studio>>;

    async fn find_tags(&self, filter: &ArtifactFilter) -> Result<Vec<Tag>>;

    /// Persist a computed rating (0-100) onto one entity
    async fn update_rating(&self, target: RatingTarget, id: &str, rating: u8) -> Result<()>;

    /// Ask the catalog to rescan its library paths
    async fn trigger_scan(&self) -> Result<()>;
}
