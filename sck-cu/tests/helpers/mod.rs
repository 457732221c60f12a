//! Shared test utilities
//!
//! An in-memory catalog plus builders for catalog entities.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use sck_common::{
    ArtifactFilter, Catalog, Error, Gender, Performer, RatingTarget, Result, Scene, SceneFilter,
    Studio, StudioRef, Tag, VideoFile,
};

/// In-memory [`Catalog`] that evaluates filters locally and records mutations
#[derive(Default)]
pub struct FakeCatalog {
    pub scenes: Vec<Scene>,
    pub performers: Vec<Performer>,
    pub studios: Vec<Studio>,
    pub tags: Vec<Tag>,
    /// Entity ids whose rating update is rejected
    pub failing_ids: HashSet<String>,
    /// When set, every query fails
    pub fail_queries: bool,
    updates: Mutex<Vec<(RatingTarget, String, u8)>>,
    scans: AtomicUsize,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scenes(mut self, scenes: Vec<Scene>) -> Self {
        self.scenes = scenes;
        self
    }

    pub fn with_performers(mut self, performers: Vec<Performer>) -> Self {
        self.performers = performers;
        self
    }

    pub fn with_studios(mut self, studios: Vec<Studio>) -> Self {
        self.studios = studios;
        self
    }

    pub fn with_tags(mut self, tags: Vec<Tag>) -> Self {
        self.tags = tags;
        self
    }

    pub fn failing_on(mut self, id: &str) -> Self {
        self.failing_ids.insert(id.to_string());
        self
    }

    pub fn updates(&self) -> Vec<(RatingTarget, String, u8)> {
        self.updates.lock().unwrap().clone()
    }

    pub fn scan_count(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }

    fn check_queries(&self) -> Result<()> {
        if self.fail_queries {
            return Err(Error::Catalog("catalog unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Catalog for FakeCatalog {
    async fn find_scenes(&self, filter: &SceneFilter) -> Result<Vec<Scene>> {
        self.check_queries()?;
        Ok(self.scenes.iter().filter(|s| filter.matches(s)).cloned().collect())
    }

    async fn find_performers(&self, filter: &ArtifactFilter) -> Result<Vec<Performer>> {
        self.check_queries()?;
        Ok(self
            .performers
            .iter()
            .filter(|p| filter.matches(p.gender, p.scene_count, p.engagement, p.favorite))
            .cloned()
            .collect())
    }

    async fn find_studios(&self, filter: &ArtifactFilter) -> Result<Vec<Studio>> {
        self.check_queries()?;
        Ok(self
            .studios
            .iter()
            .filter(|s| filter.matches(None, s.scene_count, s.engagement, s.favorite))
            .cloned()
            .collect())
    }

    async fn find_tags(&self, filter: &ArtifactFilter) -> Result<Vec<Tag>> {
        self.check_queries()?;
        Ok(self
            .tags
            .iter()
            .filter(|t| filter.matches(None, t.scene_count, t.engagement, t.favorite))
            .cloned()
            .collect())
    }

    async fn update_rating(&self, target: RatingTarget, id: &str, rating: u8) -> Result<()> {
        if self.failing_ids.contains(id) {
            return Err(Error::Catalog(format!("update of {} rejected", id)));
        }
        self.updates
            .lock()
            .unwrap()
            .push((target, id.to_string(), rating));
        Ok(())
    }

    async fn trigger_scan(&self) -> Result<()> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn performer(id: &str, name: &str, gender: Gender, engagement: u32) -> Performer {
    Performer {
        id: id.to_string(),
        name: name.to_string(),
        gender: Some(gender),
        favorite: false,
        engagement,
        scene_count: 1,
    }
}

pub fn favorite(mut performer: Performer) -> Performer {
    performer.favorite = true;
    performer
}

pub fn studio(id: &str, name: &str) -> Studio {
    Studio {
        id: id.to_string(),
        name: name.to_string(),
        favorite: false,
        engagement: 0,
        scene_count: 1,
        parent: None,
    }
}

pub fn child_studio(id: &str, name: &str, parent: &Studio) -> Studio {
    Studio {
        parent: Some(StudioRef {
            id: parent.id.clone(),
            name: parent.name.clone(),
        }),
        ..studio(id, name)
    }
}

pub fn tag(id: &str, name: &str) -> Tag {
    Tag {
        id: id.to_string(),
        name: name.to_string(),
        favorite: false,
        engagement: 0,
        scene_count: 1,
    }
}

/// Builder for test scenes; starts with no file, studio, tags or performers
pub struct SceneBuilder {
    scene: Scene,
}

impl SceneBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            scene: Scene {
                id: id.to_string(),
                title: None,
                date: None,
                details: None,
                rating: None,
                engagement: 0,
                studio: None,
                tags: vec![],
                performers: vec![],
                files: vec![],
            },
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.scene.title = Some(title.to_string());
        self
    }

    pub fn date(mut self, date: &str) -> Self {
        self.scene.date = Some(date.to_string());
        self
    }

    pub fn engagement(mut self, engagement: u32) -> Self {
        self.scene.engagement = engagement;
        self
    }

    pub fn studio(mut self, studio: &Studio) -> Self {
        self.scene.studio = Some(studio.clone());
        self
    }

    pub fn tag(mut self, tag: &Tag) -> Self {
        self.scene.tags.push(tag.clone());
        self
    }

    pub fn performer(mut self, performer: &Performer) -> Self {
        self.scene.performers.push(performer.clone());
        self
    }

    /// Primary file at a catalog path
    pub fn file(mut self, path: &str, size: u64) -> Self {
        let basename = path.rsplit('/').next().unwrap_or(path).to_string();
        self.scene.files.push(VideoFile {
            path: path.to_string(),
            basename,
            size,
            width: Some(1920),
            height: Some(1080),
        });
        self
    }

    pub fn build(self) -> Scene {
        self.scene
    }
}
