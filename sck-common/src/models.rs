//! Catalog data model
//!
//! Read-only snapshots of catalog entities. Everything the curation engine
//! computes is derived from these values; nothing here is mutated after fetch.

use serde::{Deserialize, Serialize};

/// Performer gender as reported by the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    /// Parse the catalog's upper-case enum spelling (`MALE`, `FEMALE`, ...)
    pub fn from_catalog(value: &str) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "MALE" => Gender::Male,
            "FEMALE" => Gender::Female,
            _ => Gender::Other,
        }
    }

    /// Catalog enum spelling used in query filters
    pub fn as_catalog_str(&self) -> &'static str {
        match self {
            Gender::Male => "MALE",
            Gender::Female => "FEMALE",
            Gender::Other => "NON_BINARY",
        }
    }
}

/// Kind of rateable catalog entity other than a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtifactKind {
    Performer,
    Studio,
    Tag,
}

impl ArtifactKind {
    pub fn label(&self) -> &'static str {
        match self {
            ArtifactKind::Performer => "performer",
            ArtifactKind::Studio => "studio",
            ArtifactKind::Tag => "tag",
        }
    }
}

/// A performer appearing in scenes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Performer {
    pub id: String,
    pub name: String,
    pub gender: Option<Gender>,
    pub favorite: bool,
    /// Engagement counter (explicit positive interactions)
    pub engagement: u32,
    pub scene_count: u32,
}

/// Parent link of a studio
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudioRef {
    pub id: String,
    pub name: String,
}

/// A studio (optionally nested under a parent studio)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Studio {
    pub id: String,
    pub name: String,
    pub favorite: bool,
    pub engagement: u32,
    pub scene_count: u32,
    pub parent: Option<StudioRef>,
}

/// A tag attached to scenes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub favorite: bool,
    pub engagement: u32,
    pub scene_count: u32,
}

/// A video file backing a scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoFile {
    /// Path as seen by the catalog server (e.g. `/data/studio/file.mp4`)
    pub path: String,
    pub basename: String,
    pub size: u64,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// A media item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: String,
    pub title: Option<String>,
    pub date: Option<String>,
    pub details: Option<String>,
    /// Rating currently stored in the catalog (0-100)
    pub rating: Option<u8>,
    pub engagement: u32,
    pub studio: Option<Studio>,
    pub tags: Vec<Tag>,
    pub performers: Vec<Performer>,
    pub files: Vec<VideoFile>,
}

impl Scene {
    /// Size in bytes of the primary file (0 when the scene has no file)
    pub fn size(&self) -> u64 {
        self.files.first().map(|f| f.size).unwrap_or(0)
    }

    /// Catalog path of the primary file
    pub fn primary_path(&self) -> Option<&str> {
        self.files.first().map(|f| f.path.as_str())
    }

    /// Title, falling back to the primary file's basename
    pub fn display_title(&self) -> String {
        match &self.title {
            Some(title) if !title.is_empty() => title.clone(),
            _ => self
                .files
                .first()
                .map(|f| f.basename.clone())
                .unwrap_or_else(|| self.id.clone()),
        }
    }

    pub fn is_liked(&self) -> bool {
        self.engagement > 0
    }

    pub fn has_gender(&self, gender: Gender) -> bool {
        self.performers.iter().any(|p| p.gender == Some(gender))
    }

    /// Whether this scene is associated with the given artifact
    pub fn references(&self, kind: ArtifactKind, id: &str) -> bool {
        match kind {
            ArtifactKind::Performer => self.performers.iter().any(|p| p.id == id),
            ArtifactKind::Studio => self.studio.as_ref().map(|s| s.id == id).unwrap_or(false),
            ArtifactKind::Tag => self.tags.iter().any(|t| t.id == id),
        }
    }
}

/// Common view over performers, studios and tags used by the rating engine
pub trait Artifact {
    const KIND: ArtifactKind;

    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn is_favorite(&self) -> bool;
}

impl Artifact for Performer {
    const KIND: ArtifactKind = ArtifactKind::Performer;

    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn is_favorite(&self) -> bool {
        self.favorite
    }
}

impl Artifact for Studio {
    const KIND: ArtifactKind = ArtifactKind::Studio;

    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn is_favorite(&self) -> bool {
        self.favorite
    }
}

impl Artifact for Tag {
    const KIND: ArtifactKind = ArtifactKind::Tag;

    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn is_favorite(&self) -> bool {
        self.favorite
    }
}
