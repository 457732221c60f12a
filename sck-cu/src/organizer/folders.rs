//! Destination folder policies

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use sck_common::{Gender, Performer, Scene, Studio};
use thiserror::Error;

/// Scene cannot be placed under the chosen folder policy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("scene {scene_id} has no studio")]
    MissingStudio { scene_id: String },

    #[error("scene {scene_id} has no {gender} performer")]
    MissingPerformer { scene_id: String, gender: &'static str },

    #[error("scene {scene_id} has no file")]
    MissingFile { scene_id: String },

    #[error("cannot render NFO for scene {scene_id}: {reason}")]
    Nfo { scene_id: String, reason: String },
}

/// How scenes are grouped into folders below the library root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderStructure {
    /// `<studio>/`
    Flat,
    /// `<root studio>/.../<studio>/`
    Nested,
    /// `<top performer of gender>/`
    Performer(Gender),
}

impl FolderStructure {
    pub fn needs_studio(&self) -> bool {
        matches!(self, FolderStructure::Flat | FolderStructure::Nested)
    }
}

impl FromStr for FolderStructure {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "flat" => Ok(FolderStructure::Flat),
            "nested" => Ok(FolderStructure::Nested),
            "performer-male" => Ok(FolderStructure::Performer(Gender::Male)),
            "performer-female" => Ok(FolderStructure::Performer(Gender::Female)),
            other => Err(format!(
                "unknown folder structure '{}' (expected flat, nested, performer-male or performer-female)",
                other
            )),
        }
    }
}

impl fmt::Display for FolderStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FolderStructure::Flat => f.write_str("flat"),
            FolderStructure::Nested => f.write_str("nested"),
            FolderStructure::Performer(Gender::Female) => f.write_str("performer-female"),
            FolderStructure::Performer(_) => f.write_str("performer-male"),
        }
    }
}

/// Studios indexed by id for parent walks
#[derive(Debug, Clone, Default)]
pub struct StudioHierarchy {
    by_id: HashMap<String, Studio>,
}

impl StudioHierarchy {
    pub fn new(studios: impl IntoIterator<Item = Studio>) -> Self {
        Self {
            by_id: studios.into_iter().map(|s| (s.id.clone(), s)).collect(),
        }
    }

    /// Names from the top-most known ancestor down to `studio`
    ///
    /// The walk stops at a parent that is not in the hierarchy or that was
    /// already visited, so malformed parent links cannot loop.
    pub fn lineage(&self, studio: &Studio) -> Vec<String> {
        let Some(mut current) = self.by_id.get(&studio.id) else {
            return vec![studio.name.clone()];
        };

        let mut visited = HashSet::new();
        let mut names = Vec::new();
        loop {
            if !visited.insert(current.id.as_str()) {
                break;
            }
            names.push(current.name.clone());
            match current
                .parent
                .as_ref()
                .and_then(|parent| self.by_id.get(&parent.id))
            {
                Some(parent) => current = parent,
                None => break,
            }
        }

        names.reverse();
        names
    }
}

/// Folder names (root first) for a scene
pub fn folders_for(
    scene: &Scene,
    structure: FolderStructure,
    hierarchy: &StudioHierarchy,
) -> Result<Vec<String>, PathError> {
    match structure {
        FolderStructure::Flat => {
            let studio = require_studio(scene)?;
            Ok(vec![studio.name.clone()])
        }
        FolderStructure::Nested => {
            let studio = require_studio(scene)?;
            Ok(hierarchy.lineage(studio))
        }
        FolderStructure::Performer(gender) => {
            let performer =
                top_performer(scene, gender).ok_or_else(|| PathError::MissingPerformer {
                    scene_id: scene.id.clone(),
                    gender: gender_label(gender),
                })?;
            Ok(vec![performer.name.clone()])
        }
    }
}

fn require_studio(scene: &Scene) -> Result<&Studio, PathError> {
    scene.studio.as_ref().ok_or_else(|| PathError::MissingStudio {
        scene_id: scene.id.clone(),
    })
}

/// Highest-engagement performer of `gender`, favorites preferred
///
/// Ties keep the first performer in scene order.
pub fn top_performer(scene: &Scene, gender: Gender) -> Option<&Performer> {
    let matching: Vec<&Performer> = scene
        .performers
        .iter()
        .filter(|p| p.gender == Some(gender))
        .collect();
    let favorites: Vec<&Performer> = matching.iter().copied().filter(|p| p.favorite).collect();
    let pool = if favorites.is_empty() { matching } else { favorites };

    pool.into_iter().fold(None, |best: Option<&Performer>, p| match best {
        Some(b) if b.engagement >= p.engagement => Some(b),
        _ => Some(p),
    })
}

fn gender_label(gender: Gender) -> &'static str {
    match gender {
        Gender::Male => "male",
        Gender::Female => "female",
        Gender::Other => "other",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sck_common::StudioRef;

    fn studio(id: &str, name: &str, parent: Option<&str>) -> Studio {
        Studio {
            id: id.to_string(),
            name: name.to_string(),
            favorite: false,
            engagement: 0,
            scene_count: 1,
            parent: parent.map(|p| StudioRef {
                id: p.to_string(),
                name: format!("studio {}", p),
            }),
        }
    }

    fn performer(id: &str, gender: Gender, favorite: bool, engagement: u32) -> Performer {
        Performer {
            id: id.to_string(),
            name: format!("P{}", id),
            gender: Some(gender),
            favorite,
            engagement,
            scene_count: 1,
        }
    }

    fn scene(studio: Option<Studio>, performers: Vec<Performer>) -> Scene {
        Scene {
            id: "1".to_string(),
            title: None,
            date: None,
            details: None,
            rating: None,
            engagement: 0,
            studio,
            tags: vec![],
            performers,
            files: vec![],
        }
    }

    #[test]
    fn test_parse_structure() {
        assert_eq!("flat".parse::<FolderStructure>(), Ok(FolderStructure::Flat));
        assert_eq!(
            "performer-female".parse::<FolderStructure>(),
            Ok(FolderStructure::Performer(Gender::Female))
        );
        assert!("tree".parse::<FolderStructure>().is_err());
    }

    #[test]
    fn test_nested_lineage_root_first() {
        let hierarchy = StudioHierarchy::new(vec![
            studio("1", "Root", None),
            studio("2", "Mid", Some("1")),
            studio("3", "Leaf", Some("2")),
        ]);
        let s = scene(Some(studio("3", "Leaf", Some("2"))), vec![]);
        assert_eq!(
            folders_for(&s, FolderStructure::Nested, &hierarchy).unwrap(),
            vec!["Root", "Mid", "Leaf"]
        );
    }

    #[test]
    fn test_nested_lineage_survives_cycles() {
        let hierarchy = StudioHierarchy::new(vec![
            studio("1", "A", Some("2")),
            studio("2", "B", Some("1")),
        ]);
        assert_eq!(hierarchy.lineage(&studio("1", "A", Some("2"))), vec!["B", "A"]);
    }

    #[test]
    fn test_unknown_studio_uses_own_name() {
        let hierarchy = StudioHierarchy::default();
        assert_eq!(hierarchy.lineage(&studio("9", "Lone", Some("1"))), vec!["Lone"]);
    }

    #[test]
    fn test_missing_studio_is_error() {
        let s = scene(None, vec![]);
        assert_eq!(
            folders_for(&s, FolderStructure::Flat, &StudioHierarchy::default()),
            Err(PathError::MissingStudio {
                scene_id: "1".to_string()
            })
        );
    }

    #[test]
    fn test_performer_folder_prefers_favorites() {
        let s = scene(
            None,
            vec![
                performer("1", Gender::Female, false, 50),
                performer("2", Gender::Female, true, 3),
                performer("3", Gender::Female, true, 3),
                performer("4", Gender::Male, true, 99),
            ],
        );
        let folders = folders_for(
            &s,
            FolderStructure::Performer(Gender::Female),
            &StudioHierarchy::default(),
        )
        .unwrap();
        assert_eq!(folders, vec!["P2"]);
    }

    #[test]
    fn test_performer_folder_without_match_is_error() {
        let s = scene(None, vec![performer("1", Gender::Female, false, 1)]);
        assert!(matches!(
            folders_for(
                &s,
                FolderStructure::Performer(Gender::Male),
                &StudioHierarchy::default()
            ),
            Err(PathError::MissingPerformer { gender: "male", .. })
        ));
    }
}
