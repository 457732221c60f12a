//! Copy planning: a tag-based base selection topped up with a fill
//!
//! The base is every scene carrying one of the chosen tags. Whatever budget
//! is left afterwards can be filled from favorites, but only when the
//! leftover is worth it (more than 20 GiB).

use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use bytesize::ByteSize;
use sck_common::{Catalog, Error, Gender, Performer, Result, Scene, SceneFilter};
use tracing::{info, warn};

use super::{fill_space, total_size, CandidatePool};
use crate::organizer::nfo::scene_nfo;
use crate::paths::{extension_of, replace_forbidden, stem_of, PathMapper};

/// Leftover budget above which a smart fill is attempted
pub const SMART_FILL_THRESHOLD: u64 = 20 * 1024 * 1024 * 1024;

const MAX_NAMED_PERFORMERS: usize = 5;

/// Scenes to copy and how the budget was spent
#[derive(Debug, Clone, Default)]
pub struct CopyPlan {
    pub base: Vec<Scene>,
    pub fill: Vec<Scene>,
    pub budget: u64,
    /// Budget left after the base selection
    pub remaining: u64,
}

impl CopyPlan {
    pub fn scenes(&self) -> impl Iterator<Item = &Scene> {
        self.base.iter().chain(self.fill.iter())
    }

    pub fn total_size(&self) -> u64 {
        total_size(&self.base) + total_size(&self.fill)
    }

    pub fn len(&self) -> usize {
        self.base.len() + self.fill.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Build the base selection from `tag_ids` and optionally fill the rest
pub async fn plan_copy(
    catalog: &dyn Catalog,
    tag_ids: &[String],
    budget: u64,
    smart_fill: bool,
) -> Result<CopyPlan> {
    let tagged = catalog
        .find_scenes(&SceneFilter::with_tags(tag_ids.to_vec()))
        .await?;
    let base = CandidatePool::build(vec![tagged], &[]).scenes;
    let base_size = total_size(&base);

    info!(
        scenes = base.len(),
        size = %ByteSize::b(base_size),
        "Base selection loaded"
    );

    if base_size >= budget {
        return Err(Error::InvalidInput(format!(
            "selection of {} does not fit in {}",
            ByteSize::b(base_size),
            ByteSize::b(budget)
        )));
    }
    let remaining = budget - base_size;

    let fill = if smart_fill && remaining > SMART_FILL_THRESHOLD {
        fill_space(catalog, remaining, &base).await?.scenes
    } else {
        if smart_fill {
            info!(
                remaining = %ByteSize::b(remaining),
                "Not enough space left to fill with favorites"
            );
        }
        Vec::new()
    };

    Ok(CopyPlan {
        base,
        fill,
        budget,
        remaining,
    })
}

/// Outcome of copying one scene
#[derive(Debug, Clone, PartialEq)]
pub enum CopyOutcome {
    Copied { scene_id: String, target: PathBuf },
    /// Target already present; left untouched
    Exists { scene_id: String, target: PathBuf },
    Failed { scene_id: String, reason: String },
}

/// Copy each scene's primary file under `dest`
pub fn copy_scenes<'a>(
    scenes: impl IntoIterator<Item = &'a Scene>,
    dest: &Path,
    mapper: &PathMapper,
) -> Vec<CopyOutcome> {
    scenes
        .into_iter()
        .map(|scene| {
            let outcome = copy_scene(scene, dest, mapper);
            match &outcome {
                CopyOutcome::Copied { target, .. } => {
                    info!(scene = %scene.id, target = %target.display(), "Copied")
                }
                CopyOutcome::Exists { target, .. } => {
                    info!(scene = %scene.id, target = %target.display(), "Already present")
                }
                CopyOutcome::Failed { reason, .. } => {
                    warn!(scene = %scene.id, "Copy failed: {}", reason)
                }
            }
            outcome
        })
        .collect()
}

/// Copy one scene to `<dest>/<studio>/<title> - <performers><ext>` plus an NFO
pub fn copy_scene(scene: &Scene, dest: &Path, mapper: &PathMapper) -> CopyOutcome {
    let scene_id = scene.id.clone();
    let Some(catalog_path) = scene.primary_path() else {
        return CopyOutcome::Failed {
            scene_id,
            reason: "scene has no file".to_string(),
        };
    };

    let source = mapper.to_local(catalog_path);
    let folder = dest.join(copy_folder_name(scene));
    let stem = copy_file_stem(scene);
    let ext = extension_of(catalog_path);
    let file_name = if ext.is_empty() {
        stem.clone()
    } else {
        format!("{}.{}", stem, ext)
    };
    let target = folder.join(file_name);

    if let Err(e) = fs::create_dir_all(&folder) {
        return CopyOutcome::Failed {
            scene_id,
            reason: format!("cannot create {}: {}", folder.display(), e),
        };
    }

    let copied = match copy_no_clobber(&source, &target) {
        Ok(()) => true,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => false,
        Err(e) => {
            return CopyOutcome::Failed {
                scene_id,
                reason: format!("{} -> {}: {}", source.display(), target.display(), e),
            }
        }
    };

    let nfo_path = folder.join(format!("{}.nfo", stem));
    match scene_nfo(scene) {
        Ok(nfo) => {
            if let Err(e) = fs::write(&nfo_path, nfo) {
                warn!(path = %nfo_path.display(), "Failed to write NFO: {}", e);
            }
        }
        Err(e) => warn!(scene = %scene.id, "Failed to render NFO: {}", e),
    }

    if copied {
        CopyOutcome::Copied { scene_id, target }
    } else {
        CopyOutcome::Exists { scene_id, target }
    }
}

/// Copy that refuses to replace an existing target
///
/// A failed copy removes the partial target so a later run retries it.
fn copy_no_clobber(source: &Path, target: &Path) -> io::Result<()> {
    let mut reader = fs::File::open(source)?;
    let mut writer = OpenOptions::new().write(true).create_new(true).open(target)?;
    if let Err(e) = io::copy(&mut reader, &mut writer).and_then(|_| writer.sync_all()) {
        drop(writer);
        if let Err(rm) = fs::remove_file(target) {
            warn!(path = %target.display(), "Failed to remove partial copy: {}", rm);
        }
        return Err(e);
    }
    Ok(())
}

fn copy_folder_name(scene: &Scene) -> String {
    let studio = scene
        .studio
        .as_ref()
        .map(|s| s.name.as_str())
        .filter(|name| !name.is_empty())
        .unwrap_or("UNKNOWN");
    replace_forbidden(studio)
}

/// `<title> - <up to five performers>`, or the scene id when nobody is credited
pub fn copy_file_stem(scene: &Scene) -> String {
    let title = match &scene.title {
        Some(title) if !title.is_empty() => title.clone(),
        _ => scene
            .files
            .first()
            .map(|f| stem_of(&f.basename).to_string())
            .unwrap_or_else(|| scene.id.clone()),
    };

    let mut performers: Vec<&Performer> = scene.performers.iter().collect();
    performers.sort_by(|a, b| {
        gender_order(a.gender)
            .cmp(&gender_order(b.gender))
            .then_with(|| b.engagement.cmp(&a.engagement))
    });
    let names: Vec<&str> = performers
        .iter()
        .take(MAX_NAMED_PERFORMERS)
        .map(|p| p.name.as_str())
        .collect();

    let credit = if names.is_empty() {
        scene.id.clone()
    } else {
        names.join(", ")
    };
    replace_forbidden(&format!("{} - {}", title, credit))
}

fn gender_order(gender: Option<Gender>) -> u8 {
    match gender {
        Some(Gender::Female) => 0,
        Some(Gender::Male) => 1,
        Some(Gender::Other) => 2,
        None => 3,
    }
}
