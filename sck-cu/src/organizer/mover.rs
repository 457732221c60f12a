//! Moving a scene's files to their planned location
//!
//! A scene's main file travels with every sibling sharing its stem in the
//! same directory (subtitles, old sidecars, thumbnails). All siblings land
//! under the new stem, keeping their own extensions.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::template::MAX_FILENAME_LENGTH;

/// Result of organizing one scene
#[derive(Debug, Clone, PartialEq)]
pub enum OrganizeOutcome {
    /// Files were moved (or would be, on a dry run)
    Moved {
        scene_id: String,
        from: PathBuf,
        to: PathBuf,
        files: usize,
    },
    /// Main file already at its target; only the NFO was (re)written
    Skipped { scene_id: String, path: PathBuf },
    Failed { scene_id: String, reason: String },
}

impl OrganizeOutcome {
    pub fn failed(scene_id: impl Into<String>, reason: impl ToString) -> Self {
        OrganizeOutcome::Failed {
            scene_id: scene_id.into(),
            reason: reason.to_string(),
        }
    }

    pub fn scene_id(&self) -> &str {
        match self {
            OrganizeOutcome::Moved { scene_id, .. }
            | OrganizeOutcome::Skipped { scene_id, .. }
            | OrganizeOutcome::Failed { scene_id, .. } => scene_id,
        }
    }
}

/// One planned relocation
#[derive(Debug, Clone, PartialEq)]
pub struct SceneMove {
    pub scene_id: String,
    /// Local path of the main file today
    pub current: PathBuf,
    /// Local path the main file should end up at
    pub target: PathBuf,
    /// NFO document written next to the target
    pub nfo: String,
}

impl SceneMove {
    /// Move the files and write the NFO
    ///
    /// The target stem is shortened when a sibling's longer extension would
    /// push its name past [`MAX_FILENAME_LENGTH`].
    pub fn execute(&self, dry_run: bool) -> OrganizeOutcome {
        let siblings = match sibling_files(&self.current) {
            Ok(siblings) => siblings,
            Err(e) => {
                return OrganizeOutcome::failed(
                    &self.scene_id,
                    format!("cannot list {}: {}", parent_dir(&self.current).display(), e),
                )
            }
        };
        if !siblings.iter().any(|p| p == &self.current) {
            return OrganizeOutcome::failed(
                &self.scene_id,
                format!("{} does not exist", self.current.display()),
            );
        }

        let target = fitted_target(&self.target, &siblings);
        let outcome = if self.current == target {
            if dry_run {
                info!(scene = %self.scene_id, "[dry run] Skipping move: main file already at target path");
            } else {
                info!(scene = %self.scene_id, "Skipping move: main file already at target path");
            }
            OrganizeOutcome::Skipped {
                scene_id: self.scene_id.clone(),
                path: target.clone(),
            }
        } else {
            match move_files(&siblings, &target, dry_run) {
                Ok(files) => OrganizeOutcome::Moved {
                    scene_id: self.scene_id.clone(),
                    from: self.current.clone(),
                    to: target.clone(),
                    files,
                },
                Err(reason) => return OrganizeOutcome::failed(&self.scene_id, reason),
            }
        };

        let nfo_path = target.with_extension("nfo");
        if dry_run {
            info!("[dry run] Would write NFO: {}", nfo_path.display());
        } else if let Err(e) = fs::write(&nfo_path, &self.nfo) {
            return OrganizeOutcome::failed(
                &self.scene_id,
                format!("failed to write {}: {}", nfo_path.display(), e),
            );
        } else {
            info!("Wrote NFO: {}", nfo_path.display());
        }

        outcome
    }
}

/// Rename every sibling to the target stem, rolling back on the first failure
fn move_files(siblings: &[PathBuf], target: &Path, dry_run: bool) -> Result<usize, String> {
    let target_dir = parent_dir(target);
    let new_stem = file_stem(target);

    let moves: Vec<(PathBuf, PathBuf)> = siblings
        .iter()
        .map(|from| {
            let to = target_dir.join(format!("{}{}", new_stem, dotted_extension(from)));
            (from.clone(), to)
        })
        .collect();

    if let Some((_, to)) = moves.iter().find(|(from, to)| from != to && to.exists()) {
        return Err(format!("{} already exists", to.display()));
    }

    if dry_run {
        for (from, to) in &moves {
            info!("[dry run] Would move: {} -> {}", from.display(), to.display());
        }
        return Ok(moves.len());
    }

    fs::create_dir_all(&target_dir)
        .map_err(|e| format!("cannot create {}: {}", target_dir.display(), e))?;

    let mut done: Vec<(&Path, &Path)> = Vec::new();
    for (from, to) in &moves {
        if let Err(e) = fs::rename(from, to) {
            rollback(&done);
            return Err(format!(
                "failed to move {} -> {}: {}",
                from.display(),
                to.display(),
                e
            ));
        }
        info!("Moved: {} -> {}", from.display(), to.display());
        done.push((from.as_path(), to.as_path()));
    }

    Ok(moves.len())
}

/// `target` with a stem short enough for every sibling extension and the NFO
fn fitted_target(target: &Path, siblings: &[PathBuf]) -> PathBuf {
    let longest_ext = siblings
        .iter()
        .map(|p| dotted_extension(p).chars().count())
        .chain(std::iter::once(".nfo".len()))
        .max()
        .unwrap_or(0);
    let stem = file_stem(target);
    let budget = MAX_FILENAME_LENGTH.saturating_sub(longest_ext);
    if stem.chars().count() <= budget {
        return target.to_path_buf();
    }

    let short: String = stem.chars().take(budget).collect();
    parent_dir(target).join(format!("{}{}", short.trim_end(), dotted_extension(target)))
}

/// Put already-moved files back where they came from
fn rollback(done: &[(&Path, &Path)]) {
    for (from, to) in done.iter().rev() {
        match fs::rename(to, from) {
            Ok(()) => info!("Rolled back: {} -> {}", to.display(), from.display()),
            Err(e) => warn!(
                "Rollback failed for {} -> {}: {}",
                to.display(),
                from.display(),
                e
            ),
        }
    }
}

/// Files in the main file's directory sharing its stem, main file included
pub fn sibling_files(main: &Path) -> io::Result<Vec<PathBuf>> {
    let dir = parent_dir(main);
    let stem = file_stem(main);

    let mut siblings = Vec::new();
    for entry in fs::read_dir(&dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        if file_stem(&path) == stem {
            siblings.push(path);
        }
    }
    siblings.sort();
    Ok(siblings)
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `.ext` of a path, empty when it has none
fn dotted_extension(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default()
}
