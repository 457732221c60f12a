//! Finds (and optionally removes) folders holding no video files
//!
//! A folder counts as empty when no video file exists anywhere below it.
//! Folders that cannot be read are treated as non-empty.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};
use walkdir::WalkDir;

/// Extensions (lower-case, without dot) recognised as video
pub const VIDEO_EXTENSIONS: [&str; 24] = [
    "mp4", "avi", "mkv", "mov", "wmv", "flv", "webm", "m4v", "mpg", "mpeg", "3gp", "ts", "mts",
    "m2ts", "vob", "divx", "xvid", "asf", "rm", "rmvb", "ogv", "dv", "f4v", "swf",
];

/// Folder names that deserve a second look before deletion
const IMPORTANT_FOLDER_NAMES: [&str; 28] = [
    "system",
    "windows",
    "program files",
    "program files (x86)",
    "users",
    "documents",
    "desktop",
    "downloads",
    "music",
    "pictures",
    "videos",
    "appdata",
    "temp",
    "tmp",
    "etc",
    "var",
    "usr",
    "opt",
    "home",
    "root",
    "bin",
    "sbin",
    "lib",
    "lib64",
    "boot",
    "dev",
    "proc",
    "sys",
];

#[derive(Debug, Error)]
pub enum CleanError {
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// A folder without any video below it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyFolder {
    pub path: PathBuf,
    pub has_subfolders: bool,
    /// Name resembles a system or user folder
    pub important: bool,
}

/// Totals of a deletion pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanSummary {
    pub deleted: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| VIDEO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

pub fn is_important_folder(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if name.is_empty() {
        return true;
    }
    IMPORTANT_FOLDER_NAMES
        .iter()
        .any(|important| name.contains(important) || important.contains(name.as_str()))
}

/// Every folder below `root` (root excluded) with no video at any depth
///
/// Results are in depth-first order, parents before children.
pub fn find_empty_folders(root: &Path) -> Result<Vec<EmptyFolder>, CleanError> {
    if !root.exists() {
        return Err(CleanError::PathNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(CleanError::NotADirectory(root.to_path_buf()));
    }

    let mut folders: Vec<PathBuf> = Vec::new();
    let mut occupied: HashSet<PathBuf> = HashSet::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Could not scan {}: {}", root.display(), e);
                // Keep unreadable folders (and their ancestors) out of the result
                if let Some(path) = e.path() {
                    mark_ancestors(path, root, &mut occupied);
                }
                continue;
            }
        };

        let path = entry.path();
        if entry.file_type().is_dir() {
            folders.push(path.to_path_buf());
        } else if is_video_file(path) {
            if let Some(parent) = path.parent() {
                mark_ancestors(parent, root, &mut occupied);
            }
        }
    }

    let empty: Vec<EmptyFolder> = folders
        .iter()
        .filter(|dir| dir.as_path() != root && !occupied.contains(*dir))
        .map(|dir| EmptyFolder {
            path: dir.clone(),
            has_subfolders: folders.iter().any(|f| f.parent() == Some(dir.as_path())),
            important: is_important_folder(dir),
        })
        .collect();

    info!(
        root = %root.display(),
        scanned = folders.len(),
        empty = empty.len(),
        "Folder scan complete"
    );
    Ok(empty)
}

fn mark_ancestors(start: &Path, root: &Path, occupied: &mut HashSet<PathBuf>) {
    let mut current = Some(start);
    while let Some(dir) = current {
        if !occupied.insert(dir.to_path_buf()) || dir == root {
            break;
        }
        current = dir.parent();
    }
}

/// Delete the given folders recursively
///
/// Folders nested in one already removed are skipped silently, and
/// important-looking folders are kept unless `include_important` is set.
pub fn delete_folders(folders: &[EmptyFolder], include_important: bool) -> CleanSummary {
    let mut summary = CleanSummary::default();
    let mut removed: Vec<&Path> = Vec::new();

    for folder in folders {
        if removed.iter().any(|r| folder.path.starts_with(r)) {
            continue;
        }
        if folder.important && !include_important {
            warn!(path = %folder.path.display(), "Keeping important-looking folder");
            summary.skipped += 1;
            continue;
        }
        match fs::remove_dir_all(&folder.path) {
            Ok(()) => {
                info!(path = %folder.path.display(), "Deleted");
                summary.deleted += 1;
                removed.push(&folder.path);
            }
            Err(e) => {
                warn!(path = %folder.path.display(), "Failed to delete: {}", e);
                summary.failed += 1;
            }
        }
    }

    summary
}
