//! Catalog-to-local path mapping and file name hygiene

use std::path::{Path, PathBuf};

use sck_common::config::TomlConfig;
use sck_common::Result;

/// Characters never allowed in a generated folder or file name
pub const FORBIDDEN_NAME_CHARS: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Maps paths as the catalog server sees them onto the local filesystem
///
/// The catalog reports files under its own mount (usually `/data`); the
/// same tree is mounted locally at `data_root`.
#[derive(Debug, Clone, PartialEq)]
pub struct PathMapper {
    catalog_prefix: String,
    data_root: PathBuf,
}

impl PathMapper {
    pub fn new(catalog_prefix: impl Into<String>, data_root: impl Into<PathBuf>) -> Self {
        Self {
            catalog_prefix: catalog_prefix.into(),
            data_root: data_root.into(),
        }
    }

    /// Mapper for the configured library; fails when no data root is set
    pub fn from_config(config: &TomlConfig) -> Result<Self> {
        let data_root = config.require_data_root()?;
        Ok(Self::new(config.library.catalog_prefix.clone(), data_root))
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    /// Local path for a catalog path
    ///
    /// Paths outside the catalog prefix are returned unchanged.
    pub fn to_local(&self, catalog_path: &str) -> PathBuf {
        match catalog_path.strip_prefix(self.catalog_prefix.as_str()) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => {
                let relative = rest.trim_start_matches('/');
                if relative.is_empty() {
                    self.data_root.clone()
                } else {
                    relative
                        .split('/')
                        .fold(self.data_root.clone(), |path, part| path.join(part))
                }
            }
            _ => PathBuf::from(catalog_path),
        }
    }
}

/// Remove forbidden characters from a single path component
pub fn strip_forbidden(name: &str) -> String {
    name.chars()
        .filter(|c| !FORBIDDEN_NAME_CHARS.contains(c))
        .collect()
}

/// Replace forbidden and control characters with `_`
pub fn replace_forbidden(name: &str) -> String {
    name.chars()
        .map(|c| {
            if FORBIDDEN_NAME_CHARS.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// Text after the last `.` of the final path component, `""` when absent
pub fn extension_of(path: &str) -> &str {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    match file_name.rfind('.') {
        Some(idx) if idx + 1 < file_name.len() => &file_name[idx + 1..],
        _ => "",
    }
}

/// File name without its last extension
pub fn stem_of(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => &file_name[..idx],
        _ => file_name,
    }
}
