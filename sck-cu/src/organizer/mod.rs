//! Library Reorganizer
//!
//! Computes a deterministic target path for every scene from a folder policy
//! and a file name template, then moves the files (with their siblings)
//! and writes an NFO sidecar next to each.
//!
//! Two scenes that map to the same target are never both moved: the first
//! one claims the path and later ones are reported as duplicates.

pub mod folders;
pub mod mover;
pub mod nfo;
pub mod template;

use std::collections::HashSet;
use std::path::PathBuf;

use sck_common::{ArtifactFilter, Catalog, Gender, Result, Scene, SceneFilter, Studio};
use tracing::{info, warn};

use crate::paths::{strip_forbidden, PathMapper};

pub use folders::{folders_for, FolderStructure, PathError, StudioHierarchy};
pub use mover::{OrganizeOutcome, SceneMove};
pub use nfo::scene_nfo;
pub use template::{FieldValues, FilenameTemplate, TemplateError, TemplateField};

/// Everything the reorganizer needs to know about a run
#[derive(Debug, Clone)]
pub struct OrganizeOptions {
    pub structure: FolderStructure,
    pub template: FilenameTemplate,
    /// Only scenes with at least one male performer
    pub require_male: bool,
    /// Only scenes with at least one female performer
    pub require_female: bool,
    pub dry_run: bool,
    /// Extra catalog-side criteria
    pub scene_filter: SceneFilter,
}

impl OrganizeOptions {
    pub fn new(structure: FolderStructure, template: FilenameTemplate) -> Self {
        Self {
            structure,
            template,
            require_male: false,
            require_female: false,
            dry_run: false,
            scene_filter: SceneFilter::all(),
        }
    }

    /// Catalog query implied by the options
    ///
    /// Studio-based layouts need a studio and title-based names need a title.
    pub fn effective_filter(&self) -> SceneFilter {
        let mut filter = self.scene_filter.clone();
        if self.structure.needs_studio() || self.template.contains(TemplateField::Studio) {
            filter.has_studio = true;
        }
        if self.template.contains(TemplateField::Title) {
            filter.has_title = true;
        }
        filter
    }

    fn keeps(&self, scene: &Scene) -> bool {
        (!self.require_male || scene.has_gender(Gender::Male))
            && (!self.require_female || scene.has_gender(Gender::Female))
    }
}

/// Planned moves, split by what will happen to them
#[derive(Debug, Clone, Default)]
pub struct OrganizationPlan {
    pub moves: Vec<SceneMove>,
    /// Scenes whose target was already claimed by an earlier scene
    pub duplicates: Vec<SceneMove>,
    /// Scenes that could not be placed at all
    pub unplaceable: Vec<OrganizeOutcome>,
}

/// Local target path for one scene
pub fn target_path(
    scene: &Scene,
    options: &OrganizeOptions,
    hierarchy: &StudioHierarchy,
    mapper: &PathMapper,
) -> std::result::Result<SceneMove, PathError> {
    let catalog_path = scene.primary_path().ok_or_else(|| PathError::MissingFile {
        scene_id: scene.id.clone(),
    })?;

    let folders = folders_for(scene, options.structure, hierarchy)?;
    let file_name = options
        .template
        .render_within_limit(&FieldValues::from_scene(scene));

    let target = folders
        .iter()
        .map(|f| strip_forbidden(f))
        .filter(|f| !f.is_empty())
        .fold(mapper.data_root().to_path_buf(), |path, folder| path.join(folder))
        .join(strip_forbidden(&file_name));
    let nfo = scene_nfo(scene).map_err(|e| PathError::Nfo {
        scene_id: scene.id.clone(),
        reason: e.to_string(),
    })?;

    Ok(SceneMove {
        scene_id: scene.id.clone(),
        current: mapper.to_local(catalog_path),
        target,
        nfo,
    })
}

/// Compute target paths for `scenes` in order
pub fn plan_scenes(
    scenes: &[Scene],
    studios: Vec<Studio>,
    options: &OrganizeOptions,
    mapper: &PathMapper,
) -> OrganizationPlan {
    let hierarchy = StudioHierarchy::new(studios);
    let mut claimed: HashSet<PathBuf> = HashSet::new();
    let mut plan = OrganizationPlan::default();

    for scene in scenes.iter().filter(|s| options.keeps(s)) {
        match target_path(scene, options, &hierarchy, mapper) {
            Ok(planned) => {
                if claimed.insert(planned.target.clone()) {
                    plan.moves.push(planned);
                } else {
                    warn!(
                        scene = %scene.id,
                        target = %planned.target.display(),
                        "Duplicate target path, scene left in place"
                    );
                    plan.duplicates.push(planned);
                }
            }
            Err(e) => {
                warn!(scene = %scene.id, "Cannot place scene: {}", e);
                plan.unplaceable.push(OrganizeOutcome::failed(&scene.id, e));
            }
        }
    }

    plan
}

/// Totals for a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrganizeSummary {
    pub moved: usize,
    pub skipped: usize,
    pub failed: usize,
    pub duplicates: usize,
}

impl OrganizeSummary {
    pub fn from_outcomes(outcomes: &[OrganizeOutcome], duplicates: usize) -> Self {
        let mut summary = Self {
            duplicates,
            ..Self::default()
        };
        for outcome in outcomes {
            match outcome {
                OrganizeOutcome::Moved { .. } => summary.moved += 1,
                OrganizeOutcome::Skipped { .. } => summary.skipped += 1,
                OrganizeOutcome::Failed { .. } => summary.failed += 1,
            }
        }
        summary
    }
}

/// Outcomes of a run, in scene order, plus totals
#[derive(Debug, Clone, Default)]
pub struct OrganizeReport {
    pub outcomes: Vec<OrganizeOutcome>,
    pub summary: OrganizeSummary,
    pub dry_run: bool,
}

/// Carry out a plan, one scene at a time
pub fn execute_plan(plan: &OrganizationPlan, dry_run: bool) -> OrganizeReport {
    let mut outcomes = plan.unplaceable.clone();
    for planned in &plan.moves {
        outcomes.push(planned.execute(dry_run));
    }

    let summary = OrganizeSummary::from_outcomes(&outcomes, plan.duplicates.len());
    info!(
        moved = summary.moved,
        skipped = summary.skipped,
        failed = summary.failed,
        duplicates = summary.duplicates,
        dry_run = dry_run,
        "Organize finished"
    );

    OrganizeReport {
        outcomes,
        summary,
        dry_run,
    }
}

/// Fetch, plan, execute and (for real runs) ask the catalog to rescan
pub async fn organize_library(
    catalog: &dyn Catalog,
    options: &OrganizeOptions,
    mapper: &PathMapper,
) -> Result<OrganizeReport> {
    let scenes = catalog.find_scenes(&options.effective_filter()).await?;
    let studios = catalog.find_studios(&ArtifactFilter::all()).await?;

    let plan = plan_scenes(&scenes, studios, options, mapper);
    info!(
        scenes = plan.moves.len(),
        duplicates = plan.duplicates.len(),
        unplaceable = plan.unplaceable.len(),
        structure = %options.structure,
        template = %options.template,
        "Organization plan ready"
    );

    let report = execute_plan(&plan, options.dry_run);

    if !options.dry_run {
        catalog.trigger_scan().await?;
        info!("Catalog rescan triggered; paths update once it finishes");
    }

    Ok(report)
}
