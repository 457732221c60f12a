//! Terminal tables for command output
//!
//! Builders return a [`Table`] so the caller decides where it goes.

use bytesize::ByteSize;
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use sck_common::models::Artifact;
use sck_common::Scene;

use crate::organizer::{OrganizeOutcome, OrganizeReport};
use crate::rating::{Rated, RatingResult};
use crate::services::{EmptyFolder, PerformerReport, StudioStats};

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(header);
    table
}

/// Human-readable byte count (`1.9 GB`)
pub fn format_size(bytes: u64) -> String {
    ByteSize::b(bytes).to_string()
}

fn rating_row(rank: usize, name: &str, rating: &RatingResult) -> Vec<Cell> {
    vec![
        Cell::new(rank),
        Cell::new(name),
        Cell::new(rating.score),
        Cell::new(rating.engagement),
        Cell::new(&rating.formula),
    ]
}

/// Top `top` rated performers, studios or tags
pub fn artifact_ratings_table<A: Artifact>(rated: &[Rated<A>], top: usize) -> Table {
    let mut table = new_table(vec!["#", A::KIND.label(), "Score", "Engagement", "Formula"]);
    for (i, r) in rated.iter().take(top).enumerate() {
        table.add_row(rating_row(i + 1, r.base.name(), &r.rating));
    }
    table
}

pub fn scene_ratings_table(rated: &[Rated<Scene>], top: usize) -> Table {
    let mut table = new_table(vec!["#", "scene", "Score", "Engagement", "Formula"]);
    for (i, r) in rated.iter().take(top).enumerate() {
        table.add_row(rating_row(i + 1, &r.base.display_title(), &r.rating));
    }
    table
}

/// Selected scenes with studio and size, plus a total row
pub fn scene_list_table<'a>(scenes: impl IntoIterator<Item = &'a Scene>) -> Table {
    let mut table = new_table(vec!["ID", "Title", "Studio", "Engagement", "Size"]);
    let mut total = 0u64;
    let mut count = 0usize;
    for scene in scenes {
        total += scene.size();
        count += 1;
        table.add_row(vec![
            Cell::new(&scene.id),
            Cell::new(scene.display_title()),
            Cell::new(scene.studio.as_ref().map(|s| s.name.as_str()).unwrap_or("-")),
            Cell::new(scene.engagement),
            Cell::new(format_size(scene.size())),
        ]);
    }
    table.add_row(vec![
        Cell::new(""),
        Cell::new(format!("{} scenes", count)),
        Cell::new(""),
        Cell::new(""),
        Cell::new(format_size(total)),
    ]);
    table
}

pub fn studio_stats_table(stats: &[StudioStats]) -> Table {
    let mut table = new_table(vec!["Studio", "Scenes", "Engagement", "Percent", "Size"]);
    for s in stats {
        table.add_row(vec![
            Cell::new(&s.studio.name),
            Cell::new(s.scene_count),
            Cell::new(s.total_engagement),
            Cell::new(format!("{:.1}%", s.engagement_percent)),
            Cell::new(format_size(s.total_size)),
        ]);
    }
    table
}

pub fn performer_report_table(report: &PerformerReport) -> Table {
    let mut table = new_table(vec!["#", "Performer", "Engagement", "Scenes", "Liked scenes"]);
    for (i, s) in report.top.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&s.performer.name),
            Cell::new(s.performer.engagement),
            Cell::new(s.performer.scene_count),
            Cell::new(s.liked_scenes),
        ]);
    }
    table
}

/// Failed and moved scenes of an organize run
///
/// Skipped scenes only show up in the totals.
pub fn organize_table(report: &OrganizeReport) -> Table {
    let mut table = new_table(vec!["Scene", "Result", "Detail"]);
    for outcome in &report.outcomes {
        let (result, detail) = match outcome {
            OrganizeOutcome::Moved { to, files, .. } => (
                if report.dry_run { "would move" } else { "moved" },
                format!("{} ({} files)", to.display(), files),
            ),
            OrganizeOutcome::Failed { reason, .. } => ("failed", reason.clone()),
            OrganizeOutcome::Skipped { .. } => continue,
        };
        table.add_row(vec![
            Cell::new(outcome.scene_id()),
            Cell::new(result),
            Cell::new(detail),
        ]);
    }
    table
}

pub fn empty_folders_table(folders: &[EmptyFolder]) -> Table {
    let mut table = new_table(vec!["Folder", "Subfolders", "Important"]);
    for f in folders {
        table.add_row(vec![
            Cell::new(f.path.display()),
            Cell::new(if f.has_subfolders { "yes" } else { "" }),
            Cell::new(if f.important { "yes" } else { "" }),
        ]);
    }
    table
}
