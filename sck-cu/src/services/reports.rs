//! Catalog analysis reports (studios, performers)

use std::collections::HashMap;

use sck_common::{ArtifactFilter, Catalog, Gender, Performer, Result, Scene, SceneFilter, Studio};
use tracing::info;

/// Studios below this engagement percentage are cleanup candidates
pub const CLEANUP_PERCENT_THRESHOLD: f64 = 10.0;

/// Per-studio aggregates
#[derive(Debug, Clone, PartialEq)]
pub struct StudioStats {
    pub studio: Studio,
    pub scene_count: usize,
    pub total_engagement: u64,
    pub total_size: u64,
    /// `total_engagement / scene_count * 100`
    pub engagement_percent: f64,
}

#[derive(Debug, Clone, Default)]
pub struct StudioReport {
    pub by_total: Vec<StudioStats>,
    pub by_percent: Vec<StudioStats>,
    /// Low-engagement studios, largest first
    pub cleanup_candidates: Vec<StudioStats>,
}

fn percent(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        part / whole * 100.0
    }
}

/// Aggregate scenes per studio and rank them
///
/// `limit` caps the two rankings; cleanup candidates are never capped.
pub fn studio_report(studios: &[Studio], scenes: &[Scene], limit: usize) -> StudioReport {
    let mut by_studio: HashMap<&str, Vec<&Scene>> = HashMap::new();
    for scene in scenes {
        if let Some(studio) = &scene.studio {
            by_studio.entry(studio.id.as_str()).or_default().push(scene);
        }
    }

    let stats: Vec<StudioStats> = studios
        .iter()
        .map(|studio| {
            let owned = by_studio.get(studio.id.as_str()).map(Vec::as_slice).unwrap_or(&[]);
            let total_engagement: u64 = owned.iter().map(|s| s.engagement as u64).sum();
            StudioStats {
                studio: studio.clone(),
                scene_count: owned.len(),
                total_engagement,
                total_size: owned.iter().map(|s| s.size()).sum(),
                engagement_percent: percent(total_engagement as f64, owned.len() as f64),
            }
        })
        .collect();

    let mut by_total = stats.clone();
    by_total.sort_by(|a, b| b.total_engagement.cmp(&a.total_engagement));
    by_total.truncate(limit);

    let mut by_percent = stats.clone();
    by_percent.sort_by(|a, b| b.engagement_percent.total_cmp(&a.engagement_percent));
    by_percent.truncate(limit);

    let mut cleanup_candidates: Vec<StudioStats> = stats
        .into_iter()
        .filter(|s| s.engagement_percent.floor() < CLEANUP_PERCENT_THRESHOLD)
        .collect();
    cleanup_candidates.sort_by(|a, b| b.total_size.cmp(&a.total_size));

    StudioReport {
        by_total,
        by_percent,
        cleanup_candidates,
    }
}

pub async fn load_studio_report(catalog: &dyn Catalog, limit: usize) -> Result<StudioReport> {
    let studios = catalog
        .find_studios(&ArtifactFilter::all().with_scenes())
        .await?;
    let scenes = catalog.find_scenes(&SceneFilter::all()).await?;
    info!(studios = studios.len(), scenes = scenes.len(), "Analyzing studios");
    Ok(studio_report(&studios, &scenes, limit))
}

/// A performer and how many of their scenes were liked
#[derive(Debug, Clone, PartialEq)]
pub struct PerformerStats {
    pub performer: Performer,
    pub liked_scenes: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerformerReport {
    pub gender: Gender,
    pub total: usize,
    /// Performers with engagement above zero
    pub engaged: usize,
    pub engaged_percent: f64,
    /// Highest engagement first
    pub top: Vec<PerformerStats>,
}

pub fn performer_report(
    gender: Gender,
    performers: &[Performer],
    scenes: &[Scene],
    top: usize,
) -> PerformerReport {
    let mut engaged: Vec<&Performer> = performers.iter().filter(|p| p.engagement > 0).collect();
    engaged.sort_by(|a, b| b.engagement.cmp(&a.engagement));

    let liked_count = |performer: &Performer| {
        scenes
            .iter()
            .filter(|s| s.is_liked() && s.performers.iter().any(|p| p.id == performer.id))
            .count()
    };

    PerformerReport {
        gender,
        total: performers.len(),
        engaged: engaged.len(),
        engaged_percent: percent(engaged.len() as f64, performers.len() as f64),
        top: engaged
            .iter()
            .take(top)
            .map(|p| PerformerStats {
                performer: (*p).clone(),
                liked_scenes: liked_count(p),
            })
            .collect(),
    }
}

/// Performers of `gender` appearing in at least `min_scenes` scenes
pub async fn load_performer_report(
    catalog: &dyn Catalog,
    gender: Gender,
    min_scenes: u32,
    top: usize,
) -> Result<PerformerReport> {
    let performers = catalog
        .find_performers(
            &ArtifactFilter::all()
                .with_gender(gender)
                .scene_count_above(min_scenes.saturating_sub(1)),
        )
        .await?;
    let liked_scenes = catalog.find_scenes(&SceneFilter::all().liked()).await?;
    info!(performers = performers.len(), "Analyzing performers");
    Ok(performer_report(gender, &performers, &liked_scenes, top))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sck_common::VideoFile;

    fn studio(id: &str) -> Studio {
        Studio {
            id: id.to_string(),
            name: format!("Studio {}", id),
            favorite: false,
            engagement: 0,
            scene_count: 1,
            parent: None,
        }
    }

    fn scene(studio_id: &str, engagement: u32, size: u64) -> Scene {
        Scene {
            id: format!("{}-{}-{}", studio_id, engagement, size),
            title: None,
            date: None,
            details: None,
            rating: None,
            engagement,
            studio: Some(studio(studio_id)),
            tags: vec![],
            performers: vec![],
            files: vec![VideoFile {
                path: "/data/x.mp4".to_string(),
                basename: "x.mp4".to_string(),
                size,
                width: None,
                height: None,
            }],
        }
    }

    #[test]
    fn test_studio_rankings_and_cleanup() {
        let studios = vec![studio("a"), studio("b"), studio("c")];
        let mut scenes = vec![scene("a", 5, 10), scene("a", 0, 10)];
        scenes.extend((0..20).map(|i| scene("b", if i == 0 { 1 } else { 0 }, 100 + i)));
        scenes.push(scene("c", 1, 1));

        let report = studio_report(&studios, &scenes, 10);

        assert_eq!(report.by_total[0].studio.id, "a");
        assert_eq!(report.by_total[0].engagement_percent, 250.0);
        assert_eq!(report.by_percent[0].studio.id, "a");
        assert_eq!(report.by_percent[1].studio.id, "c");

        // b: 1 / 20 * 100 = 5%
        assert_eq!(report.cleanup_candidates.len(), 1);
        assert_eq!(report.cleanup_candidates[0].studio.id, "b");
        assert_eq!(report.cleanup_candidates[0].scene_count, 20);
    }

    #[test]
    fn test_performer_share() {
        let performers: Vec<Performer> = (0..4)
            .map(|i| Performer {
                id: i.to_string(),
                name: format!("P{}", i),
                gender: Some(Gender::Female),
                favorite: false,
                engagement: i,
                scene_count: 3,
            })
            .collect();
        let mut liked = scene("a", 2, 1);
        liked.performers = vec![performers[3].clone()];

        let report = performer_report(Gender::Female, &performers, &[liked], 2);
        assert_eq!(report.total, 4);
        assert_eq!(report.engaged, 3);
        assert_eq!(report.engaged_percent, 75.0);
        assert_eq!(report.top[0].performer.id, "3");
        assert_eq!(report.top[0].liked_scenes, 1);
        assert_eq!(report.top.len(), 2);
    }
}
