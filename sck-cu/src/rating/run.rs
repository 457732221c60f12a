//! Full catalog rating pass

use sck_common::{
    ArtifactFilter, Catalog, Gender, Performer, RatingTarget, Result, Scene, SceneFilter, Studio,
    Tag,
};
use tracing::info;

use super::artifacts::rate_artifacts;
use super::scenes::rate_scenes;
use super::write_back::{RatingWriter, WriteBackSummary};
use super::Rated;

/// Ratings for every population, each ranked best-first
#[derive(Debug, Clone, Default)]
pub struct CatalogRatings {
    pub studios: Vec<Rated<Studio>>,
    pub tags: Vec<Rated<Tag>>,
    pub male_performers: Vec<Rated<Performer>>,
    pub female_performers: Vec<Rated<Performer>>,
    pub scenes: Vec<Rated<Scene>>,
}

impl CatalogRatings {
    /// Male then female performers
    pub fn performers(&self) -> Vec<Rated<Performer>> {
        self.male_performers
            .iter()
            .chain(self.female_performers.iter())
            .cloned()
            .collect()
    }

    /// Write the selected targets back to the catalog
    pub async fn write_back(
        &self,
        writer: &RatingWriter<'_>,
        targets: &[RatingTarget],
    ) -> WriteBackSummary {
        let mut summary = WriteBackSummary::default();
        for target in targets {
            let batch = match target {
                RatingTarget::Studio => writer.write_artifacts(&self.studios).await,
                RatingTarget::Performer => writer.write_artifacts(&self.performers()).await,
                RatingTarget::Scene => writer.write_scenes(&self.scenes).await,
            };
            summary.merge(batch);
        }
        summary
    }
}

/// Split the scene snapshot into the population each artifact kind is rated over
struct Populations<'a> {
    with_studio: Vec<Scene>,
    with_tags: Vec<Scene>,
    with_male: Vec<Scene>,
    with_female: Vec<Scene>,
    all: &'a [Scene],
}

impl<'a> Populations<'a> {
    fn split(scenes: &'a [Scene]) -> Self {
        Self {
            with_studio: scenes_where(scenes, |s| s.studio.is_some()),
            with_tags: scenes_where(scenes, |s| !s.tags.is_empty()),
            with_male: scenes_where(scenes, |s| s.has_gender(Gender::Male)),
            with_female: scenes_where(scenes, |s| s.has_gender(Gender::Female)),
            all: scenes,
        }
    }
}

fn scenes_where(scenes: &[Scene], pred: impl Fn(&Scene) -> bool) -> Vec<Scene> {
    scenes.iter().filter(|s| pred(*s)).cloned().collect()
}

/// Fetch everything and compute all ratings
///
/// Artifacts are rated first; scenes are then rated against those scores.
pub async fn rate_catalog(catalog: &dyn Catalog) -> Result<CatalogRatings> {
    let scenes = catalog.find_scenes(&SceneFilter::all()).await?;
    let studios = catalog
        .find_studios(&ArtifactFilter::all().with_scenes())
        .await?;
    let tags = catalog.find_tags(&ArtifactFilter::all().with_scenes()).await?;
    let males = catalog
        .find_performers(&ArtifactFilter::all().with_gender(Gender::Male).with_scenes())
        .await?;
    let females = catalog
        .find_performers(
            &ArtifactFilter::all()
                .with_gender(Gender::Female)
                .with_scenes()
                .liked(),
        )
        .await?;

    info!(
        scenes = scenes.len(),
        studios = studios.len(),
        tags = tags.len(),
        male_performers = males.len(),
        female_performers = females.len(),
        "Catalog snapshot loaded"
    );

    let populations = Populations::split(&scenes);

    let rated_studios = rate_artifacts(&studios, &populations.with_studio);
    let rated_tags = rate_artifacts(&tags, &populations.with_tags);
    let rated_males = rate_artifacts(&males, &populations.with_male);
    let rated_females = rate_artifacts(&females, &populations.with_female);

    let performers: Vec<Rated<Performer>> = rated_males
        .iter()
        .chain(rated_females.iter())
        .cloned()
        .collect();
    let rated_scenes = rate_scenes(populations.all, &rated_studios, &rated_tags, &performers);

    Ok(CatalogRatings {
        studios: rated_studios,
        tags: rated_tags,
        male_performers: rated_males,
        female_performers: rated_females,
        scenes: rated_scenes,
    })
}
