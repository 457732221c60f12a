//! GraphQL client for the Stash catalog server
//!
//! Every query asks for `per_page: -1` so a single response carries the
//! complete result set. Wire types mirror the server's field names and are
//! converted into the shared model right after decoding.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use sck_common::catalog::{ArtifactFilter, Catalog, RatingTarget, SceneFilter};
use sck_common::{Gender, Performer, Scene, Studio, StudioRef, Tag, VideoFile};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::debug;

const API_KEY_HEADER: &str = "apikey";
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Stash client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {0}: {1}")]
    Http(u16, String),

    #[error("GraphQL error: {0}")]
    GraphQl(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<ClientError> for sck_common::Error {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Config(msg) => sck_common::Error::Config(msg),
            other => sck_common::Error::Catalog(other.to_string()),
        }
    }
}

const SCENE_FIELDS: &str = r#"
    id title date details rating100 o_counter
    files { path basename size width height }
    studio { id name favorite scene_count parent_studio { id name } }
    tags { id name favorite scene_count }
    performers { id name gender favorite o_counter scene_count }
"#;

const FIND_SCENES: &str = r#"
query FindScenes($filter: FindFilterType, $scene_filter: SceneFilterType) {
  findScenes(filter: $filter, scene_filter: $scene_filter) {
    count
    scenes { ...SceneFields }
  }
}"#;

const FIND_PERFORMERS: &str = r#"
query FindPerformers($filter: FindFilterType, $performer_filter: PerformerFilterType) {
  findPerformers(filter: $filter, performer_filter: $performer_filter) {
    count
    performers { id name gender favorite o_counter scene_count }
  }
}"#;

const FIND_STUDIOS: &str = r#"
query FindStudios($filter: FindFilterType, $studio_filter: StudioFilterType) {
  findStudios(filter: $filter, studio_filter: $studio_filter) {
    count
    studios { id name favorite o_counter scene_count parent_studio { id name } }
  }
}"#;

const FIND_TAGS: &str = r#"
query FindTags($filter: FindFilterType, $tag_filter: TagFilterType) {
  findTags(filter: $filter, tag_filter: $tag_filter) {
    count
    tags { id name favorite o_counter scene_count }
  }
}"#;

const METADATA_SCAN: &str = r#"
mutation MetadataScan($input: ScanMetadataInput!) {
  metadataScan(input: $input)
}"#;

/// Client for one Stash server
pub struct StashClient {
    http_client: reqwest::Client,
    endpoint: String,
}

impl StashClient {
    /// `url` is the server base URL; `/graphql` is appended when missing
    pub fn new(url: &str, api_key: &str) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if !api_key.is_empty() {
            let value = HeaderValue::from_str(api_key)
                .map_err(|e| ClientError::Config(format!("invalid API key: {}", e)))?;
            headers.insert(API_KEY_HEADER, value);
        }

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: graphql_endpoint(url)?,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
    ) -> Result<T, ClientError> {
        debug!(endpoint = %self.endpoint, "GraphQL request");

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ClientError::Http(status.as_u16(), error_text));
        }

        let body: GraphQlResponse<T> = response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))?;

        if let Some(errors) = body.errors.filter(|e| !e.is_empty()) {
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            return Err(ClientError::GraphQl(messages.join("; ")));
        }
        body.data
            .ok_or_else(|| ClientError::Parse("response has no data".to_string()))
    }

    async fn write_rating(
        &self,
        target: RatingTarget,
        id: &str,
        rating: u8,
    ) -> Result<(), ClientError> {
        let mutation = rating_mutation(target);
        let _: Value = self
            .execute(
                &mutation,
                json!({ "input": { "id": id, "rating100": rating } }),
            )
            .await?;
        Ok(())
    }
}

fn graphql_endpoint(url: &str) -> Result<String, ClientError> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ClientError::Config("catalog URL is empty".to_string()));
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ClientError::Config(format!(
            "catalog URL must start with http:// or https://: {}",
            trimmed
        )));
    }
    if trimmed.ends_with("/graphql") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{}/graphql", trimmed))
    }
}

fn rating_mutation(target: RatingTarget) -> String {
    let (operation, input_type) = match target {
        RatingTarget::Scene => ("sceneUpdate", "SceneUpdateInput"),
        RatingTarget::Performer => ("performerUpdate", "PerformerUpdateInput"),
        RatingTarget::Studio => ("studioUpdate", "StudioUpdateInput"),
    };
    format!(
        "mutation UpdateRating($input: {input}!) {{ {op}(input: $input) {{ id }} }}",
        input = input_type,
        op = operation
    )
}

fn all_pages() -> Value {
    json!({ "per_page": -1 })
}

fn greater_than(value: u32) -> Value {
    json!({ "value": value, "modifier": "GREATER_THAN" })
}

fn not_null() -> Value {
    json!({ "value": "", "modifier": "NOT_NULL" })
}

/// Server-side filter for performers, studios and tags
fn artifact_filter(filter: &ArtifactFilter, with_gender: bool) -> Value {
    let mut map = Map::new();
    if let (true, Some(gender)) = (with_gender, filter.gender) {
        map.insert(
            "gender".to_string(),
            json!({ "value": gender.as_catalog_str(), "modifier": "EQUALS" }),
        );
    }
    if let Some(min) = filter.scene_count_above {
        map.insert("scene_count".to_string(), greater_than(min));
    }
    if let Some(min) = filter.engagement_above {
        map.insert("o_counter".to_string(), greater_than(min));
    }
    if filter.favorites_only {
        let key = if with_gender { "filter_favorites" } else { "favorite" };
        map.insert(key.to_string(), Value::Bool(true));
    }
    Value::Object(map)
}

fn scene_filter(filter: &SceneFilter) -> Value {
    let mut map = Map::new();
    if let Some(ids) = &filter.studio_ids {
        map.insert(
            "studios".to_string(),
            json!({ "value": ids, "modifier": "INCLUDES" }),
        );
    } else if filter.has_studio {
        map.insert(
            "studios".to_string(),
            json!({ "value": [], "modifier": "NOT_NULL" }),
        );
    }
    if let Some(ids) = &filter.tag_ids {
        map.insert(
            "tags".to_string(),
            json!({ "value": ids, "modifier": "INCLUDES" }),
        );
    }
    if filter.performer_favorite {
        map.insert("performer_favorite".to_string(), Value::Bool(true));
    }
    if let Some(min) = filter.engagement_above {
        map.insert("o_counter".to_string(), greater_than(min));
    }
    if filter.has_title {
        map.insert("title".to_string(), not_null());
    }
    if filter.has_date {
        map.insert("date".to_string(), not_null());
    }
    if filter.has_details {
        map.insert("details".to_string(), not_null());
    }
    if filter.has_tags {
        map.insert("tag_count".to_string(), greater_than(0));
    }
    if filter.has_performers {
        map.insert("performer_count".to_string(), greater_than(0));
    }
    if filter.organized_only {
        map.insert("organized".to_string(), Value::Bool(true));
    }
    Value::Object(map)
}

#[async_trait]
impl Catalog for StashClient {
    async fn find_scenes(&self, filter: &SceneFilter) -> sck_common::Result<Vec<Scene>> {
        let query = format!("{}\nfragment SceneFields on Scene {{{}}}", FIND_SCENES, SCENE_FIELDS);
        let data: FindScenesData = self
            .execute(
                &query,
                json!({ "filter": all_pages(), "scene_filter": scene_filter(filter) }),
            )
            .await?;
        debug!(count = data.find_scenes.count, "findScenes");
        Ok(data.find_scenes.scenes.into_iter().map(Scene::from).collect())
    }

    async fn find_performers(&self, filter: &ArtifactFilter) -> sck_common::Result<Vec<Performer>> {
        let data: FindPerformersData = self
            .execute(
                FIND_PERFORMERS,
                json!({ "filter": all_pages(), "performer_filter": artifact_filter(filter, true) }),
            )
            .await?;
        Ok(data
            .find_performers
            .performers
            .into_iter()
            .map(Performer::from)
            .collect())
    }

    async fn find_studios(&self, filter: &ArtifactFilter) -> sck_common::Result<Vec<Studio>> {
        let data: FindStudiosData = self
            .execute(
                FIND_STUDIOS,
                json!({ "filter": all_pages(), "studio_filter": artifact_filter(filter, false) }),
            )
            .await?;
        Ok(data.find_studios.studios.into_iter().map(Studio::from).collect())
    }

    async fn find_tags(&self, filter: &ArtifactFilter) -> sck_common::Result<Vec<Tag>> {
        let data: FindTagsData = self
            .execute(
                FIND_TAGS,
                json!({ "filter": all_pages(), "tag_filter": artifact_filter(filter, false) }),
            )
            .await?;
        Ok(data.find_tags.tags.into_iter().map(Tag::from).collect())
    }

    async fn update_rating(
        &self,
        target: RatingTarget,
        id: &str,
        rating: u8,
    ) -> sck_common::Result<()> {
        self.write_rating(target, id, rating.min(100))
            .await
            .map_err(Into::into)
    }

    async fn trigger_scan(&self) -> sck_common::Result<()> {
        let _: Value = self
            .execute(METADATA_SCAN, json!({ "input": { "paths": null } }))
            .await?;
        Ok(())
    }
}

// ---- wire types ----

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct FindScenesData {
    #[serde(rename = "findScenes")]
    find_scenes: SceneList,
}

#[derive(Debug, Deserialize)]
struct SceneList {
    #[serde(default)]
    count: u64,
    scenes: Vec<WireScene>,
}

#[derive(Debug, Deserialize)]
struct FindPerformersData {
    #[serde(rename = "findPerformers")]
    find_performers: PerformerList,
}

#[derive(Debug, Deserialize)]
struct PerformerList {
    performers: Vec<WirePerformer>,
}

#[derive(Debug, Deserialize)]
struct FindStudiosData {
    #[serde(rename = "findStudios")]
    find_studios: StudioList,
}

#[derive(Debug, Deserialize)]
struct StudioList {
    studios: Vec<WireStudio>,
}

#[derive(Debug, Deserialize)]
struct FindTagsData {
    #[serde(rename = "findTags")]
    find_tags: TagList,
}

#[derive(Debug, Deserialize)]
struct TagList {
    tags: Vec<WireTag>,
}

#[derive(Debug, Deserialize)]
struct WirePerformer {
    id: String,
    name: String,
    gender: Option<String>,
    #[serde(default)]
    favorite: bool,
    #[serde(default, deserialize_with = "lenient_u64")]
    o_counter: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    scene_count: u64,
}

#[derive(Debug, Deserialize)]
struct WireStudioRef {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct WireStudio {
    id: String,
    name: String,
    #[serde(default)]
    favorite: bool,
    #[serde(default, deserialize_with = "lenient_u64")]
    o_counter: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    scene_count: u64,
    parent_studio: Option<WireStudioRef>,
}

#[derive(Debug, Deserialize)]
struct WireTag {
    id: String,
    name: String,
    #[serde(default)]
    favorite: bool,
    #[serde(default, deserialize_with = "lenient_u64")]
    o_counter: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    scene_count: u64,
}

#[derive(Debug, Deserialize)]
struct WireFile {
    path: String,
    #[serde(default)]
    basename: String,
    #[serde(default, deserialize_with = "lenient_u64")]
    size: u64,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct WireScene {
    id: String,
    title: Option<String>,
    date: Option<String>,
    details: Option<String>,
    rating100: Option<u32>,
    #[serde(default, deserialize_with = "lenient_u64")]
    o_counter: u64,
    #[serde(default)]
    files: Vec<WireFile>,
    studio: Option<WireStudio>,
    #[serde(default)]
    tags: Vec<WireTag>,
    #[serde(default)]
    performers: Vec<WirePerformer>,
}

/// Accept numbers, numeric strings and null (the server sends Int64 as either)
fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

fn saturate(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

impl From<WirePerformer> for Performer {
    fn from(p: WirePerformer) -> Self {
        Performer {
            id: p.id,
            name: p.name,
            gender: p.gender.as_deref().map(Gender::from_catalog),
            favorite: p.favorite,
            engagement: saturate(p.o_counter),
            scene_count: saturate(p.scene_count),
        }
    }
}

impl From<WireStudio> for Studio {
    fn from(s: WireStudio) -> Self {
        Studio {
            id: s.id,
            name: s.name,
            favorite: s.favorite,
            engagement: saturate(s.o_counter),
            scene_count: saturate(s.scene_count),
            parent: s.parent_studio.map(|p| StudioRef {
                id: p.id,
                name: p.name,
            }),
        }
    }
}

impl From<WireTag> for Tag {
    fn from(t: WireTag) -> Self {
        Tag {
            id: t.id,
            name: t.name,
            favorite: t.favorite,
            engagement: saturate(t.o_counter),
            scene_count: saturate(t.scene_count),
        }
    }
}

impl From<WireFile> for VideoFile {
    fn from(f: WireFile) -> Self {
        VideoFile {
            path: f.path,
            basename: f.basename,
            size: f.size,
            width: f.width,
            height: f.height,
        }
    }
}

impl From<WireScene> for Scene {
    fn from(s: WireScene) -> Self {
        Scene {
            id: s.id,
            title: s.title,
            date: s.date,
            details: s.details,
            rating: s.rating100.map(|r| r.min(100) as u8),
            engagement: saturate(s.o_counter),
            studio: s.studio.map(Studio::from),
            tags: s.tags.into_iter().map(Tag::from).collect(),
            performers: s.performers.into_iter().map(Performer::from).collect(),
            files: s.files.into_iter().map(VideoFile::from).collect(),
        }
    }
}
