//! Library reorganizer tests against a temporary library

mod helpers;

use std::fs;
use std::path::Path;

use helpers::{child_studio, performer, studio, FakeCatalog, SceneBuilder};
use sck_common::{Gender, Scene};
use sck_cu::organizer::{
    organize_library, plan_scenes, FilenameTemplate, FolderStructure, OrganizeOptions,
    OrganizeOutcome,
};
use sck_cu::PathMapper;

fn options(structure: &str, template: &str) -> OrganizeOptions {
    OrganizeOptions::new(
        structure.parse::<FolderStructure>().unwrap(),
        FilenameTemplate::parse(template).unwrap(),
    )
}

fn touch(root: &Path, relative: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, relative.as_bytes()).unwrap();
}

fn library() -> (tempfile::TempDir, FakeCatalog) {
    let root = tempfile::tempdir().unwrap();
    touch(root.path(), "incoming/clip.mp4");
    touch(root.path(), "incoming/clip.srt");

    let acme = studio("s1", "Acme");
    let scene = SceneBuilder::new("7")
        .title("Sunset")
        .studio(&acme)
        .file("/data/incoming/clip.mp4", 10)
        .build();
    let catalog = FakeCatalog::new()
        .with_scenes(vec![scene])
        .with_studios(vec![acme]);
    (root, catalog)
}

#[tokio::test]
async fn test_organize_moves_siblings_and_rescans() {
    let (root, catalog) = library();
    let mapper = PathMapper::new("/data", root.path());

    let report = organize_library(&catalog, &options("flat", "{title} - {id}"), &mapper)
        .await
        .unwrap();

    assert_eq!(report.summary.moved, 1);
    assert_eq!(report.summary.failed, 0);
    assert!(root.path().join("Acme/Sunset - 7.mp4").exists());
    assert!(root.path().join("Acme/Sunset - 7.srt").exists());
    assert!(root.path().join("Acme/Sunset - 7.nfo").exists());
    assert!(!root.path().join("incoming/clip.mp4").exists());
    assert_eq!(catalog.scan_count(), 1);

    let nfo = fs::read_to_string(root.path().join("Acme/Sunset - 7.nfo")).unwrap();
    assert!(nfo.contains("<uniqueid type=\"stash\">7</uniqueid>"));
}

#[tokio::test]
async fn test_dry_run_leaves_files_and_catalog_alone() {
    let (root, catalog) = library();
    let mapper = PathMapper::new("/data", root.path());
    let mut opts = options("flat", "{title} - {id}");
    opts.dry_run = true;

    let report = organize_library(&catalog, &opts, &mapper).await.unwrap();

    assert!(report.dry_run);
    assert_eq!(report.summary.moved, 1);
    assert!(root.path().join("incoming/clip.mp4").exists());
    assert!(!root.path().join("Acme").exists());
    assert_eq!(catalog.scan_count(), 0);
}

#[tokio::test]
async fn test_second_run_skips_but_refreshes_nfo() {
    let (root, catalog) = library();
    let mapper = PathMapper::new("/data", root.path());
    let opts = options("flat", "{title} - {id}");
    organize_library(&catalog, &opts, &mapper).await.unwrap();

    let moved = SceneBuilder::new("7")
        .title("Sunset")
        .studio(&catalog.studios[0])
        .file("/data/Acme/Sunset - 7.mp4", 10)
        .build();
    let catalog = FakeCatalog::new()
        .with_scenes(vec![moved])
        .with_studios(catalog.studios.clone());
    fs::remove_file(root.path().join("Acme/Sunset - 7.nfo")).unwrap();

    let report = organize_library(&catalog, &opts, &mapper).await.unwrap();
    assert_eq!(report.summary.skipped, 1);
    assert!(root.path().join("Acme/Sunset - 7.nfo").exists());
}

#[test]
fn test_colliding_targets_become_duplicates() {
    let root = tempfile::tempdir().unwrap();
    let acme = studio("s1", "Acme");
    let scenes: Vec<Scene> = ["1", "2"]
        .iter()
        .map(|id| {
            SceneBuilder::new(id)
                .title("Same")
                .studio(&acme)
                .file(&format!("/data/{}.mp4", id), 1)
                .build()
        })
        .collect();
    let mapper = PathMapper::new("/data", root.path());

    let plan = plan_scenes(
        &scenes,
        vec![acme],
        &options("flat", "{studio} - {title}"),
        &mapper,
    );

    assert_eq!(plan.moves.len(), 1);
    assert_eq!(plan.moves[0].scene_id, "1");
    assert_eq!(plan.duplicates.len(), 1);
    assert_eq!(plan.duplicates[0].scene_id, "2");
    assert_eq!(plan.moves[0].target, root.path().join("Acme/Acme - Same.mp4"));
}

#[test]
fn test_nested_layout_survives_parent_cycle() {
    let mut top = studio("s1", "Top");
    let child = child_studio("s2", "Child", &top);
    top.parent = Some(sck_common::StudioRef {
        id: child.id.clone(),
        name: child.name.clone(),
    });

    let scene = SceneBuilder::new("3")
        .title("Loop")
        .studio(&child)
        .file("/data/x.mp4", 1)
        .build();
    let mapper = PathMapper::new("/data", "/lib");

    let plan = plan_scenes(
        &[scene],
        vec![top, child],
        &options("nested", "{title} - {id}"),
        &mapper,
    );

    assert_eq!(plan.moves.len(), 1);
    assert_eq!(
        plan.moves[0].target,
        Path::new("/lib/Top/Child/Loop - 3.mp4")
    );
}

#[test]
fn test_nested_layout_walks_to_root() {
    let root_studio = studio("s1", "Network");
    let mid = child_studio("s2", "Label", &root_studio);
    let leaf = child_studio("s3", "Series", &mid);
    let scene = SceneBuilder::new("4")
        .title("Deep")
        .studio(&leaf)
        .file("/data/x.mp4", 1)
        .build();
    let mapper = PathMapper::new("/data", "/lib");

    let plan = plan_scenes(
        &[scene],
        vec![leaf, root_studio, mid],
        &options("nested", "{title} - {id}"),
        &mapper,
    );

    assert_eq!(
        plan.moves[0].target,
        Path::new("/lib/Network/Label/Series/Deep - 4.mp4")
    );
}

#[test]
fn test_long_titles_are_cut_to_limit_keeping_extension() {
    let acme = studio("s1", "Acme");
    let scene = SceneBuilder::new("5")
        .title(&"x".repeat(400))
        .studio(&acme)
        .file("/data/long.mkv", 1)
        .build();
    let mapper = PathMapper::new("/data", "/lib");

    let plan = plan_scenes(
        &[scene],
        vec![acme],
        &options("flat", "{title} - {id}"),
        &mapper,
    );

    let name = plan.moves[0]
        .target
        .file_name()
        .unwrap()
        .to_string_lossy()
        .into_owned();
    assert_eq!(name.chars().count(), 255);
    assert!(name.ends_with(" - 5.mkv"));
}

#[test]
fn test_unplaceable_and_filtered_scenes() {
    let ann = performer("p1", "Ann", Gender::Female, 3);
    let carl = performer("p2", "Carl", Gender::Male, 1);
    let scenes = vec![
        SceneBuilder::new("1").title("Solo").performer(&ann).file("/data/1.mp4", 1).build(),
        SceneBuilder::new("2")
            .title("Duo")
            .performer(&ann)
            .performer(&carl)
            .file("/data/2.mp4", 1)
            .build(),
        SceneBuilder::new("3").title("Nobody").file("/data/3.mp4", 1).build(),
    ];
    let mapper = PathMapper::new("/data", "/lib");

    let by_male = plan_scenes(&scenes, vec![], &options("performer-male", "{title} - {id}"), &mapper);
    assert_eq!(by_male.moves.len(), 1);
    assert_eq!(by_male.moves[0].target, Path::new("/lib/Carl/Duo - 2.mp4"));
    assert_eq!(by_male.unplaceable.len(), 2);
    assert!(by_male
        .unplaceable
        .iter()
        .all(|o| matches!(o, OrganizeOutcome::Failed { .. })));

    let mut opts = options("performer-female", "{title} - {id}");
    opts.require_male = true;
    let filtered = plan_scenes(&scenes, vec![], &opts, &mapper);
    assert_eq!(filtered.moves.len(), 1);
    assert_eq!(filtered.moves[0].target, Path::new("/lib/Ann/Duo - 2.mp4"));
    assert!(filtered.unplaceable.is_empty());
}

#[tokio::test]
async fn test_missing_source_is_reported_not_fatal() {
    let root = tempfile::tempdir().unwrap();
    let acme = studio("s1", "Acme");
    let catalog = FakeCatalog::new()
        .with_scenes(vec![SceneBuilder::new("9")
            .title("Ghost")
            .studio(&acme)
            .file("/data/ghost.mp4", 1)
            .build()])
        .with_studios(vec![acme]);
    let mapper = PathMapper::new("/data", root.path());

    let report = organize_library(&catalog, &options("flat", "{title} - {id}"), &mapper)
        .await
        .unwrap();
    assert_eq!(report.summary.failed, 1);
    assert_eq!(report.outcomes[0].scene_id(), "9");
}
