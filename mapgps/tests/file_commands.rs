//! File-level command tests.
//!
//! Opens documents from disk, runs the subcommand edits and checks what
//! lands in the exported files.
//!
//! Run with: `cargo test -p mapgps --test file_commands`

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use mapgps::commands;
use mapgps::fileio::export_session_on;
use mapgps::{
    open_document, waypoints_of, EditError, EditorConfig, ExportTarget, FeatureStore, LatLng,
    MapGpsError,
};
use tempfile::TempDir;

const DOCUMENT: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {"type": "Feature", "properties": {"type": "ポイントGPS", "id": "A"},
     "geometry": {"type": "Point", "coordinates": [135.0, 34.0]}},
    {"type": "Feature", "properties": {"type": "ポイントGPS", "id": "B"},
     "geometry": {"type": "Point", "coordinates": [135.01, 34.01]}},
    {"type": "Feature", "properties": {"type": "route_waypoint", "route_id": "route_A_to_B", "waypoint_number": "1"},
     "geometry": {"type": "Point", "coordinates": [135.008, 34.0075]}},
    {"type": "Feature", "properties": {"type": "route_waypoint", "route_id": "route_A_to_B", "waypoint_number": "2"},
     "geometry": {"type": "Point", "coordinates": [135.0015, 34.002]}},
    {"type": "Feature", "properties": {"type": "route_waypoint", "route_id": "route_A_to_B", "waypoint_number": "3"},
     "geometry": {"type": "Point", "coordinates": [135.005, 34.0045]}},
    {"type": "Feature", "properties": {"type": "spot", "name": "Minoh falls", "category": "展望台"},
     "geometry": {"type": "Point", "coordinates": [135.472041, 34.853667]}}
  ]
}"#;

/// Helper: write `DOCUMENT` into a fresh temp dir.
fn write_document() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("minoh.geojson");
    fs::write(&path, DOCUMENT).expect("write document");
    (dir, path)
}

/// Helper: parse an exported file.
fn read_store(path: &Path) -> FeatureStore {
    let text = fs::read_to_string(path).expect("read export");
    FeatureStore::parse(&text).expect("export parses")
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
}

// ============================================================================
// Export
// ============================================================================

#[test]
fn test_directory_export_is_named_from_stats() {
    let (dir, input) = write_document();
    let mut session = open_document(&input, EditorConfig::default()).unwrap();

    let target = ExportTarget::Directory(dir.path().to_path_buf());
    let written = export_session_on(&mut session, &target, date()).unwrap();

    assert_eq!(
        written.file_name().and_then(|n| n.to_str()),
        Some("MapGPS-20240501_P2_R1_S1.geojson")
    );
    assert_eq!(read_store(&written).len(), 6);
}

#[test]
fn test_file_export_uses_given_path() {
    let (dir, input) = write_document();
    let mut session = open_document(&input, EditorConfig::default()).unwrap();

    let out = dir.path().join("out.geojson");
    let written = export_session_on(&mut session, &ExportTarget::File(out.clone()), date()).unwrap();
    assert_eq!(written, out);
}

#[test]
fn test_invalid_document_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.geojson");
    fs::write(&path, "{\"type\": \"FeatureCollection\"").unwrap();

    assert!(matches!(
        open_document(&path, EditorConfig::default()),
        Err(MapGpsError::Edit(_))
    ));
}

// ============================================================================
// Route commands
// ============================================================================

#[test]
fn test_optimize_command_reorders_waypoints() {
    let (dir, input) = write_document();
    let mut session = open_document(&input, EditorConfig::default()).unwrap();
    assert_eq!(commands::optimize(&mut session, "route_A_to_B").unwrap(), 3);

    let out = dir.path().join("optimized.geojson");
    export_session_on(&mut session, &ExportTarget::File(out.clone()), date()).unwrap();

    let store = read_store(&out);
    let positions: Vec<LatLng> = waypoints_of(&store, "route_A_to_B")
        .iter()
        .filter_map(|f| f.position())
        .collect();
    assert_eq!(
        positions,
        vec![
            LatLng::new(34.002, 135.0015),
            LatLng::new(34.0045, 135.005),
            LatLng::new(34.0075, 135.008),
        ]
    );
}

#[test]
fn test_unknown_route_is_reported() {
    let (_dir, input) = write_document();
    let mut session = open_document(&input, EditorConfig::default()).unwrap();
    assert!(matches!(
        commands::optimize(&mut session, "route_A_to_Z"),
        Err(MapGpsError::UnknownRoute(id)) if id == "route_A_to_Z"
    ));
}

#[test]
fn test_clear_route_removes_waypoints() {
    let (_dir, input) = write_document();
    let mut session = open_document(&input, EditorConfig::default()).unwrap();
    assert_eq!(commands::clear_route(&mut session, "route_A_to_B").unwrap(), 3);
    assert_eq!(session.stats().route_count, 0);
    assert_eq!(session.store().unwrap().len(), 3);
}

// ============================================================================
// Spot commands
// ============================================================================

#[test]
fn test_add_spot_with_name_and_category() {
    let (_dir, input) = write_document();
    let mut session = open_document(&input, EditorConfig::default()).unwrap();

    let id = commands::add_spot(
        &mut session,
        LatLng::new(34.85, 135.47),
        Some("Bridge"),
        Some("休憩所"),
    )
    .unwrap();

    let feature = session.store().unwrap().get(id).unwrap();
    assert_eq!(feature.name(), Some("Bridge"));
    assert_eq!(feature.category(), Some("休憩所"));
    assert_eq!(session.stats().spot_count, 2);
}

#[test]
fn test_add_spot_without_name_gets_placeholder() {
    let (_dir, input) = write_document();
    let mut session = open_document(&input, EditorConfig::default()).unwrap();

    let id = commands::add_spot(&mut session, LatLng::new(34.85, 135.47), None, None).unwrap();
    assert_eq!(session.store().unwrap().get(id).unwrap().name(), Some("仮1"));
}

#[test]
fn test_add_spot_rejects_invalid_position() {
    let (dir, input) = write_document();
    let mut session = open_document(&input, EditorConfig::default()).unwrap();

    let result = commands::add_spot(&mut session, LatLng::new(f64::NAN, 135.0), Some("x"), None);
    assert!(matches!(
        result,
        Err(MapGpsError::Edit(EditError::InvalidPosition { .. }))
    ));
    assert_eq!(session.store().unwrap().len(), 6);

    let out = dir.path().join("unchanged.geojson");
    export_session_on(&mut session, &ExportTarget::File(out.clone()), date()).unwrap();
    assert_eq!(read_store(&out).len(), 6);
}

#[test]
fn test_rename_and_delete_spot_by_name() {
    let (_dir, input) = write_document();
    let mut session = open_document(&input, EditorConfig::default()).unwrap();

    commands::rename_spot(&mut session, "Minoh falls", "Minoh waterfall").unwrap();
    assert!(matches!(
        commands::delete_spot(&mut session, "Minoh falls"),
        Err(MapGpsError::UnknownSpot(_))
    ));
    assert_eq!(
        commands::delete_spot(&mut session, "Minoh waterfall").unwrap(),
        "Minoh waterfall"
    );
    assert_eq!(session.stats().spot_count, 0);
}

// ============================================================================
// Stats
// ============================================================================

#[test]
fn test_stats_report_includes_bounds() {
    let (_dir, input) = write_document();
    let session = open_document(&input, EditorConfig::default()).unwrap();

    let report = commands::stats_report(&session);
    assert_eq!(report.stats.point_count, 2);
    assert_eq!(report.bounds, Some([34.0, 135.0, 34.853667, 135.472041]));

    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["route_count"], 1);
    assert_eq!(value["bounds"][2], 34.853667);
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_config_prefix_names_new_spots() {
    let (dir, input) = write_document();
    let config_path = dir.path().join("mapgps.json");
    fs::write(&config_path, r#"{"placeholder_prefix": "tmp"}"#).unwrap();

    let config = mapgps::load_config(Some(&config_path)).unwrap();
    let mut session = open_document(&input, config).unwrap();
    let id = commands::add_spot(&mut session, LatLng::new(34.85, 135.47), None, None).unwrap();
    assert_eq!(session.store().unwrap().get(id).unwrap().name(), Some("tmp1"));
}
