use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use travelogue::builder::build_travelogue;
use travelogue::config::Config;
use travelogue::export::{export, Geometry};

fn travelog_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("travelog");
    path
}

fn gpx(name: &str, segments: &[&[(f64, f64, &str)]]) -> String {
    let mut body = String::new();
    for segment in segments {
        body.push_str("<trkseg>");
        for (lat, lon, time) in segment.iter() {
            body.push_str(&format!(
                "<trkpt lat=\"{}\" lon=\"{}\"><time>{}</time></trkpt>",
                lat, lon, time
            ));
        }
        body.push_str("</trkseg>");
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
<trk><name>{}</name>{}</trk>
</gpx>"#,
        name, body
    )
}

fn setup_trip() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let trip = tmp.path().join("trip");
    fs::create_dir_all(trip.join("jun17")).unwrap();
    fs::create_dir_all(trip.join("jun18/phone")).unwrap();

    fs::write(
        trip.join("jun17/morning.gpx"),
        gpx(
            "Morning",
            &[
                &[
                    (49.1, -117.1, "2025-06-17T08:00:00Z"),
                    (49.2, -117.2, "2025-06-17T08:30:00Z"),
                ],
                &[
                    (49.3, -117.3, "2025-06-17T09:00:00Z"),
                    (49.4, -117.4, "2025-06-17T09:30:00Z"),
                    (49.5, -117.5, "2025-06-17T10:00:00Z"),
                ],
            ],
        ),
    )
    .unwrap();
    fs::write(
        trip.join("jun18/phone/ride.gpx"),
        gpx("Ride", &[&[(50.0, -118.0, "2025-06-18T12:00:00Z")]]),
    )
    .unwrap();

    // Recognised but without EXIF: an undated image.
    fs::write(trip.join("jun18/phone/IMG_0001.jpg"), [0xFF, 0xD8, 0xFF, 0xD9]).unwrap();
    // Unsupported and skipped.
    fs::write(trip.join("notes.txt"), "packing list").unwrap();
    fs::write(
        trip.join("feed.xml"),
        r#"<?xml version="1.0"?><rss><channel/></rss>"#,
    )
    .unwrap();
    fs::write(trip.join("empty.gpx"), "").unwrap();

    tmp
}

fn config_for(root: &Path) -> Config {
    let mut config = Config::minimal();
    config.input.root = root.to_path_buf();
    config
}

fn run_travelog(args: &[&str]) -> (String, String, bool) {
    let binary = travelog_binary();
    let output = Command::new(&binary)
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run travelog binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_pipeline_groups_by_day() {
    let tmp = setup_trip();
    let (travelogue, stats) = build_travelogue(&config_for(&tmp.path().join("trip"))).unwrap();

    assert_eq!(stats.scanned, 5, "empty file must not be scanned");
    assert_eq!(stats.inserted, 3);
    assert_eq!(stats.unsupported, 2);
    assert_eq!(stats.failed, 0);

    let keys: Vec<String> = travelogue.days().map(|d| d.key()).collect();
    assert_eq!(keys, vec!["2025-06-17", "2025-06-18"]);
    assert_eq!(travelogue.undated().len(), 1);
    assert_eq!(travelogue.start_date(), Some(1_750_147_200));
    assert_eq!(travelogue.end_date(), Some(1_750_248_000));

    for day in travelogue.days() {
        for artifact in day.artifacts() {
            let ext = artifact.path.extension().unwrap().to_string_lossy().to_string();
            assert_ne!(ext, "txt");
            assert_ne!(ext, "xml");
        }
    }
}

#[test]
fn test_export_linestrings_per_segment() {
    let tmp = setup_trip();
    let (travelogue, _) = build_travelogue(&config_for(&tmp.path().join("trip"))).unwrap();

    let docs = export(&travelogue);
    assert_eq!(docs.len(), 2);
    let (date, collection) = &docs[0];
    assert_eq!(date, "2025-06-17");
    assert_eq!(collection.features.len(), 2);

    let lines: Vec<&Vec<[f64; 2]>> = collection
        .features
        .iter()
        .filter_map(|f| match &f.geometry {
            Geometry::LineString(coords) => Some(coords),
            Geometry::Point(_) => None,
        })
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].len(), 2);
    assert_eq!(lines[1].len(), 3);
    assert_eq!(lines[0][0], [-117.1, 49.1]);
}

#[test]
fn test_empty_directory() {
    let tmp = TempDir::new().unwrap();
    let (travelogue, stats) = build_travelogue(&config_for(tmp.path())).unwrap();
    assert_eq!(stats.scanned, 0);
    assert_eq!(travelogue.day_count(), 0);
    assert_eq!(travelogue.start_date(), None);
    assert_eq!(travelogue.end_date(), None);
    assert!(export(&travelogue).is_empty());
}

#[test]
fn test_build_writes_documents() {
    let tmp = setup_trip();
    let trip = tmp.path().join("trip");
    let out = tmp.path().join("out");

    let (stdout, stderr, success) = run_travelog(&[
        "build",
        trip.to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
    ]);
    assert!(success, "build failed: {}", stderr);
    assert!(stdout.contains("documents written: 2"), "stdout: {}", stdout);
    assert!(stdout.contains("ok"));

    let doc: Value = serde_json::from_str(
        &fs::read_to_string(out.join("travelogue-2025-06-17.geojson")).unwrap(),
    )
    .unwrap();
    assert_eq!(doc["type"], "FeatureCollection");
    assert_eq!(doc["features"][0]["geometry"]["type"], "LineString");
    assert_eq!(doc["features"][0]["properties"]["type"], "track");
    assert_eq!(doc["features"][0]["properties"]["name"], "Morning");
    assert!(out.join("travelogue-2025-06-18.geojson").exists());
}

#[test]
fn test_build_with_config_file() {
    let tmp = setup_trip();
    let config_path = tmp.path().join("travelog.toml");
    fs::write(
        &config_path,
        format!(
            r#"[input]
root = "{}/trip"
exclude_globs = ["jun18/**"]

[output]
dir = "{}/custom"
prefix = "day-"
extension = "json"

[time]
utc_offset = "+00:00"
"#,
            tmp.path().display(),
            tmp.path().display()
        ),
    )
    .unwrap();

    let (_stdout, stderr, success) =
        run_travelog(&["--config", config_path.to_str().unwrap(), "build"]);
    assert!(success, "build failed: {}", stderr);
    assert!(tmp.path().join("custom/day-2025-06-17.json").exists());
    assert!(!tmp.path().join("custom/day-2025-06-18.json").exists());
}

#[test]
fn test_summary_json() {
    let tmp = setup_trip();
    let trip = tmp.path().join("trip");

    let (stdout, stderr, success) = run_travelog(&["summary", trip.to_str().unwrap(), "--json"]);
    assert!(success, "summary failed: {}", stderr);
    let summary: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(summary["start_date"], "2025-06-17T08:00:00+00:00");
    assert_eq!(summary["days"][0]["date"], "2025-06-17");
    assert_eq!(summary["days"][0]["count"], 1);
    assert_eq!(summary["days"][1]["count"], 1);
    assert_eq!(summary["undated"].as_array().unwrap().len(), 1);
}

#[test]
fn test_classify_lists_kinds() {
    let tmp = setup_trip();
    let trip = tmp.path().join("trip");

    let (stdout, stderr, success) = run_travelog(&["classify", trip.to_str().unwrap()]);
    assert!(success, "classify failed: {}", stderr);
    let gpx_line = stdout.lines().find(|l| l.ends_with("morning.gpx")).unwrap();
    assert!(gpx_line.starts_with("gpx"));
    let xml_line = stdout.lines().find(|l| l.ends_with("feed.xml")).unwrap();
    assert!(xml_line.starts_with("unsupported"));
}

#[test]
fn test_missing_root_fails() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("nope");
    let (_stdout, stderr, success) = run_travelog(&["build", missing.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("does not exist"), "stderr: {}", stderr);
}
