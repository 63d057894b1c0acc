//! Export the travelogue as GeoJSON, one feature collection per day.
//!
//! GPX tracks become one `LineString` per segment; photos and videos become
//! a single `Point`. Artifacts without a usable location produce no
//! feature.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::config::OutputConfig;
use crate::extract::gpx::read_tracks;
use crate::models::{Artifact, ArtifactKind};
use crate::travelogue::{Day, Travelogue};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point([f64; 2]),
    LineString(Vec<[f64; 2]>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
    pub geometry: Geometry,
    pub properties: Map<String, Value>,
}

impl Feature {
    pub fn new(geometry: Geometry, properties: Map<String, Value>) -> Self {
        Self {
            kind: "Feature",
            geometry,
            properties,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    kind: &'static str,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: "FeatureCollection",
            features,
        }
    }
}

/// Features for a single artifact.
pub fn artifact_features(artifact: &Artifact) -> Vec<Feature> {
    match artifact.kind {
        ArtifactKind::Gpx => track_features(artifact),
        ArtifactKind::Image | ArtifactKind::Video => point_feature(artifact).into_iter().collect(),
    }
}

fn track_features(artifact: &Artifact) -> Vec<Feature> {
    let tracks = match read_tracks(&artifact.path) {
        Ok(tracks) => tracks,
        Err(e) => {
            warn!("Could not re-read {}: {}", artifact.path.display(), e);
            return Vec::new();
        }
    };

    let mut features = Vec::new();
    for track in &tracks {
        for segment in &track.segments {
            let coordinates = segment
                .points
                .iter()
                .map(|p| p.location.to_position())
                .collect();
            let mut properties = Map::new();
            properties.insert("name".to_string(), json!(track.name));
            properties.insert("type".to_string(), json!("track"));
            properties.insert(
                "filepath".to_string(),
                json!(artifact.path.to_string_lossy()),
            );
            features.push(Feature::new(Geometry::LineString(coordinates), properties));
        }
    }
    features
}

/// A point feature at the first corner, or nothing if it is unknown.
fn point_feature(artifact: &Artifact) -> Option<Feature> {
    let location = artifact.geo_bounds.start?;
    let mut properties = Map::new();
    properties.insert(
        "filepath".to_string(),
        json!(artifact.path.to_string_lossy()),
    );
    properties.insert("type".to_string(), json!(artifact.kind.as_str()));
    properties.insert("timestamp".to_string(), json!(artifact.timestamp()));
    Some(Feature::new(
        Geometry::Point(location.to_position()),
        properties,
    ))
}

/// All features of a day, in timestamp order.
pub fn export_day(day: &Day) -> FeatureCollection {
    FeatureCollection::new(day.sorted().flat_map(artifact_features).collect())
}

/// One collection per day, keyed by ISO date, in date order.
pub fn export(travelogue: &Travelogue) -> Vec<(String, FeatureCollection)> {
    travelogue
        .days()
        .map(|day| (day.key(), export_day(day)))
        .collect()
}

/// Write each day's collection to `<dir>/<prefix><date>.<extension>`.
pub fn write_documents(travelogue: &Travelogue, output: &OutputConfig) -> Result<Vec<PathBuf>> {
    let documents = export(travelogue);
    if documents.is_empty() {
        return Ok(Vec::new());
    }

    std::fs::create_dir_all(&output.dir).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            output.dir.display()
        )
    })?;

    let mut written = Vec::with_capacity(documents.len());
    for (date, collection) in documents {
        let path = output.dir.join(output.file_name(&date));
        let json = serde_json::to_string_pretty(&collection)?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(
            "Exported {} features for {} to {}",
            collection.features.len(),
            date,
            path.display()
        );
        written.push(path);
    }

    Ok(written)
}
