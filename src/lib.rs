//! # Travelogue
//!
//! Assemble the files produced during a journey (GPX tracks, photos,
//! videos) into a chronological, day-partitioned timeline and export it as
//! one GeoJSON feature collection per calendar day.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌────────────┐   ┌────────────┐   ┌────────────┐   ┌──────────┐
//! │  Walker  │──▶│ Classifier │──▶│ Extractors │──▶│ Travelogue │──▶│ Exporter │
//! │ walkdir  │   │ infer+xml  │   │ gpx/exif/qt│   │ days+range │   │ GeoJSON  │
//! └──────────┘   └────────────┘   └────────────┘   └────────────┘   └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! travelog build ./trip --out ./out   # one travelogue-YYYY-MM-DD.geojson per day
//! travelog summary ./trip             # date range and per-day counts
//! travelog classify ./trip            # what each file was detected as
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Artifact, bounds and file record types |
//! | [`walker`] | Recursive directory scan |
//! | [`classify`] | MIME sniffing and GPX detection |
//! | [`extract`] | GPX, EXIF and QuickTime metadata |
//! | [`builder`] | Pipeline orchestration |
//! | [`travelogue`] | Day-keyed aggregation and ordering |
//! | [`export`] | GeoJSON feature collections |
//! | [`summary`] | Human and JSON overviews |

pub mod builder;
pub mod classify;
pub mod config;
pub mod export;
pub mod extract;
pub mod models;
pub mod summary;
pub mod travelogue;
pub mod walker;
